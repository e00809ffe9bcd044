//! UUID utilities

use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse UUID from either hyphenated or simple (32 hex digit) form
pub fn parse(s: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}

/// Render a UUID as 32 lowercase hex digits without hyphens
pub fn to_simple_string(id: &Uuid) -> String {
    id.simple().to_string()
}
