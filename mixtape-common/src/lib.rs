//! # Mixtape Common Library
//!
//! Shared code for the mixtape service crates including:
//! - Configuration loading and folder resolution
//! - Error types
//! - Fade curve definitions and calculations
//! - Time and timestamp formatting helpers
//! - Job token generation

pub mod config;
pub mod error;
pub mod fade_curves;
pub mod human_time;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
