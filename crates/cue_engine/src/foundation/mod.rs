//! Foundation module - Core utilities shared by the audio layer
//!
//! - Logging utilities

pub mod logging;
