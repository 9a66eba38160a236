//! Core types shared across respimg.
//!
//! Currently this is the error taxonomy; see [`error`].

pub mod error;

pub use error::{ConfigError, GenerationError, PassError};
