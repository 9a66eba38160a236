//! Test utilities for respimg
//!
//! Helpers for unit and integration tests:
//! - [`init_test_logging`] installs a tracing subscriber once per test binary
//! - [`RecordingGenerator`] is an [`AttributeGenerator`](crate::generator::AttributeGenerator)
//!   stub that records every request
//! - [`fixtures`] builds sample trees and elements
//!
//! # Example
//!
//! ```rust,no_run
//! use respimg::test_utils::{RecordingGenerator, fixtures, init_test_logging};
//!
//! init_test_logging(None);
//! let generator = RecordingGenerator::new();
//! let tree = fixtures::tree(vec![fixtures::img("a.jpg"), fixtures::img("b.jpg")]);
//! ```

pub mod fixtures;
mod generator;

pub use generator::RecordingGenerator;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise the
/// `RUST_LOG` environment variable; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=coordinator=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
