//! respimg - responsive image attributes for HTML document trees
//!
//! A transform step for static-site pipelines: given a parsed document tree,
//! it finds every `<img>` element, asks an image generator for responsive
//! attributes (source sets per format, a placeholder) and rewrites the element
//! in place as an `<s-image>`.
//!
//! # Architecture Overview
//!
//! One pass over a tree flows through four stages:
//! - [`resolver`] merges element attributes with pass defaults into a
//!   [`RequestDescriptor`](resolver::RequestDescriptor)
//! - [`resolver::skip`] drops requests matched by the skip rules
//! - [`coordinator`] runs the requests concurrently, calling the generator at
//!   most once per distinct image request
//! - [`transform::mutator`] writes results back onto the elements
//!
//! [`transform`] wires the stages together; [`tree`] is the document model
//! and [`generator`] the contract with the external image generator.
//!
//! ## Supporting Modules
//! - [`config`] - pass configuration, in code or from TOML
//! - [`core`] - error types
//! - [`constants`] - tag names, attribute names and parallelism defaults
//!
//! # Configuration (TOML)
//!
//! ```toml
//! input-dir = "static"
//! output-dir = "static/g"
//! width = 600
//! avif = false
//! src-prefix = "images"
//! generate-images = true
//! skip = ["*.gif"]
//! ```

pub mod config;
pub mod constants;
pub mod coordinator;
pub mod core;
pub mod generator;
pub mod resolver;
pub mod transform;
pub mod tree;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::PassConfig;
pub use coordinator::Coordinator;
pub use generator::{AttributeGenerator, GeneratedAttributes, GenerationRequest, WorkQueue};
pub use transform::{ImageTransform, PassReport};
