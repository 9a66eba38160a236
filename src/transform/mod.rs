//! The image transform pass.
//!
//! [`ImageTransform`] runs one pass over a document tree:
//!
//! 1. collect every `<img>` element once, in document order
//! 2. resolve each into a [`RequestDescriptor`]; elements without `src` are left alone
//! 3. drop elements matched by the skip rules; they are left alone too
//! 4. submit all remaining requests to a [`Coordinator`] concurrently
//! 5. when every submission has resolved, apply the results with [`mutator::apply`]
//!
//! Only step 4 suspends. Elements whose generation failed are left unmodified;
//! all others are rewritten, and the failures come back as
//! [`PassError::Generation`] together with the full [`PassReport`].
//!
//! # Example
//!
//! ```rust,no_run
//! use respimg::config::PassConfig;
//! use respimg::test_utils::{RecordingGenerator, fixtures};
//! use respimg::transform::ImageTransform;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let transform = ImageTransform::new(
//!     PassConfig::new("static", "static/g").with_width(600),
//!     RecordingGenerator::new(),
//! )?;
//!
//! let mut tree = fixtures::blog_post();
//! let report = transform.transform(&mut tree).await?;
//! println!("{} images processed", report.processed);
//! # Ok(())
//! # }
//! ```

pub mod mutator;

use std::sync::Arc;

use futures::future::join_all;

use crate::config::PassConfig;
use crate::constants::IMAGE_TAG;
use crate::coordinator::Coordinator;
use crate::core::{ConfigError, GenerationError, PassError};
use crate::generator::AttributeGenerator;
use crate::resolver::skip::SkipFilter;
use crate::resolver::{RequestDescriptor, resolve};
use crate::tree::{ElementMatcher, ElementPath, Node, select_elements};

/// One element whose attributes could not be generated.
#[derive(Debug, Clone)]
pub struct ElementFailure {
    /// Position of the element in the tree.
    pub path: ElementPath,
    /// Resolved resource path of the element.
    pub resource_path: String,
    /// The generator failure, shared with every element on the same request.
    pub error: GenerationError,
}

/// Outcome of one pass.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// `<img>` elements found.
    pub candidates: usize,
    /// Elements rewritten.
    pub processed: usize,
    /// Elements left alone by the skip rules.
    pub skipped: usize,
    /// Elements left alone for lack of a `src`.
    pub unresolved: usize,
    /// Generator calls made by this pass's own submissions.
    pub generated: usize,
    /// Elements left alone because generation failed.
    pub failures: Vec<ElementFailure>,
}

impl PassReport {
    /// Whether every submitted element was processed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Configured image transform.
///
/// Construction validates the configuration, so a transform that exists can
/// always run.
pub struct ImageTransform<G> {
    config: PassConfig,
    skip: SkipFilter,
    matcher: ElementMatcher,
    generator: Arc<G>,
}

impl<G: AttributeGenerator> ImageTransform<G> {
    /// Validate `config` and build a transform around `generator`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for missing roots or invalid skip patterns.
    pub fn new(config: PassConfig, generator: G) -> Result<Self, ConfigError> {
        config.validate()?;
        let skip = SkipFilter::from_config(&config)?;
        Ok(Self {
            config,
            skip,
            matcher: ElementMatcher::tag(IMAGE_TAG),
            generator: Arc::new(generator),
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &PassConfig {
        &self.config
    }

    /// A coordinator with fresh pass state for this transform.
    ///
    /// Pass it to [`transform_with`](Self::transform_with) repeatedly to reuse
    /// generated results across passes.
    pub fn coordinator(&self) -> Coordinator<Arc<G>> {
        Coordinator::new(Arc::clone(&self.generator), &self.config)
    }

    /// Run one pass over `tree` with its own pass state.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::Generation`] if any element failed; the tree is
    /// still rewritten for every other element.
    pub async fn transform(&self, tree: &mut Node) -> Result<PassReport, PassError> {
        let coordinator = self.coordinator();
        self.transform_with(tree, &coordinator).await
    }

    /// Run one pass over `tree` using an existing coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::Generation`] if any element failed; the tree is
    /// still rewritten for every other element.
    pub async fn transform_with<C: AttributeGenerator>(
        &self,
        tree: &mut Node,
        coordinator: &Coordinator<C>,
    ) -> Result<PassReport, PassError> {
        let paths = select_elements(tree, &self.matcher);
        let mut report = PassReport {
            candidates: paths.len(),
            ..PassReport::default()
        };

        let mut submissions: Vec<(ElementPath, RequestDescriptor)> = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(element) = tree.element(&path) else {
                continue;
            };
            let Some(request) = resolve(&element.properties, &self.config) else {
                report.unresolved += 1;
                continue;
            };
            if self.skip.should_skip(&request) {
                tracing::debug!(
                    target: "transform",
                    "Skipping {} at {}",
                    request.resource_path,
                    path
                );
                report.skipped += 1;
                continue;
            }
            submissions.push((path, request));
        }

        let results = join_all(
            submissions.iter().map(|(_, request)| coordinator.submit_tracked(request)),
        )
        .await;
        report.generated = results.iter().filter(|(_, generated)| *generated).count();

        for ((path, request), (result, _)) in submissions.into_iter().zip(results) {
            match result {
                Ok(attributes) => {
                    if let Some(element) = tree.element_mut(&path) {
                        mutator::apply(element, &attributes, &request);
                        report.processed += 1;
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        target: "transform",
                        "Leaving image at {} unprocessed: {}",
                        path,
                        error
                    );
                    report.failures.push(ElementFailure {
                        path,
                        resource_path: request.resource_path,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            target: "transform",
            "Image pass: {} candidates, {} processed, {} skipped, {} without src, {} failed, {} generated",
            report.candidates,
            report.processed,
            report.skipped,
            report.unresolved,
            report.failures.len(),
            report.generated
        );

        if report.is_success() {
            Ok(report)
        } else {
            Err(PassError::Generation {
                report: Box::new(report),
            })
        }
    }
}
