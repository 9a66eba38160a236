//! Per-pass resource coordinator with request deduplication.
//!
//! Every image element in a tree becomes one [`RequestDescriptor`] and all of
//! them are submitted concurrently. Many elements usually point at the same
//! image, and generating variants is expensive, so the [`Coordinator`] keys
//! requests by [`DedupKey`] and guarantees at most one generator call per key.
//!
//! # State Machine
//!
//! The pass state maps each key to a [`SlotState`]:
//!
//! ```text
//! (absent) ──submit──> Pending(flight) ──ok──> Ready(attributes)
//!                            │
//!                            └──error / abandoned──> (absent)
//! ```
//!
//! - **Absent**: the first submitter inserts `Pending` through the map's entry
//!   API (check and insert happen under one shard lock) and calls the generator.
//! - **Pending**: later submitters attach to the flight and wait on its
//!   `Notify`. The notified future is created while the entry is still held so
//!   a completion between releasing the entry and awaiting cannot be missed.
//! - **Ready**: later submitters get the cached result without calling the
//!   generator.
//!
//! A failed flight stores its error for the attached waiters and removes the
//! key, so a later submission with the same key calls the generator again.
//! A flight whose creator is dropped mid-generation (the pass future was
//! cancelled) is removed the same way; its waiters wake up, find no outcome and
//! retry from the top.
//!
//! # Presentation
//!
//! `skip_placeholder` is not part of the key. The generator is always asked for
//! a placeholder, and [`Coordinator::submit`] strips it from the copy returned
//! to callers that asked to skip it.
//!
//! # Lifecycle
//!
//! The pass state lives exactly as long as the coordinator. A transform creates
//! a fresh coordinator per pass unless the caller passes one in to share
//! results across passes.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Notify;

use crate::config::PassConfig;
use crate::constants::default_max_parallel;
use crate::core::GenerationError;
use crate::generator::{AttributeGenerator, GeneratedAttributes, GenerationRequest, WorkQueue};
use crate::resolver::{DedupKey, RequestDescriptor};

type Outcome = Result<Arc<GeneratedAttributes>, GenerationError>;

/// One in-progress generator call.
struct Flight {
    /// Woken once the flight is over, whatever the outcome.
    notify: Notify,
    /// Set exactly once before `notify` fires; unset if the flight was abandoned.
    outcome: OnceLock<Outcome>,
}

impl Flight {
    fn new() -> Self {
        Self {
            notify: Notify::new(),
            outcome: OnceLock::new(),
        }
    }
}

/// State of one dedup key in the pass state.
enum SlotState {
    /// A generator call for this key is running.
    Pending(Arc<Flight>),
    /// The generator call succeeded.
    Ready(Arc<GeneratedAttributes>),
}

impl SlotState {
    fn is_flight(&self, flight: &Arc<Flight>) -> bool {
        matches!(self, Self::Pending(f) if Arc::ptr_eq(f, flight))
    }
}

/// Owns a pending slot while its creator runs the generator.
///
/// Dropping the guard wakes the waiters. If no outcome was recorded (the
/// creator was cancelled) the slot is released first so the key can be
/// claimed again.
struct FlightGuard<'a> {
    state: &'a DashMap<DedupKey, SlotState>,
    key: DedupKey,
    flight: Arc<Flight>,
}

impl FlightGuard<'_> {
    fn complete(self, outcome: Outcome) -> Outcome {
        // The flight is only ever completed here, once.
        let _ = self.flight.outcome.set(outcome.clone());
        match &outcome {
            Ok(attributes) => {
                self.state.insert(self.key.clone(), SlotState::Ready(Arc::clone(attributes)));
            }
            Err(_) => {
                self.state.remove_if(&self.key, |_, slot| slot.is_flight(&self.flight));
            }
        }
        outcome
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.flight.outcome.get().is_none() {
            self.state.remove_if(&self.key, |_, slot| slot.is_flight(&self.flight));
            tracing::debug!(
                target: "coordinator",
                "Abandoned generation for {}; releasing slot",
                self.key.resource_path
            );
        }
        self.flight.notify.notify_waiters();
    }
}

/// Deduplicating front end to an [`AttributeGenerator`].
///
/// Cheap to share by reference across all submissions of a pass; every method
/// takes `&self`.
pub struct Coordinator<G> {
    generator: G,
    input_dir: PathBuf,
    output_dir: PathBuf,
    queue: WorkQueue,
    state: DashMap<DedupKey, SlotState>,
    invocations: AtomicUsize,
}

impl<G: AttributeGenerator> Coordinator<G> {
    /// Coordinator for one pass configured by `config`.
    ///
    /// Creates the pass's single [`WorkQueue`], bounded by
    /// [`PassConfig::max_parallel`] or [`default_max_parallel`].
    pub fn new(generator: G, config: &PassConfig) -> Self {
        let max_parallel = config.max_parallel.unwrap_or_else(default_max_parallel);
        Self::with_queue(generator, config, WorkQueue::new(max_parallel))
    }

    /// Coordinator using an existing queue.
    pub fn with_queue(generator: G, config: &PassConfig, queue: WorkQueue) -> Self {
        Self {
            generator,
            input_dir: config.input_dir.clone(),
            output_dir: config.output_dir.clone(),
            queue,
            state: DashMap::new(),
            invocations: AtomicUsize::new(0),
        }
    }

    /// Generated attributes for `request`, as presented to that one caller.
    ///
    /// Suspends until the result for the request's key is available. Callers
    /// sharing a key share one generator call and see the same result or the
    /// same error; the placeholder is removed for callers with
    /// `skip_placeholder`.
    ///
    /// # Errors
    ///
    /// Returns the [`GenerationError`] of the generator call this request was
    /// attached to. The failure is not cached.
    pub async fn submit(
        &self,
        request: &RequestDescriptor,
    ) -> Result<GeneratedAttributes, GenerationError> {
        self.submit_tracked(request).await.0
    }

    /// [`submit`](Self::submit), also reporting whether this call was the one
    /// that invoked the generator.
    pub(crate) async fn submit_tracked(
        &self,
        request: &RequestDescriptor,
    ) -> (Result<GeneratedAttributes, GenerationError>, bool) {
        let (shared, generated) = self.fetch(request).await;
        let presented = shared.map(|shared| {
            if request.skip_placeholder {
                shared.without_placeholder()
            } else {
                GeneratedAttributes::clone(&shared)
            }
        });
        (presented, generated)
    }

    /// Shared result for the key of `request`, and whether this call generated it.
    async fn fetch(&self, request: &RequestDescriptor) -> (Outcome, bool) {
        let key = request.dedup_key();

        let flight = loop {
            match self.state.entry(key.clone()) {
                Entry::Occupied(entry) => match entry.get() {
                    SlotState::Ready(attributes) => {
                        tracing::debug!(
                            target: "coordinator",
                            "Reusing generated attributes for {}",
                            key.resource_path
                        );
                        return (Ok(Arc::clone(attributes)), false);
                    }
                    SlotState::Pending(existing) => {
                        let existing = Arc::clone(existing);
                        // Create the notified future before releasing the entry;
                        // Notify only wakes futures that already exist.
                        let notified = existing.notify.notified();
                        drop(entry);

                        tracing::debug!(
                            target: "coordinator",
                            "Waiting for in-flight generation of {}",
                            key.resource_path
                        );
                        notified.await;

                        match existing.outcome.get() {
                            Some(outcome) => return (outcome.clone(), false),
                            // Creator was cancelled; claim the key ourselves.
                            None => continue,
                        }
                    }
                },
                Entry::Vacant(entry) => {
                    let flight = Arc::new(Flight::new());
                    entry.insert(SlotState::Pending(Arc::clone(&flight)));
                    break flight;
                }
            }
        };

        let guard = FlightGuard {
            state: &self.state,
            key,
            flight,
        };

        self.invocations.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            target: "coordinator",
            "Generating attributes for {} (width={:?}, quality={:?}, queue={})",
            request.resource_path,
            request.width,
            request.quality,
            self.queue.id()
        );

        let outcome = self
            .generator
            .generate(self.generation_request(request))
            .await
            .map(Arc::new)
            .map_err(|e| GenerationError::new(request.resource_path.clone(), e));

        if let Err(e) = &outcome {
            tracing::warn!(target: "coordinator", "{e}");
        }
        (guard.complete(outcome), true)
    }

    fn generation_request(&self, request: &RequestDescriptor) -> GenerationRequest {
        GenerationRequest {
            resource_path: request.resource_path.clone(),
            queue: self.queue.clone(),
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            include_webp: Some(request.include_webp),
            include_avif: Some(request.include_avif),
            widths: request.width.map(|width| vec![width]),
            quality: request.quality,
            skip_generation: request.skip_variant_generation,
            skip_placeholder: false,
        }
    }

    /// The pass's work queue.
    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// Number of generator calls made so far.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Number of keys with a cached successful result.
    pub fn cached_len(&self) -> usize {
        self.state
            .iter()
            .filter(|entry| matches!(entry.value(), SlotState::Ready(_)))
            .count()
    }

    /// Whether `key` has a cached successful result.
    pub fn is_cached(&self, key: &DedupKey) -> bool {
        self.state
            .get(key)
            .is_some_and(|slot| matches!(slot.value(), SlotState::Ready(_)))
    }

    /// Drop every cached result.
    ///
    /// In-flight generations are unaffected and still deliver to their waiters.
    pub fn clear(&self) {
        self.state.retain(|_, slot| matches!(slot, SlotState::Pending(_)));
    }
}
