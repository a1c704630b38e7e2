//! Runtime algorithm selection: an ordered list of registered masking
//! algorithms with a cycling cursor and a currently active algorithm.
//!
//! The registry is an explicitly constructed value meant to be owned by
//! whatever layer drives algorithm selection (a UI, a CLI), not ambient
//! global state. Mutation is serialized behind an interior mutex, so a
//! single registry can be shared by reference across threads. Masking
//! itself never holds the lock: [`mask_image`](AlgorithmRegistry::mask_image)
//! snapshots the active algorithm once at call start, so registry
//! mutation only affects future calls, never one already running.

use std::sync::{Mutex, MutexGuard, PoisonError};

use image::RgbaImage;

use crate::engine;
use crate::mask::MaskKind;
use crate::types::{MaskConfig, MaskError};

/// Ordered algorithm list, cycling cursor, and active algorithm.
#[derive(Debug)]
struct Inner {
    algorithms: Vec<MaskKind>,
    cursor: usize,
    active: MaskKind,
}

/// Registry of masking algorithms with runtime cycling and selection.
///
/// Duplicate registrations are permitted; the cursor walks the list in
/// insertion order and wraps past the end.
#[derive(Debug)]
pub struct AlgorithmRegistry {
    inner: Mutex<Inner>,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AlgorithmRegistry {
    /// An empty registry with the composite color-strength mask active.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                algorithms: Vec::new(),
                cursor: 0,
                active: MaskKind::default(),
            }),
        }
    }

    /// A registry pre-populated with every algorithm in
    /// [`MaskKind::ALL`] order.
    #[must_use]
    pub fn with_all() -> Self {
        let registry = Self::new();
        for kind in MaskKind::ALL {
            registry.register(kind);
        }
        registry
    }

    /// Append an algorithm to the cycling list.
    pub fn register(&self, kind: MaskKind) {
        self.lock().algorithms.push(kind);
    }

    /// Replace the active algorithm.
    ///
    /// Takes effect for all subsequent masking calls; an in-flight call
    /// keeps the algorithm it captured at start.
    pub fn set_active(&self, kind: MaskKind) {
        self.lock().active = kind;
    }

    /// The currently active algorithm.
    #[must_use]
    pub fn active(&self) -> MaskKind {
        self.lock().active
    }

    /// Advance the cursor by one (wrapping past the end) and activate the
    /// algorithm now under it.
    ///
    /// A no-op on an empty registry. Returns the active algorithm after
    /// the advance.
    pub fn advance(&self) -> MaskKind {
        let mut inner = self.lock();
        if inner.algorithms.is_empty() {
            return inner.active;
        }

        inner.cursor += 1;
        if inner.cursor >= inner.algorithms.len() {
            inner.cursor = 0;
        }
        inner.active = inner.algorithms[inner.cursor];
        inner.active
    }

    /// Mask `source` with the currently active algorithm.
    ///
    /// The active algorithm is captured once before any work starts, so
    /// concurrent [`set_active`](Self::set_active) /
    /// [`advance`](Self::advance) calls cannot affect this invocation.
    ///
    /// # Errors
    ///
    /// Propagates [`MaskError`] from the engine: an invalid configuration
    /// for the captured algorithm, or a strip worker failure.
    pub fn mask_image(
        &self,
        source: &RgbaImage,
        config: &MaskConfig,
    ) -> Result<RgbaImage, MaskError> {
        let kind = self.active();
        engine::mask_with(kind, source, config)
    }

    /// Lock the interior state, recovering from poisoning.
    ///
    /// Registry state is plain value data, so the contents of a poisoned
    /// lock are still coherent.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
