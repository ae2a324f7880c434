use std::collections::BTreeMap;
use std::sync::Arc;

use foundation::CanvasSize;
use runtime::Frame;
use tracing::{debug, trace, warn};

use crate::descriptor::{OverflowPolicy, ViewDescriptor};
use crate::error::ConfigurationError;
use crate::hash::{Digest, StructuralHash};
use crate::projection::{Invertible, build_projection_matrix};
use crate::resolver::resolve_view_matrix;
use crate::view_state::ViewState;
use crate::viewport::Viewport;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    pub view_id: String,
    pub descriptor: Digest,
    pub view_state: Digest,
    pub canvas: CanvasSize,
}

impl CacheKey {
    pub fn new(descriptor: &ViewDescriptor, view_state: &ViewState, canvas: CanvasSize) -> Self {
        Self {
            view_id: descriptor.id.clone(),
            descriptor: descriptor.structural_hash(),
            view_state: view_state.structural_hash(),
            canvas,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    viewport: Arc<Viewport>,
    last_used: Frame,
}

/// Memoising descriptor → viewport resolver.
///
/// Ordering contract:
/// - Entries are keyed in a `BTreeMap` for stable traversal order.
/// - Identical `(descriptor, view state, canvas)` inputs return the same
///   `Arc` until the entry is evicted.
/// - [`retain_frame`](Self::retain_frame) evicts every entry not requested
///   since the previous sweep, so the cache never outgrows one frame's views.
#[derive(Debug, Default)]
pub struct ViewportFactory {
    frame: Frame,
    entries: BTreeMap<CacheKey, CacheEntry>,
    stats: CacheStats,
}

impl ViewportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Frame that requests are currently stamped with.
    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn make_viewport(
        &mut self,
        descriptor: &ViewDescriptor,
        view_state: &ViewState,
        canvas: CanvasSize,
    ) -> Result<Arc<Viewport>, ConfigurationError> {
        let key = CacheKey::new(descriptor, view_state, canvas);
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.last_used = self.frame;
            self.stats.hits += 1;
            trace!("viewport cache hit: {}", descriptor.id);
            return Ok(Arc::clone(&entry.viewport));
        }

        self.stats.misses += 1;
        let viewport = Arc::new(build_viewport(descriptor, view_state, canvas)?);
        debug!(
            "resolved viewport {} at {:?} for {}x{}",
            descriptor.id,
            viewport.extents(),
            canvas.width,
            canvas.height
        );
        if viewport.visible().is_none() {
            warn!("viewport {} lies entirely outside the canvas", descriptor.id);
        }
        self.entries.insert(
            key,
            CacheEntry {
                viewport: Arc::clone(&viewport),
                last_used: self.frame,
            },
        );
        Ok(viewport)
    }

    /// Evicts entries not requested during the current frame, then starts the
    /// next one. Returns the number of evicted entries.
    pub fn retain_frame(&mut self) -> usize {
        let current = self.frame;
        let before = self.entries.len();
        self.entries.retain(|_, e| e.last_used == current);
        let evicted = before - self.entries.len();
        self.stats.evictions += evicted as u64;
        if evicted > 0 {
            debug!("evicted {evicted} stale viewports after frame {}", current.index);
        }
        self.frame = current.next();
        evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Uncached resolution of one descriptor.
///
/// Steps: extents, overflow policy, view matrix (which validates the view
/// state against the descriptor's frame), projection, assembly. External view
/// states supply their own projection and bypass the descriptor's mode.
pub fn build_viewport(
    descriptor: &ViewDescriptor,
    view_state: &ViewState,
    canvas: CanvasSize,
) -> Result<Viewport, ConfigurationError> {
    let extents = descriptor.extents.resolve(canvas)?;
    if descriptor.overflow == OverflowPolicy::Fail && !extents.is_within(&canvas.rect()) {
        return Err(ConfigurationError::ExceedsCanvas { extents, canvas });
    }

    let resolved = resolve_view_matrix(descriptor.frame, view_state, &extents)?;
    let projection = match view_state {
        ViewState::External(s) => Invertible::new(s.projection_matrix, "projection")?,
        _ => build_projection_matrix(
            descriptor.projection,
            &descriptor.params,
            resolved.aspect,
            resolved.distance,
        )?,
    };
    let view = Invertible::new(resolved.view, "view")?;

    Ok(Viewport::assemble(
        descriptor.id.clone(),
        extents,
        canvas,
        view,
        projection,
        resolved.distance,
        resolved.geo,
    ))
}
