//! Multi-view layout bookkeeping.
//!
//! Descriptor order is z-order: later descriptors are drawn on top and win
//! picking ties.

use std::collections::BTreeSet;
use std::sync::Arc;

use foundation::CanvasSize;
use runtime::{Frame, Latest};
use tracing::{debug, trace};

use crate::descriptor::ViewDescriptor;
use crate::error::{LayoutError, ViewError};
use crate::factory::{CacheStats, ViewportFactory};
use crate::picking::{self, HitTester, PickResult};
use crate::view_state::ViewState;
use crate::viewport::Viewport;

#[derive(Debug, Clone)]
pub struct LayoutEntry {
    pub id: String,
    pub viewport: Arc<Viewport>,
    /// `false` iff the viewport is the same instance as the previous
    /// layout's entry with this id.
    pub changed: bool,
}

/// Resolved viewports for one canvas size and view state.
#[derive(Debug, Clone)]
pub struct Layout {
    frame: Frame,
    canvas: CanvasSize,
    entries: Vec<LayoutEntry>,
    overlaps: Vec<(usize, usize)>,
}

impl Layout {
    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn viewport(&self, id: &str) -> Option<&Arc<Viewport>> {
        self.get(id).map(|e| &e.viewport)
    }

    /// Index pairs `(i, j)`, `i < j`, whose visible rectangles share area.
    pub fn overlaps(&self) -> &[(usize, usize)] {
        &self.overlaps
    }

    pub fn changed(&self) -> impl Iterator<Item = &LayoutEntry> {
        self.entries.iter().filter(|e| e.changed)
    }

    /// Entries bottom-to-top, the order a renderer should draw them.
    pub fn render_order(&self) -> impl DoubleEndedIterator<Item = &LayoutEntry> {
        self.entries.iter()
    }

    /// Entries whose visible rectangle contains the canvas pixel, topmost first.
    pub fn viewports_at(&self, x: f64, y: f64) -> impl Iterator<Item = &LayoutEntry> {
        self.entries
            .iter()
            .rev()
            .filter(move |e| e.viewport.visible().is_some_and(|r| r.contains(x, y)))
    }
}

/// Pairs of viewports whose on-canvas rectangles intersect with nonzero area.
///
/// Edge-adjacent viewports do not overlap; off-canvas viewports overlap
/// nothing.
pub fn detect_overlaps(entries: &[LayoutEntry]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for (i, a) in entries.iter().enumerate() {
        let Some(ra) = a.viewport.visible() else {
            continue;
        };
        for (j, b) in entries.iter().enumerate().skip(i + 1) {
            if b.viewport.visible().is_some_and(|rb| ra.intersects(&rb)) {
                out.push((i, j));
            }
        }
    }
    out
}

fn check_unique(descriptors: &[ViewDescriptor]) -> Result<(), LayoutError> {
    let mut seen = BTreeSet::new();
    for d in descriptors {
        if !seen.insert(d.id.as_str()) {
            return Err(LayoutError::DuplicateId(d.id.clone()));
        }
    }
    Ok(())
}

/// Owns the ordered descriptors and the viewport cache.
///
/// Two ways to drive it:
/// - call [`resolve`](Self::resolve) with the view state and canvas directly;
/// - `submit_*` inputs as they arrive and call
///   [`begin_frame`](Self::begin_frame) once per frame. Only the newest
///   submission of each kind is used; anything submitted after
///   `begin_frame` waits for the next one.
#[derive(Debug, Default)]
pub struct LayoutManager {
    descriptors: Vec<ViewDescriptor>,
    factory: ViewportFactory,
    layout: Option<Layout>,
    view_state: Option<ViewState>,
    canvas: Option<CanvasSize>,
    pending_view_state: Latest<ViewState>,
    pending_canvas: Latest<CanvasSize>,
    pending_descriptors: Latest<Vec<ViewDescriptor>>,
}

impl LayoutManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_descriptors(descriptors: Vec<ViewDescriptor>) -> Result<Self, LayoutError> {
        let mut m = Self::new();
        m.set_descriptors(descriptors)?;
        Ok(m)
    }

    pub fn descriptors(&self) -> &[ViewDescriptor] {
        &self.descriptors
    }

    /// Replaces the descriptor list; rejected lists leave the old one in place.
    pub fn set_descriptors(&mut self, descriptors: Vec<ViewDescriptor>) -> Result<(), LayoutError> {
        check_unique(&descriptors)?;
        self.descriptors = descriptors;
        Ok(())
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn viewport(&self, id: &str) -> Option<&Arc<Viewport>> {
        self.layout.as_ref()?.viewport(id)
    }

    pub fn view_state(&self) -> Option<&ViewState> {
        self.view_state.as_ref()
    }

    /// Most recent canvas size, which may be newer than [`layout`](Self::layout)'s
    /// after a failed frame.
    pub fn canvas(&self) -> Option<CanvasSize> {
        self.canvas
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.factory.stats()
    }

    /// Resolves every descriptor against `view_state` and `canvas`.
    ///
    /// On error the previous layout is kept and the error names the first
    /// failing descriptor.
    pub fn resolve(&mut self, view_state: &ViewState, canvas: CanvasSize) -> Result<&Layout, ViewError> {
        let frame = self.factory.frame();
        let mut entries = Vec::with_capacity(self.descriptors.len());
        for d in &self.descriptors {
            let viewport = self
                .factory
                .make_viewport(d, view_state, canvas)
                .map_err(|e| ViewError::configuration(d.id.as_str(), e))?;
            let changed = self
                .layout
                .as_ref()
                .and_then(|l| l.viewport(&d.id))
                .is_none_or(|prev| !Arc::ptr_eq(prev, &viewport));
            entries.push(LayoutEntry {
                id: d.id.clone(),
                viewport,
                changed,
            });
        }
        self.factory.retain_frame();

        let overlaps = detect_overlaps(&entries);
        let layout = Layout {
            frame,
            canvas,
            entries,
            overlaps,
        };
        debug!(
            "frame {}: {} views, {} changed, {} overlaps",
            frame.index,
            layout.len(),
            layout.changed().count(),
            layout.overlaps.len()
        );

        self.view_state = Some(*view_state);
        self.canvas = Some(canvas);
        Ok(self.layout.insert(layout))
    }

    /// Whether any input is waiting for the next [`begin_frame`](Self::begin_frame).
    pub fn has_pending_input(&self) -> bool {
        self.pending_view_state.is_pending()
            || self.pending_canvas.is_pending()
            || self.pending_descriptors.is_pending()
    }

    /// Submissions discarded because a newer one arrived before the frame began.
    pub fn superseded_inputs(&self) -> u64 {
        self.pending_view_state.superseded_count()
            + self.pending_canvas.superseded_count()
            + self.pending_descriptors.superseded_count()
    }

    pub fn submit_view_state(&mut self, view_state: ViewState) {
        if self.pending_view_state.submit(view_state) {
            trace!("superseded pending view state");
        }
    }

    pub fn submit_canvas(&mut self, canvas: CanvasSize) {
        if self.pending_canvas.submit(canvas) {
            trace!("superseded pending canvas size");
        }
    }

    pub fn submit_descriptors(&mut self, descriptors: Vec<ViewDescriptor>) {
        if self.pending_descriptors.submit(descriptors) {
            trace!("superseded pending descriptors");
        }
    }

    /// Applies pending inputs and resolves once.
    ///
    /// Returns `Ok(None)` until both a view state and a canvas size are known.
    /// On error the pending view state is dropped; descriptors and canvas
    /// size submitted with it still apply to later frames.
    pub fn begin_frame(&mut self) -> Result<Option<&Layout>, ViewError> {
        if let Some(descriptors) = self.pending_descriptors.take() {
            self.set_descriptors(descriptors)?;
        }
        // The canvas is kept even if the view state below is rejected.
        if let Some(canvas) = self.pending_canvas.take() {
            self.canvas = Some(canvas);
        }
        let view_state = self.pending_view_state.take().or(self.view_state);
        let (Some(view_state), Some(canvas)) = (view_state, self.canvas) else {
            self.view_state = view_state;
            return Ok(None);
        };
        self.resolve(&view_state, canvas).map(Some)
    }

    /// Topmost hit under the canvas pixel, if any.
    pub fn pick<T: HitTester>(&self, x: f64, y: f64, tester: &T) -> Option<PickResult<T::Object>> {
        picking::pick(self.layout.as_ref()?, x, y, tester)
    }

    pub fn pick_all<T: HitTester>(&self, x: f64, y: f64, tester: &T) -> Vec<PickResult<T::Object>> {
        self.layout
            .as_ref()
            .map(|l| picking::pick_all(l, x, y, tester))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::LayoutManager;
    use crate::descriptor::{Extents, Length, ViewDescriptor};
    use crate::error::{ConfigurationError, LayoutError, ViewError};
    use crate::view_state::ViewState;
    use foundation::math::Vec3;
    use foundation::{CanvasSize, PixelRect};
    use pretty_assertions::assert_eq;

    fn pct(p: f64) -> Length {
        Length::Percent(p)
    }

    fn view(id: &str, x: f64, y: f64, w: f64, h: f64) -> ViewDescriptor {
        ViewDescriptor::map(id).with_extents(Extents::new(pct(x), pct(y), pct(w), pct(h)))
    }

    fn state() -> ViewState {
        ViewState::geospatial(2.35, 48.85, 12.0)
    }

    #[test]
    fn side_by_side_views_do_not_overlap() {
        let mut m = LayoutManager::with_descriptors(vec![
            view("left", 0.0, 0.0, 50.0, 100.0),
            view("right", 50.0, 0.0, 50.0, 100.0),
        ])
        .expect("descriptors");
        let layout = m.resolve(&state(), CanvasSize::new(800, 600)).expect("layout");
        assert!(layout.overlaps().is_empty());
        assert_eq!(
            layout.viewport("right").map(|v| v.extents()),
            Some(PixelRect::new(400.0, 0.0, 400.0, 600.0))
        );
    }

    #[test]
    fn inset_overlaps_main() {
        let mut m = LayoutManager::with_descriptors(vec![
            view("main", 0.0, 0.0, 100.0, 100.0),
            view("inset", 70.0, 0.0, 15.0, 100.0),
        ])
        .expect("descriptors");
        let layout = m.resolve(&state(), CanvasSize::new(800, 600)).expect("layout");
        assert_eq!(layout.overlaps(), &[(0, 1)]);
        let top: Vec<_> = layout.viewports_at(600.0, 300.0).map(|e| e.id.as_str()).collect();
        assert_eq!(top, vec!["inset", "main"]);
        let order: Vec<_> = layout.render_order().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["main", "inset"]);
    }

    #[test]
    fn resize_doubles_percentage_extents() {
        let mut m = LayoutManager::with_descriptors(vec![view("v", 25.0, 10.0, 50.0, 40.0)])
            .expect("descriptors");
        let small = m
            .resolve(&state(), CanvasSize::new(800, 600))
            .expect("small")
            .entries()[0]
            .viewport
            .extents();
        let large = m
            .resolve(&state(), CanvasSize::new(1600, 1200))
            .expect("large")
            .entries()[0]
            .viewport
            .extents();
        assert_eq!(large.x, small.x * 2.0);
        assert_eq!(large.y, small.y * 2.0);
        assert_eq!(large.width, small.width * 2.0);
        assert_eq!(large.height, small.height * 2.0);
    }

    #[test]
    fn unchanged_inputs_reuse_viewports() {
        let mut m = LayoutManager::with_descriptors(vec![
            view("main", 0.0, 0.0, 100.0, 100.0),
            view("inset", 70.0, 70.0, 25.0, 25.0),
        ])
        .expect("descriptors");
        let canvas = CanvasSize::new(800, 600);
        let first = m.resolve(&state(), canvas).expect("first").clone();
        assert!(first.entries().iter().all(|e| e.changed));

        let second = m.resolve(&state(), canvas).expect("second");
        assert!(second.entries().iter().all(|e| !e.changed));
        assert!(Arc::ptr_eq(&first.entries()[0].viewport, &second.entries()[0].viewport));

        m.set_descriptors(vec![
            view("main", 0.0, 0.0, 100.0, 100.0),
            view("inset", 5.0, 70.0, 25.0, 25.0),
        ])
        .expect("descriptors");
        let third = m.resolve(&state(), canvas).expect("third");
        let changed: Vec<_> = third.changed().map(|e| e.id.as_str()).collect();
        assert_eq!(changed, vec!["inset"]);
        assert_eq!(m.cache_stats().evictions, 1);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut m = LayoutManager::new();
        let err = m
            .set_descriptors(vec![ViewDescriptor::map("a"), ViewDescriptor::map("a")])
            .unwrap_err();
        assert_eq!(err, LayoutError::DuplicateId("a".into()));
        assert!(m.descriptors().is_empty());
    }

    #[test]
    fn configuration_error_names_the_view() {
        let mut m = LayoutManager::with_descriptors(vec![
            ViewDescriptor::map("map"),
            ViewDescriptor::orbit("model"),
        ])
        .expect("descriptors");
        let err = m
            .resolve(&state(), CanvasSize::new(800, 600))
            .map(|_| ())
            .unwrap_err();
        let ViewError::Configuration { view_id, source } = err else {
            panic!("expected configuration error, got {err:?}");
        };
        assert_eq!(view_id, "model");
        assert!(matches!(source, ConfigurationError::ViewStateMismatch { .. }));
        assert!(m.layout().is_none());
    }

    #[test]
    fn begin_frame_uses_latest_submissions() {
        let mut m = LayoutManager::with_descriptors(vec![ViewDescriptor::orbit("model")])
            .expect("descriptors");
        assert!(m.begin_frame().expect("empty").is_none());

        m.submit_canvas(CanvasSize::new(640, 480));
        m.submit_view_state(ViewState::orbit(Vec3::ZERO, 10.0, 0.0, 0.0));
        m.submit_view_state(ViewState::orbit(Vec3::ZERO, 20.0, 0.0, 0.0));
        m.submit_canvas(CanvasSize::new(800, 600));
        assert!(m.has_pending_input());
        assert_eq!(m.superseded_inputs(), 2);

        let first = {
            let layout = m.begin_frame().expect("frame").expect("layout");
            assert_eq!(layout.canvas(), CanvasSize::new(800, 600));
            layout.frame()
        };
        assert_eq!(m.view_state(), Some(&ViewState::orbit(Vec3::ZERO, 20.0, 0.0, 0.0)));
        assert!(!m.has_pending_input());

        // Nothing new: same snapshot, same viewports, next frame.
        let (second, changed) = {
            let again = m.begin_frame().expect("frame").expect("layout");
            (again.frame(), again.changed().count())
        };
        assert!(second > first);
        assert_eq!(changed, 0);

        // Submitted after the frame began: only visible at the next one.
        m.submit_view_state(ViewState::orbit(Vec3::ZERO, 45.0, 0.0, 0.0));
        assert_eq!(m.view_state(), Some(&ViewState::orbit(Vec3::ZERO, 20.0, 0.0, 0.0)));
        m.begin_frame().expect("frame");
        assert_eq!(m.view_state(), Some(&ViewState::orbit(Vec3::ZERO, 45.0, 0.0, 0.0)));
    }

    #[test]
    fn failed_frame_keeps_the_submitted_canvas() {
        let mut m = LayoutManager::with_descriptors(vec![ViewDescriptor::map("map")])
            .expect("descriptors");
        m.submit_canvas(CanvasSize::new(800, 600));
        m.submit_view_state(ViewState::geospatial(2.35, 48.85, 10.0));
        m.begin_frame().expect("first frame");

        m.submit_canvas(CanvasSize::new(1600, 1200));
        m.submit_view_state(ViewState::orbit(Vec3::ZERO, 30.0, 0.0, 1.0));
        assert!(m.begin_frame().is_err());
        assert_eq!(m.canvas(), Some(CanvasSize::new(1600, 1200)));
        assert_eq!(m.view_state(), Some(&ViewState::geospatial(2.35, 48.85, 10.0)));
        assert_eq!(
            m.layout().map(|l| l.canvas()),
            Some(CanvasSize::new(800, 600))
        );

        m.submit_view_state(ViewState::geospatial(2.35, 48.85, 11.0));
        let layout = m.begin_frame().expect("frame").expect("layout");
        assert_eq!(layout.canvas(), CanvasSize::new(1600, 1200));
        assert_eq!(
            layout.viewport("map").map(|vp| vp.extents()),
            Some(PixelRect::new(0.0, 0.0, 1600.0, 1200.0))
        );
    }

    #[test]
    fn invalid_pending_descriptors_fail_the_frame() {
        let mut m = LayoutManager::new();
        m.submit_descriptors(vec![ViewDescriptor::map("a"), ViewDescriptor::map("a")]);
        assert_eq!(
            m.begin_frame().map(|l| l.is_some()),
            Err(ViewError::Layout(LayoutError::DuplicateId("a".into())))
        );
    }
}
