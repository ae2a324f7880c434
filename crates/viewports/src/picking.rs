//! Picking across overlapping viewports.

use foundation::math::{GeoPoint, Vec3};
use tracing::trace;

use crate::layout::Layout;
use crate::viewport::Viewport;

/// What a hit tester reports for one viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<O> {
    pub object: O,
    /// Primitive index within the object, if meaningful.
    pub index: Option<usize>,
    /// Depth of the hit in `[0, 1]`; without it the world position is taken
    /// from the ground plane.
    pub depth: Option<f64>,
}

impl<O> Hit<O> {
    pub fn new(object: O) -> Self {
        Self {
            object,
            index: None,
            depth: None,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_depth(mut self, depth: f64) -> Self {
        self.depth = Some(depth);
        self
    }
}

/// Scene-side hit testing for a single viewport.
///
/// `x`/`y` are viewport-local pixels.
pub trait HitTester {
    type Object;

    fn hit_test(&self, viewport: &Viewport, x: f64, y: f64) -> Option<Hit<Self::Object>>;
}

impl<O, F> HitTester for F
where
    F: Fn(&Viewport, f64, f64) -> Option<Hit<O>>,
{
    type Object = O;

    fn hit_test(&self, viewport: &Viewport, x: f64, y: f64) -> Option<Hit<O>> {
        self(viewport, x, y)
    }
}

/// Result of a pick, in the coordinates of the viewport that produced it.
///
/// The producing viewport's id is not recorded; callers that need it can
/// match `(x, y)` against [`Layout::viewports_at`].
#[derive(Debug, Clone, PartialEq)]
pub struct PickResult<O> {
    /// Canvas pixel that was queried.
    pub x: f64,
    pub y: f64,
    /// `None` when the hit had no depth and the pixel's ray misses the ground.
    pub world: Option<Vec3>,
    pub geo: Option<GeoPoint>,
    pub object: O,
    pub index: Option<usize>,
}

fn resolve_hit<O>(viewport: &Viewport, x: f64, y: f64, lx: f64, ly: f64, hit: Hit<O>) -> PickResult<O> {
    let world = match hit.depth {
        Some(depth) => Some(viewport.unproject_depth(lx, ly, depth)),
        None => viewport.unproject(lx, ly, None),
    };
    let geo = world.zip(viewport.geo_frame()).map(|(p, f)| f.to_geo(p));
    PickResult {
        x,
        y,
        world,
        geo,
        object: hit.object,
        index: hit.index,
    }
}

/// Topmost hit under the canvas pixel `(x, y)`.
///
/// Ordering contract:
/// - Only viewports whose visible rectangle contains the pixel are tested.
/// - They are tested topmost first (reverse descriptor order); the first
///   viewport that reports a hit wins even if a lower one would report a
///   nearer object.
pub fn pick<T: HitTester + ?Sized>(layout: &Layout, x: f64, y: f64, tester: &T) -> Option<PickResult<T::Object>> {
    let mut tested = 0usize;
    for entry in layout.viewports_at(x, y) {
        tested += 1;
        let (lx, ly) = entry.viewport.to_local(x, y);
        if let Some(hit) = tester.hit_test(&entry.viewport, lx, ly) {
            trace!("pick ({x}, {y}) hit in {} after {tested} viewports", entry.id);
            return Some(resolve_hit(&entry.viewport, x, y, lx, ly, hit));
        }
    }
    trace!("pick ({x}, {y}) missed {tested} viewports");
    None
}

/// Every hit under the pixel, topmost viewport first.
pub fn pick_all<T: HitTester + ?Sized>(layout: &Layout, x: f64, y: f64, tester: &T) -> Vec<PickResult<T::Object>> {
    layout
        .viewports_at(x, y)
        .filter_map(|entry| {
            let (lx, ly) = entry.viewport.to_local(x, y);
            let hit = tester.hit_test(&entry.viewport, lx, ly)?;
            Some(resolve_hit(&entry.viewport, x, y, lx, ly, hit))
        })
        .collect()
}
