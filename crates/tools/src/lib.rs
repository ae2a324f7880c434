//! JSON reports printed by the `viewctl` binary.

use foundation::math::{GeoPoint, Vec3};
use serde_json::{Value, json};
use viewports::hash::StructuralHash;
use viewports::{Hit, HitTester, LayoutManager, SceneConfig, Viewport};

/// Hits any viewport whose pixel ray reaches the ground plane.
///
/// Stands in for a scene: the reported object is the viewport id.
#[derive(Debug, Default, Copy, Clone)]
pub struct GroundHitTester;

impl HitTester for GroundHitTester {
    type Object = String;

    fn hit_test(&self, viewport: &Viewport, x: f64, y: f64) -> Option<Hit<String>> {
        viewport.unproject(x, y, None)?;
        Some(Hit::new(viewport.id().to_string()))
    }
}

/// Layout manager for `scene`, already resolved once.
pub fn open_scene(scene: &SceneConfig) -> Result<LayoutManager, Box<dyn std::error::Error>> {
    let mut manager = scene.layout_manager()?;
    manager.resolve(&scene.view_state, scene.canvas)?;
    Ok(manager)
}

pub fn layout_report(manager: &LayoutManager) -> Option<Value> {
    let layout = manager.layout()?;
    let views: Vec<Value> = manager
        .descriptors()
        .iter()
        .zip(layout.entries())
        .map(|(d, e)| {
            let vp = &e.viewport;
            json!({
                "id": e.id,
                "descriptor_hash": blake3::Hash::from(d.structural_hash()).to_hex().to_string(),
                "extents": vp.extents(),
                "visible": vp.visible(),
                "focal_distance": vp.focal_distance(),
                "geospatial": vp.is_geospatial(),
                "meters_per_pixel": vp.meters_per_pixel(),
                "view_projection": vp.view_projection_matrix().cols,
            })
        })
        .collect();
    let overlaps: Vec<Value> = layout
        .overlaps()
        .iter()
        .map(|&(i, j)| json!([layout.entries()[i].id, layout.entries()[j].id]))
        .collect();
    Some(json!({
        "canvas": layout.canvas(),
        "frame": layout.frame().index,
        "views": views,
        "overlaps": overlaps,
    }))
}

pub fn project_report(viewport: &Viewport, world: Vec3) -> Value {
    let s = viewport.project(world);
    let (cx, cy) = viewport.to_canvas(s.x, s.y);
    json!({
        "view": viewport.id(),
        "local": [s.x, s.y],
        "canvas": [cx, cy],
        "depth": s.depth,
        "inside": viewport.contains_local(s.x, s.y) && (0.0..=1.0).contains(&s.depth),
    })
}

pub fn project_geo_report(viewport: &Viewport, geo: GeoPoint) -> Option<Value> {
    let frame = viewport.geo_frame()?;
    Some(project_report(viewport, frame.to_linear(geo)))
}

/// `x`/`y` are canvas pixels; `z` is the target plane (world units).
pub fn unproject_report(viewport: &Viewport, x: f64, y: f64, z: Option<f64>) -> Value {
    let (lx, ly) = viewport.to_local(x, y);
    let world = viewport.unproject(lx, ly, z);
    let geo = world.zip(viewport.geo_frame()).map(|(p, f)| f.to_geo(p));
    json!({
        "view": viewport.id(),
        "local": [lx, ly],
        "world": world,
        "geo": geo,
    })
}

pub fn pick_report(manager: &LayoutManager, x: f64, y: f64, all: bool) -> Value {
    let tester = GroundHitTester;
    let results = if all {
        manager.pick_all(x, y, &tester)
    } else {
        manager.pick(x, y, &tester).into_iter().collect()
    };
    let hits: Vec<Value> = results
        .into_iter()
        .map(|r| {
            json!({
                "view": r.object,
                "world": r.world,
                "geo": r.geo,
            })
        })
        .collect();
    json!({ "x": x, "y": y, "hits": hits })
}
