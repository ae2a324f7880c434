//! Resolved, immutable viewports.
//!
//! Screen convention: viewport-local logical pixels, origin at the top-left
//! corner of the viewport, y down. Depth is clip-space z after the
//! perspective divide, `0` at the near plane and `1` at the far plane.

use foundation::math::{GeoPoint, Mat4, Vec3};
use foundation::{CanvasSize, PixelRect};

use crate::error::ConfigurationError;
use crate::projection::Invertible;
use crate::resolver::GeoFrame;

/// Rays whose direction is this close to horizontal (relative to their
/// length) are treated as parallel to a z-plane.
const PARALLEL_EPS: f64 = 1e-9;

/// Projected position in viewport-local pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Parameter where the ray meets the plane `z = plane_z`.
    ///
    /// `None` if the ray is parallel to the plane or the plane is behind the
    /// origin.
    pub fn intersect_z(&self, plane_z: f64) -> Option<f64> {
        if self.dir.z.abs() <= PARALLEL_EPS * self.dir.length() {
            return None;
        }
        let t = (plane_z - self.origin.z) / self.dir.z;
        (t.is_finite() && t >= 0.0).then_some(t)
    }
}

/// Scale factors of a geographic viewport at its center pixel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DistanceScales {
    pub units_per_meter: f64,
    pub units_per_pixel: f64,
    pub meters_per_pixel: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    id: String,
    extents: PixelRect,
    visible: Option<PixelRect>,
    canvas: CanvasSize,
    view: Invertible,
    projection: Invertible,
    view_projection: Mat4,
    inv_view_projection: Mat4,
    distance: f64,
    geo: Option<GeoFrame>,
}

impl Viewport {
    pub(crate) fn assemble(
        id: String,
        extents: PixelRect,
        canvas: CanvasSize,
        view: Invertible,
        projection: Invertible,
        distance: f64,
        geo: Option<GeoFrame>,
    ) -> Self {
        let view_projection = projection.matrix.mul(&view.matrix);
        // Composed from the two inverses rather than inverting the product,
        // which loses precision at high zoom.
        let inv_view_projection = view.inverse.mul(&projection.inverse);
        Self {
            id,
            visible: extents.intersection(&canvas.rect()),
            extents,
            canvas,
            view,
            projection,
            view_projection,
            inv_view_projection,
            distance,
            geo,
        }
    }

    /// Viewport from caller-owned matrices; both must be finite and invertible.
    pub fn from_matrices(
        id: impl Into<String>,
        extents: PixelRect,
        canvas: CanvasSize,
        view: Mat4,
        projection: Mat4,
    ) -> Result<Self, ConfigurationError> {
        if extents.is_empty() {
            return Err(ConfigurationError::NonPositiveSize {
                width: extents.width,
                height: extents.height,
            });
        }
        let view = Invertible::new(view, "view")?;
        let projection = Invertible::new(projection, "projection")?;
        Ok(Self::assemble(
            id.into(),
            extents,
            canvas,
            view,
            projection,
            1.0,
            None,
        ))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full resolved rectangle on the canvas; may extend past the canvas.
    pub fn extents(&self) -> PixelRect {
        self.extents
    }

    /// Part of the viewport inside the canvas, `None` if entirely off-canvas.
    pub fn visible(&self) -> Option<PixelRect> {
        self.visible
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn width(&self) -> f64 {
        self.extents.width
    }

    pub fn height(&self) -> f64 {
        self.extents.height
    }

    /// Eye-to-focus distance the projection's clip range is scaled by.
    pub fn focal_distance(&self) -> f64 {
        self.distance
    }

    pub fn geo_frame(&self) -> Option<&GeoFrame> {
        self.geo.as_ref()
    }

    pub fn is_geospatial(&self) -> bool {
        self.geo.is_some()
    }

    pub fn view_matrix(&self) -> &Mat4 {
        &self.view.matrix
    }

    pub fn inverse_view_matrix(&self) -> &Mat4 {
        &self.view.inverse
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection.matrix
    }

    pub fn inverse_projection_matrix(&self) -> &Mat4 {
        &self.projection.inverse
    }

    pub fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_projection
    }

    pub fn inverse_view_projection_matrix(&self) -> &Mat4 {
        &self.inv_view_projection
    }

    /// Camera position in world space.
    pub fn eye(&self) -> Vec3 {
        let c = self.view.inverse.cols[3];
        Vec3::new(c[0], c[1], c[2])
    }

    /// Canvas pixel to viewport-local pixel.
    pub fn to_local(&self, canvas_x: f64, canvas_y: f64) -> (f64, f64) {
        (canvas_x - self.extents.x, canvas_y - self.extents.y)
    }

    pub fn to_canvas(&self, local_x: f64, local_y: f64) -> (f64, f64) {
        (local_x + self.extents.x, local_y + self.extents.y)
    }

    /// Whether a viewport-local pixel lies inside the viewport (half-open).
    pub fn contains_local(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && x < self.extents.width && y >= 0.0 && y < self.extents.height
    }

    /// World point to viewport-local pixels.
    ///
    /// Points on the camera plane have no projection and come back
    /// non-finite; points behind a perspective camera have depth outside
    /// `[0, 1]`.
    pub fn project(&self, p: Vec3) -> ScreenPoint {
        let [x, y, z, w] = self.view_projection.transform_vec4([p.x, p.y, p.z, 1.0]);
        let (nx, ny, nz) = (x / w, y / w, z / w);
        ScreenPoint {
            x: (nx + 1.0) * 0.5 * self.extents.width,
            y: (1.0 - ny) * 0.5 * self.extents.height,
            depth: nz,
        }
    }

    /// `None` when the viewport has no geographic frame.
    pub fn project_geo(&self, geo: GeoPoint) -> Option<ScreenPoint> {
        let frame = self.geo.as_ref()?;
        Some(self.project(frame.to_linear(geo)))
    }

    /// Inverse of [`project`](Self::project).
    pub fn unproject_depth(&self, x: f64, y: f64, depth: f64) -> Vec3 {
        let nx = x / self.extents.width * 2.0 - 1.0;
        let ny = 1.0 - y / self.extents.height * 2.0;
        let [wx, wy, wz, w] = self.inv_view_projection.transform_vec4([nx, ny, depth, 1.0]);
        Vec3::new(wx / w, wy / w, wz / w)
    }

    /// Ray from the near plane to the far plane through a local pixel.
    ///
    /// `dir` spans the whole clip range, so `ray.at(1.0)` is on the far plane.
    pub fn ray(&self, x: f64, y: f64) -> Option<Ray> {
        let near = self.unproject_depth(x, y, 0.0);
        let far = self.unproject_depth(x, y, 1.0);
        let ray = Ray {
            origin: near,
            dir: far - near,
        };
        (near.is_finite() && ray.dir.is_finite()).then_some(ray)
    }

    /// Local pixel to the world point on the plane `z = target_z` (default
    /// `0`, the ground plane).
    pub fn unproject(&self, x: f64, y: f64, target_z: Option<f64>) -> Option<Vec3> {
        let ray = self.ray(x, y)?;
        let t = ray.intersect_z(target_z.unwrap_or(0.0))?;
        Some(ray.at(t))
    }

    /// Local pixel to the geographic point at `altitude` meters (default `0`).
    pub fn unproject_geo(&self, x: f64, y: f64, altitude: Option<f64>) -> Option<GeoPoint> {
        let frame = self.geo.as_ref()?;
        let altitude = altitude.unwrap_or(0.0);
        let p = self.unproject(x, y, Some(altitude * frame.units_per_meter()))?;
        let mut geo = frame.to_geo(p);
        geo.altitude = altitude;
        Some(geo)
    }

    /// Ground-plane footprint of the four viewport corners, clockwise from
    /// top-left. Corners whose ray misses the ground (above the horizon) are
    /// `None`.
    pub fn ground_footprint(&self) -> [Option<Vec3>; 4] {
        let (w, h) = (self.extents.width, self.extents.height);
        [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)].map(|(x, y)| self.unproject(x, y, None))
    }

    /// World units spanned by one pixel on the ground at the viewport center.
    pub fn units_per_pixel(&self) -> Option<f64> {
        let (cx, cy) = (self.extents.width * 0.5, self.extents.height * 0.5);
        let a = self.unproject(cx, cy, None)?;
        let b = self.unproject(cx + 1.0, cy, None)?;
        Some((b - a).length())
    }

    pub fn distance_scales(&self) -> Option<DistanceScales> {
        let frame = self.geo.as_ref()?;
        let units_per_meter = frame.units_per_meter();
        let units_per_pixel = self.units_per_pixel()?;
        Some(DistanceScales {
            units_per_meter,
            units_per_pixel,
            meters_per_pixel: units_per_pixel / units_per_meter,
        })
    }

    pub fn meters_per_pixel(&self) -> Option<f64> {
        self.distance_scales().map(|s| s.meters_per_pixel)
    }

    /// Column-major `f32` view-projection for GPU upload.
    pub fn view_projection_f32(&self) -> [[f32; 4]; 4] {
        self.view_projection.to_f32_cols()
    }
}

#[cfg(test)]
mod tests {
    use super::Viewport;
    use crate::error::ConfigurationError;
    use crate::projection::Invertible;
    use crate::resolver::GeoFrame;
    use foundation::math::web_mercator::lng_lat_to_common;
    use foundation::math::{GeoPoint, Mat4, Vec3};
    use foundation::{CanvasSize, PixelRect};

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "expected {a} ~= {b} (eps={eps})");
    }

    fn assert_vec_close(a: Vec3, b: Vec3, eps: f64) {
        assert!((a - b).length() <= eps, "expected {a:?} ~= {b:?} (eps={eps})");
    }

    /// Perspective camera 10 units above the origin looking down, +Y up on screen.
    fn top_down(extents: PixelRect) -> Viewport {
        let view = Mat4::look_to_rh(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z, Vec3::Y).expect("view");
        let proj = Mat4::perspective_rh_z0(60f64.to_radians(), extents.aspect(), 1.0, 100.0);
        Viewport::from_matrices("top", extents, CanvasSize::new(800, 600), view, proj)
            .expect("viewport")
    }

    #[test]
    fn project_unproject_round_trip() {
        let vp = top_down(PixelRect::new(400.0, 0.0, 400.0, 600.0));
        for p in [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.5, -2.0, 3.0),
            Vec3::new(-4.0, 2.5, -20.0),
        ] {
            let s = vp.project(p);
            let back = vp.unproject_depth(s.x, s.y, s.depth);
            assert_vec_close(back, p, 1e-9);
        }
    }

    #[test]
    fn origin_projects_to_viewport_center() {
        let vp = top_down(PixelRect::new(400.0, 0.0, 400.0, 600.0));
        let s = vp.project(Vec3::ZERO);
        assert_close(s.x, 200.0, 1e-9);
        assert_close(s.y, 300.0, 1e-9);
        assert!(s.depth > 0.0 && s.depth < 1.0);

        // +Y is up on screen, so it moves toward y = 0.
        assert!(vp.project(Vec3::new(0.0, 1.0, 0.0)).y < 300.0);
    }

    #[test]
    fn unproject_hits_requested_plane() {
        let vp = top_down(PixelRect::new(0.0, 0.0, 800.0, 600.0));
        let p = vp.unproject(123.0, 456.0, None).expect("ground hit");
        assert_close(p.z, 0.0, 1e-9);
        let s = vp.project(p);
        assert_close(s.x, 123.0, 1e-6);
        assert_close(s.y, 456.0, 1e-6);

        let q = vp.unproject(400.0, 300.0, Some(4.0)).expect("plane hit");
        assert_vec_close(q, Vec3::new(0.0, 0.0, 4.0), 1e-9);
    }

    #[test]
    fn unproject_parallel_or_behind_is_none() {
        let extents = PixelRect::new(0.0, 0.0, 800.0, 600.0);
        // Horizon camera: center ray runs parallel to z = 0.
        let view = Mat4::look_to_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::Y, Vec3::Z).expect("view");
        let proj = Mat4::perspective_rh_z0(1.0, extents.aspect(), 0.1, 100.0);
        let vp = Viewport::from_matrices("h", extents, CanvasSize::new(800, 600), view, proj)
            .expect("viewport");
        assert_eq!(vp.unproject(400.0, 300.0, None), None);
        // Above the horizon the ground plane is behind the ray.
        assert_eq!(vp.unproject(400.0, 10.0, None), None);
        assert!(vp.unproject(400.0, 590.0, None).is_some());
    }

    #[test]
    fn visible_rect_is_clipped_to_canvas() {
        let vp = top_down(PixelRect::new(700.0, 500.0, 200.0, 200.0));
        assert_eq!(vp.visible(), Some(PixelRect::new(700.0, 500.0, 100.0, 100.0)));
        let off = top_down(PixelRect::new(900.0, 0.0, 100.0, 100.0));
        assert_eq!(off.visible(), None);
    }

    #[test]
    fn local_coordinates() {
        let vp = top_down(PixelRect::new(560.0, 20.0, 200.0, 150.0));
        assert_eq!(vp.to_local(600.0, 30.0), (40.0, 10.0));
        assert_eq!(vp.to_canvas(40.0, 10.0), (600.0, 30.0));
        assert!(vp.contains_local(0.0, 0.0));
        assert!(!vp.contains_local(200.0, 10.0));
    }

    #[test]
    fn eye_and_footprint() {
        let vp = top_down(PixelRect::new(0.0, 0.0, 800.0, 600.0));
        assert_vec_close(vp.eye(), Vec3::new(0.0, 0.0, 10.0), 1e-12);
        let upload = vp.view_projection_f32();
        assert_eq!(upload[3][3], vp.view_projection_matrix().at(3, 3) as f32);
        let corners = vp.ground_footprint();
        assert!(corners.iter().all(Option::is_some));
        let tl = corners[0].expect("corner");
        assert!(tl.x < 0.0 && tl.y > 0.0);
    }

    #[test]
    fn geo_round_trip_through_mercator_frame() {
        let extents = PixelRect::new(0.0, 0.0, 512.0, 512.0);
        let (cx, cy) = lng_lat_to_common(0.0, 0.0);
        let view = Mat4::look_to_rh(Vec3::new(cx, cy, 100.0), -Vec3::Z, Vec3::Y).expect("view");
        let proj = Mat4::orthographic_rh_z0(-256.0, 256.0, -256.0, 256.0, 1.0, 200.0);
        let vp = Viewport::assemble(
            "map".into(),
            extents,
            CanvasSize::new(512, 512),
            Invertible::new(view, "view").expect("view"),
            Invertible::new(proj, "projection").expect("proj"),
            100.0,
            Some(GeoFrame::WebMercator {
                center: GeoPoint::new(0.0, 0.0, 0.0),
            }),
        );
        let s = vp.project_geo(GeoPoint::new(90.0, 0.0, 0.0)).expect("geo");
        assert_close(s.x, 384.0, 1e-9);
        assert_close(s.y, 256.0, 1e-9);

        let g = vp.unproject_geo(s.x, s.y, None).expect("unproject");
        assert_close(g.longitude, 90.0, 1e-9);
        assert_close(g.latitude, 0.0, 1e-9);

        // One common unit per pixel at zoom 0.
        let scales = vp.distance_scales().expect("scales");
        assert_close(scales.units_per_pixel, 1.0, 1e-9);
        assert!(scales.meters_per_pixel > 70_000.0 && scales.meters_per_pixel < 80_000.0);
    }

    #[test]
    fn from_matrices_rejects_singular_input() {
        let rect = PixelRect::new(0.0, 0.0, 100.0, 100.0);
        let canvas = CanvasSize::new(100, 100);
        let zero = Mat4::from_cols([[0.0; 4]; 4]);
        assert_eq!(
            Viewport::from_matrices("v", rect, canvas, zero, Mat4::IDENTITY).map(|_| ()),
            Err(ConfigurationError::NonInvertibleMatrix { matrix: "view" })
        );
        assert_eq!(
            Viewport::from_matrices("v", rect, canvas, Mat4::IDENTITY, zero).map(|_| ()),
            Err(ConfigurationError::NonInvertibleMatrix { matrix: "projection" })
        );
        assert!(Viewport::from_matrices("v", rect, canvas, Mat4::IDENTITY, Mat4::IDENTITY).is_ok());
    }

    #[test]
    fn cartesian_viewport_has_no_geo_mapping() {
        let vp = top_down(PixelRect::new(0.0, 0.0, 800.0, 600.0));
        assert!(vp.project_geo(GeoPoint::new(0.0, 0.0, 0.0)).is_none());
        assert!(vp.unproject_geo(10.0, 10.0, None).is_none());
        assert!(vp.distance_scales().is_none());
    }
}
