//! Structural hashing for cache keys.
//!
//! Floats go through `canonical_f64_bytes`, so `-0.0`/`0.0` and all NaN
//! payloads hash alike. Every enum writes a variant tag before its fields and
//! every optional value writes a presence byte.

use foundation::CanvasSize;
use foundation::math::{Mat4, Vec3, canonical_f64_bytes};

use crate::descriptor::{
    Extents, Length, OverflowPolicy, ProjectionMode, ProjectionParams, ViewDescriptor, ViewFrame,
};
use crate::view_state::{GeoAnchor, ViewState};

/// 32-byte blake3 digest.
pub type Digest = [u8; 32];

pub trait StructuralHash {
    fn hash_into(&self, h: &mut blake3::Hasher);

    fn structural_hash(&self) -> Digest {
        let mut h = blake3::Hasher::new();
        self.hash_into(&mut h);
        *h.finalize().as_bytes()
    }
}

impl StructuralHash for f64 {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        h.update(&canonical_f64_bytes(*self));
    }
}

impl StructuralHash for u32 {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        h.update(&self.to_le_bytes());
    }
}

impl StructuralHash for str {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        h.update(&(self.len() as u64).to_le_bytes());
        h.update(self.as_bytes());
    }
}

impl<T: StructuralHash> StructuralHash for Option<T> {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        match self {
            None => {
                h.update(&[0]);
            }
            Some(v) => {
                h.update(&[1]);
                v.hash_into(h);
            }
        }
    }
}

impl StructuralHash for Vec3 {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        self.x.hash_into(h);
        self.y.hash_into(h);
        self.z.hash_into(h);
    }
}

impl StructuralHash for Mat4 {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        for v in self.to_cols_array() {
            v.hash_into(h);
        }
    }
}

impl StructuralHash for CanvasSize {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        self.width.hash_into(h);
        self.height.hash_into(h);
    }
}

impl StructuralHash for Length {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        match self {
            Length::Pixels(px) => {
                h.update(&[0]);
                px.hash_into(h);
            }
            Length::Percent(p) => {
                h.update(&[1]);
                p.hash_into(h);
            }
        }
    }
}

impl StructuralHash for Extents {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        self.x.hash_into(h);
        self.y.hash_into(h);
        self.width.hash_into(h);
        self.height.hash_into(h);
    }
}

impl StructuralHash for ProjectionParams {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        self.fovy.hash_into(h);
        self.near.hash_into(h);
        self.far.hash_into(h);
        self.left.hash_into(h);
        self.right.hash_into(h);
        self.top.hash_into(h);
        self.bottom.hash_into(h);
        self.matrix.hash_into(h);
    }
}

impl StructuralHash for ViewDescriptor {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        self.id.as_str().hash_into(h);
        self.extents.hash_into(h);
        h.update(&[match self.frame {
            ViewFrame::Geospatial => 0,
            ViewFrame::Cartesian => 1,
        }]);
        h.update(&[match self.projection {
            ProjectionMode::Perspective => 0,
            ProjectionMode::Orthographic => 1,
            ProjectionMode::ExplicitOrtho => 2,
            ProjectionMode::External => 3,
        }]);
        self.params.hash_into(h);
        h.update(&[match self.overflow {
            OverflowPolicy::Clip => 0,
            OverflowPolicy::Fail => 1,
        }]);
    }
}

impl StructuralHash for GeoAnchor {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        self.longitude.hash_into(h);
        self.latitude.hash_into(h);
        self.zoom.hash_into(h);
    }
}

impl StructuralHash for ViewState {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        match self {
            ViewState::Geospatial(s) => {
                h.update(&[0]);
                s.longitude.hash_into(h);
                s.latitude.hash_into(h);
                s.zoom.hash_into(h);
                s.pitch.hash_into(h);
                s.bearing.hash_into(h);
            }
            ViewState::Positional(s) => {
                h.update(&[1]);
                s.position.hash_into(h);
                s.direction.hash_into(h);
                s.up.hash_into(h);
            }
            ViewState::GeoPositional(s) => {
                h.update(&[2]);
                s.position.hash_into(h);
                s.direction.hash_into(h);
                s.up.hash_into(h);
                s.anchor.hash_into(h);
            }
            ViewState::Orbit(s) => {
                h.update(&[3]);
                s.target.hash_into(h);
                s.rotation_x.hash_into(h);
                s.rotation_y.hash_into(h);
                s.zoom.hash_into(h);
            }
            ViewState::External(s) => {
                h.update(&[4]);
                s.view_matrix.hash_into(h);
                s.projection_matrix.hash_into(h);
            }
        }
    }
}
