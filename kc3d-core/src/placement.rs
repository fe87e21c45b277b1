/// Placement rules: where each part sits in the assembled product
///
/// Constants model the physical keyboard being visualized: adjacent keycap
/// centers sit one pitch apart, legend text floats just above the keycap
/// face, and the switch board is recessed behind the caps. All parts are
/// re-centered at the origin from their local bounding box before the slot
/// offset is applied, so model files may be authored anywhere in space.
use nalgebra::Vector3;

use crate::geometry::Aabb;
use crate::transform::{RotationState, Transform};

/// Center-to-center spacing of adjacent keycaps, in model units.
pub const KEYCAP_PITCH: f32 = 18.5;

/// Height of the legend text above the keycap face.
pub const LEGEND_RISE: f32 = 4.925;

/// How far the switch board is recessed behind the keycaps.
pub const BOARD_DROP: f32 = 6.0;

/// The fixed transform a slot applies to its loaded mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub offset: Vector3<f32>,
    pub rotation: RotationState,
    pub scale: f32,
}

impl Placement {
    /// Placement with the given offset and no rotation or scaling.
    pub fn at(offset: Vector3<f32>) -> Self {
        Self {
            offset,
            rotation: RotationState::zero(),
            scale: 1.0,
        }
    }

    /// The node translation that re-centers a mesh with the given local
    /// bounds at the origin and then moves it to this placement's offset.
    pub fn anchor(&self, bounds: &Aabb) -> Vector3<f32> {
        let centered = bounds.center().coords * self.scale;
        if self.rotation.is_zero() {
            self.offset - centered
        } else {
            let rot = Transform::rotation_matrix(&self.rotation);
            self.offset - rot.transform_vector(&centered)
        }
    }
}

/// Lateral center of keycap `index` in a row of `count`, centered on x = 0.
pub fn keycap_offset(index: usize, count: usize) -> f32 {
    (index as f32 - (count.max(1) as f32 - 1.0) / 2.0) * KEYCAP_PITCH
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn keycap_row_is_centered() {
        assert_eq!(keycap_offset(0, 1), 0.0);

        // Two caps straddle the origin one pitch apart.
        assert!((keycap_offset(0, 2) + KEYCAP_PITCH / 2.0).abs() < 1e-6);
        assert!((keycap_offset(1, 2) - KEYCAP_PITCH / 2.0).abs() < 1e-6);

        // Odd counts put the middle cap on the axis.
        assert_eq!(keycap_offset(1, 3), 0.0);
    }

    #[test]
    fn anchor_recenters_then_offsets() {
        let placement = Placement::at(Vector3::new(0.0, 0.0, LEGEND_RISE));
        let bounds = Aabb::new(Point3::new(2.0, 2.0, 2.0), Point3::new(4.0, 4.0, 4.0));

        let anchor = placement.anchor(&bounds);
        assert!((anchor - Vector3::new(-3.0, -3.0, LEGEND_RISE - 3.0)).norm() < 1e-6);
    }

    #[test]
    fn anchor_respects_scale() {
        let mut placement = Placement::at(Vector3::zeros());
        placement.scale = 2.0;
        let bounds = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));

        // Center (1,1,1) scaled by 2 must be pulled back to the origin.
        let anchor = placement.anchor(&bounds);
        assert!((anchor - Vector3::new(-2.0, -2.0, -2.0)).norm() < 1e-6);
    }
}
