//! View-plane coordinate frames
//!
//! A `ViewFrame` wraps a drawing view's crop-box transform and converts
//! between 3D model coordinates and the 2D view-plane system the layout
//! policies operate in (origin at the crop box, x = right, y = up).

use serde::{Deserialize, Serialize};

use crate::geometry::{Point2, Point3, Transform};

/// Opaque handle to a drawing view owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(pub u64);

/// A view's crop-box reference frame, captured once per layout operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewFrame {
    /// Crop-box transform: view-plane coordinates to model coordinates
    pub transform: Transform,
    /// Whether the view has an active crop box (required by Arrange)
    pub crop_active: bool,
    /// Crop box minimum corner, in view-plane coordinates
    pub crop_min: Point3,
    /// Crop box maximum corner, in view-plane coordinates
    pub crop_max: Point3,
}

impl ViewFrame {
    /// Map a model-space point into view-plane coordinates
    pub fn to_view(&self, p: Point3) -> Point3 {
        self.transform.invert_point(p)
    }

    /// Map a view-plane point back into model space
    pub fn to_model(&self, p: Point3) -> Point3 {
        self.transform.apply_point(p)
    }

    /// Map a view-plane displacement vector into model space
    pub fn vector_to_model(&self, v: Point3) -> Point3 {
        self.transform.apply_vector(v)
    }

    /// Horizontal center of the crop box, in view-plane coordinates.
    ///
    /// Arrange classifies tags to the left or right margin by comparing
    /// their leader end against this line.
    pub fn horizontal_center(&self) -> f64 {
        (self.crop_min.x + self.crop_max.x) / 2.0
    }

    /// Crop box height in view-plane units
    pub fn crop_height(&self) -> f64 {
        self.crop_max.y - self.crop_min.y
    }

    /// Project a model-space point onto the view plane (dropping depth)
    pub fn project(&self, p: Point3) -> Point2 {
        self.to_view(p).to_2d()
    }
}

impl Default for ViewFrame {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            crop_active: false,
            crop_min: Point3::default(),
            crop_max: Point3::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotated_frame() -> ViewFrame {
        // A plan view rotated 90 degrees: view-x points along model-y
        ViewFrame {
            transform: Transform {
                origin: Point3::new(50.0, 50.0, 0.0),
                basis_x: Point3::new(0.0, 1.0, 0.0),
                basis_y: Point3::new(-1.0, 0.0, 0.0),
                basis_z: Point3::new(0.0, 0.0, 1.0),
            },
            crop_active: true,
            crop_min: Point3::new(-20.0, -10.0, 0.0),
            crop_max: Point3::new(20.0, 10.0, 0.0),
        }
    }

    #[test]
    fn test_to_view_roundtrip() {
        let frame = rotated_frame();
        let p = Point3::new(12.0, 34.0, 0.0);
        let back = frame.to_model(frame.to_view(p));
        assert!((back - p).is_zero(1e-12));
    }

    #[test]
    fn test_view_axes() {
        let frame = rotated_frame();
        // One unit along view-x is one unit along model-y
        let p = frame.to_model(Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(50.0, 51.0, 0.0)).is_zero(1e-12));
    }

    #[test]
    fn test_horizontal_center() {
        let frame = rotated_frame();
        assert_eq!(frame.horizontal_center(), 0.0);
        assert_eq!(frame.crop_height(), 20.0);
    }
}
