// Copyright @yucwang 2026

use crate::core::volume::Volume;
use crate::math::constants::{Float, Quaternionf, Vector3f, DEG_TO_RAD};

/// Edge length of the cube the volume is drawn into, in local units.
pub const VOLUME_CUBE_SIZE: Float = 5.0;
/// Slice quads are slightly larger than the cube so their border stays visible.
pub const SLICE_PLANE_EXTENT: Float = 5.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SliceAxis {
    Axial,
    Coronal,
    Sagittal,
}

impl SliceAxis {
    pub const ALL: [SliceAxis; 3] = [SliceAxis::Axial, SliceAxis::Coronal, SliceAxis::Sagittal];

    pub fn name(&self) -> &'static str {
        match self {
            SliceAxis::Axial => "axial",
            SliceAxis::Coronal => "coronal",
            SliceAxis::Sagittal => "sagittal",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "axial" => Some(SliceAxis::Axial),
            "coronal" => Some(SliceAxis::Coronal),
            "sagittal" => Some(SliceAxis::Sagittal),
            _ => None,
        }
    }

    /// Local direction the plane moves along as its position changes.
    pub fn direction(&self) -> Vector3f {
        match self {
            SliceAxis::Axial => Vector3f::new(0.0, 1.0, 0.0),
            SliceAxis::Coronal => Vector3f::new(0.0, 0.0, 1.0),
            SliceAxis::Sagittal => Vector3f::new(1.0, 0.0, 0.0),
        }
    }

    /// Plane orientation as Euler angles in degrees.
    pub fn euler_degrees(&self) -> Vector3f {
        match self {
            SliceAxis::Axial => Vector3f::new(90.0, 0.0, 0.0),
            SliceAxis::Coronal => Vector3f::new(0.0, 0.0, 0.0),
            SliceAxis::Sagittal => Vector3f::new(0.0, 90.0, 0.0),
        }
    }

    /// Texture axis the slice shader samples across (0 = x, 1 = y, 2 = z).
    pub fn texture_axis(&self) -> usize {
        match self {
            SliceAxis::Axial => 2,
            SliceAxis::Coronal => 1,
            SliceAxis::Sagittal => 0,
        }
    }
}

/// Geometry and shader inputs for one cut-plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlicePlane {
    pub axis: SliceAxis,
    pub visible: bool,
    /// Normalized position along the axis, `[0, 1]`.
    pub position: Float,
    pub local_position: Vector3f,
    pub normal: Vector3f,
    pub orientation: Quaternionf,
    pub extent: Float,
    pub texture_axis: usize,
}

impl SlicePlane {
    pub fn new(axis: SliceAxis, position: Float, visible: bool) -> Self {
        let euler = axis.euler_degrees() * DEG_TO_RAD;
        Self {
            axis,
            visible,
            position,
            local_position: axis.direction() * (position - 0.5) * VOLUME_CUBE_SIZE,
            normal: axis.direction(),
            orientation: Quaternionf::from_euler_angles(euler.x, euler.y, euler.z),
            extent: SLICE_PLANE_EXTENT,
            texture_axis: axis.texture_axis(),
        }
    }
}

/// Row-major 2D image of a cut through a volume.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<Float>,
}

impl SliceImage {
    pub fn get(&self, u: usize, v: usize) -> Float {
        self.data[u + v * self.width]
    }

    /// 8-bit grayscale, values clamped to `[0, 1]` first.
    pub fn to_u8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }
}

fn grid_coord(i: usize, n: usize) -> Float {
    if n > 1 {
        i as Float / (n - 1) as Float
    } else {
        0.0
    }
}

/// Sample the plane at `position` along `axis` at the volume's own resolution.
///
/// Axial images span (x, y), coronal (x, z), sagittal (y, z).
pub fn extract_slice(volume: &dyn Volume, axis: SliceAxis, position: Float) -> SliceImage {
    let dims = volume.dimensions();
    let t = position.clamp(0.0, 1.0);
    let (width, height) = match axis {
        SliceAxis::Axial => (dims.width, dims.height),
        SliceAxis::Coronal => (dims.width, dims.depth),
        SliceAxis::Sagittal => (dims.height, dims.depth),
    };

    let mut data = Vec::with_capacity(width * height);
    for v in 0..height {
        for u in 0..width {
            let (a, b) = (grid_coord(u, width), grid_coord(v, height));
            let p = match axis {
                SliceAxis::Axial => Vector3f::new(a, b, t),
                SliceAxis::Coronal => Vector3f::new(a, t, b),
                SliceAxis::Sagittal => Vector3f::new(t, a, b),
            };
            data.push(volume.eval(p));
        }
    }
    SliceImage { width, height, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volumes::scalar_field::{Dimensions, ScalarField};

    fn z_ramp() -> ScalarField {
        let dims = Dimensions::new(4, 3, 5);
        let mut field = ScalarField::new(dims).unwrap();
        for z in 0..5 {
            for y in 0..3 {
                for x in 0..4 {
                    field.set(x, y, z, z as Float * 0.25).unwrap();
                }
            }
        }
        field
    }

    #[test]
    fn plane_positions_follow_slider() {
        let plane = SlicePlane::new(SliceAxis::Axial, 1.0, true);
        assert_eq!(plane.local_position, Vector3f::new(0.0, 2.5, 0.0));
        assert_eq!(plane.texture_axis, 2);

        let plane = SlicePlane::new(SliceAxis::Sagittal, 0.0, true);
        assert_eq!(plane.local_position, Vector3f::new(-2.5, 0.0, 0.0));
        assert_eq!(plane.texture_axis, 0);

        let plane = SlicePlane::new(SliceAxis::Coronal, 0.5, false);
        assert_eq!(plane.local_position, Vector3f::zeros());
        assert!(!plane.visible);
    }

    #[test]
    fn axial_plane_is_rotated_flat() {
        let plane = SlicePlane::new(SliceAxis::Axial, 0.5, true);
        let n = plane.orientation * Vector3f::new(0.0, 0.0, 1.0);
        assert!(n.y.abs() > 0.999);
    }

    #[test]
    fn axial_slice_reads_one_depth() {
        let field = z_ramp();
        let image = extract_slice(&field, SliceAxis::Axial, 0.5);
        assert_eq!((image.width, image.height), (4, 3));
        assert!(image.data.iter().all(|v| (v - 0.5).abs() < 1e-5));
    }

    #[test]
    fn coronal_slice_spans_depth() {
        let field = z_ramp();
        let image = extract_slice(&field, SliceAxis::Coronal, 0.0);
        assert_eq!((image.width, image.height), (4, 5));
        assert!(image.get(0, 0).abs() < 1e-5);
        assert!((image.get(3, 4) - 1.0).abs() < 1e-5);
        assert_eq!(image.to_u8()[4 * 4], 255);
    }

    #[test]
    fn axis_names_round_trip() {
        for axis in SliceAxis::ALL.iter() {
            assert_eq!(SliceAxis::from_name(axis.name()), Some(*axis));
        }
        assert_eq!(SliceAxis::from_name("oblique"), None);
    }
}
