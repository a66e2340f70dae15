//! Coordinate mapping between camera, depth, and color spaces
//!
//! The device exposes a calibration-backed mapper once it is open. The core
//! treats the mapper as an opaque capability: consumers use it to project
//! tracked joints or depth pixels into color space, but the calibration math
//! behind it belongs to the device implementation.

/// A 3-D point in camera space (meters, origin at the sensor)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraSpacePoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl CameraSpacePoint {
    /// Create a new camera-space point
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A 2-D pixel position in depth space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepthSpacePoint {
    pub x: f32,
    pub y: f32,
}

impl DepthSpacePoint {
    /// Create a new depth-space point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A 2-D pixel position in color space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorSpacePoint {
    pub x: f32,
    pub y: f32,
}

impl ColorSpacePoint {
    /// Create a new color-space point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Maps points between the device's coordinate spaces
///
/// Implementations are provided by the device; the mapper becomes available
/// from the session once the device is open.
pub trait CoordinateMapper: Send + Sync {
    /// Project a 3-D camera-space point onto the color image
    fn camera_to_color(&self, point: CameraSpacePoint) -> ColorSpacePoint;

    /// Project a depth pixel plus its range sample onto the color image
    fn depth_to_color(&self, point: DepthSpacePoint, depth_mm: u16) -> ColorSpacePoint;
}

/// Pinhole projection mapper used by the synthetic device
///
/// Models coaxial depth and color cameras: camera-space points project
/// through a single focal length, depth pixels scale by the resolution ratio.
/// Real devices replace this with factory calibration data.
#[derive(Debug, Clone)]
pub struct PinholeMapper {
    depth_width: f32,
    depth_height: f32,
    color_width: f32,
    color_height: f32,
    focal_px: f32,
}

impl PinholeMapper {
    /// Create a mapper for the given depth and color resolutions
    pub fn new(depth: (u32, u32), color: (u32, u32), focal_px: f32) -> Self {
        Self {
            depth_width: depth.0 as f32,
            depth_height: depth.1 as f32,
            color_width: color.0 as f32,
            color_height: color.1 as f32,
            focal_px,
        }
    }
}

impl CoordinateMapper for PinholeMapper {
    fn camera_to_color(&self, point: CameraSpacePoint) -> ColorSpacePoint {
        // Points at or behind the image plane project to the frame center.
        let z = point.z.max(f32::EPSILON);

        ColorSpacePoint::new(
            self.color_width / 2.0 + self.focal_px * (point.x / z),
            self.color_height / 2.0 - self.focal_px * (point.y / z),
        )
    }

    fn depth_to_color(&self, point: DepthSpacePoint, _depth_mm: u16) -> ColorSpacePoint {
        ColorSpacePoint::new(
            point.x * (self.color_width / self.depth_width),
            point.y * (self.color_height / self.depth_height),
        )
    }
}
