//! Calibrated-frame to framebuffer projection.

use contracts::{HudEngineConfig, Vertex};
use nalgebra::{Matrix3, Rotation3, Vector3};

/// Fixed camera mounting: device X/Y/Z map to view Y/Z/X
pub fn view_from_device() -> Matrix3<f32> {
    Matrix3::new(
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, //
        1.0, 0.0, 0.0,
    )
}

/// `view_from_device · device_from_calib` for a roll/pitch/yaw triple (rad)
pub fn view_from_calib(roll: f32, pitch: f32, yaw: f32) -> Matrix3<f32> {
    let device_from_calib = Rotation3::from_euler_angles(roll, pitch, yaw);
    view_from_device() * device_from_calib.matrix()
}

/// Everything needed to project a calibrated-frame point into framebuffer
/// pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionContext {
    view_from_calib: Matrix3<f32>,
    intrinsics: Matrix3<f32>,
    car_space: Matrix3<f32>,
    fb_w: f32,
    fb_h: f32,
    margin: f32,
}

impl ProjectionContext {
    /// Context with no calibration yet; nothing projects as visible until
    /// `set_calibration` is called.
    pub fn new(config: &HudEngineConfig) -> Self {
        let k = config.intrinsics();
        let intrinsics = Matrix3::new(
            k.fx, 0.0, k.cx, //
            0.0, k.fy, k.cy, //
            0.0, 0.0, 1.0,
        );
        let mut ctx = Self {
            view_from_calib: Matrix3::zeros(),
            intrinsics,
            car_space: Matrix3::identity(),
            fb_w: config.display.width as f32,
            fb_h: config.display.height as f32,
            margin: config.display.offscreen_margin,
        };
        ctx.car_space = Self::car_space_transform(config, ctx.fb_w, ctx.fb_h);
        ctx
    }

    /// translate(fb/2 + y_offset) · scale(zoom) · translate(-principal point)
    fn car_space_transform(config: &HudEngineConfig, fb_w: f32, fb_h: f32) -> Matrix3<f32> {
        let k = config.intrinsics();
        let mut zoom = config.display.zoom / k.fx;
        if config.wide_camera {
            zoom *= 0.5;
        }
        let tx = fb_w / 2.0 - zoom * k.cx;
        let ty = fb_h / 2.0 + config.display.y_offset - zoom * k.cy;
        Matrix3::new(
            zoom, 0.0, tx, //
            0.0, zoom, ty, //
            0.0, 0.0, 1.0,
        )
    }

    /// Recompute the calibration rotation
    pub fn set_calibration(&mut self, roll: f32, pitch: f32, yaw: f32) {
        self.view_from_calib = view_from_calib(roll, pitch, yaw);
    }

    /// Re-derive the viewport transform for a resized framebuffer
    pub fn set_framebuffer_size(&mut self, config: &HudEngineConfig, width: u32, height: u32) {
        self.fb_w = width as f32;
        self.fb_h = height as f32;
        self.car_space = Self::car_space_transform(config, self.fb_w, self.fb_h);
    }

    /// Row-major copy of the calibration rotation
    pub fn view_from_calib_rows(&self) -> [[f32; 3]; 3] {
        let m = &self.view_from_calib;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// Project a calibrated-frame point (x forward, y right, z down).
    ///
    /// Returns the framebuffer vertex and whether it lies within the
    /// framebuffer expanded by the off-screen margin. Points at or behind the
    /// image plane are never visible.
    #[inline]
    pub fn project(&self, x: f32, y: f32, z: f32) -> (Vertex, bool) {
        let kep = self.intrinsics * (self.view_from_calib * Vector3::new(x, y, z));
        if kep.z <= f32::EPSILON {
            return (Vertex::default(), false);
        }

        let image = Vector3::new(kep.x / kep.z, kep.y / kep.z, 1.0);
        let out = self.car_space * image;
        let vertex = Vertex::new(out.x, out.y);
        let visible = vertex.x >= -self.margin
            && vertex.x <= self.fb_w + self.margin
            && vertex.y >= -self.margin
            && vertex.y <= self.fb_h + self.margin;
        (vertex, visible)
    }
}
