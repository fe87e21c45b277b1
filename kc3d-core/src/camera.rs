/// Camera, projection, and orbit-control state
use nalgebra::{Matrix4, Point3, Vector3};

use crate::geometry::Aabb;

/// Viewing distance used until the first part finishes loading.
pub const DEFAULT_ORBIT_RADIUS: f32 = 25.0;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Camera configuration for 3D rendering
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, DEFAULT_ORBIT_RADIUS),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            aspect: width as f32 / height as f32,
            near: 0.1,
            far: 1000.0,
            mode: ProjectionMode::Perspective,
        }
    }

    /// Resize events touch only the camera and the renderer, never scene
    /// state.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = (self.position - self.target).norm();
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Project a world-space point to screen space, returning
    /// `(x, y, depth)` or `None` when the point falls outside the frustum.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let vp = self.projection_matrix() * self.view_matrix();
        let h = vp * point.to_homogeneous();

        if h.w <= 1e-6 {
            return None; // behind the camera
        }

        let ndc_x = h.x / h.w;
        let ndc_y = h.y / h.w;
        let depth = h.z / h.w;

        if !(-1.0..=1.0).contains(&ndc_x) || !(-1.0..=1.0).contains(&ndc_y) {
            return None;
        }

        let screen_x = (ndc_x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc_y) * 0.5 * height as f32;

        Some((screen_x, screen_y, depth))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Spherical orbit state driven by drag/scroll input.
///
/// Rotation input accumulates into a pending delta that damping bleeds into
/// the angles over subsequent frames; auto-rotate advances the azimuth at a
/// turns-per-minute rate. `step` runs once per frame before the scene is
/// drawn.
pub struct OrbitState {
    pub center: Point3<f32>,
    pub radius: f32,
    /// Azimuth angle around the up axis.
    pub theta: f32,
    /// Polar angle, clamped away from the poles.
    pub phi: f32,

    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub damping_factor: f32,
    pub enable_damping: bool,
    pub auto_rotate: bool,
    /// 1.0 = one full turn per 60 seconds.
    pub auto_rotate_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    rotate_delta: (f32, f32),
}

impl OrbitState {
    pub fn new(center: Point3<f32>, radius: f32) -> Self {
        Self {
            center,
            radius,
            theta: 0.0,
            phi: std::f32::consts::FRAC_PI_2,
            rotate_speed: 0.5,
            zoom_speed: 0.05,
            damping_factor: 0.1,
            enable_damping: true,
            auto_rotate: true,
            auto_rotate_speed: 0.75,
            min_distance: 2.0,
            max_distance: 400.0,
            rotate_delta: (0.0, 0.0),
        }
    }

    /// Re-center the orbit on an assembled product's bounds.
    pub fn frame(&mut self, bounds: &Aabb) {
        self.center = bounds.center();
        let extent = bounds.size().norm();
        if extent > 1e-3 {
            self.radius = (extent * 1.4).clamp(self.min_distance, self.max_distance);
        }
    }

    /// Queue a rotation from drag or key input (radians, pre-damping).
    pub fn nudge(&mut self, d_theta: f32, d_phi: f32) {
        self.rotate_delta.0 += d_theta * self.rotate_speed;
        self.rotate_delta.1 += d_phi * self.rotate_speed;
    }

    /// Zoom by scroll steps; positive steps move the camera closer.
    pub fn zoom(&mut self, steps: f32) {
        let scale = (1.0 - self.zoom_speed).powf(steps.abs());
        if steps > 0.0 {
            self.radius *= scale;
        } else {
            self.radius /= scale;
        }
        self.radius = self.radius.clamp(self.min_distance, self.max_distance);
    }

    /// Advance damping and auto-rotate by one frame of `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        if self.auto_rotate {
            let turn = std::f32::consts::TAU / 60.0;
            self.theta += turn * self.auto_rotate_speed * dt;
        }

        if self.enable_damping {
            let target_fps = 60.0;
            let retention = (1.0 - self.damping_factor).powf(dt * target_fps);
            self.theta += self.rotate_delta.0 * (1.0 - retention);
            self.phi += self.rotate_delta.1 * (1.0 - retention);
            self.rotate_delta.0 *= retention;
            self.rotate_delta.1 *= retention;
        } else {
            self.theta += self.rotate_delta.0;
            self.phi += self.rotate_delta.1;
            self.rotate_delta = (0.0, 0.0);
        }

        const EPS: f32 = 1e-4;
        self.phi = self.phi.clamp(EPS, std::f32::consts::PI - EPS);
    }

    /// Eye position for the current spherical coordinates.
    pub fn eye(&self) -> Point3<f32> {
        let dir = Vector3::new(
            self.phi.sin() * self.theta.sin(),
            self.phi.cos(),
            self.phi.sin() * self.theta.cos(),
        );
        self.center + dir * self.radius
    }

    /// Write the orbit pose into a camera.
    pub fn apply_to(&self, camera: &mut Camera) {
        camera.position = self.eye();
        camera.target = self.center;
    }
}
