//! Perspective camera state and matrices.

use crate::util::{Mat4, Vec3};

const OPENGL_TO_WGPU_MATRIX: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

pub fn wgpu_projection(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    // GL clip space (-1..1 depth) remapped to wgpu's 0..1; no Y flip needed.
    OPENGL_TO_WGPU_MATRIX * Mat4::perspective_rh_gl(fov_y, aspect, near, far)
}

/// Where the camera sits, what it looks at and how it projects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical FOV in degrees
    pub fov: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl CameraPose {
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }
}

/// Perspective camera owned by one viewer instance.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical FOV in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
            aspect: 1.0,
        }
    }

    /// Copy position, target and projection from `pose`.
    pub fn apply(&mut self, pose: &CameraPose) {
        self.position = pose.position;
        self.target = pose.target;
        self.fov = pose.fov;
        self.near = pose.near;
        self.far = pose.far;
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position,
            target: self.target,
            fov: self.fov,
            near: self.near,
            far: self.far,
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Get current distance from target
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    /// Up vector for the view matrix. Falls back to +Z when looking straight
    /// up or down, where +Y would be parallel to the view direction.
    pub fn up(&self) -> Vec3 {
        let forward = (self.target - self.position).normalize_or_zero();
        if forward.dot(Vec3::Y).abs() > 0.999 {
            Vec3::Z
        } else {
            Vec3::Y
        }
    }

    /// Get view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up())
    }

    /// Get projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        wgpu_projection(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_proj_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
