//! Perspective camera for the Earth scene.

use glam::{Mat4, Vec3};

/// A look-at perspective camera producing reverse-Z projection matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
}

impl Camera {
    /// Camera `distance` units out on +Z, looking at the origin.
    pub fn looking_at_origin(fov_y_degrees: f32, aspect_ratio: f32, near: f32, far: f32, distance: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, distance),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: fov_y_degrees.to_radians(),
            aspect_ratio,
            near,
            far,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Reverse-Z: the near plane maps to depth 1, the far plane to 0.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        self.aspect_ratio = width / height.max(1.0);
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::looking_at_origin(75.0, 16.0 / 9.0, 0.1, 1000.0, 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_default_camera_looks_down_neg_z() {
        let camera = Camera::default();
        let forward = camera.forward();
        assert!(forward.x.abs() < 1e-6);
        assert!(forward.y.abs() < 1e-6);
        assert!((forward.z + 1.0).abs() < 1e-6);
        assert!((camera.fov_y - 75.0_f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_reverse_z_depth_range() {
        let camera = Camera::default();
        let vp = camera.view_projection_matrix();

        // A point just past the near plane lands near depth 1.
        let near = vp * Vec4::new(0.0, 0.0, 2.0 - 0.1 - 1e-3, 1.0);
        let near_depth = near.z / near.w;
        assert!(near_depth > 0.9 && near_depth <= 1.0, "near depth {near_depth}");

        // A point near the far plane lands near depth 0.
        let far = vp * Vec4::new(0.0, 0.0, 2.0 - 999.0, 1.0);
        let far_depth = far.z / far.w;
        assert!((0.0..0.01).contains(&far_depth), "far depth {far_depth}");
    }

    #[test]
    fn test_origin_projects_to_screen_center() {
        let camera = Camera::default();
        let clip = camera.view_projection_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-6);
        assert!((clip.y / clip.w).abs() < 1e-6);
    }

    #[test]
    fn test_set_aspect_ratio() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(1920.0, 1080.0);
        assert!((camera.aspect_ratio - 1920.0 / 1080.0).abs() < 1e-6);
        camera.set_aspect_ratio(800.0, 0.0);
        assert!(camera.aspect_ratio.is_finite());
    }
}
