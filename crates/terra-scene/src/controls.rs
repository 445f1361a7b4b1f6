//! Damped orbit controls: drag to rotate around the planet, scroll to zoom.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

const POLE_EPSILON: f32 = 1e-4;

/// Orbits a camera around `target` on a sphere.
///
/// Input accumulates angular velocity; each [`update`](Self::update) applies a
/// `damping_factor` share of it and decays the rest, so motion eases out.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    /// Multiplier on drag distance.
    pub rotate_speed: f32,
    /// Share of the pending rotation applied per update, in `(0, 1]`.
    pub damping_factor: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    radius: f32,
    /// Azimuth around +Y, 0 on +Z.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl OrbitControls {
    /// Controls for a camera at `position` looking at `target`.
    pub fn new(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let radius = offset.length().max(f32::EPSILON);
        Self {
            target,
            rotate_speed: 0.5,
            damping_factor: 0.05,
            zoom_speed: 1.0,
            min_distance: 1.2,
            max_distance: 20.0,
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    /// Rotate by a pointer drag of `(dx, dy)` pixels in a viewport
    /// `viewport_height` pixels tall. A full-height drag is one turn at speed 1.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.delta_theta -= TAU * dx / height * self.rotate_speed;
        self.delta_phi -= TAU * dy / height * self.rotate_speed;
    }

    /// Zoom by `steps` wheel notches; positive moves closer.
    pub fn zoom(&mut self, steps: f32) {
        self.scale *= 0.95_f32.powf(steps * self.zoom_speed);
    }

    /// Advance one frame and return the new camera position.
    pub fn update(&mut self) -> Vec3 {
        self.theta += self.delta_theta * self.damping_factor;
        self.phi = (self.phi + self.delta_phi * self.damping_factor)
            .clamp(POLE_EPSILON, PI - POLE_EPSILON);
        self.radius = (self.radius * self.scale).clamp(self.min_distance, self.max_distance);

        let decay = 1.0 - self.damping_factor;
        self.delta_theta *= decay;
        self.delta_phi *= decay;
        self.scale = 1.0;

        self.position()
    }

    pub fn position(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + Vec3::new(
                self.radius * sin_phi * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * sin_phi * self.theta.cos(),
            )
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    /// Pending rotation has decayed to nothing.
    pub fn is_settled(&self) -> bool {
        self.delta_theta.abs() < 1e-6 && self.delta_phi.abs() < 1e-6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls() -> OrbitControls {
        OrbitControls::new(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO)
    }

    #[test]
    fn test_update_without_input_keeps_position() {
        let mut c = controls();
        let p = c.update();
        assert!((p - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);
        assert!(c.is_settled());
    }

    #[test]
    fn test_drag_eases_out() {
        let mut c = controls();
        c.rotate_by_pixels(100.0, 0.0, 800.0);

        let first = c.update();
        let step1 = (first - Vec3::new(0.0, 0.0, 2.0)).length();
        let second = c.update();
        let step2 = (second - first).length();
        assert!(step1 > 0.0);
        // Each frame moves less than the one before.
        assert!(step2 < step1);
        // Radius is unchanged by rotation.
        assert!((second.length() - 2.0).abs() < 1e-4);

        for _ in 0..1000 {
            c.update();
        }
        assert!(c.is_settled());
    }

    #[test]
    fn test_drag_right_moves_camera_left() {
        let mut c = controls();
        c.rotate_by_pixels(50.0, 0.0, 600.0);
        let p = c.update();
        assert!(p.x < 0.0, "camera should orbit towards -X, got {p:?}");
    }

    #[test]
    fn test_pitch_clamped_at_poles() {
        let mut c = controls();
        c.rotate_by_pixels(0.0, 100_000.0, 100.0);
        for _ in 0..200 {
            let p = c.update();
            assert!(p.is_finite());
        }
        let p = c.position();
        assert!(p.y > 1.99 && p.y <= 2.0);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut c = controls();
        c.zoom(3.0);
        c.update();
        assert!(c.distance() < 2.0);

        c.zoom(1000.0);
        c.update();
        assert_eq!(c.distance(), c.min_distance);

        c.zoom(-1000.0);
        c.update();
        assert_eq!(c.distance(), c.max_distance);
    }
}
