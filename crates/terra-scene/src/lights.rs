//! The light rig around the planet.

use glam::Vec3;

use crate::backend::Light;

/// Linear RGB from a `0xRRGGBB` colour.
pub fn hex_color(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Bright ambient fill so the night side stays readable.
pub fn ambient() -> Light {
    Light::Ambient {
        color: hex_color(0x909090),
        intensity: 1.0,
    }
}

/// Warm white sun up and to the right of the camera.
pub fn sun() -> Light {
    Light::Directional {
        color: hex_color(0xfffaf0),
        intensity: 2.0,
        position: Vec3::new(5.0, 3.0, 5.0),
    }
}

/// White sky over a blue ground, standing in for atmospheric scattering.
pub fn hemisphere() -> Light {
    Light::Hemisphere {
        sky: hex_color(0xffffff),
        ground: hex_color(0x6666ff),
        intensity: 0.6,
    }
}

/// Blue rim light behind the planet.
pub fn back_light() -> Light {
    Light::Point {
        color: hex_color(0x4080ff),
        intensity: 0.8,
        position: Vec3::new(-5.0, -3.0, -5.0),
    }
}

/// Soft yellow light from below.
pub fn fill_light() -> Light {
    Light::Point {
        color: hex_color(0xffffcc),
        intensity: 0.5,
        position: Vec3::new(0.0, -5.0, 0.0),
    }
}

/// Lights to create, in order. The point lights are optional.
pub fn light_rig(with_point_lights: bool) -> Vec<Light> {
    let mut lights = vec![ambient(), sun(), hemisphere()];
    if with_point_lights {
        lights.push(back_light());
        lights.push(fill_light());
    }
    lights
}
