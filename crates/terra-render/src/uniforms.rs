//! GPU-side uniform layouts. Field order and padding mirror the WGSL structs
//! in [`crate::shaders`].

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use terra_scene::{Light, PointsMaterial, StandardMaterial};

/// Lights beyond this are dropped.
pub const MAX_LIGHTS: usize = 8;

pub const LIGHT_AMBIENT: u32 = 0;
pub const LIGHT_DIRECTIONAL: u32 = 1;
pub const LIGHT_HEMISPHERE: u32 = 2;
pub const LIGHT_POINT: u32 = 3;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// World position, w unused.
    pub position: [f32; 4],
    /// Surface width and height in pixels, zw unused.
    pub viewport: [f32; 4],
}

impl CameraUniform {
    pub fn new(view_proj: Mat4, position: Vec3, width: u32, height: u32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            position: position.extend(1.0).to_array(),
            viewport: [width.max(1) as f32, height.max(1) as f32, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model's upper 3x3, padded to 4x4.
    pub normal: [[f32; 4]; 4],
}

impl ModelUniform {
    pub fn new(model: Mat4) -> Self {
        let normal = Mat3::from_mat4(model).inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal: Mat4::from_mat3(normal).to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// x: light kind.
    pub header: [u32; 4],
    /// Colour premultiplied by intensity. For hemisphere lights, the sky.
    pub color: [f32; 4],
    /// Position for point lights, direction towards the light for directional.
    pub position: [f32; 4],
    /// Hemisphere ground colour.
    pub ground: [f32; 4],
}

impl GpuLight {
    pub fn from_light(light: &Light) -> Self {
        let pack = |c: Vec3, intensity: f32| (c * intensity).extend(1.0).to_array();
        match *light {
            Light::Ambient { color, intensity } => Self {
                header: [LIGHT_AMBIENT, 0, 0, 0],
                color: pack(color, intensity),
                ..Self::default()
            },
            Light::Directional {
                color,
                intensity,
                position,
            } => Self {
                header: [LIGHT_DIRECTIONAL, 0, 0, 0],
                color: pack(color, intensity),
                position: position.normalize_or_zero().extend(0.0).to_array(),
                ..Self::default()
            },
            Light::Hemisphere {
                sky,
                ground,
                intensity,
            } => Self {
                header: [LIGHT_HEMISPHERE, 0, 0, 0],
                color: pack(sky, intensity),
                ground: pack(ground, intensity),
                ..Self::default()
            },
            Light::Point {
                color,
                intensity,
                position,
            } => Self {
                header: [LIGHT_POINT, 0, 0, 0],
                color: pack(color, intensity),
                position: position.extend(1.0).to_array(),
                ..Self::default()
            },
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LightsUniform {
    pub lights: [GpuLight; MAX_LIGHTS],
    /// x: number of lights in use.
    pub count: [u32; 4],
}

impl LightsUniform {
    pub fn new<'a>(lights: impl IntoIterator<Item = &'a Light>) -> Self {
        let mut uniform = Self::default();
        let mut count = 0;
        for light in lights {
            if count == MAX_LIGHTS {
                log::warn!("More than {MAX_LIGHTS} lights, ignoring the rest");
                break;
            }
            uniform.lights[count] = GpuLight::from_light(light);
            count += 1;
        }
        uniform.count[0] = count as u32;
        uniform
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    /// Emissive colour premultiplied by its intensity.
    pub emissive: [f32; 4],
    /// x: roughness, y: metalness, z: normal scale.
    pub params: [f32; 4],
}

impl MaterialUniform {
    pub fn standard(material: &StandardMaterial) -> Self {
        Self {
            color: material.color.extend(1.0).to_array(),
            emissive: (material.emissive * material.emissive_intensity)
                .extend(1.0)
                .to_array(),
            params: [
                material.roughness,
                material.metalness,
                material.normal_scale,
                0.0,
            ],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PointsUniform {
    /// x: size attenuation on, y: vertex colours on, z: size multiplier.
    pub params: [f32; 4],
}

impl PointsUniform {
    pub fn new(material: &PointsMaterial) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        Self {
            params: [
                flag(material.size_attenuation),
                flag(material.vertex_colors),
                1.0,
                0.0,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terra_scene::lights::light_rig;

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 96);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 128);
        assert_eq!(std::mem::size_of::<GpuLight>(), 64);
        assert_eq!(std::mem::size_of::<LightsUniform>(), 64 * MAX_LIGHTS + 16);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
        assert_eq!(std::mem::size_of::<PointsUniform>(), 16);
    }

    #[test]
    fn test_light_rig_packs() {
        let rig = light_rig(true);
        let uniform = LightsUniform::new(&rig);
        assert_eq!(uniform.count[0], 5);
        let kinds: Vec<u32> = uniform.lights[..5].iter().map(|l| l.header[0]).collect();
        assert_eq!(
            kinds,
            vec![
                LIGHT_AMBIENT,
                LIGHT_DIRECTIONAL,
                LIGHT_HEMISPHERE,
                LIGHT_POINT,
                LIGHT_POINT
            ]
        );
    }

    #[test]
    fn test_directional_light_normalized() {
        let light = Light::Directional {
            color: Vec3::ONE,
            intensity: 2.0,
            position: Vec3::new(3.0, 0.0, 4.0),
        };
        let gpu = GpuLight::from_light(&light);
        assert!((gpu.position[0] - 0.6).abs() < 1e-6);
        assert!((gpu.position[2] - 0.8).abs() < 1e-6);
        assert_eq!(gpu.color[..3], [2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_excess_lights_dropped() {
        let lights = vec![
            Light::Ambient {
                color: Vec3::ONE,
                intensity: 1.0
            };
            MAX_LIGHTS + 3
        ];
        assert_eq!(LightsUniform::new(&lights).count[0], MAX_LIGHTS as u32);
    }

    #[test]
    fn test_normal_matrix_undoes_scale() {
        let model = ModelUniform::new(Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0)));
        assert!((model.normal[0][0] - 0.5).abs() < 1e-6);
        assert!((model.normal[1][1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_material_emissive_premultiplied() {
        let material = terra_scene::material::earth_material();
        let uniform = MaterialUniform::standard(&material);
        let expected = material.emissive.x * 0.2;
        assert!((uniform.emissive[0] - expected).abs() < 1e-6);
        assert_eq!(uniform.params[..3], [0.5, 0.1, 0.05]);
    }
}
