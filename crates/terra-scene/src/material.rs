//! The planet surface material.

use glam::Vec3;

use crate::backend::{StandardMaterial, TextureId};
use crate::lights::hex_color;
use crate::textures::TextureSlot;

/// White base, mildly rough, with a faint emissive lift.
pub fn earth_material() -> StandardMaterial {
    StandardMaterial {
        color: Vec3::ONE,
        roughness: 0.5,
        metalness: 0.1,
        emissive: hex_color(0x222222),
        emissive_intensity: 0.2,
        normal_scale: 0.05,
        map: None,
        specular_map: None,
        normal_map: None,
    }
}

impl StandardMaterial {
    /// Bind `texture` to the material slot it was loaded for.
    pub fn bind(&mut self, slot: TextureSlot, texture: TextureId) {
        match slot {
            TextureSlot::Color => self.map = Some(texture),
            TextureSlot::Specular => self.specular_map = Some(texture),
            TextureSlot::Normal => self.normal_map = Some(texture),
        }
    }

    pub fn bound_textures(&self) -> usize {
        [self.map, self.specular_map, self.normal_map]
            .iter()
            .flatten()
            .count()
    }
}
