//! Procedural background stars: deterministic point clouds in a cube around
//! the origin, layered by size and tint.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::backend::{PointCloud, PointsMaterial};

/// Parameters for one layer of stars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarLayer {
    pub count: u32,
    /// Nominal star size; individual sizes fall in `[0.5, 1.5) * size`.
    pub size: f32,
    /// Base RGB colour, jittered by up to ±0.05 per channel.
    pub tint: [f32; 3],
    /// Side length of the cube the stars are scattered in.
    pub spread: f32,
}

impl StarLayer {
    /// Small, numerous, slightly blue.
    pub const DISTANT: Self = Self {
        count: 15_000,
        size: 0.05,
        tint: [0.9, 0.9, 1.0],
        spread: 2000.0,
    };

    /// Medium, slightly yellow.
    pub const MID: Self = Self {
        count: 5_000,
        size: 0.1,
        tint: [1.0, 0.95, 0.8],
        spread: 1500.0,
    };

    /// Large foreground stars, slightly purple.
    pub const BRIGHT: Self = Self {
        count: 1_000,
        size: 0.15,
        tint: [0.95, 0.9, 1.0],
        spread: 1000.0,
    };

    /// The three layers drawn behind the planet, farthest first.
    pub const ALL: [Self; 3] = [Self::DISTANT, Self::MID, Self::BRIGHT];

    /// Scatter the layer's stars. Deterministic for a given seed.
    pub fn generate(&self, seed: u64) -> PointCloud {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let count = self.count as usize;
        let mut cloud = PointCloud {
            positions: Vec::with_capacity(count),
            colors: Vec::with_capacity(count),
            sizes: Vec::with_capacity(count),
        };

        for _ in 0..count {
            let position = [
                (rng.random::<f32>() - 0.5) * self.spread,
                (rng.random::<f32>() - 0.5) * self.spread,
                (rng.random::<f32>() - 0.5) * self.spread,
            ];
            let size = rng.random::<f32>() * self.size + self.size * 0.5;
            let color = self.tint.map(|c| c + (rng.random::<f32>() * 0.1 - 0.05));

            cloud.positions.push(position);
            cloud.sizes.push(size);
            cloud.colors.push(color);
        }

        cloud
    }

    pub fn material(&self) -> PointsMaterial {
        PointsMaterial {
            size: self.size,
            size_attenuation: true,
            vertex_colors: true,
            transparent: true,
        }
    }
}
