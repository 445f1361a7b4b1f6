//! Procedural cloud layer: clusters of soft white discs on a transparent
//! equirectangular canvas, encoded as RGBA PNG.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error("Invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Invalid cloud size range {min}..{max}")]
    InvalidSizeRange { min: f32, max: f32 },
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}

/// Canvas and cloud distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudParams {
    pub width: u32,
    pub height: u32,
    pub clouds: u32,
    /// Cloud sizes are uniform in `[min_size, max_size)` pixels.
    pub min_size: f32,
    pub max_size: f32,
}

impl Default for CloudParams {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 512,
            clouds: 100,
            min_size: 50.0,
            max_size: 150.0,
        }
    }
}

impl CloudParams {
    pub fn validate(&self) -> Result<(), CloudError> {
        if self.width == 0 || self.height == 0 {
            return Err(CloudError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.min_size > 0.0 && self.max_size >= self.min_size) {
            return Err(CloudError::InvalidSizeRange {
                min: self.min_size,
                max: self.max_size,
            });
        }
        Ok(())
    }
}

/// One translucent white disc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disc {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub alpha: f32,
}

/// Lay out every disc. Each cloud is 5 to 9 discs scattered across its width
/// and half its height.
pub fn plan(params: &CloudParams, rng: &mut impl Rng) -> Vec<Disc> {
    let mut discs = Vec::new();
    for _ in 0..params.clouds {
        let x = rng.random::<f32>() * params.width as f32;
        let y = rng.random::<f32>() * params.height as f32;
        let size = params.min_size + rng.random::<f32>() * (params.max_size - params.min_size);

        let count = rng.random_range(5..=9);
        for _ in 0..count {
            let offset_x = (rng.random::<f32>() - 0.5) * size;
            let offset_y = (rng.random::<f32>() - 0.5) * size * 0.5;
            let radius = (rng.random::<f32>() * 0.5 + 0.5) * size / 2.0;
            let alpha = rng.random::<f32>() * 0.4 + 0.2;
            discs.push(Disc {
                x: x + offset_x,
                y: y + offset_y,
                radius,
                alpha,
            });
        }
    }
    discs
}

/// Coverage-only canvas; every painted pixel is white.
#[derive(Debug, Clone)]
pub struct CloudCanvas {
    width: u32,
    height: u32,
    alpha: Vec<f32>,
}

impl CloudCanvas {
    /// A fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![0.0; width as usize * height as usize],
        }
    }

    /// Generate the cloud layer for `params` from `seed`.
    pub fn generate(params: &CloudParams, seed: u64) -> Result<Self, CloudError> {
        params.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut canvas = Self::new(params.width, params.height);
        for disc in plan(params, &mut rng) {
            canvas.fill_disc(&disc);
        }
        tracing::debug!(
            width = params.width,
            height = params.height,
            seed,
            coverage = canvas.coverage(),
            "Generated cloud layer"
        );
        Ok(canvas)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Composite `disc` over the canvas (source-over), with a one-pixel
    /// antialiased edge. Parts outside the canvas are clipped.
    pub fn fill_disc(&mut self, disc: &Disc) {
        if disc.radius <= 0.0 || disc.alpha <= 0.0 {
            return;
        }
        let reach = disc.radius + 1.0;
        let x0 = (disc.x - reach).floor().max(0.0) as u32;
        let y0 = (disc.y - reach).floor().max(0.0) as u32;
        let x1 = ((disc.x + reach).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((disc.y + reach).ceil().max(0.0) as u32).min(self.height);

        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f32 + 0.5 - disc.x;
                let dy = py as f32 + 0.5 - disc.y;
                let distance = (dx * dx + dy * dy).sqrt();
                let coverage = (disc.radius - distance + 0.5).clamp(0.0, 1.0);
                if coverage == 0.0 {
                    continue;
                }
                let src = disc.alpha * coverage;
                let dst = &mut self.alpha[(py * self.width + px) as usize];
                *dst = src + *dst * (1.0 - src);
            }
        }
    }

    /// Alpha at a pixel, `0.0` outside the canvas.
    pub fn alpha_at(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.alpha[(y * self.width + x) as usize]
    }

    /// Share of pixels with any cloud.
    pub fn coverage(&self) -> f32 {
        if self.alpha.is_empty() {
            return 0.0;
        }
        let covered = self.alpha.iter().filter(|&&a| a > 0.0).count();
        covered as f32 / self.alpha.len() as f32
    }

    /// Straight (not premultiplied) RGBA8.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.alpha.len() * 4);
        for &a in &self.alpha {
            if a > 0.0 {
                rgba.extend_from_slice(&[255, 255, 255, (a * 255.0).round() as u8]);
            } else {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
        rgba
    }

    pub fn encode_png(&self, writer: impl Write) -> Result<(), CloudError> {
        let mut encoder = png::Encoder::new(writer, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.to_rgba())?;
        writer.finish()?;
        Ok(())
    }

    /// Write the PNG to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), CloudError> {
        let io_err = |source| CloudError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = File::create(path).map_err(io_err)?;
        self.encode_png(BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_disc_ranges() {
        let params = CloudParams::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let discs = plan(&params, &mut rng);
        assert!(discs.len() >= 5 * 100 && discs.len() <= 9 * 100);
        for d in &discs {
            assert!(d.alpha >= 0.2 && d.alpha <= 0.6, "alpha {}", d.alpha);
            // Radius is (0.5..1) * size / 2 with size in 50..150.
            assert!(d.radius >= 12.5 && d.radius <= 75.0, "radius {}", d.radius);
        }
    }

    #[test]
    fn test_same_seed_same_canvas() {
        let params = CloudParams {
            width: 128,
            height: 64,
            clouds: 10,
            ..CloudParams::default()
        };
        let a = CloudCanvas::generate(&params, 42).unwrap();
        let b = CloudCanvas::generate(&params, 42).unwrap();
        let c = CloudCanvas::generate(&params, 43).unwrap();
        assert_eq!(a.to_rgba(), b.to_rgba());
        assert_ne!(a.to_rgba(), c.to_rgba());
    }

    #[test]
    fn test_fill_disc_composites_source_over() {
        let mut canvas = CloudCanvas::new(20, 20);
        let disc = Disc {
            x: 10.0,
            y: 10.0,
            radius: 5.0,
            alpha: 0.5,
        };
        canvas.fill_disc(&disc);
        assert!((canvas.alpha_at(10, 10) - 0.5).abs() < 1e-6);
        canvas.fill_disc(&disc);
        assert!((canvas.alpha_at(10, 10) - 0.75).abs() < 1e-6);
        assert_eq!(canvas.alpha_at(0, 0), 0.0);
    }

    #[test]
    fn test_disc_off_canvas_is_clipped() {
        let mut canvas = CloudCanvas::new(8, 8);
        canvas.fill_disc(&Disc {
            x: -3.0,
            y: 4.0,
            radius: 5.0,
            alpha: 1.0,
        });
        assert!(canvas.alpha_at(0, 4) > 0.0);
        assert_eq!(canvas.alpha_at(7, 4), 0.0);
        canvas.fill_disc(&Disc {
            x: 500.0,
            y: 500.0,
            radius: 5.0,
            alpha: 1.0,
        });
    }

    #[test]
    fn test_rgba_is_white_or_transparent() {
        let canvas = CloudCanvas::generate(
            &CloudParams {
                width: 64,
                height: 32,
                clouds: 5,
                ..CloudParams::default()
            },
            7,
        )
        .unwrap();
        let rgba = canvas.to_rgba();
        assert_eq!(rgba.len(), 64 * 32 * 4);
        for px in rgba.chunks_exact(4) {
            assert!(px == [0, 0, 0, 0] || px[..3] == [255, 255, 255]);
        }
        assert!(canvas.coverage() > 0.0);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let zero = CloudParams {
            width: 0,
            ..CloudParams::default()
        };
        assert!(matches!(
            CloudCanvas::generate(&zero, 1),
            Err(CloudError::InvalidSize { .. })
        ));
        let inverted = CloudParams {
            min_size: 100.0,
            max_size: 10.0,
            ..CloudParams::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_save_writes_decodable_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("textures/earth/earth_clouds.png");
        let canvas = CloudCanvas::generate(
            &CloudParams {
                width: 32,
                height: 16,
                clouds: 3,
                ..CloudParams::default()
            },
            9,
        )
        .unwrap();
        canvas.save(&path).unwrap();

        let decoder = png::Decoder::new(File::open(&path).unwrap());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (32, 16));
        assert_eq!(info.color_type, png::ColorType::Rgba);
    }
}
