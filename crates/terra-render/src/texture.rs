//! Texture upload for planet maps, plus the 1x1 stand-ins bound to empty
//! material slots.

use terra_scene::TextureData;

#[derive(Debug, thiserror::Error)]
pub enum TextureUploadError {
    #[error("invalid texture dimensions {width}x{height} (max {max})")]
    InvalidDimensions { width: u32, height: u32, max: u32 },
    #[error("texture data is {actual} bytes, expected {expected}")]
    DataSizeMismatch { expected: usize, actual: usize },
}

/// An uploaded 2D texture and its default view.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    /// Colour data goes to an sRGB format so sampling returns linear values.
    pub fn format_for(data: &TextureData) -> wgpu::TextureFormat {
        if data.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        }
    }

    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        data: &TextureData,
    ) -> Result<Self, TextureUploadError> {
        validate(data, device.limits().max_texture_dimension_2d)?;

        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::format_for(data),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(data.width * 4),
                rows_per_image: None,
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("Uploaded texture '{label}' ({}x{})", data.width, data.height);
        Ok(Self { texture, view })
    }
}

fn validate(data: &TextureData, max: u32) -> Result<(), TextureUploadError> {
    if data.width == 0 || data.height == 0 || data.width > max || data.height > max {
        return Err(TextureUploadError::InvalidDimensions {
            width: data.width,
            height: data.height,
            max,
        });
    }
    let expected = data.width as usize * data.height as usize * 4;
    if data.rgba.len() != expected {
        return Err(TextureUploadError::DataSizeMismatch {
            expected,
            actual: data.rgba.len(),
        });
    }
    Ok(())
}

/// Neutral textures for unbound slots: white colour and specular, flat normal.
pub struct FallbackTextures {
    pub white: GpuTexture,
    pub flat_normal: GpuTexture,
}

impl FallbackTextures {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Self, TextureUploadError> {
        Ok(Self {
            white: GpuTexture::upload(device, queue, "fallback-white", &solid([255; 4], false))?,
            flat_normal: GpuTexture::upload(
                device,
                queue,
                "fallback-normal",
                &solid([128, 128, 255, 255], false),
            )?,
        })
    }
}

fn solid(rgba: [u8; 4], srgb: bool) -> TextureData {
    TextureData {
        width: 1,
        height: 1,
        rgba: rgba.to_vec(),
        srgb,
    }
}

/// Linear, repeating horizontally so the seam at u = 0/1 filters cleanly.
pub fn surface_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("planet-sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}
