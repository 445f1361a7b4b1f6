//! Render pipelines for the planet and the starfield.

use std::num::NonZeroU64;

use crate::buffer::{StarInstance, VertexPositionNormalUv};
use crate::depth::DepthBuffer;
use crate::shaders::{PLANET_SHADER_SOURCE, STAR_SHADER_SOURCE};
use crate::uniforms::{CameraUniform, LightsUniform, MaterialUniform, ModelUniform, PointsUniform};

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: usize,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Bind group layouts shared by both pipelines.
pub struct SceneLayouts {
    /// Group 0: camera and lights.
    pub frame: wgpu::BindGroupLayout,
    /// Group 1: model matrices.
    pub model: wgpu::BindGroupLayout,
    /// Group 2 for the planet: material uniform, three maps and a sampler.
    pub standard_material: wgpu::BindGroupLayout,
    /// Group 2 for stars.
    pub points_material: wgpu::BindGroupLayout,
}

impl SceneLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let vertex_fragment = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;

        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-bgl"),
            entries: &[
                uniform_entry(0, vertex_fragment, size_of::<CameraUniform>()),
                uniform_entry(
                    1,
                    wgpu::ShaderStages::FRAGMENT,
                    size_of::<LightsUniform>(),
                ),
            ],
        });

        let model = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("model-bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX,
                size_of::<ModelUniform>(),
            )],
        });

        let standard_material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("standard-material-bgl"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT, size_of::<MaterialUniform>()),
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let points_material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("points-material-bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX,
                size_of::<PointsUniform>(),
            )],
        });

        Self {
            frame,
            model,
            standard_material,
            points_material,
        }
    }
}

fn depth_state(write: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DepthBuffer::FORMAT,
        depth_write_enabled: write,
        depth_compare: DepthBuffer::COMPARE_FUNCTION,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Opaque, back-face culled, lit sphere.
pub struct PlanetPipeline {
    pub pipeline: wgpu::RenderPipeline,
}

impl PlanetPipeline {
    pub fn new(
        device: &wgpu::Device,
        layouts: &SceneLayouts,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("planet-shader"),
            source: wgpu::ShaderSource::Wgsl(PLANET_SHADER_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("planet-pipeline-layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.model, &layouts.standard_material],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("planet-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[VertexPositionNormalUv::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(depth_state(true)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self { pipeline }
    }
}

/// Alpha-blended star sprites. They test depth but never write it.
pub struct StarPipeline {
    pub pipeline: wgpu::RenderPipeline,
}

impl StarPipeline {
    pub fn new(
        device: &wgpu::Device,
        layouts: &SceneLayouts,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("star-shader"),
            source: wgpu::ShaderSource::Wgsl(STAR_SHADER_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("star-pipeline-layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.model, &layouts.points_material],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("star-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[StarInstance::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(depth_state(false)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self { pipeline }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_device;

    #[test]
    fn test_pipelines_build() {
        let Some((device, _queue)) = test_device::create() else {
            return;
        };
        let layouts = SceneLayouts::new(&device);
        let format = wgpu::TextureFormat::Bgra8UnormSrgb;
        let _planet = PlanetPipeline::new(&device, &layouts, format);
        let _stars = StarPipeline::new(&device, &layouts, format);
    }
}
