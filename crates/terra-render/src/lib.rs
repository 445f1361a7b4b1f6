//! wgpu renderer for the Earth scene: surface and device setup, the lit
//! planet pipeline, the star sprite pipeline, and a [`RenderBackend`]
//! implementation tying them together.
//!
//! [`RenderBackend`]: terra_scene::RenderBackend

pub mod backend;
pub mod buffer;
pub mod depth;
pub mod gpu;
pub mod pipeline;
pub mod shaders;
pub mod texture;
pub mod uniforms;

pub use backend::WgpuBackend;
pub use buffer::{MeshBuffer, StarInstance, VertexPositionNormalUv};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use pipeline::{PlanetPipeline, SceneLayouts, StarPipeline};
pub use uniforms::{CameraUniform, LightsUniform, MAX_LIGHTS, MaterialUniform, ModelUniform};

#[cfg(test)]
pub(crate) mod test_device {
    /// A device without a surface, or `None` when no adapter is available.
    pub fn create() -> Option<(wgpu::Device, wgpu::Queue)> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });

            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::default(),
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .ok()?;

            adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .ok()
        })
    }
}
