//! [`RenderBackend`] on wgpu.
//!
//! The window surface is the output target: attaching configures it and
//! creates a matching depth buffer, detaching drops the depth buffer so
//! nothing renders until the next attach. A backend built without a surface
//! renders into an owned colour texture instead.

use std::collections::HashMap;

use terra_scene::{
    BackendError, FrameDesc, Geometry, GeometryId, Light, LightId, MaterialDesc, MaterialId,
    RenderBackend, ResourceId, StandardMaterial, SurfaceSize, TextureData, TextureId,
};
use wgpu::util::DeviceExt;

use crate::buffer::{MeshBuffer, StarBuffer};
use crate::depth::DepthBuffer;
use crate::gpu::{RenderContext, SurfaceError};
use crate::pipeline::{PlanetPipeline, SceneLayouts, StarPipeline};
use crate::texture::{FallbackTextures, GpuTexture, surface_sampler};
use crate::uniforms::{CameraUniform, LightsUniform, MaterialUniform, ModelUniform, PointsUniform};

struct FrameBindings {
    camera: wgpu::Buffer,
    lights: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct ModelBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

enum GpuShape {
    Mesh(MeshBuffer),
    Stars(StarBuffer),
}

/// Geometry with its own model uniform: one transform per geometry per frame.
struct GpuGeometry {
    shape: GpuShape,
    model: ModelBinding,
}

enum GpuMaterial {
    Standard {
        desc: StandardMaterial,
        uniform: wgpu::Buffer,
        bind_group: wgpu::BindGroup,
    },
    Points {
        uniform: wgpu::Buffer,
        bind_group: wgpu::BindGroup,
    },
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    surface: Option<RenderContext>,
    /// Colour target when there is no surface; exists while attached.
    offscreen: Option<wgpu::Texture>,
    layouts: SceneLayouts,
    planet_pipeline: PlanetPipeline,
    star_pipeline: StarPipeline,
    frame: FrameBindings,
    sampler: wgpu::Sampler,
    fallback: FallbackTextures,
    depth: Option<DepthBuffer>,
    next_id: u64,
    geometries: HashMap<GeometryId, GpuGeometry>,
    materials: HashMap<MaterialId, GpuMaterial>,
    textures: HashMap<TextureId, GpuTexture>,
    lights: HashMap<LightId, Light>,
}

impl WgpuBackend {
    /// Build pipelines and shared bindings on `ctx`. No output is attached yet.
    pub fn new(ctx: RenderContext) -> Result<Self, BackendError> {
        let (device, queue, format) = (ctx.device.clone(), ctx.queue.clone(), ctx.surface_format);
        Self::build(device, queue, format, Some(ctx))
    }

    /// A backend drawing into an offscreen `color_format` texture.
    pub fn without_surface(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
    ) -> Result<Self, BackendError> {
        Self::build(device, queue, color_format, None)
    }

    fn build(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
        surface: Option<RenderContext>,
    ) -> Result<Self, BackendError> {
        let layouts = SceneLayouts::new(&device);
        let planet_pipeline = PlanetPipeline::new(&device, &layouts, color_format);
        let star_pipeline = StarPipeline::new(&device, &layouts, color_format);

        let camera = uniform_buffer(&device, "camera-uniform", &CameraUniform::default());
        let lights = uniform_buffer(&device, "lights-uniform", &LightsUniform::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind-group"),
            layout: &layouts.frame,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights.as_entire_binding(),
                },
            ],
        });

        let sampler = surface_sampler(&device);
        let fallback = FallbackTextures::new(&device, &queue)
            .map_err(|e| BackendError::Resource(e.to_string()))?;

        Ok(Self {
            layouts,
            planet_pipeline,
            star_pipeline,
            frame: FrameBindings {
                camera,
                lights,
                bind_group,
            },
            sampler,
            fallback,
            depth: None,
            next_id: 0,
            geometries: HashMap::new(),
            materials: HashMap::new(),
            textures: HashMap::new(),
            lights: HashMap::new(),
            device,
            queue,
            color_format,
            surface,
            offscreen: None,
        })
    }

    /// The window context, `None` for an offscreen backend.
    pub fn context(&self) -> Option<&RenderContext> {
        self.surface.as_ref()
    }

    /// Resize the surface, or recreate the offscreen target.
    fn size_color_target(&mut self, size: SurfaceSize) {
        match self.surface.as_mut() {
            Some(ctx) => ctx.resize(size.width, size.height),
            None => {
                self.offscreen = Some(self.device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("offscreen-color"),
                    size: wgpu::Extent3d {
                        width: size.width,
                        height: size.height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: self.color_format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                }));
            }
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn model_binding(&self, label: &str) -> ModelBinding {
        let buffer = uniform_buffer(
            &self.device,
            label,
            &ModelUniform::new(glam::Mat4::IDENTITY),
        );
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layouts.model,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        ModelBinding { buffer, bind_group }
    }

    fn texture_view<'a>(
        &'a self,
        id: Option<TextureId>,
        fallback: &'a GpuTexture,
    ) -> Result<&'a wgpu::TextureView, BackendError> {
        match id {
            Some(id) => self
                .textures
                .get(&id)
                .map(|t| &t.view)
                .ok_or(BackendError::UnknownResource(id.into())),
            None => Ok(&fallback.view),
        }
    }

    fn standard_bind_group(
        &self,
        uniform: &wgpu::Buffer,
        material: &StandardMaterial,
    ) -> Result<wgpu::BindGroup, BackendError> {
        let color = self.texture_view(material.map, &self.fallback.white)?;
        let specular = self.texture_view(material.specular_map, &self.fallback.white)?;
        let normal = self.texture_view(material.normal_map, &self.fallback.flat_normal)?;

        Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("standard-material-bind-group"),
            layout: &self.layouts.standard_material,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(color),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(specular),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(normal),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }))
    }

    fn points_bind_group(&self, uniform: &wgpu::Buffer) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("points-material-bind-group"),
            layout: &self.layouts.points_material,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        })
    }
}

fn uniform_buffer<T: bytemuck::Pod>(device: &wgpu::Device, label: &str, value: &T) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(value),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

fn clear_color(rgba: [f64; 4]) -> wgpu::Color {
    wgpu::Color {
        r: rgba[0],
        g: rgba[1],
        b: rgba[2],
        a: rgba[3],
    }
}

impl RenderBackend for WgpuBackend {
    fn attach_output(&mut self, size: SurfaceSize) -> Result<(), BackendError> {
        let size = size.clamped();
        self.size_color_target(size);
        self.depth = Some(DepthBuffer::new(&self.device, size.width, size.height));
        log::info!("Output attached at {}x{}", size.width, size.height);
        Ok(())
    }

    fn resize_output(&mut self, size: SurfaceSize) {
        let size = size.clamped();
        if self.depth.is_none() {
            log::debug!("Resize with no output attached");
            return;
        }
        self.size_color_target(size);
        if let Some(depth) = self.depth.as_mut() {
            depth.resize(&self.device, size.width, size.height);
        }
    }

    fn detach_output(&mut self) {
        self.offscreen = None;
        if self.depth.take().is_some() {
            log::info!("Output detached");
        }
    }

    fn output_size(&self) -> Option<SurfaceSize> {
        self.depth
            .as_ref()
            .map(|d| SurfaceSize::new(d.width(), d.height()))
    }

    fn create_geometry(&mut self, geometry: &Geometry) -> Result<GeometryId, BackendError> {
        let id = GeometryId(self.allocate_id());
        let label = format!("geometry-{}", id.0);
        let shape = match geometry {
            Geometry::Mesh(mesh) => GpuShape::Mesh(MeshBuffer::new(&self.device, &label, mesh)),
            Geometry::Points(cloud) => {
                GpuShape::Stars(StarBuffer::new(&self.device, &label, cloud))
            }
        };
        let model = self.model_binding(&format!("{label}-model"));
        self.geometries.insert(id, GpuGeometry { shape, model });
        Ok(id)
    }

    fn create_material(&mut self, material: &MaterialDesc) -> Result<MaterialId, BackendError> {
        let gpu = match material {
            MaterialDesc::Standard(desc) => {
                let uniform = uniform_buffer(
                    &self.device,
                    "standard-material",
                    &MaterialUniform::standard(desc),
                );
                let bind_group = self.standard_bind_group(&uniform, desc)?;
                GpuMaterial::Standard {
                    desc: desc.clone(),
                    uniform,
                    bind_group,
                }
            }
            MaterialDesc::Points(desc) => {
                let uniform =
                    uniform_buffer(&self.device, "points-material", &PointsUniform::new(desc));
                let bind_group = self.points_bind_group(&uniform);
                GpuMaterial::Points {
                    uniform,
                    bind_group,
                }
            }
        };
        let id = MaterialId(self.allocate_id());
        self.materials.insert(id, gpu);
        Ok(id)
    }

    fn update_material(
        &mut self,
        id: MaterialId,
        material: &MaterialDesc,
    ) -> Result<(), BackendError> {
        let current = self
            .materials
            .get(&id)
            .ok_or(BackendError::UnknownResource(id.into()))?;

        match (current, material) {
            (GpuMaterial::Standard { uniform, desc, .. }, MaterialDesc::Standard(new)) => {
                if desc == new {
                    return Ok(());
                }
                let bind_group = self.standard_bind_group(uniform, new)?;
                self.queue
                    .write_buffer(uniform, 0, bytemuck::bytes_of(&MaterialUniform::standard(new)));
                if let Some(GpuMaterial::Standard {
                    desc,
                    bind_group: slot,
                    ..
                }) = self.materials.get_mut(&id)
                {
                    *desc = new.clone();
                    *slot = bind_group;
                }
                Ok(())
            }
            (GpuMaterial::Points { uniform, .. }, MaterialDesc::Points(new)) => {
                self.queue
                    .write_buffer(uniform, 0, bytemuck::bytes_of(&PointsUniform::new(new)));
                Ok(())
            }
            _ => Err(BackendError::Resource(format!(
                "material {id:?} cannot change kind"
            ))),
        }
    }

    fn create_texture(&mut self, texture: &TextureData) -> Result<TextureId, BackendError> {
        let id = TextureId(self.allocate_id());
        let gpu = GpuTexture::upload(
            &self.device,
            &self.queue,
            &format!("texture-{}", id.0),
            texture,
        )
        .map_err(|e| BackendError::Resource(e.to_string()))?;
        self.textures.insert(id, gpu);
        Ok(id)
    }

    fn create_light(&mut self, light: &Light) -> Result<LightId, BackendError> {
        let id = LightId(self.allocate_id());
        self.lights.insert(id, light.clone());
        Ok(id)
    }

    fn release(&mut self, id: ResourceId) {
        let removed = match id {
            ResourceId::Geometry(g) => self.geometries.remove(&g).is_some(),
            ResourceId::Material(m) => self.materials.remove(&m).is_some(),
            ResourceId::Texture(t) => self.textures.remove(&t).is_some(),
            ResourceId::Light(l) => self.lights.remove(&l).is_some(),
        };
        if !removed {
            log::debug!("Release of unknown resource {id:?} ignored");
        }
    }

    fn render(&mut self, frame: &FrameDesc<'_>) -> Result<(), BackendError> {
        let depth = self.depth.as_ref().ok_or(BackendError::NotAttached)?;

        // Resolve everything before touching the GPU.
        let lights = frame
            .lights
            .iter()
            .map(|id| {
                self.lights
                    .get(id)
                    .ok_or(BackendError::UnknownResource((*id).into()))
            })
            .collect::<Result<Vec<&Light>, _>>()?;

        let mut draws = Vec::with_capacity(frame.items.len());
        for item in frame.items {
            let geometry = self
                .geometries
                .get(&item.geometry)
                .ok_or(BackendError::UnknownResource(item.geometry.into()))?;
            let material = self
                .materials
                .get(&item.material)
                .ok_or(BackendError::UnknownResource(item.material.into()))?;
            match (&geometry.shape, material) {
                (GpuShape::Mesh(_), GpuMaterial::Standard { .. })
                | (GpuShape::Stars(_), GpuMaterial::Points { .. }) => {}
                _ => {
                    return Err(BackendError::Render(format!(
                        "{:?} cannot be drawn with {:?}",
                        item.geometry, item.material
                    )));
                }
            }
            draws.push((item, geometry, material));
        }

        let (surface_texture, view) = match (&self.surface, &self.offscreen) {
            (Some(ctx), _) => {
                let texture = match ctx.get_current_texture() {
                    Ok(texture) => texture,
                    Err(SurfaceError::Timeout) => {
                        log::warn!("Surface timeout, skipping frame");
                        return Ok(());
                    }
                    Err(e) => return Err(BackendError::Render(e.to_string())),
                };
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                (Some(texture), view)
            }
            (None, Some(color)) => (
                None,
                color.create_view(&wgpu::TextureViewDescriptor::default()),
            ),
            (None, None) => return Err(BackendError::NotAttached),
        };

        let queue = &self.queue;
        let camera = CameraUniform::new(
            frame.view_proj,
            frame.camera_position,
            depth.width(),
            depth.height(),
        );
        queue.write_buffer(&self.frame.camera, 0, bytemuck::bytes_of(&camera));
        queue.write_buffer(
            &self.frame.lights,
            0,
            bytemuck::bytes_of(&LightsUniform::new(lights.iter().copied())),
        );
        for (item, geometry, _) in &draws {
            queue.write_buffer(
                &geometry.model.buffer,
                0,
                bytemuck::bytes_of(&ModelUniform::new(item.model)),
            );
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(frame.clear_color)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(DepthBuffer::CLEAR_VALUE),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for (_, geometry, material) in &draws {
                match (&geometry.shape, material) {
                    (GpuShape::Mesh(mesh), GpuMaterial::Standard { bind_group, .. }) => {
                        pass.set_pipeline(&self.planet_pipeline.pipeline);
                        pass.set_bind_group(0, &self.frame.bind_group, &[]);
                        pass.set_bind_group(1, &geometry.model.bind_group, &[]);
                        pass.set_bind_group(2, bind_group, &[]);
                        mesh.draw(&mut pass);
                    }
                    (GpuShape::Stars(stars), GpuMaterial::Points { bind_group, .. }) => {
                        pass.set_pipeline(&self.star_pipeline.pipeline);
                        pass.set_bind_group(0, &self.frame.bind_group, &[]);
                        pass.set_bind_group(1, &geometry.model.bind_group, &[]);
                        pass.set_bind_group(2, bind_group, &[]);
                        stars.draw(&mut pass);
                    }
                    _ => {}
                }
            }
        }

        queue.submit(Some(encoder.finish()));
        if let Some(texture) = surface_texture {
            texture.present();
        }
        Ok(())
    }

    fn live_resources(&self) -> usize {
        self.geometries.len() + self.materials.len() + self.textures.len() + self.lights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use glam::{Mat4, Vec3};
    use terra_scene::DrawItem;
    use terra_scene::lights::light_rig;
    use terra_scene::material::earth_material;
    use terra_scene::sphere::uv_sphere;
    use terra_scene::starfield::StarLayer;

    use crate::test_device;

    fn offscreen_backend() -> Option<WgpuBackend> {
        let (device, queue) = test_device::create()?;
        let backend =
            WgpuBackend::without_surface(device, queue, wgpu::TextureFormat::Rgba8UnormSrgb)
                .expect("backend");
        Some(backend)
    }

    fn frame<'a>(items: &'a [DrawItem], lights: &'a [LightId]) -> FrameDesc<'a> {
        FrameDesc {
            view_proj: Mat4::IDENTITY,
            camera_position: Vec3::new(0.0, 0.0, 5.0),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            items,
            lights,
        }
    }

    fn texel() -> TextureData {
        TextureData {
            width: 2,
            height: 2,
            rgba: vec![255; 16],
            srgb: true,
        }
    }

    #[test]
    fn test_clear_color_channels() {
        let c = clear_color([0.0, 0.25, 0.5, 1.0]);
        assert_eq!((c.r, c.g, c.b, c.a), (0.0, 0.25, 0.5, 1.0));
    }

    #[test]
    fn test_live_resources_track_create_and_release() {
        let Some(mut backend) = offscreen_backend() else {
            return;
        };
        assert!(backend.context().is_none());
        assert_eq!(backend.live_resources(), 0);

        let sphere = backend
            .create_geometry(&Geometry::Mesh(uv_sphere(1.0, 16, 8)))
            .unwrap();
        let stars = backend
            .create_geometry(&Geometry::Points(StarLayer::DISTANT.generate(7)))
            .unwrap();
        let texture = backend.create_texture(&texel()).unwrap();
        let mut desc = earth_material();
        desc.map = Some(texture);
        let material = backend
            .create_material(&MaterialDesc::Standard(desc))
            .unwrap();
        let points = backend
            .create_material(&MaterialDesc::Points(StarLayer::DISTANT.material()))
            .unwrap();
        let lights: Vec<LightId> = light_rig(true)
            .iter()
            .map(|l| backend.create_light(l).unwrap())
            .collect();
        assert_eq!(backend.live_resources(), 5 + lights.len());

        backend.release(sphere.into());
        backend.release(stars.into());
        backend.release(material.into());
        backend.release(points.into());
        backend.release(texture.into());
        for id in &lights {
            backend.release((*id).into());
        }
        assert_eq!(backend.live_resources(), 0);

        // Second release is ignored.
        backend.release(sphere.into());
        assert_eq!(backend.live_resources(), 0);
    }

    #[test]
    fn test_material_with_unknown_texture_is_rejected() {
        let Some(mut backend) = offscreen_backend() else {
            return;
        };
        let mut desc = earth_material();
        desc.normal_map = Some(TextureId(999));
        assert!(
            backend
                .create_material(&MaterialDesc::Standard(desc))
                .is_err()
        );
        assert_eq!(backend.live_resources(), 0);
    }

    #[test]
    fn test_update_material_cannot_change_kind() {
        let Some(mut backend) = offscreen_backend() else {
            return;
        };
        let id = backend
            .create_material(&MaterialDesc::Standard(earth_material()))
            .unwrap();
        let err = backend
            .update_material(id, &MaterialDesc::Points(StarLayer::BRIGHT.material()))
            .unwrap_err();
        assert!(matches!(err, BackendError::Resource(_)));

        let mut desc = earth_material();
        desc.roughness = 0.9;
        backend
            .update_material(id, &MaterialDesc::Standard(desc))
            .unwrap();
    }

    #[test]
    fn test_offscreen_render_follows_attach_state() {
        let Some(mut backend) = offscreen_backend() else {
            return;
        };
        let sphere = backend
            .create_geometry(&Geometry::Mesh(uv_sphere(1.0, 16, 8)))
            .unwrap();
        let material = backend
            .create_material(&MaterialDesc::Standard(earth_material()))
            .unwrap();
        let lights: Vec<LightId> = light_rig(false)
            .iter()
            .map(|l| backend.create_light(l).unwrap())
            .collect();
        let items = [DrawItem {
            geometry: sphere,
            material,
            model: Mat4::IDENTITY,
        }];

        assert!(matches!(
            backend.render(&frame(&items, &lights)),
            Err(BackendError::NotAttached)
        ));

        backend.attach_output(SurfaceSize::new(64, 48)).unwrap();
        assert_eq!(backend.output_size(), Some(SurfaceSize::new(64, 48)));
        backend.render(&frame(&items, &lights)).unwrap();

        backend.resize_output(SurfaceSize::new(32, 32));
        assert_eq!(backend.output_size(), Some(SurfaceSize::new(32, 32)));
        backend.render(&frame(&items, &lights)).unwrap();

        backend.detach_output();
        assert_eq!(backend.output_size(), None);
        assert!(matches!(
            backend.render(&frame(&items, &lights)),
            Err(BackendError::NotAttached)
        ));
    }

    #[test]
    fn test_mismatched_geometry_and_material_fail_to_render() {
        let Some(mut backend) = offscreen_backend() else {
            return;
        };
        let stars = backend
            .create_geometry(&Geometry::Points(StarLayer::MID.generate(3)))
            .unwrap();
        let material = backend
            .create_material(&MaterialDesc::Standard(earth_material()))
            .unwrap();
        backend.attach_output(SurfaceSize::new(16, 16)).unwrap();

        let items = [DrawItem {
            geometry: stars,
            material,
            model: Mat4::IDENTITY,
        }];
        assert!(matches!(
            backend.render(&frame(&items, &[])),
            Err(BackendError::Render(_))
        ));

        backend.release(material.into());
        assert!(matches!(
            backend.render(&frame(&items, &[])),
            Err(BackendError::UnknownResource(ResourceId::Material(_)))
        ));
    }
}
