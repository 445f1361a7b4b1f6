//! In-memory backend and host that record what the scene asks of them.
//!
//! Used by the lifecycle tests and for running the scene without a GPU.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::backend::{
    BackendError, FrameDesc, Geometry, GeometryId, Light, LightId, MaterialDesc, MaterialId,
    RenderBackend, TextureData, TextureId,
};
use crate::frame::FrameHandle;
use crate::host::{ListenerId, SurfaceHost, SurfaceSize};
use crate::resources::ResourceId;
use crate::textures::{TextureError, TextureSource};

/// Summary of one rendered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub items: usize,
    pub lights: usize,
    pub camera_position: glam::Vec3,
}

/// Backend that hands out ids and keeps descriptors in maps.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    output: Option<SurfaceSize>,
    geometries: BTreeMap<GeometryId, Geometry>,
    materials: BTreeMap<MaterialId, MaterialDesc>,
    textures: BTreeMap<TextureId, (u32, u32)>,
    lights: BTreeMap<LightId, Light>,
    released: Vec<ResourceId>,
    resizes: Vec<SurfaceSize>,
    frames: Vec<RenderedFrame>,
    creations: usize,
    fail_at_creation: Option<usize>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose `n`th resource creation (0-based) fails.
    pub fn failing_at(n: usize) -> Self {
        Self {
            fail_at_creation: Some(n),
            ..Self::default()
        }
    }

    pub fn resizes(&self) -> &[SurfaceSize] {
        &self.resizes
    }

    pub fn frames(&self) -> &[RenderedFrame] {
        &self.frames
    }

    pub fn released(&self) -> &[ResourceId] {
        &self.released
    }

    pub fn material(&self, id: MaterialId) -> Option<&MaterialDesc> {
        self.materials.get(&id)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(&id)
    }

    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.lights.values()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn next(&mut self) -> Result<u64, BackendError> {
        let index = self.creations;
        self.creations += 1;
        if self.fail_at_creation == Some(index) {
            return Err(BackendError::Resource(format!(
                "injected failure at creation {index}"
            )));
        }
        self.next_id += 1;
        Ok(self.next_id)
    }
}

impl RenderBackend for HeadlessBackend {
    fn attach_output(&mut self, size: SurfaceSize) -> Result<(), BackendError> {
        self.output = Some(size.clamped());
        Ok(())
    }

    fn resize_output(&mut self, size: SurfaceSize) {
        let size = size.clamped();
        self.resizes.push(size);
        if self.output.is_some() {
            self.output = Some(size);
        }
    }

    fn detach_output(&mut self) {
        self.output = None;
    }

    fn output_size(&self) -> Option<SurfaceSize> {
        self.output
    }

    fn create_geometry(&mut self, geometry: &Geometry) -> Result<GeometryId, BackendError> {
        let id = GeometryId(self.next()?);
        self.geometries.insert(id, geometry.clone());
        Ok(id)
    }

    fn create_material(&mut self, material: &MaterialDesc) -> Result<MaterialId, BackendError> {
        let id = MaterialId(self.next()?);
        self.materials.insert(id, material.clone());
        Ok(id)
    }

    fn update_material(
        &mut self,
        id: MaterialId,
        material: &MaterialDesc,
    ) -> Result<(), BackendError> {
        match self.materials.get_mut(&id) {
            Some(slot) => {
                *slot = material.clone();
                Ok(())
            }
            None => Err(BackendError::UnknownResource(ResourceId::Material(id))),
        }
    }

    fn create_texture(&mut self, texture: &TextureData) -> Result<TextureId, BackendError> {
        let id = TextureId(self.next()?);
        self.textures.insert(id, (texture.width, texture.height));
        Ok(id)
    }

    fn create_light(&mut self, light: &Light) -> Result<LightId, BackendError> {
        let id = LightId(self.next()?);
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
        if removed {
            self.released.push(id);
        }
    }

    fn render(&mut self, frame: &FrameDesc<'_>) -> Result<(), BackendError> {
        if self.output.is_none() {
            return Err(BackendError::NotAttached);
        }
        for item in frame.items {
            if !self.geometries.contains_key(&item.geometry) {
                return Err(BackendError::UnknownResource(item.geometry.into()));
            }
            if !self.materials.contains_key(&item.material) {
                return Err(BackendError::UnknownResource(item.material.into()));
            }
        }
        self.frames.push(RenderedFrame {
            items: frame.items.len(),
            lights: frame.lights.len(),
            camera_position: frame.camera_position,
        });
        Ok(())
    }

    fn live_resources(&self) -> usize {
        self.geometries.len() + self.materials.len() + self.textures.len() + self.lights.len()
    }
}

/// Host with a settable size that records listener and frame bookkeeping.
#[derive(Debug)]
pub struct HeadlessHost {
    size: SurfaceSize,
    next_listener: u64,
    listeners: BTreeSet<u64>,
    requested: Option<FrameHandle>,
    cancelled: Vec<FrameHandle>,
}

impl HeadlessHost {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            next_listener: 0,
            listeners: BTreeSet::new(),
            requested: None,
            cancelled: Vec::new(),
        }
    }

    pub fn set_size(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    /// The frame the scene asked for, consumed.
    pub fn take_frame_request(&mut self) -> Option<FrameHandle> {
        self.requested.take()
    }

    pub fn requested_frame(&self) -> Option<FrameHandle> {
        self.requested
    }

    pub fn cancelled(&self) -> &[FrameHandle] {
        &self.cancelled
    }
}

impl SurfaceHost for HeadlessHost {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        self.next_listener += 1;
        self.listeners.insert(self.next_listener);
        ListenerId(self.next_listener)
    }

    fn remove_resize_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id.0)
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn request_frame(&mut self, handle: FrameHandle) {
        self.requested = Some(handle);
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.requested == Some(handle) {
            self.requested = None;
        }
        self.cancelled.push(handle);
    }
}

/// Texture source serving encoded images from memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.files.insert(path.into(), bytes);
        self
    }
}

impl TextureSource for MemorySource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, TextureError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| TextureError::Io {
                path: path.into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not in memory source"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PointCloud;

    #[test]
    fn test_injected_failure_hits_one_creation() {
        let mut backend = HeadlessBackend::failing_at(1);
        let points = Geometry::Points(PointCloud::default());
        assert!(backend.create_geometry(&points).is_ok());
        assert!(backend.create_geometry(&points).is_err());
        assert!(backend.create_geometry(&points).is_ok());
        assert_eq!(backend.live_resources(), 2);
    }

    #[test]
    fn test_release_unknown_is_ignored() {
        let mut backend = HeadlessBackend::new();
        backend.release(ResourceId::Light(LightId(99)));
        assert!(backend.released().is_empty());
    }

    #[test]
    fn test_render_requires_output() {
        let mut backend = HeadlessBackend::new();
        let frame = FrameDesc {
            view_proj: glam::Mat4::IDENTITY,
            camera_position: glam::Vec3::ZERO,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            items: &[],
            lights: &[],
        };
        assert!(matches!(backend.render(&frame), Err(BackendError::NotAttached)));
        backend.attach_output(SurfaceSize::new(0, 10)).unwrap();
        assert_eq!(backend.output_size(), Some(SurfaceSize::new(1, 10)));
        assert!(backend.render(&frame).is_ok());
    }

    #[test]
    fn test_host_listener_bookkeeping() {
        let mut host = HeadlessHost::new(SurfaceSize::new(640, 480));
        let a = host.add_resize_listener();
        let b = host.add_resize_listener();
        assert_ne!(a, b);
        assert_eq!(host.listener_count(), 2);
        assert!(host.remove_resize_listener(a));
        assert!(!host.remove_resize_listener(a));
        assert_eq!(host.listener_count(), 1);
    }
}
