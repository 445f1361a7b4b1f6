//! The renderer seam.
//!
//! A [`RenderBackend`] owns an output target attached to a host surface and a
//! set of GPU resources addressed by typed ids. The scene never touches GPU
//! objects directly.

use glam::{Mat4, Vec3};

use crate::host::SurfaceSize;
use crate::resources::ResourceId;

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);
    };
}

resource_id!(
    /// Vertex data (a mesh or a point cloud).
    GeometryId
);
resource_id!(
    /// Shading parameters and texture bindings.
    MaterialId
);
resource_id!(
    /// An uploaded RGBA image.
    TextureId
);
resource_id!(
    /// A light contributing to [`StandardMaterial`] shading.
    LightId
);

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("No output target is attached")]
    NotAttached,
    #[error("Unknown resource {0:?}")]
    UnknownResource(ResourceId),
    #[error("Failed to create resource: {0}")]
    Resource(String),
    #[error("Render failed: {0}")]
    Render(String),
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Unindexed points with a colour and size each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    pub sizes: Vec<f32>,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Mesh(MeshData),
    Points(PointCloud),
}

/// Lit physically-based surface.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    pub color: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
    pub normal_scale: f32,
    /// Diffuse colour map, sRGB.
    pub map: Option<TextureId>,
    /// Drives both metalness and roughness.
    pub specular_map: Option<TextureId>,
    pub normal_map: Option<TextureId>,
}

/// Unlit sprites for a [`PointCloud`].
#[derive(Debug, Clone, PartialEq)]
pub struct PointsMaterial {
    /// Nominal point size in world units; per-point sizes come from the cloud.
    pub size: f32,
    pub size_attenuation: bool,
    pub vertex_colors: bool,
    pub transparent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialDesc {
    Standard(StandardMaterial),
    Points(PointsMaterial),
}

/// Decoded image ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows.
    pub rgba: Vec<u8>,
    /// Colour data (sampled as sRGB) rather than linear data such as normals.
    pub srgb: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Ambient {
        color: Vec3,
        intensity: f32,
    },
    /// Infinitely distant light shining from `position` towards the origin.
    Directional {
        color: Vec3,
        intensity: f32,
        position: Vec3,
    },
    Hemisphere {
        sky: Vec3,
        ground: Vec3,
        intensity: f32,
    },
    Point {
        color: Vec3,
        intensity: f32,
        position: Vec3,
    },
}

/// One mesh or point cloud to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub model: Mat4,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameDesc<'a> {
    pub view_proj: Mat4,
    pub camera_position: Vec3,
    pub clear_color: [f64; 4],
    pub items: &'a [DrawItem],
    pub lights: &'a [LightId],
}

/// Renderer used by the Earth scene.
pub trait RenderBackend {
    /// Create the output target at `size` and attach it to the host surface.
    fn attach_output(&mut self, size: SurfaceSize) -> Result<(), BackendError>;

    /// Replace the output target (and depth buffer) with one of `size`.
    fn resize_output(&mut self, size: SurfaceSize);

    /// Drop the output target.
    fn detach_output(&mut self);

    fn output_size(&self) -> Option<SurfaceSize>;

    fn create_geometry(&mut self, geometry: &Geometry) -> Result<GeometryId, BackendError>;

    fn create_material(&mut self, material: &MaterialDesc) -> Result<MaterialId, BackendError>;

    fn update_material(
        &mut self,
        id: MaterialId,
        material: &MaterialDesc,
    ) -> Result<(), BackendError>;

    fn create_texture(&mut self, texture: &TextureData) -> Result<TextureId, BackendError>;

    fn create_light(&mut self, light: &Light) -> Result<LightId, BackendError>;

    /// Release a resource. Unknown ids are ignored.
    fn release(&mut self, id: ResourceId);

    fn render(&mut self, frame: &FrameDesc<'_>) -> Result<(), BackendError>;

    /// Number of resources created and not yet released, output target excluded.
    fn live_resources(&self) -> usize;
}

impl<T: RenderBackend + ?Sized> RenderBackend for &mut T {
    fn attach_output(&mut self, size: SurfaceSize) -> Result<(), BackendError> {
        (**self).attach_output(size)
    }

    fn resize_output(&mut self, size: SurfaceSize) {
        (**self).resize_output(size);
    }

    fn detach_output(&mut self) {
        (**self).detach_output();
    }

    fn output_size(&self) -> Option<SurfaceSize> {
        (**self).output_size()
    }

    fn create_geometry(&mut self, geometry: &Geometry) -> Result<GeometryId, BackendError> {
        (**self).create_geometry(geometry)
    }

    fn create_material(&mut self, material: &MaterialDesc) -> Result<MaterialId, BackendError> {
        (**self).create_material(material)
    }

    fn update_material(
        &mut self,
        id: MaterialId,
        material: &MaterialDesc,
    ) -> Result<(), BackendError> {
        (**self).update_material(id, material)
    }

    fn create_texture(&mut self, texture: &TextureData) -> Result<TextureId, BackendError> {
        (**self).create_texture(texture)
    }

    fn create_light(&mut self, light: &Light) -> Result<LightId, BackendError> {
        (**self).create_light(light)
    }

    fn release(&mut self, id: ResourceId) {
        (**self).release(id);
    }

    fn render(&mut self, frame: &FrameDesc<'_>) -> Result<(), BackendError> {
        (**self).render(frame)
    }

    fn live_resources(&self) -> usize {
        (**self).live_resources()
    }
}
