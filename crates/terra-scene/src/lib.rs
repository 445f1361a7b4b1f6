//! The Earth scene: a textured, slowly rotating planet over a layered
//! starfield, with an explicit open/close resource scope.
//!
//! Rendering goes through the [`RenderBackend`] seam and presentation through
//! [`SurfaceHost`], so the lifecycle can be driven by a real window and GPU or
//! by the [`headless`] implementations in tests.

pub mod backend;
pub mod camera;
pub mod controls;
pub mod frame;
pub mod headless;
pub mod host;
pub mod lights;
pub mod material;
pub mod overlay;
pub mod resources;
pub mod sphere;
pub mod starfield;
pub mod textures;
pub mod view;

pub use backend::{
    BackendError, DrawItem, FrameDesc, Geometry, GeometryId, Light, LightId, MaterialDesc,
    MaterialId, MeshData, PointCloud, PointsMaterial, RenderBackend, StandardMaterial,
    TextureData, TextureId,
};
pub use camera::Camera;
pub use controls::OrbitControls;
pub use frame::{FrameHandle, FrameScheduler};
pub use host::{ListenerId, SurfaceHost, SurfaceSize};
pub use overlay::OverlayPanel;
pub use resources::{ResourceId, SceneResources};
pub use textures::{
    source_for, FileSource, HttpSource, LoadState, TextureError, TextureLoadTracker, TextureSlot,
    TextureSource,
};
pub use view::{EarthView, SceneError, SceneOptions};
