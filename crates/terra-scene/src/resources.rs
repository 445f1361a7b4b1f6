//! Ledger of backend resources acquired by an open scene.

use crate::backend::{GeometryId, LightId, MaterialId, RenderBackend, TextureId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceId {
    Geometry(GeometryId),
    Material(MaterialId),
    Texture(TextureId),
    Light(LightId),
}

impl From<GeometryId> for ResourceId {
    fn from(id: GeometryId) -> Self {
        Self::Geometry(id)
    }
}

impl From<MaterialId> for ResourceId {
    fn from(id: MaterialId) -> Self {
        Self::Material(id)
    }
}

impl From<TextureId> for ResourceId {
    fn from(id: TextureId) -> Self {
        Self::Texture(id)
    }
}

impl From<LightId> for ResourceId {
    fn from(id: LightId) -> Self {
        Self::Light(id)
    }
}

/// Every resource acquired since the scene opened, in acquisition order.
#[derive(Debug, Default)]
pub struct SceneResources {
    acquired: Vec<ResourceId>,
}

impl SceneResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` and hand it back.
    pub fn track<T: Copy + Into<ResourceId>>(&mut self, id: T) -> T {
        self.acquired.push(id.into());
        id
    }

    pub fn len(&self) -> usize {
        self.acquired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acquired.is_empty()
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.acquired.contains(&id)
    }

    /// Release everything, newest first.
    pub fn release_all(&mut self, backend: &mut impl RenderBackend) {
        while let Some(id) = self.acquired.pop() {
            backend.release(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Geometry, Light, PointCloud};
    use crate::headless::HeadlessBackend;
    use glam::Vec3;

    #[test]
    fn test_release_all_empties_backend() {
        let mut backend = HeadlessBackend::new();
        let mut resources = SceneResources::new();

        let geometry = resources.track(
            backend
                .create_geometry(&Geometry::Points(PointCloud::default()))
                .unwrap(),
        );
        resources.track(
            backend
                .create_light(&Light::Ambient {
                    color: Vec3::ONE,
                    intensity: 1.0,
                })
                .unwrap(),
        );
        assert_eq!(resources.len(), 2);
        assert!(resources.contains(ResourceId::Geometry(geometry)));
        assert_eq!(backend.live_resources(), 2);

        resources.release_all(&mut backend);
        assert!(resources.is_empty());
        assert_eq!(backend.live_resources(), 0);
    }

    #[test]
    fn test_release_order_is_newest_first() {
        let mut backend = HeadlessBackend::new();
        let mut resources = SceneResources::new();
        let first = resources.track(
            backend
                .create_geometry(&Geometry::Points(PointCloud::default()))
                .unwrap(),
        );
        let second = resources.track(
            backend
                .create_geometry(&Geometry::Points(PointCloud::default()))
                .unwrap(),
        );

        resources.release_all(&mut backend);
        assert_eq!(backend.released(), &[
            ResourceId::Geometry(second),
            ResourceId::Geometry(first),
        ]);
    }
}
