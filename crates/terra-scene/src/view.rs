//! The Earth scene lifecycle.
//!
//! [`EarthView::open`] acquires every resource the scene needs and records it;
//! [`EarthView::close`] releases exactly what was recorded. Frames and resize
//! events arriving while closed are ignored.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use glam::{EulerRot, Mat4, Vec3};
use terra_config::{SceneConfig, TextureSet};
use terra_planets::PlanetRecord;

use crate::backend::{
    BackendError, DrawItem, FrameDesc, Geometry, LightId, MaterialDesc, MaterialId,
    RenderBackend, StandardMaterial,
};
use crate::camera::Camera;
use crate::controls::OrbitControls;
use crate::frame::{FrameHandle, FrameScheduler};
use crate::host::{ListenerId, SurfaceHost, SurfaceSize};
use crate::lights::light_rig;
use crate::material::earth_material;
use crate::overlay::OverlayPanel;
use crate::resources::SceneResources;
use crate::sphere::uv_sphere;
use crate::starfield::StarLayer;
use crate::textures::{requests_for, LoadState, TextureLoadTracker, TextureLoader, TextureSource};

/// Radians added to the planet's Y rotation every frame.
const SPIN_PER_FRAME: f32 = 0.0005;
const WOBBLE_RATE: f64 = 0.0005 * 0.001;
const WOBBLE_AMPLITUDE: f32 = 0.02;

const SPHERE_SEGMENTS: u32 = 32;
const CAMERA_FOV_DEGREES: f32 = 75.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 1000.0;
const CAMERA_DISTANCE: f32 = 2.0;
const CLEAR_COLOR: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("Render backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("The Earth view is not open")]
    AlreadyClosed,
}

/// What to build when the view opens.
#[derive(Debug, Clone)]
pub struct SceneOptions {
    pub textures: TextureSet,
    /// Longest the loading indicator waits for textures.
    pub texture_timeout: Duration,
    /// Seed for the first star layer; later layers use the following seeds.
    pub star_seed: u64,
    /// Add the back and fill point lights.
    pub fill_lights: bool,
    pub orbit_controls: bool,
}

impl SceneOptions {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            textures: config.textures.clone(),
            texture_timeout: Duration::from_millis(config.texture_timeout_ms),
            star_seed: config.star_seed,
            fill_lights: config.fill_lights,
            orbit_controls: config.orbit_controls,
        }
    }
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self::from_config(&SceneConfig::default())
    }
}

/// Everything acquired so far, in a form that can be released at any point.
#[derive(Debug, Default)]
struct Acquired {
    resources: SceneResources,
    listener: Option<ListenerId>,
    attached: bool,
}

struct Planet {
    item: DrawItem,
    material: StandardMaterial,
    rotation: Vec3,
}

struct OpenScene {
    acquired: Acquired,
    camera: Camera,
    controls: Option<OrbitControls>,
    planet: Planet,
    stars: Vec<DrawItem>,
    lights: Vec<LightId>,
    loader: Option<TextureLoader>,
    tracker: TextureLoadTracker,
    opened_at: Instant,
    /// Wall clock at open, in milliseconds since the epoch.
    epoch_ms_at_open: f64,
}

impl OpenScene {
    fn clock_ms(&self, now: Instant) -> f64 {
        self.epoch_ms_at_open + now.saturating_duration_since(self.opened_at).as_secs_f64() * 1000.0
    }
}

/// A rotating Earth over a starfield, drawn through `B` into `H`.
pub struct EarthView<B: RenderBackend, H: SurfaceHost> {
    backend: B,
    host: H,
    options: SceneOptions,
    texture_source: Arc<dyn TextureSource>,
    planet: Option<PlanetRecord>,
    frames: FrameScheduler,
    scene: Option<OpenScene>,
}

impl<B: RenderBackend, H: SurfaceHost> EarthView<B, H> {
    /// A closed view. Nothing is acquired until [`open`](Self::open).
    pub fn new(
        backend: B,
        host: H,
        options: SceneOptions,
        texture_source: Arc<dyn TextureSource>,
    ) -> Self {
        Self {
            backend,
            host,
            options,
            texture_source,
            planet: None,
            frames: FrameScheduler::new(),
            scene: None,
        }
    }

    /// Build the scene, start texture loads and request the first frame.
    ///
    /// Opening an open view closes it first. On failure everything acquired
    /// so far is released and the view stays closed.
    pub fn open(&mut self) -> Result<(), SceneError> {
        if self.scene.is_some() {
            tracing::debug!("Earth view already open, reopening");
            self.close();
        }

        let opened_at = Instant::now();
        let mut acquired = Acquired::default();
        let built = build(&mut self.backend, &mut self.host, &self.options, &mut acquired);
        let (camera, planet, stars, lights) = match built {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!("Failed to open Earth view: {e}");
                rollback(&mut self.backend, &mut self.host, acquired);
                return Err(e.into());
            }
        };
        let listener = self.host.add_resize_listener();
        acquired.listener = Some(listener);

        let controls = self
            .options
            .orbit_controls
            .then(|| OrbitControls::new(camera.position, camera.target));

        let loader = TextureLoader::spawn(
            Arc::clone(&self.texture_source),
            requests_for(&self.options.textures),
        );
        let tracker =
            TextureLoadTracker::new(loader.expected(), opened_at, self.options.texture_timeout);
        let epoch_ms_at_open = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0);

        tracing::info!(
            resources = acquired.resources.len(),
            textures = loader.expected(),
            "Earth view opened"
        );

        self.scene = Some(OpenScene {
            acquired,
            camera,
            controls,
            planet,
            stars,
            lights,
            loader: Some(loader),
            tracker,
            opened_at,
            epoch_ms_at_open,
        });

        let handle = self.frames.request();
        self.host.request_frame(handle);
        Ok(())
    }

    /// Stop the frame loop and release everything `open` acquired.
    /// Closing a closed view does nothing.
    pub fn close(&mut self) {
        let Some(mut scene) = self.scene.take() else {
            return;
        };

        if let Some(handle) = self.frames.cancel() {
            self.host.cancel_frame(handle);
        }
        if let Some(listener) = scene.acquired.listener.take()
            && !self.host.remove_resize_listener(listener)
        {
            tracing::warn!("Resize listener {listener:?} was already removed");
        }
        scene.acquired.resources.release_all(&mut self.backend);
        scene.loader = None;
        if scene.acquired.attached {
            self.backend.detach_output();
        }

        tracing::info!("Earth view closed");
    }

    /// Run the frame `handle`.
    ///
    /// Returns `Ok(false)` when the view is closed or `handle` is not the
    /// pending request, in which case nothing happens.
    pub fn on_frame(&mut self, handle: FrameHandle, now: Instant) -> Result<bool, SceneError> {
        let Some(scene) = self.scene.as_mut() else {
            tracing::trace!("Frame {handle:?} arrived after close");
            return Ok(false);
        };
        if !self.frames.take(handle) {
            tracing::trace!("Ignoring stale frame {handle:?}");
            return Ok(false);
        }

        apply_textures(&mut self.backend, scene);
        scene.tracker.poll(now);

        scene.planet.rotation.y += SPIN_PER_FRAME;
        let wobble = (scene.clock_ms(now) * WOBBLE_RATE).sin() as f32;
        scene.planet.rotation.x = wobble * WOBBLE_AMPLITUDE;
        if let Some(controls) = scene.controls.as_mut() {
            scene.camera.position = controls.update();
        }

        let next = self.frames.request();
        self.host.request_frame(next);

        draw(&mut self.backend, scene)?;
        Ok(true)
    }

    /// Draw the current state again without advancing it.
    pub fn redraw(&mut self) -> Result<(), SceneError> {
        let scene = self.scene.as_mut().ok_or(SceneError::AlreadyClosed)?;
        draw(&mut self.backend, scene)?;
        Ok(())
    }

    /// The host surface changed size.
    pub fn on_resize(&mut self, size: SurfaceSize) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let size = size.clamped();
        scene
            .camera
            .set_aspect_ratio(size.width as f32, size.height as f32);
        self.backend.resize_output(size);
        tracing::debug!(width = size.width, height = size.height, "Earth view resized");
    }

    pub fn is_open(&self) -> bool {
        self.scene.is_some()
    }

    /// The loading indicator is showing.
    pub fn is_loading(&self) -> bool {
        self.scene.as_ref().is_some_and(|s| s.tracker.is_loading())
    }

    pub fn load_state(&self) -> Option<LoadState> {
        self.scene.as_ref().map(|s| s.tracker.state())
    }

    /// Show `planet` in the overlay. Does not touch the renderer.
    pub fn set_planet(&mut self, planet: Option<PlanetRecord>) {
        self.planet = planet;
    }

    pub fn planet(&self) -> Option<&PlanetRecord> {
        self.planet.as_ref()
    }

    pub fn overlay(&self) -> Option<OverlayPanel> {
        self.planet.as_ref().map(OverlayPanel::from_record)
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.scene.as_ref().map(|s| &s.camera)
    }

    pub fn controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.scene.as_mut().and_then(|s| s.controls.as_mut())
    }

    /// Euler angles (XYZ order) of the planet mesh.
    pub fn planet_rotation(&self) -> Option<Vec3> {
        self.scene.as_ref().map(|s| s.planet.rotation)
    }

    pub fn planet_material(&self) -> Option<MaterialId> {
        self.scene.as_ref().map(|s| s.planet.item.material)
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.frames.pending()
    }

    pub fn options(&self) -> &SceneOptions {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<B: RenderBackend, H: SurfaceHost> Drop for EarthView<B, H> {
    fn drop(&mut self) {
        self.close();
    }
}

type Built = (Camera, Planet, Vec<DrawItem>, Vec<LightId>);

/// Acquire the output target and every GPU resource, recording each in
/// `acquired` as soon as it exists.
fn build<B: RenderBackend, H: SurfaceHost>(
    backend: &mut B,
    host: &mut H,
    options: &SceneOptions,
    acquired: &mut Acquired,
) -> Result<Built, BackendError> {
    let size = host.size().clamped();
    backend.attach_output(size)?;
    acquired.attached = true;

    let camera = Camera::looking_at_origin(
        CAMERA_FOV_DEGREES,
        size.aspect_ratio(),
        CAMERA_NEAR,
        CAMERA_FAR,
        CAMERA_DISTANCE,
    );

    let resources = &mut acquired.resources;
    let mesh = uv_sphere(1.0, SPHERE_SEGMENTS, SPHERE_SEGMENTS);
    let geometry = resources.track(backend.create_geometry(&Geometry::Mesh(mesh))?);
    let material = earth_material();
    let material_id =
        resources.track(backend.create_material(&MaterialDesc::Standard(material.clone()))?);
    let planet = Planet {
        item: DrawItem {
            geometry,
            material: material_id,
            model: Mat4::IDENTITY,
        },
        material,
        rotation: Vec3::ZERO,
    };

    let mut stars = Vec::with_capacity(StarLayer::ALL.len());
    for (i, layer) in StarLayer::ALL.iter().enumerate() {
        let cloud = layer.generate(options.star_seed.wrapping_add(i as u64));
        let geometry = resources.track(backend.create_geometry(&Geometry::Points(cloud))?);
        let material =
            resources.track(backend.create_material(&MaterialDesc::Points(layer.material()))?);
        stars.push(DrawItem {
            geometry,
            material,
            model: Mat4::IDENTITY,
        });
    }

    let mut lights = Vec::new();
    for light in light_rig(options.fill_lights) {
        lights.push(resources.track(backend.create_light(&light)?));
    }

    Ok((camera, planet, stars, lights))
}

fn rollback<B: RenderBackend, H: SurfaceHost>(
    backend: &mut B,
    host: &mut H,
    mut acquired: Acquired,
) {
    if let Some(listener) = acquired.listener.take() {
        host.remove_resize_listener(listener);
    }
    acquired.resources.release_all(backend);
    if acquired.attached {
        backend.detach_output();
    }
}

/// Upload finished textures and bind them to the planet material.
fn apply_textures<B: RenderBackend>(backend: &mut B, scene: &mut OpenScene) {
    let Some(loader) = scene.loader.as_mut() else {
        return;
    };

    for result in loader.drain() {
        let uploaded = result
            .texture
            .map_err(|e| e.to_string())
            .and_then(|data| backend.create_texture(&data).map_err(|e| e.to_string()));
        match uploaded {
            Ok(id) => {
                scene.acquired.resources.track(id);
                scene.planet.material.bind(result.slot, id);
                let desc = MaterialDesc::Standard(scene.planet.material.clone());
                if let Err(e) = backend.update_material(scene.planet.item.material, &desc) {
                    tracing::warn!("Failed to bind {:?} texture: {e}", result.slot);
                }
                tracing::debug!(path = %result.path, "Applied {:?} texture", result.slot);
                scene.tracker.record(true);
            }
            Err(e) => {
                tracing::warn!("Failed to load Earth texture {}: {e}", result.path);
                scene.tracker.record(false);
            }
        }
    }

    if loader.is_finished() {
        scene.loader = None;
    }
}

fn draw<B: RenderBackend>(backend: &mut B, scene: &OpenScene) -> Result<(), BackendError> {
    let r = scene.planet.rotation;
    let planet = DrawItem {
        model: Mat4::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
        ..scene.planet.item
    };

    let mut items = Vec::with_capacity(scene.stars.len() + 1);
    items.extend_from_slice(&scene.stars);
    items.push(planet);

    backend.render(&FrameDesc {
        view_proj: scene.camera.view_projection_matrix(),
        camera_position: scene.camera.position,
        clear_color: CLEAR_COLOR,
        items: &items,
        lights: &scene.lights,
    })
}
