//! Window creation and event handling via winit.
//!
//! [`ViewerApp`] implements winit's [`ApplicationHandler`]. It polls the
//! [`PageShell`] until the planet record arrives, then mounts an
//! [`EarthView`] drawing through [`WgpuBackend`] into a [`WindowHost`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use terra_config::Config;
use terra_planets::PlanetRecord;
use terra_render::{WgpuBackend, init_render_context_blocking};
use terra_scene::{
    EarthView, FrameHandle, ListenerId, SceneOptions, SurfaceHost, SurfaceSize, source_for,
};
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::client::PlanetClient;
use crate::page::{PageShell, PageState};

/// Status shown while the scene is up but its textures are still loading.
pub const LOADING_SCENE_STATUS: &str = "Loading Earth visualization...";

/// How often the event loop wakes to check on the planet fetch.
const PAGE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Pixel scroll distance treated as one wheel notch.
const PIXELS_PER_LINE: f64 = 50.0;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

/// Resize listeners and the outstanding frame request of a host.
#[derive(Debug, Default)]
pub struct HostState {
    next_listener: u64,
    listeners: BTreeSet<u64>,
    requested: Option<FrameHandle>,
}

impl HostState {
    fn add_listener(&mut self) -> ListenerId {
        self.next_listener += 1;
        self.listeners.insert(self.next_listener);
        ListenerId(self.next_listener)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id.0)
    }

    fn cancel(&mut self, handle: FrameHandle) {
        if self.requested == Some(handle) {
            self.requested = None;
        }
    }
}

/// A winit window as the scene's presentation surface.
///
/// Frame requests become `request_redraw` calls; the handle is collected
/// again when `RedrawRequested` arrives.
pub struct WindowHost {
    window: Arc<Window>,
    state: HostState,
}

impl WindowHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            state: HostState::default(),
        }
    }

    /// The pending frame request, consumed.
    pub fn take_frame_request(&mut self) -> Option<FrameHandle> {
        self.state.requested.take()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl SurfaceHost for WindowHost {
    fn size(&self) -> SurfaceSize {
        let size = self.window.inner_size();
        SurfaceSize::new(size.width, size.height)
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        self.state.add_listener()
    }

    fn remove_resize_listener(&mut self, id: ListenerId) -> bool {
        self.state.remove_listener(id)
    }

    fn listener_count(&self) -> usize {
        self.state.listeners.len()
    }

    fn request_frame(&mut self, handle: FrameHandle) {
        self.state.requested = Some(handle);
        self.window.request_redraw();
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.state.cancel(handle);
    }
}

/// Left-button drag tracking.
#[derive(Debug, Default, Clone, Copy)]
pub struct PointerDrag {
    pressed: bool,
    last: Option<(f64, f64)>,
}

impl PointerDrag {
    pub fn set_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
    }

    pub fn release(&mut self) {
        self.pressed = false;
        self.last = None;
    }

    /// Record a cursor move; returns the drag delta while the button is held.
    pub fn move_to(&mut self, x: f64, y: f64) -> Option<(f32, f32)> {
        let previous = self.last.replace((x, y));
        if !self.pressed {
            return None;
        }
        previous.map(|(px, py)| ((x - px) as f32, (y - py) as f32))
    }
}

/// Wheel notches from a scroll event; positive scrolls away from the user.
pub fn scroll_steps(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
    }
}

type Scene = EarthView<WgpuBackend, WindowHost>;

/// The viewer: page shell first, Earth scene once the record is in.
pub struct ViewerApp {
    config: Config,
    page: PageShell,
    window: Option<Arc<Window>>,
    /// Created with the window, handed to the scene when it mounts.
    backend: Option<WgpuBackend>,
    view: Option<Scene>,
    scene_error: Option<String>,
    pointer: PointerDrag,
    title: String,
}

impl ViewerApp {
    pub fn new(config: Config, page: PageShell) -> Self {
        let title = config.window.title.clone();
        Self {
            config,
            page,
            window: None,
            backend: None,
            view: None,
            scene_error: None,
            pointer: PointerDrag::default(),
            title,
        }
    }

    pub fn page(&self) -> &PageShell {
        &self.page
    }

    /// What the window title currently reports after the app name.
    pub fn status_line(&self) -> String {
        if let Some(e) = &self.scene_error {
            return format!("Error: {e}");
        }
        match &self.view {
            Some(view) if view.is_loading() => LOADING_SCENE_STATUS.to_string(),
            Some(view) => view
                .overlay()
                .map(|overlay| overlay.summary_line())
                .unwrap_or_else(|| self.page.status_text()),
            None => self.page.status_text(),
        }
    }

    fn mount_scene(&mut self, record: PlanetRecord) {
        let Some(window) = self.window.clone() else {
            return;
        };
        let Some(backend) = self.backend.take() else {
            return;
        };
        let options = SceneOptions::from_config(&self.config.scene);
        let source = source_for(&self.config.scene.texture_root);
        let mut view = EarthView::new(backend, WindowHost::new(window), options, source);
        view.set_planet(Some(record));

        match view.open() {
            Ok(()) => {
                if let Some(overlay) = view.overlay() {
                    info!("Showing planet:\n{overlay}");
                }
                self.view = Some(view);
            }
            Err(e) => {
                error!("Failed to open Earth scene: {e}");
                self.scene_error = Some(e.to_string());
            }
        }
    }

    fn refresh_title(&mut self) {
        let title = format!("{} - {}", self.config.window.title, self.status_line());
        if title != self.title
            && let Some(window) = &self.window
        {
            window.set_title(&title);
            self.title = title;
        }
    }

    fn unmount_scene(&mut self) {
        if let Some(mut view) = self.view.take() {
            view.close();
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(window_attributes_from_config(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let backend = init_render_context_blocking(window.clone(), self.config.window.vsync)
            .map_err(|e| e.to_string())
            .and_then(|ctx| WgpuBackend::new(ctx).map_err(|e| e.to_string()));
        match backend {
            Ok(backend) => self.backend = Some(backend),
            Err(e) => {
                error!("GPU initialization failed: {e}");
                event_loop.exit();
                return;
            }
        }

        let size = window.inner_size();
        info!(
            "Window created: {}x{} (scale: {:.2})",
            size.width,
            size.height,
            window.scale_factor()
        );
        self.window = Some(window);
        self.refresh_title();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.unmount_scene();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(view) = &mut self.view {
                    view.on_resize(SurfaceSize::new(size.width, size.height));
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(view) = &mut self.view
                    && let Some(handle) = view.host_mut().take_frame_request()
                    && let Err(e) = view.on_frame(handle, Instant::now())
                {
                    error!("Frame failed: {e}");
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => self.pointer.set_pressed(true),
                ElementState::Released => self.pointer.set_pressed(false),
            },
            WindowEvent::CursorLeft { .. } => self.pointer.release(),
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((dx, dy)) = self.pointer.move_to(position.x, position.y)
                    && let Some(view) = &mut self.view
                {
                    let height = view.host().size().clamped().height as f32;
                    if let Some(controls) = view.controls_mut() {
                        controls.rotate_by_pixels(dx, dy, height);
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(controls) = self.view.as_mut().and_then(|v| v.controls_mut()) {
                    controls.zoom(scroll_steps(delta));
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.page.poll();
        if self.view.is_none()
            && self.scene_error.is_none()
            && let PageState::Ready(record) = self.page.state()
        {
            let record = record.clone();
            self.mount_scene(record);
        }
        self.refresh_title();

        if self.page.state().is_loading() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(
                Instant::now() + PAGE_POLL_INTERVAL,
            ));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.view.is_some() {
            warn!("Event loop exiting with the scene still open");
            self.unmount_scene();
        }
    }
}

/// Mount the page shell, open the window and run until it is closed.
pub fn run(config: Config) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    let client = PlanetClient::new(config.scene.api_base_url.clone());
    let page = PageShell::mount(client, config.scene.planet_name.clone());
    let mut app = ViewerApp::new(config, page);
    event_loop.run_app(&mut app)
}
