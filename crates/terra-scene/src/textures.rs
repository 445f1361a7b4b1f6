//! Background texture loading for the planet material.
//!
//! Each request is fetched and decoded on its own worker thread; the frame loop drains
//! finished results with [`TextureLoader::drain`]. [`TextureLoadTracker`]
//! decides when the scene stops reporting itself as loading.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use terra_config::TextureSet;

use crate::backend::TextureData;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("Failed to read texture {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to fetch texture {url}: {message}")]
    Http { url: String, message: String },
    #[error("Failed to decode texture {path}: {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },
}

/// Which material input a texture feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    /// Diffuse colour, sampled as sRGB.
    Color,
    /// Drives metalness and roughness.
    Specular,
    Normal,
}

impl TextureSlot {
    pub fn is_srgb(self) -> bool {
        matches!(self, Self::Color)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRequest {
    pub slot: TextureSlot,
    /// Path relative to the source root.
    pub path: String,
}

/// The loads a texture set asks for, colour first.
pub fn requests_for(set: &TextureSet) -> Vec<TextureRequest> {
    match set {
        TextureSet::Detailed {
            day,
            specular,
            normal,
        } => {
            let mut requests = vec![TextureRequest {
                slot: TextureSlot::Color,
                path: day.clone(),
            }];
            if let Some(path) = specular {
                requests.push(TextureRequest {
                    slot: TextureSlot::Specular,
                    path: path.clone(),
                });
            }
            if let Some(path) = normal {
                requests.push(TextureRequest {
                    slot: TextureSlot::Normal,
                    path: path.clone(),
                });
            }
            requests
        }
        TextureSet::Legacy { land } => vec![TextureRequest {
            slot: TextureSlot::Color,
            path: land.clone(),
        }],
    }
}

/// Where encoded texture bytes come from.
pub trait TextureSource: Send + Sync {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, TextureError>;
}

/// Reads textures from a directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TextureSource for FileSource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, TextureError> {
        let path = self.root.join(path);
        std::fs::read(&path).map_err(|source| TextureError::Io { path, source })
    }
}

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const HTTP_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches textures over HTTP from a base URL.
#[derive(Clone)]
pub struct HttpSource {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new()
                .timeout_connect(HTTP_CONNECT_TIMEOUT)
                .timeout_read(HTTP_READ_TIMEOUT)
                .build(),
        }
    }
}

impl TextureSource for HttpSource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, TextureError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let response = self.agent.get(&url).call().map_err(|e| TextureError::Http {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut response.into_reader(), &mut bytes).map_err(|e| {
            TextureError::Http {
                url,
                message: e.to_string(),
            }
        })?;
        Ok(bytes)
    }
}

/// An HTTP source for `http(s)://` roots, a directory otherwise.
pub fn source_for(root: &str) -> Arc<dyn TextureSource> {
    if root.starts_with("http://") || root.starts_with("https://") {
        Arc::new(HttpSource::new(root))
    } else {
        Arc::new(FileSource::new(root))
    }
}

/// Decode encoded image bytes into RGBA8.
pub fn decode(path: &str, bytes: &[u8], srgb: bool) -> Result<TextureData, TextureError> {
    let image = image::load_from_memory(bytes).map_err(|source| TextureError::Decode {
        path: path.to_string(),
        source,
    })?;
    let rgba = image.to_rgba8();
    Ok(TextureData {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
        srgb,
    })
}

/// A finished load.
#[derive(Debug)]
pub struct TextureResult {
    pub slot: TextureSlot,
    pub path: String,
    pub texture: Result<TextureData, TextureError>,
}

/// Loads a batch of textures, one worker thread per request.
///
/// Requests are independent: a slow fetch holds back only its own slot.
pub struct TextureLoader {
    result_receiver: crossbeam_channel::Receiver<TextureResult>,
    expected: usize,
    received: usize,
    workers: Vec<JoinHandle<()>>,
}

impl TextureLoader {
    pub fn spawn(source: Arc<dyn TextureSource>, requests: Vec<TextureRequest>) -> Self {
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        let mut workers = Vec::with_capacity(requests.len());
        for request in requests {
            let source = Arc::clone(&source);
            let result_tx = result_tx.clone();
            let slot = request.slot;
            let spawned = thread::Builder::new()
                .name(format!("terra-texture-{slot:?}").to_lowercase())
                .spawn(move || {
                    let texture = source
                        .fetch(&request.path)
                        .and_then(|bytes| decode(&request.path, &bytes, request.slot.is_srgb()));
                    // Receiver gone: the scene closed and nobody wants the result.
                    let _ = result_tx.send(TextureResult {
                        slot: request.slot,
                        path: request.path,
                        texture,
                    });
                });
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => tracing::error!("Failed to spawn {slot:?} texture worker: {e}"),
            }
        }

        Self {
            result_receiver: result_rx,
            expected: workers.len(),
            received: 0,
            workers,
        }
    }

    /// Requests the workers are expected to answer.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Collect every finished result without blocking.
    pub fn drain(&mut self) -> Vec<TextureResult> {
        let results: Vec<TextureResult> = self.result_receiver.try_iter().collect();
        self.received += results.len();
        results
    }

    /// Every request has been answered.
    pub fn is_finished(&self) -> bool {
        self.received >= self.expected
    }
}

impl Drop for TextureLoader {
    fn drop(&mut self) {
        // Workers still blocked on a fetch are left detached; their send
        // fails once the channel is closed.
        for worker in self.workers.drain(..) {
            if worker.is_finished() {
                let _ = worker.join();
            }
        }
    }
}

/// Loading progress as seen by the loading indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    /// Every texture arrived.
    Complete,
    /// A texture failed; the rest are no longer waited for.
    Failed,
    /// The timeout elapsed first.
    TimedOut,
}

/// Settles on whichever comes first: all textures in, a failure, or the timeout.
/// Once settled it never returns to loading.
#[derive(Debug, Clone)]
pub struct TextureLoadTracker {
    remaining: usize,
    deadline: Instant,
    state: LoadState,
}

impl TextureLoadTracker {
    pub fn new(expected: usize, started_at: Instant, timeout: Duration) -> Self {
        Self {
            remaining: expected,
            deadline: started_at + timeout,
            state: if expected == 0 {
                LoadState::Complete
            } else {
                LoadState::Loading
            },
        }
    }

    /// Note one finished load.
    pub fn record(&mut self, succeeded: bool) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.state != LoadState::Loading {
            return;
        }
        if !succeeded {
            self.state = LoadState::Failed;
        } else if self.remaining == 0 {
            self.state = LoadState::Complete;
        }
    }

    /// Apply the timeout as of `now`.
    pub fn poll(&mut self, now: Instant) {
        if self.state == LoadState::Loading && now >= self.deadline {
            self.state = LoadState::TimedOut;
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }
}
