//! Request routing, kept free of socket handling so it can be tested directly.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use terra_planets::PlanetQuery;

/// A response before it is handed to tiny_http.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(e) => {
                tracing::error!("Failed to serialize response: {e}");
                Self::text(500, "Internal Server Error")
            }
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.as_bytes().to_vec(),
        }
    }

    fn not_found() -> Self {
        Self::text(404, "Not Found")
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    provider_configured: bool,
}

/// Everything a request handler may read.
pub struct Routes {
    query: PlanetQuery,
    public_dir: PathBuf,
}

impl Routes {
    pub fn new(query: PlanetQuery, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            query,
            public_dir: public_dir.into(),
        }
    }

    /// Dispatch a GET request by its raw URL (path plus optional query string).
    pub fn get(&self, url: &str) -> Reply {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));

        match path {
            "/api/planets" => {
                let name = query_param(query, "name");
                let response = self.query.handle(name.as_deref());
                tracing::info!(
                    name = name.as_deref().unwrap_or(""),
                    status = response.status,
                    "GET /api/planets"
                );
                Reply::json(response.status, &response.body)
            }
            "/health" => Reply::json(200, &HealthResponse {
                status: "ok",
                provider_configured: self.query.is_configured(),
            }),
            _ => match path.strip_prefix("/textures/") {
                Some(relative) => self.texture(relative),
                None => Reply::not_found(),
            },
        }
    }

    fn texture(&self, relative: &str) -> Reply {
        let Some(path) = resolve_asset(&self.public_dir.join("textures"), relative) else {
            tracing::warn!(path = relative, "Rejected texture path");
            return Reply::not_found();
        };

        match std::fs::read(&path) {
            Ok(body) => Reply {
                status: 200,
                content_type: content_type(&path),
                body,
            },
            Err(e) => {
                tracing::debug!("Texture {} not served: {e}", path.display());
                Reply::not_found()
            }
        }
    }
}

/// First value of `key` in a urlencoded query string.
pub fn query_param(query: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Join `relative` under `root`, refusing anything that is not a plain
/// descending path.
pub fn resolve_asset(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    let mut components = relative.components().peekable();
    components.peek()?;
    if components.all(|c| matches!(c, Component::Normal(_))) {
        Some(root.join(relative))
    } else {
        None
    }
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
