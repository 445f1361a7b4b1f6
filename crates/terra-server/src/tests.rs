//! End-to-end tests against a live server on an ephemeral port.

use std::sync::Arc;

use terra_planets::{PlanetQuery, ProviderError, StaticProvider};

use crate::PlanetServer;
use crate::routes::Routes;

fn start(query: PlanetQuery, public_dir: &std::path::Path) -> PlanetServer {
    let mut server = PlanetServer::new("127.0.0.1", 0);
    server.start(Routes::new(query, public_dir)).unwrap();
    server
}

/// GET returning status and parsed JSON body, for both success and error statuses.
fn get_json(port: u16, path: &str) -> (u16, serde_json::Value) {
    let response = match ureq::get(&format!("http://127.0.0.1:{port}{path}")).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(e) => panic!("request failed: {e}"),
    };
    let status = response.status();
    let body: serde_json::Value = response.into_json().unwrap();
    (status, body)
}

#[test]
fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(PlanetQuery::new(Ok(Arc::new(StaticProvider))), dir.path());

    let (status, body) = get_json(server.actual_port(), "/health");
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider_configured"], true);
}

#[test]
fn test_mars_returns_earth_then_mars() {
    struct Solar;
    impl terra_planets::PlanetProvider for Solar {
        fn fetch(&self, name: &str) -> Result<Vec<terra_planets::PlanetRecord>, ProviderError> {
            Ok(match name {
                "Earth" => vec![terra_planets::PlanetRecord::earth()],
                "Mars" => vec![terra_planets::PlanetRecord::named("Mars")],
                _ => vec![],
            })
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let server = start(PlanetQuery::new(Ok(Arc::new(Solar))), dir.path());
    let port = server.actual_port();

    let (status, body) = get_json(port, "/api/planets?name=Mars");
    assert_eq!(status, 200);
    let planets = body["planets"].as_array().unwrap();
    assert_eq!(planets.len(), 2);
    assert_eq!(planets[0]["name"], "Earth");
    assert_eq!(planets[0]["isEarth"], true);
    assert_eq!(planets[1]["name"], "Mars");
    assert_eq!(planets[1]["isEarth"], false);
    assert!(body.get("message").is_none());

    let (status, body) = get_json(port, "/api/planets?name=Zzyx");
    assert_eq!(status, 200);
    assert_eq!(body["message"], "No planets found matching 'Zzyx'");
    assert_eq!(body["planets"].as_array().unwrap().len(), 1);
    assert_eq!(body["planets"][0]["isEarth"], true);
}

#[test]
fn test_default_name_is_earth() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(PlanetQuery::new(Ok(Arc::new(StaticProvider))), dir.path());

    let (status, body) = get_json(server.actual_port(), "/api/planets");
    assert_eq!(status, 200);
    assert_eq!(body["planets"].as_array().unwrap().len(), 1);
    assert_eq!(body["planets"][0]["temperature"], 288.0);
    assert_eq!(body["planets"][0]["isEarth"], true);
}

#[test]
fn test_missing_key_is_500_for_every_name() {
    let dir = tempfile::tempdir().unwrap();
    let query = PlanetQuery::new(Err(ProviderError::ConfigurationMissing {
        env_var: "API_NINJAS_KEY".to_string(),
    }));
    let server = start(query, dir.path());
    let port = server.actual_port();

    for path in ["/api/planets", "/api/planets?name=Earth", "/api/planets?name=Mars"] {
        let (status, body) = get_json(port, path);
        assert_eq!(status, 500, "{path}");
        assert!(body["error"].as_str().unwrap().contains("API_NINJAS_KEY"));
    }

    let (_, health) = get_json(port, "/health");
    assert_eq!(health["provider_configured"], false);
}

#[test]
fn test_texture_and_unknown_routes() {
    let dir = tempfile::tempdir().unwrap();
    let earth = dir.path().join("textures/earth");
    std::fs::create_dir_all(&earth).unwrap();
    std::fs::write(earth.join("earth_normal.jpg"), b"normal-map").unwrap();

    let server = start(PlanetQuery::new(Ok(Arc::new(StaticProvider))), dir.path());
    let base = format!("http://127.0.0.1:{}", server.actual_port());

    let response = ureq::get(&format!("{base}/textures/earth/earth_normal.jpg"))
        .call()
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.content_type(), "image/jpeg");
    assert_eq!(response.into_string().unwrap(), "normal-map");

    for path in ["/nope", "/textures/earth/missing.jpg"] {
        match ureq::get(&format!("{base}{path}")).call() {
            Err(ureq::Error::Status(404, _)) => {}
            other => panic!("{path}: expected 404, got {other:?}"),
        }
    }

    match ureq::post(&format!("{base}/api/planets")).call() {
        Err(ureq::Error::Status(404, _)) => {}
        other => panic!("expected 404 for POST, got {other:?}"),
    }
}

#[test]
fn test_bind_conflict_is_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let mut server = PlanetServer::new("127.0.0.1", port);
    let dir = tempfile::tempdir().unwrap();
    let result = server.start(Routes::new(
        PlanetQuery::new(Ok(Arc::new(StaticProvider))),
        dir.path(),
    ));
    assert!(matches!(result, Err(crate::ServerError::BindError { .. })));
}
