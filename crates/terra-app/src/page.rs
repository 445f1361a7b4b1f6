//! The page shell: fetch the planet record once, then show it or an error.

use std::thread;

use crossbeam_channel::{Receiver, TryRecvError};
use terra_planets::PlanetRecord;

use crate::client::{ClientError, PlanetClient};

pub type FetchResult = Result<Vec<PlanetRecord>, ClientError>;

/// Where the shell is. `Ready` and `Error` are terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum PageState {
    Loading,
    Ready(PlanetRecord),
    Error(String),
}

impl PageState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Owns the single planet fetch and its outcome.
///
/// Dropping the shell drops the receiving end; a fetch still in flight
/// finishes on its own thread and its result is discarded.
#[derive(Debug)]
pub struct PageShell {
    planet_name: String,
    state: PageState,
    results: Option<Receiver<FetchResult>>,
}

impl PageShell {
    /// Mount the shell and start fetching `planet_name` in the background.
    pub fn mount(client: PlanetClient, planet_name: impl Into<String>) -> Self {
        let planet_name = planet_name.into();
        let (tx, rx) = crossbeam_channel::bounded(1);
        let name = planet_name.clone();

        let spawned = thread::Builder::new()
            .name("planet-fetch".into())
            .spawn(move || {
                tracing::debug!(base_url = client.base_url(), %name, "Fetching planet data");
                // The shell may already be gone.
                let _ = tx.send(client.fetch(&name));
            });

        match spawned {
            Ok(_) => Self::from_receiver(planet_name, rx),
            Err(e) => Self {
                planet_name,
                state: PageState::Error(e.to_string()),
                results: None,
            },
        }
    }

    /// A loading shell fed by `results`.
    pub fn from_receiver(planet_name: impl Into<String>, results: Receiver<FetchResult>) -> Self {
        Self {
            planet_name: planet_name.into(),
            state: PageState::Loading,
            results: Some(results),
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn planet_name(&self) -> &str {
        &self.planet_name
    }

    /// Check for the fetch outcome. Returns `true` when the state changed.
    pub fn poll(&mut self) -> bool {
        let Some(results) = &self.results else {
            return false;
        };
        let outcome = match results.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => {
                Err(ClientError::Transport("planet fetch ended without a result".into()))
            }
        };
        self.results = None;
        self.state = settle(&self.planet_name, outcome);
        match &self.state {
            PageState::Ready(record) => tracing::info!(planet = %record.name, "Planet data ready"),
            PageState::Error(message) => {
                tracing::error!("Error fetching {} data: {message}", self.planet_name);
            }
            PageState::Loading => {}
        }
        true
    }

    /// What the page shows while no scene is mounted.
    pub fn status_text(&self) -> String {
        match &self.state {
            PageState::Loading => format!("Loading {} data...", self.planet_name),
            PageState::Ready(record) => record.name.clone(),
            PageState::Error(message) => format!("Error: {message}"),
        }
    }
}

/// The state a finished fetch leads to.
pub fn settle(planet_name: &str, outcome: FetchResult) -> PageState {
    match outcome {
        Ok(planets) => match planets.into_iter().next() {
            Some(first) => PageState::Ready(first),
            None => PageState::Error(format!("No {planet_name} data found in the response")),
        },
        Err(ClientError::Status(status)) => {
            PageState::Error(format!("Failed to fetch {planet_name} data: {status}"))
        }
        Err(e) => PageState::Error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::fake_service;
    use std::time::{Duration, Instant};

    fn poll_until_settled(shell: &mut PageShell) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while shell.state().is_loading() {
            assert!(Instant::now() < deadline, "fetch never settled");
            shell.poll();
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_first_record_becomes_ready() {
        let mars = PlanetRecord::named("Mars");
        let state = settle("Earth", Ok(vec![PlanetRecord::earth(), mars]));
        assert_eq!(state, PageState::Ready(PlanetRecord::earth()));
    }

    #[test]
    fn test_empty_result_is_error() {
        assert_eq!(
            settle("Earth", Ok(Vec::new())),
            PageState::Error("No Earth data found in the response".into())
        );
    }

    #[test]
    fn test_status_failure_message() {
        assert_eq!(
            settle("Earth", Err(ClientError::Status(500))),
            PageState::Error("Failed to fetch Earth data: 500".into())
        );
    }

    #[test]
    fn test_transport_failure_keeps_its_message() {
        let state = settle("Earth", Err(ClientError::Transport("connection refused".into())));
        assert_eq!(state, PageState::Error("connection refused".into()));
    }

    #[test]
    fn test_shell_starts_loading_and_settles_once() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut shell = PageShell::from_receiver("Earth", rx);
        assert!(shell.state().is_loading());
        assert_eq!(shell.status_text(), "Loading Earth data...");
        assert!(!shell.poll());

        tx.send(Ok(vec![PlanetRecord::earth().tagged(true)])).unwrap();
        assert!(shell.poll());
        assert!(matches!(shell.state(), PageState::Ready(r) if r.name == "Earth"));

        // Terminal: nothing further is read.
        assert!(!shell.poll());
    }

    #[test]
    fn test_worker_gone_without_result_is_error() {
        let (tx, rx) = crossbeam_channel::bounded::<FetchResult>(1);
        drop(tx);
        let mut shell = PageShell::from_receiver("Earth", rx);
        assert!(shell.poll());
        assert!(matches!(shell.state(), PageState::Error(_)));
        assert!(shell.status_text().starts_with("Error: "));
    }

    #[test]
    fn test_mount_fetches_from_service() {
        let body = serde_json::json!({ "planets": [PlanetRecord::earth().tagged(true)] }).to_string();
        let (url, requests) = fake_service(vec![(200, body)]);

        let mut shell = PageShell::mount(PlanetClient::new(url), "Earth");
        poll_until_settled(&mut shell);

        assert!(matches!(shell.state(), PageState::Ready(r) if r.is_reference()));
        assert_eq!(requests.recv().unwrap(), "/api/planets?name=Earth");
    }

    #[test]
    fn test_mount_reports_service_error() {
        let (url, _requests) = fake_service(vec![(500, r#"{"error":"x"}"#.to_string())]);

        let mut shell = PageShell::mount(PlanetClient::new(url), "Earth");
        poll_until_settled(&mut shell);

        assert_eq!(
            shell.state(),
            &PageState::Error("Failed to fetch Earth data: 500".into())
        );
    }

    #[test]
    fn test_unmount_before_result_is_harmless() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let shell = PageShell::from_receiver("Earth", rx);
        drop(shell);
        assert!(tx.send(Ok(Vec::new())).is_err());
    }
}
