//! Terra viewer: a window that fetches the planet record and shows it as a
//! rotating Earth.

pub mod client;
pub mod page;
pub mod platform;
pub mod window;

pub use client::{ClientError, PlanetClient};
pub use page::{PageShell, PageState};
pub use window::{ViewerApp, WindowHost, run};
