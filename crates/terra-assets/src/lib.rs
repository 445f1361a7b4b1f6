//! Offline asset generation for the Earth viewer.

pub mod clouds;

pub use clouds::{CloudCanvas, CloudError, CloudParams, Disc};
