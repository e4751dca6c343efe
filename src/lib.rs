//! Project Bookmarks
//!
//! Bookmarks local project folders and keeps a background-measured folder
//! size for each one.

pub mod core;
pub mod logging;
pub mod service;
pub mod sizing;
pub mod storage;

pub use service::{ProjectService, ServiceError, SizeReport};
