//! HTTP front end: upload M4A files, download their MP3 segments as a zip.

pub mod api;
pub mod archive;
pub mod state;

pub use api::create_router;
pub use state::AppState;
