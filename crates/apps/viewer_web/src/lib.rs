pub mod config;
pub mod controller;
pub mod search;
pub mod tile_cache;
pub mod ui;
#[cfg(target_arch = "wasm32")]
mod web;

pub use config::{ElementIds, ViewerConfig};
pub use controller::Viewer;
pub use search::{SearchIndex, SearchUi};
pub use tile_cache::TileCache;
pub use ui::{MemoryUi, MessageTone, UiHost};
