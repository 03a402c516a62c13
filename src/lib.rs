pub mod api;
pub mod app;
pub mod cache;
pub mod charts;
pub mod chat;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod portal;
pub mod progress;
pub mod render;
pub mod session;
pub mod state;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use portal::Portal;
pub use state::AppState;
