use crate::portal::Portal;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle to the single portal instance.
///
/// Handlers hold the lock for a whole action, network calls included, so
/// user events are processed one at a time.
#[derive(Clone)]
pub struct AppState {
    pub portal: Arc<Mutex<Portal>>,
}

impl AppState {
    pub fn new(portal: Portal) -> Self {
        Self {
            portal: Arc::new(Mutex::new(portal)),
        }
    }
}
