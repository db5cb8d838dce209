// Application state for HTTP handlers
use crate::infrastructure::broadcast_surface::BroadcastSurface;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub surface: Arc<BroadcastSurface>,
    pub decimation_samples: usize,
}
