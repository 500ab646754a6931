mod adaptive;
mod buffer;
mod config;
mod reconcile;

pub use adaptive::{adapt, AdaptiveParams, MAX_PING_MS, MIN_BLEND_FACTOR, PING_KNEE_MS};
pub use buffer::{ServerSnapshot, UpdateBuffer, UpdateBuffers};
pub use config::{
    ReconcileConfig, DEAD_ZONE, DEFAULT_UPDATE_INTERVAL_MS, NETWORK_TIMEOUT_MS,
    UPDATE_BUFFER_CAPACITY,
};
pub use reconcile::{Branch, ReconcileReport, Reconciler, TickContext};
