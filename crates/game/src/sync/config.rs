use super::adaptive::AdaptiveParams;

pub const NETWORK_TIMEOUT_MS: f64 = 150.0;
pub const DEAD_ZONE: f32 = 0.05;
pub const DEFAULT_UPDATE_INTERVAL_MS: f64 = 50.0;
pub const UPDATE_BUFFER_CAPACITY: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileConfig {
    /// Snapshots older than this no longer steer the body.
    pub network_timeout_ms: f64,
    pub dead_zone: f32,
    /// Nominal gap between server updates.
    pub update_interval_ms: f64,
    pub base: AdaptiveParams,
    pub buffer_capacity: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            network_timeout_ms: NETWORK_TIMEOUT_MS,
            dead_zone: DEAD_ZONE,
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            base: AdaptiveParams::default(),
            buffer_capacity: UPDATE_BUFFER_CAPACITY,
        }
    }
}

impl ReconcileConfig {
    pub fn with_update_interval(mut self, update_interval_ms: f64) -> Self {
        self.update_interval_ms = update_interval_ms;
        self
    }

    pub fn adaptive_params(&self, ping_ms: f32) -> AdaptiveParams {
        super::adaptive::adapt(ping_ms, self.base, self.update_interval_ms as f32)
    }
}
