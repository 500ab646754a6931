use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::physics::{BodyMaterial, GRAVITY};
use crate::sync::ReconcileConfig;

pub const DEFAULT_TICK_RATE: u32 = 60;
pub const DEFAULT_PLAYER_ID: &str = "mainPlayer1";

/// Tuning pushed by the server in a `physics_config` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub base_impulse: f32,
    pub max_impulse: f32,
    pub max_speed: f32,
    pub restitution: f32,
    pub friction: f32,
    pub gravity_x: f32,
    pub gravity_y: f32,
    pub gravity_z: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            base_impulse: 8.0,
            max_impulse: 50.0,
            max_speed: 80.0,
            restitution: 0.9,
            friction: 0.05,
            gravity_x: GRAVITY.x,
            gravity_y: GRAVITY.y,
            gravity_z: GRAVITY.z,
        }
    }
}

impl PhysicsConfig {
    pub fn gravity(&self) -> Vec3 {
        Vec3::new(self.gravity_x, self.gravity_y, self.gravity_z)
    }

    /// Surface parameters for dynamic bodies created after this config arrived.
    pub fn material(&self) -> BodyMaterial {
        BodyMaterial {
            friction: self.friction,
            restitution: self.restitution,
            ..BodyMaterial::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub tick_rate: u32,
    /// Server id of the sphere driven by local input.
    pub player_id: String,
    pub reconcile: ReconcileConfig,
    /// Minimum gap between locally applied impulses.
    pub input_debounce_ms: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            player_id: DEFAULT_PLAYER_ID.to_string(),
            reconcile: ReconcileConfig::default(),
            input_debounce_ms: 10.0,
        }
    }
}
