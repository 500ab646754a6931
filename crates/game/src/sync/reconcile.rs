use glam::Vec3;

use crate::error::PhysicsError;
use crate::net::NetworkStatus;
use crate::physics::PhysicsWorld;
use crate::registry::{AuthorityMode, ObjectKind, ObjectRegistry, SimObject};

use super::adaptive::AdaptiveParams;
use super::buffer::{ServerSnapshot, UpdateBuffers};
use super::config::ReconcileConfig;

// Share of the positional error pushed into the body while the visual snaps.
const DEAD_ZONE_FORCE_SCALE: f32 = 0.5;

/// What the reconciler decided for one object on one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Branch {
    /// Static geometry mirrors its body.
    Static,
    /// Local-only object mirrors its body.
    LocalOnly,
    /// Server-only object placed at the newest reported position.
    ServerDriven,
    /// No usable server data; the body is trusted.
    LocalFallback,
    /// Snapshot had a velocity but no position.
    VelocityOnly,
    Teleport { velocity_reset: bool },
    DeadZone { force: Vec3 },
    Blend { progress: f32, force: Vec3 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReconcileReport {
    pub static_objects: u32,
    pub local_only: u32,
    pub server_driven: u32,
    pub local_fallback: u32,
    pub velocity_only: u32,
    pub teleports: u32,
    pub dead_zone: u32,
    pub blended: u32,
    pub failed: u32,
    pub params: Option<AdaptiveParams>,
}

impl ReconcileReport {
    pub fn record(&mut self, branch: Branch) {
        match branch {
            Branch::Static => self.static_objects += 1,
            Branch::LocalOnly => self.local_only += 1,
            Branch::ServerDriven => self.server_driven += 1,
            Branch::LocalFallback => self.local_fallback += 1,
            Branch::VelocityOnly => self.velocity_only += 1,
            Branch::Teleport { .. } => self.teleports += 1,
            Branch::DeadZone { .. } => self.dead_zone += 1,
            Branch::Blend { .. } => self.blended += 1,
        }
    }

    pub fn merge(&mut self, other: &ReconcileReport) {
        self.static_objects += other.static_objects;
        self.local_only += other.local_only;
        self.server_driven += other.server_driven;
        self.local_fallback += other.local_fallback;
        self.velocity_only += other.velocity_only;
        self.teleports += other.teleports;
        self.dead_zone += other.dead_zone;
        self.blended += other.blended;
        self.failed += other.failed;
        if other.params.is_some() {
            self.params = other.params;
        }
    }

    pub fn reconciled(&self) -> u32 {
        self.static_objects
            + self.local_only
            + self.server_driven
            + self.local_fallback
            + self.velocity_only
            + self.teleports
            + self.dead_zone
            + self.blended
    }
}

/// Per-tick link state shared by every object in one pass.
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    pub now_ms: f64,
    pub connected: bool,
    pub params: AdaptiveParams,
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ReconcileConfig {
        &mut self.config
    }

    pub fn tick_context(&self, network: &dyn NetworkStatus, now_ms: f64) -> TickContext {
        TickContext {
            now_ms,
            connected: network.is_connected(),
            params: self.config.adaptive_params(network.current_ping_ms()),
        }
    }

    /// Reconciles every registered object. A failing object is logged and skipped.
    pub fn reconcile_all(
        &self,
        registry: &mut ObjectRegistry,
        physics: &mut PhysicsWorld,
        buffers: &UpdateBuffers,
        network: &dyn NetworkStatus,
        now_ms: f64,
    ) -> ReconcileReport {
        let ctx = self.tick_context(network, now_ms);
        let mut report = ReconcileReport {
            params: Some(ctx.params),
            ..Default::default()
        };

        for object in registry.objects_mut() {
            let latest = buffers.latest(&object.id);
            match self.reconcile_object(object, physics, latest, &ctx) {
                Ok(branch) => report.record(branch),
                Err(e) => {
                    log::warn!("Skipping {} this tick: {}", object.id, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    pub fn reconcile_object(
        &self,
        object: &mut SimObject,
        physics: &mut PhysicsWorld,
        latest: Option<&ServerSnapshot>,
        ctx: &TickContext,
    ) -> Result<Branch, PhysicsError> {
        let handle = object.body();
        let body_position = physics
            .body_position(handle)
            .ok_or_else(|| PhysicsError::MissingBody(object.id.clone()))?;

        let branch = match (&object.kind, object.authority) {
            (ObjectKind::Terrain(_), _) => {
                object.visual.position = body_position;
                Branch::Static
            }
            (_, AuthorityMode::LocalOnly) => {
                object.visual.position = body_position;
                Branch::LocalOnly
            }
            (_, AuthorityMode::ServerOnly) => {
                match latest.and_then(|s| s.position) {
                    Some(server) => {
                        physics.set_body_position(handle, server);
                        object.visual.position = server;
                    }
                    None => object.visual.position = body_position,
                }
                Branch::ServerDriven
            }
            (_, AuthorityMode::Hybrid) => {
                self.reconcile_hybrid(object, physics, body_position, latest, ctx)
            }
        };

        if let Some(rotation) = physics.body_rotation(handle) {
            object.visual.orientation = rotation;
        }

        Ok(branch)
    }

    fn reconcile_hybrid(
        &self,
        object: &mut SimObject,
        physics: &mut PhysicsWorld,
        body_position: Vec3,
        latest: Option<&ServerSnapshot>,
        ctx: &TickContext,
    ) -> Branch {
        let handle = object.body();
        let since_update = latest
            .map(|s| (ctx.now_ms - s.received_at_ms).max(0.0))
            .unwrap_or(f64::INFINITY);

        let usable = latest.filter(|_| ctx.connected && since_update <= self.config.network_timeout_ms);
        let Some(snapshot) = usable else {
            object.visual.position = body_position;
            physics.activate(handle);
            return Branch::LocalFallback;
        };

        if let Some(velocity) = snapshot.velocity {
            physics.set_body_velocity(handle, velocity);
        }

        let Some(server) = snapshot.position else {
            object.visual.position = body_position;
            return Branch::VelocityOnly;
        };

        let delta = server - body_position;
        let distance = delta.length();

        if distance > ctx.params.teleport_threshold {
            physics.set_body_position(handle, server);
            object.visual.position = server;

            let velocity_reset = since_update > 2.0 * self.config.update_interval_ms;
            if velocity_reset {
                physics.set_body_velocity(handle, Vec3::ZERO);
            }
            log::debug!(
                "Teleported {} by {:.2} (velocity reset: {})",
                object.id,
                distance,
                velocity_reset
            );
            Branch::Teleport { velocity_reset }
        } else if distance < self.config.dead_zone {
            object.visual.position = server;
            let force = delta * DEAD_ZONE_FORCE_SCALE;
            physics.set_central_force(handle, force);
            Branch::DeadZone { force }
        } else {
            let progress = (since_update / self.config.update_interval_ms).min(1.0) as f32;
            object.visual.position = body_position.lerp(server, progress);

            let force = delta * ctx.params.correction_strength;
            physics.set_central_force(handle, force);
            physics.activate(handle);
            Branch::Blend { progress, force }
        }
    }
}
