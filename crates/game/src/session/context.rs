use glam::Vec3;

use crate::config::{ClientConfig, PhysicsConfig};
use crate::error::{ProtocolError, SyncError};
use crate::input::{Command, InputOutcome, LocalInput};
use crate::net::{
    BatchUpdate, ClientMessage, CommandAck, ConnectionMonitor, CreateObject, NetworkStatus,
    ServerMessage, UpdateBody,
};
use crate::physics::PhysicsWorld;
use crate::registry::{ObjectId, ObjectKind, ObjectRegistry, SimObject};
use crate::sync::{ReconcileReport, Reconciler, UpdateBuffers};

use super::gate::{GameGate, GateEvent, GateState};
use super::timestep::FixedTimestep;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub steps: u32,
    pub gate: GateState,
    pub reconcile: ReconcileReport,
}

/// Everything one client simulation owns: the physics world, objects, server state and link.
pub struct Session {
    config: ClientConfig,
    physics: PhysicsWorld,
    registry: ObjectRegistry,
    buffers: UpdateBuffers,
    reconciler: Reconciler,
    gate: GameGate,
    timestep: FixedTimestep,
    physics_config: PhysicsConfig,
    monitor: ConnectionMonitor,
    input: LocalInput,
    pending: Vec<ObjectId>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Session {
    pub fn new(config: ClientConfig) -> Self {
        let physics_config = PhysicsConfig::default();
        let timestep = FixedTimestep::new(config.tick_rate);
        let mut physics = PhysicsWorld::with_timestep(timestep.dt());
        physics.set_gravity(physics_config.gravity());

        Self {
            physics,
            registry: ObjectRegistry::new(),
            buffers: UpdateBuffers::new(config.reconcile.buffer_capacity),
            reconciler: Reconciler::new(config.reconcile.clone()),
            gate: GameGate::new(),
            timestep,
            physics_config,
            monitor: ConnectionMonitor::new(),
            input: LocalInput::new(config.input_debounce_ms),
            pending: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn buffers(&self) -> &UpdateBuffers {
        &self.buffers
    }

    pub fn gate(&self) -> GateState {
        self.gate.state()
    }

    pub fn physics_config(&self) -> &PhysicsConfig {
        &self.physics_config
    }

    pub fn monitor(&self) -> &ConnectionMonitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut ConnectionMonitor {
        &mut self.monitor
    }

    pub fn object(&self, id: &str) -> Option<&SimObject> {
        self.registry.get(id)
    }

    pub fn player(&self) -> Option<&SimObject> {
        self.registry.get(&self.config.player_id)
    }

    pub fn pending(&self) -> &[ObjectId] {
        &self.pending
    }

    /// Decodes and applies one text frame from the server.
    pub fn handle_text(&mut self, text: &str, now_ms: f64) -> Result<(), SyncError> {
        let message = ServerMessage::parse(text)?;
        self.handle_message(message, now_ms)
    }

    pub fn handle_message(&mut self, message: ServerMessage, now_ms: f64) -> Result<(), SyncError> {
        log::trace!("Handling {}", message.kind());
        match message {
            ServerMessage::Create(create) => self.on_create(create, now_ms),
            ServerMessage::Update(update) => {
                if let Some(server_time) = update.body.timestamp {
                    self.monitor.observe_server_time(server_time, now_ms);
                }
                self.on_update(&update.id, &update.body, now_ms);
                Ok(())
            }
            ServerMessage::BatchUpdate(batch) => {
                self.on_batch(batch, now_ms);
                Ok(())
            }
            ServerMessage::Remove(remove) => self.remove(&remove.id),
            ServerMessage::Pong(pong) => {
                self.monitor
                    .on_pong(pong.client_time, pong.server_time, now_ms);
                Ok(())
            }
            ServerMessage::CmdAck(ack) => {
                self.on_ack(ack, now_ms);
                Ok(())
            }
            ServerMessage::PhysicsConfig { config } => {
                self.apply_physics_config(config);
                Ok(())
            }
        }
    }

    fn on_create(&mut self, create: CreateObject, now_ms: f64) -> Result<(), SyncError> {
        if let Some(server_time) = create.server_time {
            self.monitor.observe_server_time(server_time, now_ms);
        }

        let spec = match create.to_spec(self.physics_config.material()) {
            Ok(spec) => spec,
            Err(ProtocolError::UnsupportedKind(kind)) => {
                log::debug!("Skipping {} ({}): no physics body", create.id, kind);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let is_terrain = matches!(spec.kind, ObjectKind::Terrain(_));
        let is_player = spec.id == self.config.player_id;
        let position = spec.position;

        let object = self.registry.spawn(&mut self.physics, spec, now_ms)?;
        object.server_position = Some(position);
        let id = object.id.clone();
        log::info!("Created {} {} at {}", create.object_type, id, position);

        if !self.gate.is_ready() {
            self.pending.push(id);
        }

        let opened = match (is_terrain, is_player) {
            (true, _) => self.gate.signal(GateEvent::TerrainReady),
            (false, true) => self.gate.signal(GateEvent::PlayerReady),
            (false, false) => false,
        };
        if opened {
            self.activate_pending();
        }
        Ok(())
    }

    fn on_update(&mut self, id: &str, body: &UpdateBody, now_ms: f64) {
        let Some(object) = self.registry.get_mut(id) else {
            log::trace!("Update for unknown object {}", id);
            return;
        };
        if !object.authority.reads_server_state() {
            return;
        }

        let snapshot = body.snapshot(now_ms);
        if let Some(position) = snapshot.position {
            object.server_position = Some(position);
        }
        if !self.buffers.record(id, snapshot) {
            log::debug!("Update for {} carried no state", id);
        }
    }

    fn on_batch(&mut self, batch: BatchUpdate, now_ms: f64) {
        if let Some(server_time) = batch.server_time {
            self.monitor.observe_server_time(server_time, now_ms);
        }
        for (id, body) in &batch.updates {
            self.on_update(id, body, now_ms);
        }
    }

    fn on_ack(&mut self, ack: CommandAck, now_ms: f64) {
        match (ack.client_time, ack.server_time) {
            (Some(client_time), Some(server_time)) => {
                self.monitor.on_pong(client_time, server_time, now_ms);
            }
            (Some(client_time), None) => {
                self.monitor.on_round_trip(client_time, now_ms);
            }
            (None, Some(server_time)) => self.monitor.observe_server_time(server_time, now_ms),
            (None, None) => {}
        }
    }

    pub fn apply_physics_config(&mut self, config: PhysicsConfig) {
        log::info!(
            "Physics config: impulse {} (max {}), max speed {}, gravity {}",
            config.base_impulse,
            config.max_impulse,
            config.max_speed,
            config.gravity()
        );
        self.physics.set_gravity(config.gravity());
        self.physics_config = config;
    }

    /// Despawns the object and drops everything buffered for it.
    pub fn remove(&mut self, id: &str) -> Result<(), SyncError> {
        self.buffers.remove(id);
        self.pending.retain(|p| p != id);
        match self.registry.despawn(&mut self.physics, id) {
            Some(_) => Ok(()),
            None => Err(SyncError::UnknownObject(id.to_string())),
        }
    }

    fn activate_pending(&mut self) {
        log::info!("Gameplay ready, activating {} objects", self.pending.len());
        for id in std::mem::take(&mut self.pending) {
            let Some(object) = self.registry.get_mut(&id) else {
                continue;
            };
            if let Some(position) = object.server_position {
                self.physics.set_body_position(object.body(), position);
                object.visual.position = position;
            }
            self.physics.activate(object.body());
        }
    }

    /// Runs one display frame against the session's own connection monitor.
    pub fn frame(&mut self, delta_secs: f32, now_ms: f64) -> FrameReport {
        self.run_frame(delta_secs, now_ms, None)
    }

    /// Same as `frame`, but link state comes from `network`.
    pub fn frame_with(
        &mut self,
        delta_secs: f32,
        now_ms: f64,
        network: &dyn NetworkStatus,
    ) -> FrameReport {
        self.run_frame(delta_secs, now_ms, Some(network))
    }

    /// Steps physics for the elapsed time, then reconciles every object.
    /// Nothing moves until the gate is open.
    fn run_frame(
        &mut self,
        delta_secs: f32,
        now_ms: f64,
        external: Option<&dyn NetworkStatus>,
    ) -> FrameReport {
        if !self.gate.is_ready() {
            return self.idle_report();
        }

        let steps = self.step_physics(delta_secs);
        let network: &dyn NetworkStatus = match external {
            Some(network) => network,
            None => &self.monitor,
        };
        let reconcile = self.reconciler.reconcile_all(
            &mut self.registry,
            &mut self.physics,
            &self.buffers,
            network,
            now_ms,
        );
        FrameReport {
            steps,
            gate: self.gate.state(),
            reconcile,
        }
    }

    fn idle_report(&self) -> FrameReport {
        FrameReport {
            steps: 0,
            gate: self.gate.state(),
            reconcile: ReconcileReport::default(),
        }
    }

    fn step_physics(&mut self, delta_secs: f32) -> u32 {
        self.timestep.accumulate(delta_secs);
        let mut steps = 0;
        while self.timestep.consume_tick() {
            self.physics.step();
            steps += 1;
        }
        steps
    }

    /// Routes a directional command to the server, or to the local player body when offline.
    pub fn input(&mut self, command: Command, now_ms: f64) -> InputOutcome {
        let base = self.physics_config.base_impulse;
        if self.monitor.is_connected() {
            return InputOutcome::Send(command.to_message(base, now_ms));
        }

        let Some(body) = self.player().map(SimObject::body) else {
            return InputOutcome::NoPlayer;
        };
        let impulse = command.impulse(base);
        let max_speed = self.physics_config.max_speed;
        self.input
            .apply(&mut self.physics, body, impulse, max_speed, now_ms)
    }

    pub fn ping(&mut self, now_ms: f64) -> ClientMessage {
        self.monitor.ping_sent(now_ms);
        ClientMessage::Ping {
            client_time: now_ms,
        }
    }

    pub fn visual_position(&self, id: &str) -> Option<Vec3> {
        self.registry.get(id).map(|o| o.visual.position)
    }

    pub fn body_position(&self, id: &str) -> Option<Vec3> {
        self.registry
            .get(id)
            .and_then(|o| self.physics.body_position(o.body()))
    }

    /// Frees every body and forgets all server state. The gate closes again.
    pub fn teardown(&mut self) {
        log::info!("Tearing down session with {} objects", self.registry.len());
        self.registry.clear(&mut self.physics);
        self.buffers.clear();
        self.pending.clear();
        self.gate.reset();
        self.timestep.reset();
        self.input.reset();
    }
}
