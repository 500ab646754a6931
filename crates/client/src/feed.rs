use std::f32::consts::TAU;
use std::time::Duration;

use glam::Vec3;
use rollsync::net::{BatchUpdate, CommandAck, CreateObject, Pong, UpdateBody};
use rollsync::{ClientMessage, LinkSimulation, PhysicsConfig, ServerMessage};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

const TERRAIN_SAMPLES: usize = 16;
const TERRAIN_SPACING: f32 = 4.0;
const ORBIT_RADIUS: f32 = 12.0;
const ORBIT_PERIOD_SECS: f32 = 8.0;
const BALL_RADIUS: f32 = 1.0;

/// Pushes `text` through the simulated link: it may be dropped, otherwise it lands after a delay.
pub fn deliver(link: &LinkSimulation, tx: &mpsc::Sender<String>, text: String) {
    if link.should_drop() {
        log::trace!("Link dropped a frame");
        return;
    }
    let delay = Duration::from_millis(link.delay_ms() as u64);
    let tx = tx.clone();
    tokio::spawn(async move {
        time::sleep(delay).await;
        // Receiver gone means the client shut down.
        let _ = tx.send(text).await;
    });
}

/// Plays a fixed authoritative trajectory for the player: a slow orbit over flat terrain.
pub struct ScriptedFeed {
    pub link: LinkSimulation,
    pub player_id: String,
    pub update_interval: Duration,
    /// Added to the local clock to form server timestamps.
    pub clock_offset_ms: f64,
    pub start: Instant,
}

impl ScriptedFeed {
    fn server_now(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0 + self.clock_offset_ms
    }

    fn player_state(&self) -> (Vec3, Vec3) {
        let t = self.start.elapsed().as_secs_f32();
        let omega = TAU / ORBIT_PERIOD_SECS;
        let angle = omega * t;
        let position = Vec3::new(
            ORBIT_RADIUS * angle.cos(),
            BALL_RADIUS,
            ORBIT_RADIUS * angle.sin(),
        );
        let velocity = Vec3::new(
            -ORBIT_RADIUS * omega * angle.sin(),
            0.0,
            ORBIT_RADIUS * omega * angle.cos(),
        );
        (position, velocity)
    }

    fn intro(&self) -> Vec<ServerMessage> {
        let server_time = Some(self.server_now());
        let terrain = CreateObject {
            id: "terrain".to_string(),
            object_type: "terrain".to_string(),
            physics_by: Some("ammo".to_string()),
            server_time,
            heightmap_w: Some(TERRAIN_SAMPLES),
            heightmap_h: Some(TERRAIN_SAMPLES),
            height_data: Some(vec![0.0; TERRAIN_SAMPLES * TERRAIN_SAMPLES]),
            scale_x: Some(TERRAIN_SPACING),
            scale_y: Some(1.0),
            scale_z: Some(TERRAIN_SPACING),
            ..Default::default()
        };

        let (start, _) = self.player_state();
        let player = CreateObject {
            id: self.player_id.clone(),
            object_type: "sphere".to_string(),
            x: start.x,
            y: start.y,
            z: start.z,
            radius: Some(BALL_RADIUS),
            mass: Some(1.0),
            physics_by: Some("both".to_string()),
            server_time,
            ..Default::default()
        };

        let crate_box = CreateObject {
            id: "crate".to_string(),
            object_type: "box".to_string(),
            y: 3.0,
            width: Some(2.0),
            height: Some(2.0),
            depth: Some(2.0),
            mass: Some(5.0),
            physics_by: Some("ammo".to_string()),
            server_time,
            ..Default::default()
        };

        vec![
            ServerMessage::PhysicsConfig {
                config: PhysicsConfig::default(),
            },
            ServerMessage::Create(terrain),
            ServerMessage::Create(player),
            ServerMessage::Create(crate_box),
        ]
    }

    fn reply(&self, text: &str) -> Option<ServerMessage> {
        let message: ClientMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Feed ignoring client frame: {}", e);
                return None;
            }
        };
        let server_time = self.server_now();
        match message {
            ClientMessage::Ping { client_time } => Some(ServerMessage::Pong(Pong {
                client_time,
                server_time,
            })),
            ClientMessage::Cmd { cmd, client_time, .. } => {
                Some(ServerMessage::CmdAck(CommandAck {
                    cmd,
                    client_time: Some(client_time),
                    server_time: Some(server_time),
                }))
            }
        }
    }

    fn send(&self, tx: &mpsc::Sender<String>, message: &ServerMessage) {
        match message.to_json() {
            Ok(text) => deliver(&self.link, tx, text),
            Err(e) => log::error!("Feed failed to encode {}: {}", message.kind(), e),
        }
    }

    pub async fn run(self, to_client: mpsc::Sender<String>, mut from_client: mpsc::Receiver<String>) {
        // Setup frames skip loss and jitter so the client always sees them, in order.
        time::sleep(Duration::from_millis(self.link.latency_ms as u64)).await;
        for message in self.intro() {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    log::error!("Feed failed to encode {}: {}", message.kind(), e);
                    continue;
                }
            };
            if to_client.send(text).await.is_err() {
                return;
            }
        }

        let mut updates = time::interval(self.update_interval);
        loop {
            tokio::select! {
                _ = updates.tick() => {
                    let (position, velocity) = self.player_state();
                    let mut batch = BatchUpdate {
                        server_time: Some(self.server_now()),
                        ..Default::default()
                    };
                    batch.updates.insert(
                        self.player_id.clone(),
                        UpdateBody {
                            position: Some(position.into()),
                            velocity: Some(velocity.into()),
                            timestamp: batch.server_time,
                        },
                    );
                    self.send(&to_client, &ServerMessage::BatchUpdate(batch));
                }
                incoming = from_client.recv() => {
                    let Some(text) = incoming else {
                        log::debug!("Client hung up, feed stopping");
                        break;
                    };
                    if let Some(reply) = self.reply(&text) {
                        self.send(&to_client, &reply);
                    }
                }
            }
        }
    }
}
