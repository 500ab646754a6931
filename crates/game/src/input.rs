use glam::Vec3;

use crate::net::ClientMessage;
use crate::physics::{BodyHandle, PhysicsWorld};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Left,
    Right,
    Up,
    Down,
    Jump,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Left,
        Command::Right,
        Command::Up,
        Command::Down,
        Command::Jump,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Jump => "SPACE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Up is away from the camera, so it pushes along -z.
    pub fn impulse(self, base: f32) -> Vec3 {
        match self {
            Self::Left => Vec3::new(-base, 0.0, 0.0),
            Self::Right => Vec3::new(base, 0.0, 0.0),
            Self::Up => Vec3::new(0.0, 0.0, -base),
            Self::Down => Vec3::new(0.0, 0.0, base),
            Self::Jump => Vec3::new(0.0, 2.0 * base, 0.0),
        }
    }

    pub fn to_message(self, base: f32, client_time_ms: f64) -> ClientMessage {
        ClientMessage::Cmd {
            cmd: self.name().to_string(),
            client_time: client_time_ms,
            data: self.impulse(base).into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// Connected: the server applies the impulse.
    Send(ClientMessage),
    Applied { impulse: Vec3 },
    Debounced,
    NoPlayer,
}

/// Applies impulses to the player body while offline.
#[derive(Debug, Clone)]
pub struct LocalInput {
    debounce_ms: f64,
    last_applied_ms: Option<f64>,
}

impl LocalInput {
    pub fn new(debounce_ms: f64) -> Self {
        Self {
            debounce_ms,
            last_applied_ms: None,
        }
    }

    pub fn apply(
        &mut self,
        physics: &mut PhysicsWorld,
        body: BodyHandle,
        impulse: Vec3,
        max_speed: f32,
        now_ms: f64,
    ) -> InputOutcome {
        if let Some(last) = self.last_applied_ms {
            if now_ms - last < self.debounce_ms {
                return InputOutcome::Debounced;
            }
        }

        if !physics.apply_impulse(body, impulse) {
            return InputOutcome::NoPlayer;
        }
        physics.clamp_speed(body, max_speed);
        self.last_applied_ms = Some(now_ms);
        InputOutcome::Applied { impulse }
    }

    pub fn reset(&mut self) {
        self.last_applied_ms = None;
    }
}
