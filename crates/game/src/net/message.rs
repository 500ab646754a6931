use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::PhysicsConfig;
use crate::error::ProtocolError;
use crate::physics::{BodyMaterial, Heightfield};
use crate::registry::{AuthorityMode, ObjectSpec};
use crate::sync::ServerSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WireVec3 {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl From<WireVec3> for Vec3 {
    fn from(v: WireVec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Vec3> for WireVec3 {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Create(CreateObject),
    Update(ObjectUpdate),
    BatchUpdate(BatchUpdate),
    Remove(RemoveObject),
    Pong(Pong),
    CmdAck(CommandAck),
    PhysicsConfig { config: PhysicsConfig },
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct CreateObject {
    pub id: String,
    pub object_type: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physics_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heightmap_w: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heightmap_h: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_data: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_z: Option<f32>,
}

impl CreateObject {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Unknown `physics_by` tags fall back to hybrid.
    pub fn authority(&self) -> AuthorityMode {
        match self.physics_by.as_deref() {
            None => AuthorityMode::Hybrid,
            Some(tag) => AuthorityMode::from_physics_by(tag).unwrap_or_else(|| {
                log::warn!("Unknown physics_by {:?} for {}, using hybrid", tag, self.id);
                AuthorityMode::Hybrid
            }),
        }
    }

    pub fn to_spec(&self, material: BodyMaterial) -> Result<ObjectSpec, ProtocolError> {
        let position = self.position();
        let spec = match self.object_type.as_str() {
            "sphere" => ObjectSpec::sphere(
                self.id.clone(),
                position,
                self.radius.unwrap_or(1.0),
                self.mass.unwrap_or(1.0),
            )
            .with_material(material),
            "box" => {
                let size = Vec3::new(
                    self.width.unwrap_or(1.0),
                    self.height.unwrap_or(1.0),
                    self.depth.unwrap_or(1.0),
                );
                ObjectSpec::cuboid(self.id.clone(), position, size / 2.0, self.mass.unwrap_or(1.0))
                    .with_material(material)
            }
            "terrain" => {
                return Ok(ObjectSpec::terrain(
                    self.id.clone(),
                    position,
                    self.heightfield()?,
                ));
            }
            other => return Err(ProtocolError::UnsupportedKind(other.to_string())),
        };

        Ok(spec.with_authority(self.authority()))
    }

    fn heightfield(&self) -> Result<Heightfield, ProtocolError> {
        let missing = |field| ProtocolError::MissingField {
            id: self.id.clone(),
            kind: "terrain",
            field,
        };
        let width = self.heightmap_w.ok_or_else(|| missing("heightmap_w"))?;
        let depth = self.heightmap_h.ok_or_else(|| missing("heightmap_h"))?;
        let heights = self.height_data.clone().ok_or_else(|| missing("height_data"))?;
        let scale = Vec3::new(
            self.scale_x.unwrap_or(1.0),
            self.scale_y.unwrap_or(1.0),
            self.scale_z.unwrap_or(1.0),
        );
        Ok(Heightfield::new(width, depth, heights, scale))
    }
}

/// Partial state for one object. Either vector may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct UpdateBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<WireVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<WireVec3>,
    #[serde(
        default,
        alias = "server_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<f64>,
}

impl UpdateBody {
    pub fn snapshot(&self, received_at_ms: f64) -> ServerSnapshot {
        ServerSnapshot {
            position: self.position.map(Vec3::from),
            velocity: self.velocity.map(Vec3::from),
            server_time_ms: self.timestamp,
            received_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObjectUpdate {
    pub id: String,
    #[serde(flatten)]
    pub body: UpdateBody,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct BatchUpdate {
    #[serde(default)]
    pub updates: HashMap<String, UpdateBody>,
    #[serde(default, alias = "time", skip_serializing_if = "Option::is_none")]
    pub server_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RemoveObject {
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Pong {
    pub client_time: f64,
    pub server_time: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandAck {
    #[serde(default)]
    pub cmd: String,
    pub client_time: Option<f64>,
    pub server_time: Option<f64>,
}

impl ServerMessage {
    /// Decodes one text frame. Frames with no `type` but an `id` and `object_type` are creates.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let mut value: serde_json::Value = serde_json::from_str(text)?;

        if let Some(object) = value.as_object_mut() {
            let untyped_create = !object.contains_key("type")
                && object.contains_key("id")
                && object.contains_key("object_type");
            if untyped_create {
                object.insert("type".to_string(), serde_json::Value::from("create"));
            }
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::BatchUpdate(_) => "batch_update",
            Self::Remove(_) => "remove",
            Self::Pong(_) => "pong",
            Self::CmdAck(_) => "cmd_ack",
            Self::PhysicsConfig { .. } => "physics_config",
        }
    }
}

/// Frames the client sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Cmd {
        cmd: String,
        client_time: f64,
        data: WireVec3,
    },
    Ping {
        client_time: f64,
    },
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ObjectKind;

    #[test]
    fn parses_update_with_server_time_alias() {
        let msg = ServerMessage::parse(
            r#"{"type":"update","id":"ball","position":{"x":1,"y":2,"z":3},"server_time":1500}"#,
        )
        .unwrap();

        let ServerMessage::Update(update) = msg else {
            panic!("expected update");
        };
        assert_eq!(update.id, "ball");
        assert_eq!(update.body.timestamp, Some(1500.0));

        let snapshot = update.body.snapshot(42.0);
        assert_eq!(snapshot.position, Some(Vec3::new(1.0, 2.0, 3.0)));
        assert!(snapshot.velocity.is_none());
        assert_eq!(snapshot.received_at_ms, 42.0);
    }

    #[test]
    fn untyped_object_is_a_create() {
        let msg = ServerMessage::parse(
            r#"{"id":"ball","object_type":"sphere","x":0,"y":5,"z":0,"radius":0.5,"physics_by":"both"}"#,
        )
        .unwrap();

        let ServerMessage::Create(create) = msg else {
            panic!("expected create");
        };
        let spec = create.to_spec(BodyMaterial::default()).unwrap();
        assert_eq!(spec.kind, ObjectKind::Sphere { radius: 0.5 });
        assert_eq!(spec.authority, AuthorityMode::Hybrid);
        assert_eq!(spec.position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(spec.mass, 1.0);
    }

    #[test]
    fn batch_update_keeps_partial_entries() {
        let msg = ServerMessage::parse(
            r#"{"type":"batch_update","time":10,"updates":{
                "a":{"position":{"x":1,"y":0,"z":0},"velocity":{"x":0,"y":0,"z":0}},
                "b":{"velocity":{"x":0,"y":1,"z":0}}
            }}"#,
        )
        .unwrap();

        let ServerMessage::BatchUpdate(batch) = msg else {
            panic!("expected batch update");
        };
        assert_eq!(batch.server_time, Some(10.0));
        assert_eq!(batch.updates.len(), 2);
        assert!(batch.updates["b"].position.is_none());
    }

    #[test]
    fn box_dimensions_are_full_sizes() {
        let create = CreateObject {
            id: "crate".to_string(),
            object_type: "box".to_string(),
            width: Some(2.0),
            height: Some(4.0),
            depth: Some(1.0),
            mass: Some(5.0),
            physics_by: Some("bullet".to_string()),
            ..Default::default()
        };

        let spec = create.to_spec(BodyMaterial::default()).unwrap();
        assert_eq!(
            spec.kind,
            ObjectKind::Box {
                half_extents: Vec3::new(1.0, 2.0, 0.5)
            }
        );
        assert_eq!(spec.authority, AuthorityMode::ServerOnly);
    }

    #[test]
    fn terrain_requires_height_data() {
        let create = CreateObject {
            id: "ground".to_string(),
            object_type: "terrain".to_string(),
            heightmap_w: Some(4),
            heightmap_h: Some(4),
            ..Default::default()
        };

        assert!(matches!(
            create.to_spec(BodyMaterial::default()),
            Err(ProtocolError::MissingField {
                field: "height_data",
                ..
            })
        ));
    }

    #[test]
    fn trees_have_no_body() {
        let create = CreateObject {
            id: "oak".to_string(),
            object_type: "tree".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            create.to_spec(BodyMaterial::default()),
            Err(ProtocolError::UnsupportedKind(kind)) if kind == "tree"
        ));
    }

    #[test]
    fn physics_config_message() {
        let msg = ServerMessage::parse(
            r#"{"type":"physics_config","config":{"base_impulse":8,"max_speed":40}}"#,
        )
        .unwrap();

        let ServerMessage::PhysicsConfig { config } = msg else {
            panic!("expected physics config");
        };
        assert_eq!(config.max_speed, 40.0);
        assert_eq!(config.restitution, PhysicsConfig::default().restitution);
    }

    #[test]
    fn command_frame_shape() {
        let msg = ClientMessage::Cmd {
            cmd: "LEFT".to_string(),
            client_time: 12.5,
            data: Vec3::new(-8.0, 0.0, 0.0).into(),
        };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "cmd");
        assert_eq!(value["cmd"], "LEFT");
        assert_eq!(value["client_time"], 12.5);
        assert_eq!(value["data"]["x"], -8.0);
    }

    #[test]
    fn garbage_is_a_protocol_error() {
        assert!(matches!(
            ServerMessage::parse("{not json"),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            ServerMessage::parse(r#"{"type":"teleport_everyone"}"#),
            Err(ProtocolError::Json(_))
        ));
    }
}
