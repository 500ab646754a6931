use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::physics::{BodyHandle, BodyMaterial, Heightfield};

pub type ObjectId = String;

/// Which side owns an object's motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityMode {
    /// Simulated locally; server snapshots are ignored.
    LocalOnly,
    /// Positioned from server snapshots only; never pushed by forces or velocity.
    ServerOnly,
    /// Simulated locally and reconciled against server snapshots.
    #[default]
    Hybrid,
}

impl AuthorityMode {
    /// Maps the wire `physics_by` tag. Unknown tags yield `None`.
    pub fn from_physics_by(tag: &str) -> Option<Self> {
        match tag {
            "ammo" | "local" => Some(Self::LocalOnly),
            "bullet" | "server" => Some(Self::ServerOnly),
            "both" | "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }

    pub fn reads_server_state(self) -> bool {
        match self {
            Self::LocalOnly => false,
            Self::ServerOnly | Self::Hybrid => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Terrain(Heightfield),
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Terrain(_) => "terrain",
            Self::Sphere { .. } => "sphere",
            Self::Box { .. } => "box",
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Self::Terrain(_))
    }
}

/// Transform the render layer draws from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visual {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Visual {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
        }
    }
}

/// Everything needed to create an object and its body in one go.
#[derive(Debug, Clone)]
pub struct ObjectSpec {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub position: Vec3,
    pub mass: f32,
    pub authority: AuthorityMode,
    pub material: BodyMaterial,
}

impl ObjectSpec {
    pub fn sphere(id: impl Into<ObjectId>, position: Vec3, radius: f32, mass: f32) -> Self {
        Self {
            id: id.into(),
            kind: ObjectKind::Sphere { radius },
            position,
            mass,
            authority: AuthorityMode::Hybrid,
            material: BodyMaterial::default(),
        }
    }

    pub fn cuboid(id: impl Into<ObjectId>, position: Vec3, half_extents: Vec3, mass: f32) -> Self {
        Self {
            id: id.into(),
            kind: ObjectKind::Box { half_extents },
            position,
            mass,
            authority: AuthorityMode::Hybrid,
            material: BodyMaterial::default(),
        }
    }

    pub fn terrain(id: impl Into<ObjectId>, position: Vec3, field: Heightfield) -> Self {
        Self {
            id: id.into(),
            kind: ObjectKind::Terrain(field),
            position,
            mass: 0.0,
            authority: AuthorityMode::LocalOnly,
            material: BodyMaterial::TERRAIN,
        }
    }

    pub fn with_authority(mut self, authority: AuthorityMode) -> Self {
        self.authority = authority;
        self
    }

    pub fn with_material(mut self, material: BodyMaterial) -> Self {
        self.material = material;
        self
    }
}

#[derive(Debug)]
pub struct SimObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub authority: AuthorityMode,
    pub mass: f32,
    pub visual: Visual,
    /// Last position reported by the server, including the one from the create message.
    pub server_position: Option<Vec3>,
    pub created_at_ms: f64,
    body: BodyHandle,
}

impl SimObject {
    pub(crate) fn new(spec: ObjectSpec, body: BodyHandle, created_at_ms: f64) -> Self {
        Self {
            id: spec.id,
            mass: if spec.kind.is_static() { 0.0 } else { spec.mass },
            kind: spec.kind,
            authority: spec.authority,
            visual: Visual::at(spec.position),
            server_position: None,
            created_at_ms,
            body,
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }
}
