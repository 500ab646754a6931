pub mod config;
pub mod error;
pub mod input;
pub mod net;
pub mod physics;
pub mod registry;
pub mod session;
pub mod sync;

pub use config::{ClientConfig, PhysicsConfig, DEFAULT_PLAYER_ID, DEFAULT_TICK_RATE};
pub use error::{PhysicsError, ProtocolError, SyncError};
pub use input::{Command, InputOutcome, LocalInput};
pub use net::{
    ClientMessage, ConnectionMonitor, ConnectionState, LinkSimulation, NetworkStatus,
    ServerMessage,
};
pub use physics::{BodyHandle, BodyMaterial, Heightfield, PhysicsWorld};
pub use registry::{AuthorityMode, ObjectId, ObjectKind, ObjectRegistry, ObjectSpec, SimObject};
pub use session::{FrameReport, GameGate, GateEvent, GateState, Session};
pub use sync::{AdaptiveParams, Branch, ReconcileConfig, ReconcileReport, Reconciler};
