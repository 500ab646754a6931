mod message;
mod stats;
mod status;

pub use message::{
    BatchUpdate, ClientMessage, CommandAck, CreateObject, ObjectUpdate, Pong, RemoveObject,
    ServerMessage, UpdateBody, WireVec3,
};
pub use stats::{ClockSync, LinkSimulation, PingTracker, CLOCK_SAMPLES, PING_SAMPLES};
pub use status::{ConnectionMonitor, ConnectionState, NetworkStatus};
