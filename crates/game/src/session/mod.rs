mod context;
mod gate;
mod timestep;

pub use context::{FrameReport, Session};
pub use gate::{transition, GameGate, GateEvent, GateState};
pub use timestep::FixedTimestep;
