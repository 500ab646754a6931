mod shape;
mod world;

pub use rapier3d::dynamics::RigidBodyHandle as BodyHandle;
pub use shape::{BodyMaterial, Heightfield};
pub use world::{PhysicsWorld, GRAVITY};
