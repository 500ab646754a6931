use glam::{Quat, Vec3};
use rapier3d::prelude::*;

use crate::error::PhysicsError;

use super::shape::{positive, BodyMaterial, Heightfield};

pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

// Fraction of the characteristic size used as the soft-CCD prediction distance.
const CCD_PREDICTION_FACTOR: Real = 0.5;

pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    gravity: Vector,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub const TICK_RATE: Real = 1.0 / 60.0;

    pub fn new() -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = Self::TICK_RATE;
        integration_parameters.min_ccd_dt = Self::TICK_RATE / 100.0;

        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: Vector::new(GRAVITY.x, GRAVITY.y, GRAVITY.z),
        }
    }

    pub fn with_timestep(dt: Real) -> Self {
        let mut world = Self::new();
        world.integration_parameters.dt = dt;
        world.integration_parameters.min_ccd_dt = dt / 100.0;
        world
    }

    pub fn timestep(&self) -> Real {
        self.integration_parameters.dt
    }

    pub fn gravity(&self) -> Vec3 {
        Vec3::new(self.gravity.x, self.gravity.y, self.gravity.z)
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = Vector::new(gravity.x, gravity.y, gravity.z);
    }

    /// Advances one fixed step. User forces only last for the step they were applied in.
    pub fn step(&mut self) {
        self.pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );

        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
        }
    }

    pub fn add_terrain(
        &mut self,
        position: Vec3,
        field: &Heightfield,
        material: BodyMaterial,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        field.validate()?;
        let extents = field.extents();

        let body = RigidBodyBuilder::fixed()
            .translation(Vector::new(position.x, position.y, position.z))
            .build();
        let handle = self.bodies.insert(body);

        let collider =
            ColliderBuilder::heightfield(field.to_grid(), Vector::new(extents.x, extents.y, extents.z))
                .friction(material.friction)
                .restitution(material.restitution)
                .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        Ok(handle)
    }

    pub fn add_dynamic_sphere(
        &mut self,
        position: Vec3,
        radius: Real,
        mass: Real,
        material: BodyMaterial,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        positive("sphere radius", radius)?;
        positive("sphere mass", mass)?;

        let body = dynamic_body(position, radius * 2.0, material);
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::ball(radius)
            .mass(mass)
            .friction(material.friction)
            .restitution(material.restitution)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        Ok(handle)
    }

    pub fn add_dynamic_box(
        &mut self,
        position: Vec3,
        half_extents: Vec3,
        mass: Real,
        material: BodyMaterial,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        validate_half_extents(half_extents)?;
        positive("box mass", mass)?;

        let body = dynamic_body(position, half_extents.min_element() * 2.0, material);
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .mass(mass)
            .friction(material.friction)
            .restitution(material.restitution)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        Ok(handle)
    }

    pub fn add_kinematic_sphere(
        &mut self,
        position: Vec3,
        radius: Real,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        positive("sphere radius", radius)?;

        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(Vector::new(position.x, position.y, position.z))
            .build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::ball(radius).build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        Ok(handle)
    }

    pub fn add_kinematic_box(
        &mut self,
        position: Vec3,
        half_extents: Vec3,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        validate_half_extents(half_extents)?;

        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(Vector::new(position.x, position.y, position.z))
            .build();
        let handle = self.bodies.insert(body);

        let collider =
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        Ok(handle)
    }

    /// Frees the body together with every collider attached to it.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    pub fn contains(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn body_position(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| {
            let t = b.translation();
            Vec3::new(t.x, t.y, t.z)
        })
    }

    pub fn body_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| {
            let v = b.linvel();
            Vec3::new(v.x, v.y, v.z)
        })
    }

    pub fn body_rotation(&self, handle: RigidBodyHandle) -> Option<Quat> {
        self.bodies.get(handle).map(|b| {
            let r = b.rotation();
            Quat::from_xyzw(r.x, r.y, r.z, r.w)
        })
    }

    /// Moves the body without integrating, keeping its rotation.
    pub fn set_body_position(&mut self, handle: RigidBodyHandle, position: Vec3) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        let current_rot = *body.rotation();
        let new_pose =
            Pose::from_parts(Vector::new(position.x, position.y, position.z), current_rot);
        body.set_position(new_pose, true);
        true
    }

    pub fn set_body_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        body.set_linvel(Vector::new(velocity.x, velocity.y, velocity.z), true);
        true
    }

    /// Replaces any force queued for the next step. Repeated calls between steps do not stack.
    pub fn set_central_force(&mut self, handle: RigidBodyHandle, force: Vec3) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        body.reset_forces(false);
        body.add_force(Vector::new(force.x, force.y, force.z), true);
        true
    }

    pub fn queued_force(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| {
            let f = b.user_force();
            Vec3::new(f.x, f.y, f.z)
        })
    }

    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec3) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        body.apply_impulse(Vector::new(impulse.x, impulse.y, impulse.z), true);
        true
    }

    /// Wakes the body so the solver does not treat it as resting.
    pub fn activate(&mut self, handle: RigidBodyHandle) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        body.wake_up(true);
        true
    }

    pub fn is_sleeping(&self, handle: RigidBodyHandle) -> Option<bool> {
        self.bodies.get(handle).map(|b| b.is_sleeping())
    }

    pub fn clamp_speed(&mut self, handle: RigidBodyHandle, max_speed: Real) -> bool {
        let Some(velocity) = self.body_velocity(handle) else {
            return false;
        };
        if velocity.length() > max_speed {
            self.set_body_velocity(handle, velocity.clamp_length_max(max_speed));
        }
        true
    }
}

fn dynamic_body(position: Vec3, characteristic_size: Real, material: BodyMaterial) -> RigidBody {
    RigidBodyBuilder::dynamic()
        .translation(Vector::new(position.x, position.y, position.z))
        .linear_damping(material.linear_damping)
        .angular_damping(material.angular_damping)
        .ccd_enabled(true)
        .soft_ccd_prediction(characteristic_size * CCD_PREDICTION_FACTOR)
        .build()
}

fn validate_half_extents(half_extents: Vec3) -> Result<(), PhysicsError> {
    positive("box half extent x", half_extents.x)?;
    positive("box half extent y", half_extents.y)?;
    positive("box half extent z", half_extents.z)
}
