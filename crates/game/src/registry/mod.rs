mod object;

use std::collections::HashMap;

pub use object::{AuthorityMode, ObjectId, ObjectKind, ObjectSpec, SimObject, Visual};

use crate::error::{PhysicsError, SyncError};
use crate::physics::{BodyHandle, PhysicsWorld};

/// Owns every simulated object and the physics body that backs it.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: HashMap<ObjectId, SimObject>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the object and its body together. On error nothing is inserted anywhere.
    pub fn spawn(
        &mut self,
        physics: &mut PhysicsWorld,
        spec: ObjectSpec,
        now_ms: f64,
    ) -> Result<&mut SimObject, SyncError> {
        if self.objects.contains_key(&spec.id) {
            return Err(SyncError::DuplicateObject(spec.id));
        }

        let body = create_body(physics, &spec)?;
        log::debug!(
            "Spawned {} {} ({:?}) at {}",
            spec.kind.name(),
            spec.id,
            spec.authority,
            spec.position
        );

        let id = spec.id.clone();
        let object = SimObject::new(spec, body, now_ms);
        Ok(self.objects.entry(id).or_insert(object))
    }

    /// Removes the object and frees its body.
    pub fn despawn(&mut self, physics: &mut PhysicsWorld, id: &str) -> Option<SimObject> {
        let object = self.objects.remove(id)?;
        if !physics.remove_body(object.body()) {
            log::warn!("Body for {} was already gone at despawn", id);
        }
        log::debug!("Despawned {} {}", object.kind.name(), id);
        Some(object)
    }

    pub fn clear(&mut self, physics: &mut PhysicsWorld) {
        for (_, object) in self.objects.drain() {
            physics.remove_body(object.body());
        }
    }

    pub fn get(&self, id: &str) -> Option<&SimObject> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SimObject> {
        self.objects.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &SimObject> {
        self.objects.values()
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut SimObject> {
        self.objects.values_mut()
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

fn create_body(physics: &mut PhysicsWorld, spec: &ObjectSpec) -> Result<BodyHandle, PhysicsError> {
    let dynamic = match spec.authority {
        AuthorityMode::LocalOnly | AuthorityMode::Hybrid => true,
        AuthorityMode::ServerOnly => false,
    };

    match (&spec.kind, dynamic) {
        (ObjectKind::Terrain(field), _) => physics.add_terrain(spec.position, field, spec.material),
        (ObjectKind::Sphere { radius }, true) => {
            physics.add_dynamic_sphere(spec.position, *radius, spec.mass, spec.material)
        }
        (ObjectKind::Sphere { radius }, false) => {
            physics.add_kinematic_sphere(spec.position, *radius)
        }
        (ObjectKind::Box { half_extents }, true) => {
            physics.add_dynamic_box(spec.position, *half_extents, spec.mass, spec.material)
        }
        (ObjectKind::Box { half_extents }, false) => {
            physics.add_kinematic_box(spec.position, *half_extents)
        }
    }
}
