use std::collections::{HashMap, VecDeque};

use glam::Vec3;

use crate::registry::ObjectId;

/// One authoritative report for a single object. Either field may be missing on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServerSnapshot {
    pub position: Option<Vec3>,
    pub velocity: Option<Vec3>,
    pub server_time_ms: Option<f64>,
    pub received_at_ms: f64,
}

impl ServerSnapshot {
    pub fn new(position: Vec3, velocity: Vec3, received_at_ms: f64) -> Self {
        Self {
            position: Some(position),
            velocity: Some(velocity),
            server_time_ms: None,
            received_at_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.velocity.is_none()
    }
}

/// Bounded FIFO of the newest snapshots for one object.
#[derive(Debug, Clone)]
pub struct UpdateBuffer {
    entries: VecDeque<ServerSnapshot>,
    capacity: usize,
}

impl UpdateBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, snapshot: ServerSnapshot) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    pub fn latest(&self) -> Option<&ServerSnapshot> {
        self.entries.back()
    }

    pub fn oldest(&self) -> Option<&ServerSnapshot> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServerSnapshot> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Per-object update buffers keyed by server id.
#[derive(Debug, Clone)]
pub struct UpdateBuffers {
    buffers: HashMap<ObjectId, UpdateBuffer>,
    capacity: usize,
}

impl UpdateBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: HashMap::new(),
            capacity,
        }
    }

    /// Stores the snapshot unless it carries neither position nor velocity.
    pub fn record(&mut self, id: &str, snapshot: ServerSnapshot) -> bool {
        if snapshot.is_empty() {
            return false;
        }

        let capacity = self.capacity;
        self.buffers
            .entry(id.to_owned())
            .or_insert_with(|| UpdateBuffer::new(capacity))
            .push(snapshot);
        true
    }

    pub fn latest(&self, id: &str) -> Option<&ServerSnapshot> {
        self.buffers.get(id).and_then(UpdateBuffer::latest)
    }

    pub fn buffer(&self, id: &str) -> Option<&UpdateBuffer> {
        self.buffers.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<UpdateBuffer> {
        self.buffers.remove(id)
    }

    pub fn clear(&mut self) {
        self.buffers.clear();
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
