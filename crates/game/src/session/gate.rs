/// Gameplay starts once both the terrain and the local player exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    WaitingForTerrain { player_seen: bool },
    WaitingForPlayer,
    Ready,
}

impl Default for GateState {
    fn default() -> Self {
        Self::WaitingForTerrain { player_seen: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    TerrainReady,
    PlayerReady,
}

pub fn transition(state: GateState, event: GateEvent) -> GateState {
    match (state, event) {
        (GateState::Ready, _) => GateState::Ready,
        (GateState::WaitingForTerrain { player_seen: true }, GateEvent::TerrainReady) => {
            GateState::Ready
        }
        (GateState::WaitingForTerrain { player_seen: false }, GateEvent::TerrainReady) => {
            GateState::WaitingForPlayer
        }
        (GateState::WaitingForTerrain { .. }, GateEvent::PlayerReady) => {
            GateState::WaitingForTerrain { player_seen: true }
        }
        (GateState::WaitingForPlayer, GateEvent::PlayerReady) => GateState::Ready,
        (GateState::WaitingForPlayer, GateEvent::TerrainReady) => GateState::WaitingForPlayer,
    }
}

#[derive(Debug, Clone, Default)]
pub struct GameGate {
    state: GateState,
}

impl GameGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == GateState::Ready
    }

    /// Returns true only on the signal that opens the gate.
    pub fn signal(&mut self, event: GateEvent) -> bool {
        let was_ready = self.is_ready();
        let next = transition(self.state, event);
        if next != self.state {
            log::debug!("Gate {:?} -> {:?} on {:?}", self.state, next, event);
        }
        self.state = next;
        !was_ready && self.is_ready()
    }

    pub fn reset(&mut self) {
        self.state = GateState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terrain_then_player() {
        let mut gate = GameGate::new();
        assert!(!gate.signal(GateEvent::TerrainReady));
        assert_eq!(gate.state(), GateState::WaitingForPlayer);
        assert!(gate.signal(GateEvent::PlayerReady));
        assert!(gate.is_ready());
    }

    #[test]
    fn player_then_terrain() {
        let mut gate = GameGate::new();
        assert!(!gate.signal(GateEvent::PlayerReady));
        assert_eq!(
            gate.state(),
            GateState::WaitingForTerrain { player_seen: true }
        );
        assert!(gate.signal(GateEvent::TerrainReady));
    }

    #[test]
    fn repeated_signals_open_once() {
        let mut gate = GameGate::new();
        gate.signal(GateEvent::TerrainReady);
        gate.signal(GateEvent::TerrainReady);
        assert_eq!(gate.state(), GateState::WaitingForPlayer);

        assert!(gate.signal(GateEvent::PlayerReady));
        assert!(!gate.signal(GateEvent::PlayerReady));
        assert!(!gate.signal(GateEvent::TerrainReady));
        assert!(gate.is_ready());
    }

    #[test]
    fn reset_closes_gate() {
        let mut gate = GameGate::new();
        gate.signal(GateEvent::TerrainReady);
        gate.signal(GateEvent::PlayerReady);
        gate.reset();
        assert_eq!(gate.state(), GateState::default());
    }
}
