// Longest frame delta folded into the accumulator; a stall never replays more than this.
const MAX_FRAME_DELTA: f32 = 0.25;

#[derive(Debug, Clone)]
pub struct FixedTimestep {
    dt: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            dt: 1.0 / tick_rate.max(1) as f32,
            accumulator: 0.0,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.clamp(0.0, MAX_FRAME_DELTA);
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_timestep_accumulation() {
        let mut ts = FixedTimestep::new(60);

        ts.accumulate(1.0 / 30.0 + 1e-4);
        assert!(ts.consume_tick());
        assert!(ts.consume_tick());
        assert!(!ts.consume_tick());
    }

    #[test]
    fn long_stall_is_clamped() {
        let mut ts = FixedTimestep::new(60);
        ts.accumulate(5.0);

        let mut ticks = 0;
        while ts.consume_tick() {
            ticks += 1;
        }
        // 0.25 s at 60 Hz, give or take float rounding
        assert!((14..=15).contains(&ticks));
    }

    #[test]
    fn negative_delta_is_ignored() {
        let mut ts = FixedTimestep::new(60);
        ts.accumulate(-1.0);
        ts.accumulate(1.0 / 60.0 + 1e-4);
        assert!(ts.consume_tick());
        assert!(!ts.consume_tick());
    }
}
