use std::collections::VecDeque;

use rand::Rng;

pub const PING_SAMPLES: usize = 10;
pub const CLOCK_SAMPLES: usize = 10;

/// Rolling mean of the last `PING_SAMPLES` round trips.
#[derive(Debug, Clone, Default)]
pub struct PingTracker {
    samples: VecDeque<f32>,
}

impl PingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, rtt_ms: f32) {
        if !rtt_ms.is_finite() || rtt_ms < 0.0 {
            log::warn!("Ignoring bogus round trip sample {}", rtt_ms);
            return;
        }
        if self.samples.len() == PING_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(rtt_ms);
    }

    /// Zero until the first pong arrives.
    pub fn average_ms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Estimates `server_clock - client_clock` as the median of recent pong samples.
#[derive(Debug, Clone, Default)]
pub struct ClockSync {
    offsets: VecDeque<f64>,
    offset_ms: f64,
}

impl ClockSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// `server_time` is assumed to be stamped halfway through the round trip.
    pub fn record(&mut self, server_time_ms: f64, rtt_ms: f64, now_ms: f64) {
        let offset = server_time_ms + rtt_ms / 2.0 - now_ms;
        if self.offsets.len() == CLOCK_SAMPLES {
            self.offsets.pop_front();
        }
        self.offsets.push_back(offset);

        let mut sorted: Vec<f64> = self.offsets.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        self.offset_ms = sorted[sorted.len() / 2];
    }

    pub fn offset_ms(&self) -> f64 {
        self.offset_ms
    }

    pub fn server_now(&self, now_ms: f64) -> f64 {
        now_ms + self.offset_ms
    }

    pub fn is_synced(&self) -> bool {
        !self.offsets.is_empty()
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
        self.offset_ms = 0.0;
    }
}

/// Artificial link conditions for exercising reconciliation without a real server.
#[derive(Debug, Clone, Default)]
pub struct LinkSimulation {
    pub enabled: bool,
    pub loss_percent: f32,
    pub latency_ms: u32,
    pub jitter_ms: u32,
}

impl LinkSimulation {
    pub fn new(latency_ms: u32, jitter_ms: u32, loss_percent: f32) -> Self {
        Self {
            enabled: latency_ms > 0 || jitter_ms > 0 || loss_percent > 0.0,
            loss_percent: loss_percent.clamp(0.0, 100.0),
            latency_ms,
            jitter_ms,
        }
    }

    pub fn should_drop(&self) -> bool {
        if !self.enabled || self.loss_percent <= 0.0 {
            return false;
        }
        rand::thread_rng().gen_range(0.0..100.0) < self.loss_percent
    }

    /// One-way delay for the next message.
    pub fn delay_ms(&self) -> u32 {
        if !self.enabled {
            return 0;
        }
        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        self.latency_ms + jitter
    }
}
