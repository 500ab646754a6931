use super::stats::{ClockSync, PingTracker};

/// Link state the reconciler reads once per tick.
pub trait NetworkStatus {
    fn is_connected(&self) -> bool;
    /// Smoothed round trip in milliseconds; zero when unknown.
    fn current_ping_ms(&self) -> f32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Tracks the socket lifecycle plus ping and clock samples from `pong` replies.
#[derive(Debug, Clone, Default)]
pub struct ConnectionMonitor {
    state: ConnectionState,
    ping: PingTracker,
    clock: ClockSync,
    last_ping_sent_ms: Option<f64>,
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn begin_connect(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    pub fn on_open(&mut self) {
        if self.state != ConnectionState::Connected {
            log::info!("Connected to server");
        }
        self.state = ConnectionState::Connected;
    }

    pub fn on_close(&mut self) {
        if self.state == ConnectionState::Connected {
            log::warn!("Connection to server lost, running locally");
        }
        self.state = ConnectionState::Disconnected;
        self.last_ping_sent_ms = None;
    }

    pub fn ping_sent(&mut self, now_ms: f64) {
        self.last_ping_sent_ms = Some(now_ms);
    }

    pub fn last_ping_sent_ms(&self) -> Option<f64> {
        self.last_ping_sent_ms
    }

    /// Folds one pong into the ping and clock estimates. Returns the measured round trip.
    pub fn on_pong(&mut self, client_time_ms: f64, server_time_ms: f64, now_ms: f64) -> f64 {
        let rtt = (now_ms - client_time_ms).max(0.0);
        self.ping.record(rtt as f32);
        self.clock.record(server_time_ms, rtt, now_ms);
        log::trace!(
            "Pong rtt={:.1}ms avg={:.1}ms offset={:.1}ms",
            rtt,
            self.ping.average_ms(),
            self.clock.offset_ms()
        );
        rtt
    }

    /// Round trip from an ack that carries only our send time.
    pub fn on_round_trip(&mut self, client_time_ms: f64, now_ms: f64) -> f64 {
        let rtt = (now_ms - client_time_ms).max(0.0);
        self.ping.record(rtt as f32);
        rtt
    }

    /// Clock sample from a message stamped by the server with no matching send time.
    pub fn observe_server_time(&mut self, server_time_ms: f64, now_ms: f64) {
        self.clock.record(server_time_ms, 0.0, now_ms);
    }

    pub fn ping(&self) -> &PingTracker {
        &self.ping
    }

    pub fn clock(&self) -> &ClockSync {
        &self.clock
    }
}

impl NetworkStatus for ConnectionMonitor {
    fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    fn current_ping_ms(&self) -> f32 {
        self.ping.average_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mut monitor = ConnectionMonitor::new();
        assert!(!monitor.is_connected());

        monitor.begin_connect();
        assert_eq!(monitor.state(), ConnectionState::Connecting);
        assert!(!monitor.is_connected());

        monitor.on_open();
        assert!(monitor.is_connected());

        monitor.ping_sent(100.0);
        monitor.on_close();
        assert!(!monitor.is_connected());
        assert!(monitor.last_ping_sent_ms().is_none());
    }

    #[test]
    fn pong_feeds_ping_and_clock() {
        let mut monitor = ConnectionMonitor::new();
        monitor.on_open();

        let rtt = monitor.on_pong(1000.0, 5040.0, 1080.0);

        assert_eq!(rtt, 80.0);
        assert_eq!(monitor.current_ping_ms(), 80.0);
        assert_eq!(monitor.clock().offset_ms(), 4000.0);
    }
}
