pub const PING_KNEE_MS: f32 = 50.0;
pub const MAX_PING_MS: f32 = 300.0;
pub const MIN_BLEND_FACTOR: f32 = 0.05;
pub const PING_CURVE_EXPONENT: f32 = 0.75;

// Update intervals above this make each correction carry more weight.
const SPARSE_UPDATE_INTERVAL_MS: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveParams {
    pub blend_factor: f32,
    /// Force applied per unit of positional error in the blend band.
    pub correction_strength: f32,
    /// Divergence beyond which the body is moved instead of pushed.
    pub teleport_threshold: f32,
}

impl Default for AdaptiveParams {
    fn default() -> Self {
        Self {
            blend_factor: 0.3,
            correction_strength: 10.0,
            teleport_threshold: 10.0,
        }
    }
}

/// Derives reconciliation parameters from the measured round trip.
///
/// Higher latency means staler corrections, so correction strength falls and teleport tolerance
/// grows along a `t^0.75` curve between the knee and `MAX_PING_MS`, then stays clamped.
pub fn adapt(ping_ms: f32, base: AdaptiveParams, update_interval_ms: f32) -> AdaptiveParams {
    let mut params = if ping_ms <= PING_KNEE_MS {
        base
    } else if ping_ms <= MAX_PING_MS {
        let t = ((ping_ms - PING_KNEE_MS) / (MAX_PING_MS - PING_KNEE_MS)).powf(PING_CURVE_EXPONENT);
        AdaptiveParams {
            blend_factor: base.blend_factor + (MIN_BLEND_FACTOR - base.blend_factor) * t,
            correction_strength: base.correction_strength * (1.0 - 0.5 * t),
            teleport_threshold: base.teleport_threshold * (1.0 + 0.5 * t),
        }
    } else {
        AdaptiveParams {
            blend_factor: MIN_BLEND_FACTOR,
            correction_strength: base.correction_strength * 0.5,
            teleport_threshold: base.teleport_threshold * 1.5,
        }
    };

    if update_interval_ms > SPARSE_UPDATE_INTERVAL_MS {
        let scale = update_interval_ms / SPARSE_UPDATE_INTERVAL_MS;
        params.correction_strength *= scale;
        params.blend_factor /= scale;
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn below_knee_is_identity() {
        let base = AdaptiveParams::default();
        assert_eq!(adapt(30.0, base, 50.0), base);
        assert_eq!(adapt(PING_KNEE_MS, base, 50.0), base);
    }

    #[test]
    fn beyond_max_ping_clamps() {
        let base = AdaptiveParams::default();
        let params = adapt(500.0, base, 50.0);

        assert_eq!(params.blend_factor, MIN_BLEND_FACTOR);
        assert!(close(params.teleport_threshold, base.teleport_threshold * 1.5));
        assert!(close(params.correction_strength, base.correction_strength * 0.5));
    }

    #[test]
    fn curve_is_continuous_at_max_ping() {
        let base = AdaptiveParams::default();
        let at_max = adapt(MAX_PING_MS, base, 50.0);
        let beyond = adapt(MAX_PING_MS + 1.0, base, 50.0);

        assert!(close(at_max.blend_factor, beyond.blend_factor));
        assert!(close(at_max.correction_strength, beyond.correction_strength));
        assert!(close(at_max.teleport_threshold, beyond.teleport_threshold));
    }

    #[test]
    fn rising_ping_trusts_local_more() {
        let base = AdaptiveParams::default();
        let mut previous = adapt(PING_KNEE_MS, base, 50.0);

        for ping in [75.0, 120.0, 180.0, 240.0, 299.0] {
            let params = adapt(ping, base, 50.0);
            assert!(params.blend_factor < previous.blend_factor);
            assert!(params.correction_strength < previous.correction_strength);
            assert!(params.teleport_threshold > previous.teleport_threshold);
            previous = params;
        }
    }

    #[test]
    fn curve_front_loads_the_change() {
        let base = AdaptiveParams::default();
        let midpoint = (PING_KNEE_MS + MAX_PING_MS) / 2.0;
        let params = adapt(midpoint, base, 50.0);
        let linear_half = base.blend_factor + (MIN_BLEND_FACTOR - base.blend_factor) * 0.5;

        assert!(params.blend_factor < linear_half);
    }

    #[test]
    fn sparse_updates_strengthen_correction() {
        let base = AdaptiveParams::default();
        let params = adapt(30.0, base, 200.0);

        assert!(close(params.correction_strength, base.correction_strength * 2.0));
        assert!(close(params.blend_factor, base.blend_factor / 2.0));
        assert_eq!(params.teleport_threshold, base.teleport_threshold);
    }
}
