//! Automatic obstacle avoidance, re-evaluated once per simulation tick.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{AvoidanceConfig, TreblePulse};

/// All drivable lanes, in candidate evaluation order.
pub const LANES: [i32; 3] = [-1, 0, 1];

/// Owns the lane-change decision state: the cooldown timestamp and the RNG
/// behind the random score term.
#[derive(Debug)]
pub struct Autopilot {
    config: AvoidanceConfig,
    rng: SmallRng,
    last_decision: Option<f32>,
}

impl Autopilot {
    /// Creates an autopilot, seeding the jitter RNG from `config.seed` when
    /// set and from the OS otherwise.
    pub fn new(config: AvoidanceConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self {
            config,
            rng,
            last_decision: None,
        }
    }

    pub fn config(&self) -> &AvoidanceConfig {
        &self.config
    }

    /// Evaluates the current situation and returns the lane to move to, if
    /// any. Accepting a change restarts the cooldown; returning `None`
    /// (cooldown active, nothing blocking, or no safe lane) does not.
    pub fn evaluate(
        &mut self,
        pulses: &[TreblePulse],
        distance: f32,
        current_lane: i32,
        now: f32,
    ) -> Option<i32> {
        if let Some(last) = self.last_decision {
            if now - last < self.config.cooldown_seconds {
                return None;
            }
        }

        let jitter = self.config.jitter;
        let rng = &mut self.rng;
        let lane = plan_change(pulses, distance, current_lane, &self.config, || {
            if jitter > 0.0 {
                rng.random_range(0.0..jitter)
            } else {
                0.0
            }
        })?;

        self.last_decision = Some(now);
        Some(lane)
    }

    /// Treats `now` as a fresh decision, pushing the next automatic change
    /// behind the cooldown. Called when the player steers manually so the
    /// heuristic cannot immediately override them.
    pub fn suppress(&mut self, now: f32) {
        self.last_decision = Some(now);
    }
}

/// Pure lane-planning step, independent of cooldown state. The random score
/// term is supplied by the caller, so simulations and tests can pin it.
///
/// Returns the safe lane with the highest score, `None` when nothing blocks
/// the current lane or when no candidate lane is safe. Unavoidable
/// collisions are accepted rather than dodged into another hazard.
pub fn plan_change(
    pulses: &[TreblePulse],
    distance: f32,
    current_lane: i32,
    config: &AvoidanceConfig,
    mut jitter: impl FnMut() -> f32,
) -> Option<i32> {
    // Hazards strictly ahead and inside the lookahead window, reduced to
    // (lane, forward distance).
    let upcoming: Vec<(i32, f32)> = pulses
        .iter()
        .filter_map(|pulse| {
            let ahead = pulse.track_distance() - distance;
            (ahead > 0.0 && ahead <= config.lookahead).then_some((pulse.lane, ahead))
        })
        .collect();

    let blocked = upcoming
        .iter()
        .any(|&(lane, ahead)| lane == current_lane && ahead <= config.conflict_range);
    if !blocked {
        return None;
    }

    let mut best: Option<(i32, f32)> = None;
    for &lane in &LANES {
        if lane == current_lane {
            continue;
        }
        let unsafe_lane = upcoming
            .iter()
            .any(|&(l, ahead)| l == lane && ahead <= config.conflict_range);
        if unsafe_lane {
            continue;
        }

        let mut nearest = config.lookahead;
        let mut pressure = 0.0;
        for &(l, ahead) in &upcoming {
            if l == lane {
                nearest = nearest.min(ahead);
                pressure += 1.0 / ahead.max(1.0);
            }
        }

        let cost = (lane - current_lane).abs() as f32 * config.lane_change_cost;
        let score = nearest - pressure - cost + jitter();

        // Strict comparison keeps the first-seen candidate on ties.
        match best {
            Some((_, top)) if top >= score => {}
            _ => best = Some((lane, score)),
        }
    }

    best.map(|(lane, _)| lane)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn pulse(lane: i32, z: f32) -> TreblePulse {
        TreblePulse {
            time: z / 50.0,
            pos: Vec3::new(lane as f32 * 2.5, 1.0, z),
            intensity: 0.5,
            lane,
        }
    }

    fn config() -> AvoidanceConfig {
        AvoidanceConfig {
            seed: Some(7),
            ..AvoidanceConfig::default()
        }
    }

    #[test]
    fn no_blocking_hazard_means_no_change() {
        let pulses = vec![pulse(0, 20.0)]; // ahead but outside conflict range
        assert_eq!(plan_change(&pulses, 0.0, 0, &config(), || 0.0), None);
    }

    #[test]
    fn hazards_behind_are_ignored() {
        let pulses = vec![pulse(0, 4.0)];
        assert_eq!(plan_change(&pulses, 10.0, 0, &config(), || 0.0), None);
    }

    #[test]
    fn blocked_lane_picks_side_with_less_pressure() {
        // Blocking hazard dead ahead in lane 0; lane 1 has a hazard at 20
        // units, lane -1 is clear. With jitter pinned, lane -1 scores
        // 25 - 0 - 0.35 = 24.65 against lane 1's 20 - 1/20 - 0.35 = 19.6.
        let pulses = vec![pulse(0, 5.0), pulse(1, 20.0)];
        assert_eq!(plan_change(&pulses, 0.0, 0, &config(), || 0.0), Some(-1));
    }

    #[test]
    fn equal_candidates_resolve_to_first_seen() {
        let pulses = vec![pulse(0, 5.0)];
        assert_eq!(plan_change(&pulses, 0.0, 0, &config(), || 0.0), Some(-1));
    }

    #[test]
    fn no_safe_lane_accepts_the_collision() {
        let pulses = vec![pulse(-1, 3.0), pulse(0, 5.0), pulse(1, 6.0)];
        assert_eq!(plan_change(&pulses, 0.0, 0, &config(), || 0.0), None);
    }

    #[test]
    fn two_lane_jump_costs_more_than_one() {
        // From lane -1 with lane 0 clear and lane 1 clear: both score the
        // full lookahead minus the change cost, so the single-lane shift
        // wins even though it is evaluated second.
        let pulses = vec![pulse(-1, 5.0)];
        assert_eq!(plan_change(&pulses, 0.0, -1, &config(), || 0.0), Some(0));
    }

    #[test]
    fn cooldown_limits_decisions() {
        let pulses = vec![pulse(0, 5.0), pulse(0, 12.0)];
        let mut pilot = Autopilot::new(config());

        let first = pilot.evaluate(&pulses, 0.0, 0, 1.0);
        assert!(first.is_some());

        // Still blocked 0.2s later, but inside the cooldown.
        let second = pilot.evaluate(&pulses, 1.0, 0, 1.2);
        assert_eq!(second, None);

        // Past the cooldown the heuristic may decide again.
        let third = pilot.evaluate(&pulses, 4.0, 0, 1.6);
        assert!(third.is_some());
    }

    #[test]
    fn suppress_restarts_the_cooldown() {
        let pulses = vec![pulse(0, 5.0)];
        let mut pilot = Autopilot::new(config());

        pilot.suppress(1.0);
        assert_eq!(pilot.evaluate(&pulses, 0.0, 0, 1.2), None);
        assert!(pilot.evaluate(&pulses, 0.0, 0, 1.5).is_some());
    }

    #[test]
    fn seeded_pilots_agree() {
        let pulses = vec![pulse(0, 5.0), pulse(1, 15.0), pulse(-1, 18.0)];
        let mut a = Autopilot::new(config());
        let mut b = Autopilot::new(config());
        assert_eq!(
            a.evaluate(&pulses, 0.0, 0, 1.0),
            b.evaluate(&pulses, 0.0, 0, 1.0)
        );
    }
}
