//! Damage mitigation and status-effect stacking rules.

/// Fraction of damage absorbed while an enemy's shield is up.
pub const SHIELD_FACTOR: f32 = 0.35;
/// Seconds before a shield rises during which enemies report a warning.
pub const SHIELD_WARN_LEAD: f32 = 0.6;

/// Damage dealt after armor, pierce and shield are taken into account.
///
/// Armor reduced by pierce never drops below zero, so pierce can cancel armor
/// but never amplifies damage.
#[must_use]
pub fn mitigated_damage(raw: f32, armor: f32, pierce: f32, shielded: bool) -> f32 {
    let effective_armor = (armor - pierce).max(0.0);
    let shield = if shielded { SHIELD_FACTOR } else { 0.0 };
    raw * (1.0 - effective_armor) * (1.0 - shield)
}

/// How a fresh application of an effect combines with one already running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackPolicy {
    /// The incoming magnitude and duration replace the running ones.
    Overwrite,
    /// The incoming magnitude replaces the running one and the duration
    /// becomes the longer of the two.
    ExtendToLongest,
}

/// Slows overwrite whatever slow is running.
pub const SLOW_POLICY: StackPolicy = StackPolicy::Overwrite;
/// Burns take the newest damage rate and the longest remaining time.
pub const BURN_POLICY: StackPolicy = StackPolicy::ExtendToLongest;
/// Stuns keep the longest remaining time.
pub const STUN_POLICY: StackPolicy = StackPolicy::ExtendToLongest;

/// A status effect with a magnitude and a remaining duration in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimedEffect {
    /// Strength of the effect; meaning depends on the effect.
    pub magnitude: f32,
    /// Seconds left before the effect lapses.
    pub remaining: f32,
}

impl TimedEffect {
    /// Creates an effect with the provided magnitude and duration.
    #[must_use]
    pub const fn new(magnitude: f32, remaining: f32) -> Self {
        Self {
            magnitude,
            remaining,
        }
    }

    /// Reports whether the effect still has time left.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    /// Combines an incoming application according to the policy.
    pub fn stack(&mut self, policy: StackPolicy, magnitude: f32, duration: f32) {
        match policy {
            StackPolicy::Overwrite => {
                self.magnitude = magnitude;
                self.remaining = duration;
            }
            StackPolicy::ExtendToLongest => {
                self.magnitude = magnitude;
                self.remaining = self.remaining.max(duration);
            }
        }
    }

    /// Counts down the remaining time; returns whether the effect was active
    /// at the start of the step.
    pub fn decay(&mut self, dt: f32) -> bool {
        if !self.is_active() {
            return false;
        }
        self.remaining -= dt;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_is_non_increasing_in_armor_and_shield() {
        let raw = 18.0;
        let mut previous = f32::INFINITY;
        for step in 0..10 {
            let armor = step as f32 * 0.1;
            let open = mitigated_damage(raw, armor, 0.1, false);
            let shielded = mitigated_damage(raw, armor, 0.1, true);
            assert!(open <= previous);
            assert!(shielded <= open);
            previous = open;
        }
    }

    #[test]
    fn pierce_never_amplifies_damage() {
        assert_eq!(mitigated_damage(10.0, 0.1, 0.5, false), 10.0);
        assert!((mitigated_damage(10.0, 0.35, 0.15, false) - 8.0).abs() < 1e-5);
    }

    #[test]
    fn shield_absorbs_a_flat_fraction() {
        assert!((mitigated_damage(100.0, 0.0, 0.0, true) - 65.0).abs() < 1e-4);
    }

    #[test]
    fn slow_overwrites_running_slow() {
        let mut slow = TimedEffect::new(0.25, 3.0);
        slow.stack(SLOW_POLICY, 0.5, 1.2);
        assert_eq!(slow, TimedEffect::new(0.5, 1.2));
    }

    #[test]
    fn burn_keeps_longest_duration_and_newest_rate() {
        let mut burn = TimedEffect::new(16.0, 3.0);
        burn.stack(BURN_POLICY, 6.0, 2.2);
        assert_eq!(burn, TimedEffect::new(6.0, 3.0));
        burn.stack(BURN_POLICY, 10.0, 4.0);
        assert_eq!(burn, TimedEffect::new(10.0, 4.0));
    }

    #[test]
    fn stun_extends_but_never_shortens() {
        let mut stun = TimedEffect::default();
        stun.stack(STUN_POLICY, 1.0, 0.35);
        stun.stack(STUN_POLICY, 1.0, 0.2);
        assert_eq!(stun.remaining, 0.35);
    }

    #[test]
    fn decay_reports_activity_at_step_start() {
        let mut effect = TimedEffect::new(1.0, 0.05);
        assert!(effect.decay(0.1));
        assert!(!effect.is_active());
        assert!(!effect.decay(0.1));
    }
}
