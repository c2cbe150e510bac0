//! Bounded fitness score combining survival, foraging and activity.

/// Highest possible fitness.
pub const MAX_FITNESS: f32 = 100.0;

const STARVATION_WEIGHT: f32 = 0.4;
const HUNGER_PER_TICK: f32 = 0.1;
const MAX_HUNGER_PENALTY: f32 = 20.0;
const EFFICIENCY_MIN_AGE: u32 = 50;
const EFFICIENCY_THRESHOLD: f32 = 0.01;
const MAX_INEFFICIENCY_PENALTY: f32 = 15.0;
const EXPECTED_DISTANCE_PER_TICK: f32 = 0.5;
const MAX_INACTIVITY_PENALTY: f32 = 10.0;
const DEATH_PENALTY: f32 = 15.0;
const FOOD_BONUS_PER_ITEM: f32 = 2.0;
const MAX_FOOD_BONUS: f32 = 20.0;
const MAX_LONGEVITY_BONUS: f32 = 10.0;
const HIGH_ENERGY_RATIO: f32 = 0.7;
const MAX_ENERGY_BONUS: f32 = 10.0;

/// The state a fitness score is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vitals {
    /// Current energy.
    pub energy: f32,
    /// Energy capacity.
    pub max_energy: f32,
    /// Ticks lived.
    pub age: u32,
    /// Resources eaten so far.
    pub resources_consumed: u32,
    /// Total distance moved.
    pub distance_traveled: f32,
}

/// Computes a fitness in `[0, 100]`.
pub fn evaluate(v: &Vitals) -> f32 {
    let age = v.age as f32;
    let eaten = v.resources_consumed as f32;
    let energy_ratio = if v.max_energy > 0.0 {
        (v.energy / v.max_energy).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let mut penalty = STARVATION_WEIGHT * (1.0 - energy_ratio) * MAX_FITNESS;

    if v.resources_consumed == 0 {
        penalty += (age * HUNGER_PER_TICK).min(MAX_HUNGER_PENALTY);
    }

    if v.age > EFFICIENCY_MIN_AGE {
        let ratio = eaten / age;
        if ratio < EFFICIENCY_THRESHOLD {
            penalty += MAX_INEFFICIENCY_PENALTY * (1.0 - ratio / EFFICIENCY_THRESHOLD);
        }
    }

    let expected_distance = age * EXPECTED_DISTANCE_PER_TICK;
    if expected_distance > 0.0 && v.distance_traveled < expected_distance {
        let shortfall = 1.0 - v.distance_traveled.max(0.0) / expected_distance;
        penalty += MAX_INACTIVITY_PENALTY * shortfall;
    }

    if v.energy <= 0.0 {
        penalty += DEATH_PENALTY;
    }

    let mut bonus = (eaten * FOOD_BONUS_PER_ITEM).min(MAX_FOOD_BONUS);
    if v.resources_consumed > 0 {
        bonus += (age / 100.0).min(MAX_LONGEVITY_BONUS);
    }
    if energy_ratio > HIGH_ENERGY_RATIO {
        bonus += (energy_ratio - HIGH_ENERGY_RATIO) / (1.0 - HIGH_ENERGY_RATIO) * MAX_ENERGY_BONUS;
    }

    let score = MAX_FITNESS - penalty + bonus;
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, MAX_FITNESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals(energy: f32, age: u32, eaten: u32, distance: f32) -> Vitals {
        Vitals {
            energy,
            max_energy: 100.0,
            age,
            resources_consumed: eaten,
            distance_traveled: distance,
        }
    }

    #[test]
    fn newborn_at_full_energy_is_capped() {
        assert_eq!(evaluate(&vitals(100.0, 0, 0, 0.0)), MAX_FITNESS);
    }

    #[test]
    fn starvation_costs_fitness() {
        let fed = evaluate(&vitals(80.0, 10, 0, 5.0));
        let hungry = evaluate(&vitals(20.0, 10, 0, 5.0));
        assert!(hungry < fed);
    }

    #[test]
    fn dead_agent_scores_low() {
        let score = evaluate(&vitals(0.0, 400, 0, 0.0));
        // 100 - 40 starvation - 20 hunger - 15 inefficiency - 10 inactivity - 15 death
        assert_eq!(score, 0.0);
    }

    #[test]
    fn foraging_is_rewarded() {
        let idle = evaluate(&vitals(50.0, 200, 0, 100.0));
        let forager = evaluate(&vitals(50.0, 200, 5, 100.0));
        assert!(forager > idle);
        assert!((0.0..=MAX_FITNESS).contains(&forager));
    }

    #[test]
    fn non_finite_input_stays_bounded() {
        let score = evaluate(&vitals(f32::NAN, 10, 0, f32::NAN));
        assert!((0.0..=MAX_FITNESS).contains(&score));
    }
}
