//! Random sampling helpers shared by the genetic operators.
//!
//! Every function takes the caller's generator so a simulation can be replayed
//! from a seed.

use rand::Rng;

/// Draws a standard normal sample using the Box-Muller transform.
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let u1 = rng.random::<f32>().clamp(f32::MIN_POSITIVE, 1.0);
    let u2 = rng.random::<f32>();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

/// Returns `true` with probability `p`. Probabilities outside `[0, 1]`
/// saturate instead of panicking.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f32) -> bool {
    rng.random::<f32>() < p
}

/// Number of mutation passes to apply to a newborn controller.
///
/// The first pass always happens. Each further pass succeeds with half the
/// probability of the previous one (0.5, 0.25, ...), so the depth follows a
/// truncated geometric distribution bounded by `max_depth`.
pub fn cascade_depth<R: Rng + ?Sized>(rng: &mut R, max_depth: u32) -> u32 {
    let max_depth = max_depth.max(1);
    let mut depth = 1;
    let mut chance = 0.5_f32;

    while depth < max_depth && rng.random::<f32>() < chance {
        depth += 1;
        chance *= 0.5;
    }

    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn gaussian_is_finite() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            assert!(gaussian(&mut rng).is_finite());
        }
    }

    #[test]
    fn cascade_depth_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10_000 {
            let depth = cascade_depth(&mut rng, 4);
            assert!((1..=4).contains(&depth));
        }
        assert_eq!(cascade_depth(&mut rng, 0), 1);
    }

    #[test]
    fn cascade_depth_is_mostly_shallow() {
        let mut rng = StdRng::seed_from_u64(3);
        let single = (0..4_000)
            .filter(|_| cascade_depth(&mut rng, 16) == 1)
            .count();
        // P(depth == 1) = 0.5
        assert!((1_600..2_400).contains(&single), "got {single}");
    }
}
