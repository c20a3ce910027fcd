#![forbid(unsafe_code)]

//! Random streams used by the engine.
//!
//! Each pass draws from its own [`StdRng`]. Glyph sampling and seed
//! scattering therefore never shift the launch sequence, and reveal timing
//! for a given seed is identical with or without the cosmetic passes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Independent random streams for the launch, scatter, and glyph passes.
#[derive(Debug, Clone)]
pub struct ScrambleRng {
    pub(crate) launch: StdRng,
    pub(crate) scatter: StdRng,
    pub(crate) glyph: StdRng,
}

impl ScrambleRng {
    /// Streams seeded from the operating system.
    #[must_use]
    pub fn from_os_rng() -> Self {
        Self {
            launch: StdRng::from_os_rng(),
            scatter: StdRng::from_os_rng(),
            glyph: StdRng::from_os_rng(),
        }
    }

    /// Reproducible streams derived from one seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            launch: StdRng::seed_from_u64(seed),
            scatter: StdRng::seed_from_u64(seed.wrapping_add(GOLDEN_GAMMA)),
            glyph: StdRng::seed_from_u64(seed.wrapping_add(GOLDEN_GAMMA.wrapping_mul(2))),
        }
    }

    /// Seeded when `seed` is set, OS entropy otherwise.
    #[must_use]
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_os_rng, Self::seeded)
    }
}

/// Weighted coin flip. `chance` must already be clamped into `[0, 1]`.
pub(crate) fn should_scramble<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    rng.random_bool(chance)
}

/// Launch duration: `base + uniform(0, ceil(base / 2))`.
pub(crate) fn launch_duration<R: Rng + ?Sized>(rng: &mut R, base: u32) -> u32 {
    base.saturating_add(rng.random_range(0..=base.div_ceil(2)))
}
