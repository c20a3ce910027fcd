#![forbid(unsafe_code)]

//! Scramble configuration.
//!
//! [`ScrambleConfig`] carries every tunable of one play cycle. It is plain
//! data: the engine takes a [`normalized`](ScrambleConfig::normalized) copy
//! on construction, so any value a host passes in (zero steps, `NaN`
//! chance, an empty character set) degrades to something that animates
//! instead of panicking. Hosts that prefer to reject bad input call
//! [`validate`](ScrambleConfig::validate) first.
//!
//! # Defaults
//!
//! | Field           | Default                  |
//! |-----------------|--------------------------|
//! | `play_on_mount` | `true`                   |
//! | `text`          | `""`                     |
//! | `speed`         | `1.0` (60 accepted fps)  |
//! | `tick`          | `1`                      |
//! | `step`          | `1`                      |
//! | `chance`        | `1.0`                    |
//! | `seed`          | `1`                      |
//! | `scramble`      | `1`                      |
//! | `ignore`        | `[' ']`                  |
//! | `range`         | code points `65..=125`   |
//! | `overdrive`     | generic filler `'_'`     |
//! | `overflow`      | `true`                   |

use std::time::Duration;

use rand::Rng;

use crate::error::ConfigError;

/// Accepted frames per second at `speed == 1`.
const BASE_FPS: f64 = 60.0;

/// Longest frame interval. Vanishingly small speeds saturate here so the
/// acceptance gate can still open.
pub const MAX_FRAME_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Filler drawn by [`Overdrive::Generic`] (code point 95).
pub const GENERIC_FILLER: char = '_';

const DEFAULT_RANGE_MIN: u32 = 65;
const DEFAULT_RANGE_MAX: u32 = 125;

// ---------------------------------------------------------------------------
// CharRange
// ---------------------------------------------------------------------------

/// Source of the random characters shown while a cell scrambles.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CharRange {
    /// Inclusive code-point interval. Endpoints may be given in either order.
    Interval {
        /// Lower code point.
        min: u32,
        /// Upper code point.
        max: u32,
    },
    /// Explicit list of code points, sampled uniformly.
    Set(Vec<u32>),
}

impl Default for CharRange {
    fn default() -> Self {
        Self::Interval {
            min: DEFAULT_RANGE_MIN,
            max: DEFAULT_RANGE_MAX,
        }
    }
}

impl CharRange {
    /// Inclusive interval between two characters.
    #[must_use]
    pub fn between(a: char, b: char) -> Self {
        Self::Interval {
            min: a as u32,
            max: b as u32,
        }
    }

    /// Explicit set built from the characters of `chars`.
    #[must_use]
    pub fn from_chars(chars: &str) -> Self {
        Self::Set(chars.chars().map(u32::from).collect())
    }

    /// Draw one character uniformly from the range.
    ///
    /// An empty set samples the default interval. Code points that are not
    /// Unicode scalar values render as U+FFFD.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        let code = match self {
            Self::Interval { min, max } => {
                let (lo, hi) = if min <= max { (*min, *max) } else { (*max, *min) };
                rng.random_range(lo..=hi)
            }
            Self::Set(codes) if codes.len() == 1 => codes[0],
            Self::Set(codes) if !codes.is_empty() => codes[rng.random_range(0..codes.len())],
            Self::Set(_) => rng.random_range(DEFAULT_RANGE_MIN..=DEFAULT_RANGE_MAX),
        };
        char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Interval { min, max } => {
                for code in [*min, *max] {
                    if char::from_u32(code).is_none() {
                        return Err(ConfigError::InvalidCodePoint(code));
                    }
                }
                Ok(())
            }
            Self::Set(codes) if codes.is_empty() => Err(ConfigError::EmptyCharSet),
            Self::Set(codes) => match codes.iter().find(|c| char::from_u32(**c).is_none()) {
                Some(code) => Err(ConfigError::InvalidCodePoint(*code)),
                None => Ok(()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Overdrive
// ---------------------------------------------------------------------------

/// Filler flash that sweeps ahead of the reveal frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Overdrive {
    /// No overdrive pass.
    Off,
    /// Sweep with [`GENERIC_FILLER`].
    #[default]
    Generic,
    /// Sweep with a caller-chosen filler.
    Char(char),
}

impl Overdrive {
    /// Filler character, or `None` when overdrive is off.
    #[must_use]
    pub const fn filler(self) -> Option<char> {
        match self {
            Self::Off => None,
            Self::Generic => Some(GENERIC_FILLER),
            Self::Char(c) => Some(c),
        }
    }
}

impl From<bool> for Overdrive {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Generic } else { Self::Off }
    }
}

impl From<char> for Overdrive {
    fn from(filler: char) -> Self {
        Self::Char(filler)
    }
}

// ---------------------------------------------------------------------------
// ScrambleConfig
// ---------------------------------------------------------------------------

/// Configuration of one scramble animation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScrambleConfig {
    /// Animate on activation. When false, activation shows the final text.
    pub play_on_mount: bool,
    /// Target text.
    pub text: String,
    /// Frame-rate multiplier. `0` freezes the engine; infinity accepts
    /// every delivered frame.
    pub speed: f64,
    /// Run a tick only on every Nth accepted frame.
    pub tick: u32,
    /// Characters launched, cells resized, and overdrive positions swept per pass.
    pub step: usize,
    /// Probability that a launched or re-armed character scrambles.
    pub chance: f64,
    /// Re-arm attempts per tick in the seed scatterer.
    pub seed: usize,
    /// Base scramble duration, in composed frames.
    pub scramble: u32,
    /// Characters that never scramble.
    pub ignore: Vec<char>,
    /// Random character source.
    pub range: CharRange,
    /// Overdrive filler setting.
    pub overdrive: Overdrive,
    /// Retain control cells across resets.
    pub overflow: bool,
    /// Seed for deterministic randomness. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for ScrambleConfig {
    fn default() -> Self {
        Self {
            play_on_mount: true,
            text: String::new(),
            speed: 1.0,
            tick: 1,
            step: 1,
            chance: 1.0,
            seed: 1,
            scramble: 1,
            ignore: vec![' '],
            range: CharRange::default(),
            overdrive: Overdrive::default(),
            overflow: true,
            rng_seed: None,
        }
    }
}

impl ScrambleConfig {
    /// Default configuration targeting `text`.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set whether activation animates (builder).
    #[must_use]
    pub fn play_on_mount(mut self, play: bool) -> Self {
        self.play_on_mount = play;
        self
    }

    /// Set the speed multiplier (builder).
    #[must_use]
    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Set the tick-skip factor (builder).
    #[must_use]
    pub fn tick(mut self, tick: u32) -> Self {
        self.tick = tick;
        self
    }

    /// Set the per-tick step size (builder).
    #[must_use]
    pub fn step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    /// Set the scramble probability (builder).
    #[must_use]
    pub fn chance(mut self, chance: f64) -> Self {
        self.chance = chance;
        self
    }

    /// Set the number of re-arm attempts per tick (builder).
    #[must_use]
    pub fn seed(mut self, seed: usize) -> Self {
        self.seed = seed;
        self
    }

    /// Set the base scramble duration (builder).
    #[must_use]
    pub fn scramble(mut self, scramble: u32) -> Self {
        self.scramble = scramble;
        self
    }

    /// Replace the ignore set (builder).
    #[must_use]
    pub fn ignore(mut self, ignore: impl IntoIterator<Item = char>) -> Self {
        self.ignore = ignore.into_iter().collect();
        self
    }

    /// Set the random character source (builder).
    #[must_use]
    pub fn range(mut self, range: CharRange) -> Self {
        self.range = range;
        self
    }

    /// Set the overdrive filler (builder). Accepts `bool` or `char`.
    #[must_use]
    pub fn overdrive(mut self, overdrive: impl Into<Overdrive>) -> Self {
        self.overdrive = overdrive.into();
        self
    }

    /// Set tail retention across resets (builder).
    #[must_use]
    pub fn overflow(mut self, overflow: bool) -> Self {
        self.overflow = overflow;
        self
    }

    /// Seed the random streams for reproducible runs (builder).
    #[must_use]
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Minimum wall time between accepted frames, or `None` when frozen.
    ///
    /// Infinite speed yields [`Duration::ZERO`]; intervals beyond
    /// [`MAX_FRAME_INTERVAL`] saturate to it.
    #[must_use]
    pub fn frame_interval(&self) -> Option<Duration> {
        if self.speed.is_nan() || self.speed <= 0.0 {
            return None;
        }
        let secs = 1.0 / (BASE_FPS * self.speed);
        let interval = Duration::try_from_secs_f64(secs).unwrap_or(MAX_FRAME_INTERVAL);
        Some(interval.min(MAX_FRAME_INTERVAL))
    }

    /// Whether the engine is frozen and will never request frames.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frame_interval().is_none()
    }

    /// Reject values outside their domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.speed.is_nan() || self.speed < 0.0 {
            return Err(ConfigError::InvalidSpeed(self.speed));
        }
        if !self.chance.is_finite() || !(0.0..=1.0).contains(&self.chance) {
            return Err(ConfigError::InvalidChance(self.chance));
        }
        if self.tick == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if self.step == 0 {
            return Err(ConfigError::ZeroStep);
        }
        self.range.validate()
    }

    /// Copy with every value forced into its domain. Never fails.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut cfg = self.clone();
        cfg.chance = if cfg.chance.is_nan() {
            1.0
        } else {
            cfg.chance.clamp(0.0, 1.0)
        };
        if cfg.speed.is_nan() || cfg.speed < 0.0 {
            cfg.speed = 0.0;
        }
        cfg.tick = cfg.tick.max(1);
        cfg.step = cfg.step.max(1);
        if matches!(&cfg.range, CharRange::Set(codes) if codes.is_empty()) {
            cfg.range = CharRange::default();
        }
        cfg
    }
}
