#![forbid(unsafe_code)]

//! Configuration validation errors.
//!
//! The engine itself is total: it runs on a normalized copy of its
//! configuration and never fails. [`ConfigError`] is only produced by
//! [`ScrambleConfig::validate`](crate::config::ScrambleConfig::validate),
//! for hosts that want to reject bad user input instead of silently
//! clamping it.

/// A configuration value outside its accepted domain.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `speed` is negative or NaN.
    InvalidSpeed(f64),
    /// `chance` is outside `[0, 1]` or not finite.
    InvalidChance(f64),
    /// `tick` must be at least 1.
    ZeroTick,
    /// `step` must be at least 1.
    ZeroStep,
    /// An explicit character set with no code points.
    EmptyCharSet,
    /// A code point that is not a Unicode scalar value.
    InvalidCodePoint(u32),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidSpeed(speed) => {
                write!(f, "speed must be a non-negative number (got {speed})")
            }
            Self::InvalidChance(chance) => {
                write!(f, "chance must be within [0, 1] (got {chance})")
            }
            Self::ZeroTick => f.write_str("tick must be at least 1"),
            Self::ZeroStep => f.write_str("step must be at least 1"),
            Self::EmptyCharSet => f.write_str("character set is empty"),
            Self::InvalidCodePoint(code) => {
                write!(f, "code point {code:#x} is not a valid character")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
