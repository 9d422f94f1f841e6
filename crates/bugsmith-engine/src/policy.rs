//! Chaos policy
//!
//! Maps a chaos level to a per-site injection probability and draws the
//! independent decisions the mutation rules ask for. All randomness flows
//! through an explicit [`Entropy`] source owned by the caller.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Lowest accepted chaos level
pub const MIN_LEVEL: u8 = 1;
/// Highest accepted chaos level
pub const MAX_LEVEL: u8 = 10;
/// Level used when a request does not name one
pub const DEFAULT_LEVEL: u8 = 5;
/// Upper bound on the per-site injection probability
pub const MAX_PROBABILITY: f64 = 0.8;

/// Validated chaos level (1..=10)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct ChaosLevel(u8);

impl ChaosLevel {
    /// Validate a level; out-of-range values are rejected, never clamped
    ///
    /// # Errors
    /// Returns [`ConfigError::LevelOutOfRange`] outside `1..=10`
    pub fn new(level: i64) -> Result<Self, ConfigError> {
        match u8::try_from(level) {
            Ok(value) if (MIN_LEVEL..=MAX_LEVEL).contains(&value) => Ok(Self(value)),
            _ => Err(ConfigError::LevelOutOfRange {
                level,
                min: MIN_LEVEL,
                max: MAX_LEVEL,
            }),
        }
    }

    /// Every valid level, lowest first
    pub fn all() -> impl Iterator<Item = ChaosLevel> {
        (MIN_LEVEL..=MAX_LEVEL).map(ChaosLevel)
    }

    /// Get raw level
    #[inline]
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Per-site injection probability: `min(level * 0.1, 0.8)`
    #[inline]
    #[must_use]
    pub fn probability(self) -> f64 {
        (f64::from(self.0) * 0.1).min(MAX_PROBABILITY)
    }
}

impl Default for ChaosLevel {
    fn default() -> Self {
        Self(DEFAULT_LEVEL)
    }
}

impl TryFrom<i64> for ChaosLevel {
    type Error = ConfigError;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<ChaosLevel> for u8 {
    fn from(level: ChaosLevel) -> Self {
        level.0
    }
}

impl std::fmt::Display for ChaosLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of random draws for one run
pub trait Entropy {
    /// Bernoulli draw, true with `probability`
    fn chance(&mut self, probability: f64) -> bool;

    /// Uniform index in `0..len`; `len` is never zero
    fn pick(&mut self, len: usize) -> usize;
}

impl Entropy for StdRng {
    fn chance(&mut self, probability: f64) -> bool {
        self.gen_bool(probability.clamp(0.0, 1.0))
    }

    fn pick(&mut self, len: usize) -> usize {
        if len <= 1 {
            0
        } else {
            self.gen_range(0..len)
        }
    }
}

/// Deterministic entropy for tests
///
/// Plays back scripted decisions in order, then falls back to a fixed
/// answer. Picks always return the same index (modulo the range).
#[derive(Debug, Clone, Default)]
pub struct ScriptedEntropy {
    script: Vec<bool>,
    cursor: usize,
    fallback: bool,
    pick: usize,
    draws: usize,
}

impl ScriptedEntropy {
    /// Every decision succeeds
    #[must_use]
    pub fn always() -> Self {
        Self {
            fallback: true,
            ..Self::default()
        }
    }

    /// Every decision fails
    #[must_use]
    pub fn never() -> Self {
        Self::default()
    }

    /// Play `decisions` in order, then fail every later decision
    #[must_use]
    pub fn from_decisions(decisions: impl Into<Vec<bool>>) -> Self {
        Self {
            script: decisions.into(),
            ..Self::default()
        }
    }

    /// With fixed pick index
    #[inline]
    #[must_use]
    pub fn with_pick(mut self, index: usize) -> Self {
        self.pick = index;
        self
    }

    /// Number of decisions drawn so far
    #[inline]
    #[must_use]
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl Entropy for ScriptedEntropy {
    fn chance(&mut self, _probability: f64) -> bool {
        self.draws += 1;
        match self.script.get(self.cursor) {
            Some(decision) => {
                self.cursor += 1;
                *decision
            }
            None => self.fallback,
        }
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            self.pick % len
        }
    }
}

/// Per-run decision maker
pub struct ChaosPolicy<'e> {
    level: ChaosLevel,
    entropy: &'e mut dyn Entropy,
}

impl<'e> ChaosPolicy<'e> {
    /// Create policy drawing from `entropy`
    pub fn new(level: ChaosLevel, entropy: &'e mut dyn Entropy) -> Self {
        Self { level, entropy }
    }

    /// Get chaos level
    #[inline]
    #[must_use]
    pub fn level(&self) -> ChaosLevel {
        self.level
    }

    /// Get injection probability
    #[inline]
    #[must_use]
    pub fn probability(&self) -> f64 {
        self.level.probability()
    }

    /// Independent Bernoulli decision with the level's probability
    pub fn decide(&mut self) -> bool {
        let probability = self.level.probability();
        self.entropy.chance(probability)
    }

    /// Uniform choice from a non-empty slice
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.entropy.pick(items.len()))
    }
}

impl std::fmt::Debug for ChaosPolicy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChaosPolicy")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}
