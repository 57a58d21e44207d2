//! Configuration management for the booking feature.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::ConfigError;
use crate::layout::{probability, RandomSeeder};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Error policy variable (`strict` or `lenient`)
pub const ERROR_POLICY_VAR: &str = "SEATMAP_ERROR_POLICY";
/// Purchasing variant switch
pub const PURCHASE_ENABLED_VAR: &str = "SEATMAP_PURCHASE_ENABLED";
/// Acknowledgment lifetime in milliseconds
pub const ACK_DISMISS_MS_VAR: &str = "SEATMAP_ACK_DISMISS_MS";
/// Fill animation interval in milliseconds
pub const FILL_TICK_MS_VAR: &str = "SEATMAP_FILL_TICK_MS";
/// Fill animation percent per tick
pub const FILL_STEP_VAR: &str = "SEATMAP_FILL_STEP";
/// Probability that a generated seat starts sold
pub const SOLD_RATIO_VAR: &str = "SEATMAP_SOLD_RATIO";
/// Fixed RNG seed for inventory generation
pub const SEED_VAR: &str = "SEATMAP_SEED";

/// How rejected booking operations are reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log at debug level and leave state untouched
    Lenient,
    /// Record the error in `BookingState::last_error` and log a warning
    #[default]
    Strict,
}

impl FromStr for ErrorPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(ConfigError::InvalidValue {
                key: ERROR_POLICY_VAR,
                value: s.to_string(),
                expected: "strict or lenient",
            }),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => f.write_str("lenient"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

/// Booking configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Whether rejected toggles and purchases are surfaced
    pub error_policy: ErrorPolicy,
    /// Purchasing variant (`false` renders a selection-only seat map)
    pub purchase_enabled: bool,
    /// How long a purchase acknowledgment stays visible
    pub acknowledgment_delay: Duration,
    /// Interval between fill animation ticks
    pub fill_tick: Duration,
    /// Percent added per fill tick (1..=100)
    pub fill_step: u8,
    /// Probability that a generated seat starts sold (0.0..=1.0)
    pub sold_ratio: f64,
    /// Fixed RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::Strict,
            purchase_enabled: true,
            acknowledgment_delay: Duration::from_millis(3000),
            fill_tick: Duration::from_millis(50),
            fill_step: 1,
            sold_ratio: 0.3,
            seed: None,
        }
    }
}

impl BookingConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables take their defaults. Invalid values are logged and
    /// replaced by the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from environment variables, rejecting invalid values
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first variable that is
    /// set but cannot be parsed.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::try_from_source(|key| env::var(key).ok())
    }

    /// Like [`BookingConfig::from_env`], reading variables from `source`
    #[must_use]
    pub fn from_source<F>(source: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = Lookup {
            source,
            strict: false,
        };
        // Lenient lookups never fail
        lookup.load().unwrap_or_default()
    }

    /// Like [`BookingConfig::try_from_env`], reading variables from `source`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first invalid variable.
    pub fn try_from_source<F>(source: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Lookup {
            source,
            strict: true,
        }
        .load()
    }

    /// Set the error policy
    #[must_use]
    pub const fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Enable or disable purchasing
    #[must_use]
    pub const fn with_purchase_enabled(mut self, enabled: bool) -> Self {
        self.purchase_enabled = enabled;
        self
    }

    /// Set the acknowledgment lifetime
    #[must_use]
    pub const fn with_acknowledgment_delay(mut self, delay: Duration) -> Self {
        self.acknowledgment_delay = delay;
        self
    }

    /// Set the fill animation interval
    #[must_use]
    pub const fn with_fill_tick(mut self, tick: Duration) -> Self {
        self.fill_tick = tick;
        self
    }

    /// Set the fill step, clamped to 1..=100
    #[must_use]
    pub fn with_fill_step(mut self, step: u8) -> Self {
        self.fill_step = step.clamp(1, 100);
        self
    }

    /// Set the sold ratio, clamped to 0.0..=1.0 (NaN becomes 0.0)
    #[must_use]
    pub fn with_sold_ratio(mut self, ratio: f64) -> Self {
        self.sold_ratio = probability(ratio);
        self
    }

    /// Fix the RNG seed
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Random seeder honouring `seed` and `sold_ratio`
    #[must_use]
    pub fn seeder(&self) -> RandomSeeder {
        match self.seed {
            Some(seed) => RandomSeeder::seeded(seed, self.sold_ratio),
            None => RandomSeeder::from_entropy(self.sold_ratio),
        }
    }
}

struct Lookup<F> {
    source: F,
    strict: bool,
}

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn load(&self) -> Result<BookingConfig, ConfigError> {
        let defaults = BookingConfig::default();

        Ok(BookingConfig {
            error_policy: self.value(
                ERROR_POLICY_VAR,
                "strict or lenient",
                defaults.error_policy,
                |raw| raw.parse().ok(),
            )?,
            purchase_enabled: self.value(
                PURCHASE_ENABLED_VAR,
                "true or false",
                defaults.purchase_enabled,
                parse_bool,
            )?,
            acknowledgment_delay: self.value(
                ACK_DISMISS_MS_VAR,
                "a positive number of milliseconds",
                defaults.acknowledgment_delay,
                parse_millis,
            )?,
            fill_tick: self.value(
                FILL_TICK_MS_VAR,
                "a positive number of milliseconds",
                defaults.fill_tick,
                parse_millis,
            )?,
            fill_step: self.value(
                FILL_STEP_VAR,
                "an integer between 1 and 100",
                defaults.fill_step,
                |raw| raw.parse().ok().filter(|step| (1..=100).contains(step)),
            )?,
            sold_ratio: self.value(
                SOLD_RATIO_VAR,
                "a number between 0.0 and 1.0",
                defaults.sold_ratio,
                |raw| raw.parse().ok().filter(|ratio| (0.0..=1.0).contains(ratio)),
            )?,
            seed: self.value(SEED_VAR, "an unsigned integer", defaults.seed, |raw| {
                raw.parse().ok().map(Some)
            })?,
        })
    }

    fn value<T>(
        &self,
        key: &'static str,
        expected: &'static str,
        default: T,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Result<T, ConfigError> {
        let Some(raw) = (self.source)(key) else {
            return Ok(default);
        };

        match parse(raw.trim()) {
            Some(value) => Ok(value),
            None if self.strict => Err(ConfigError::InvalidValue {
                key,
                value: raw,
                expected,
            }),
            None => {
                tracing::warn!(key, value = %raw, expected, "Invalid configuration value, using default");
                Ok(default)
            },
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_millis(raw: &str) -> Option<Duration> {
    raw.parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}
