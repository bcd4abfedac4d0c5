use humantime::parse_duration;
use serde::de::{Error as DeError, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt::Formatter;
use std::time::Duration;

/// Defines a collection of fine-tune parameters for an
/// [exponential backoff](backoff::ExponentialBackoff) mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    pub(crate) initial_interval: Duration,
    pub(crate) max_interval: Duration,
    pub(crate) randomization_factor: f64,
    pub(crate) multiplier: f64,
    pub(crate) max_elapsed_time: Option<Duration>,
}

impl BackoffConfig {
    /// Exposes the
    /// [initial interval](backoff::ExponentialBackoffBuilder::with_initial_interval)
    /// of this exponential backoff definition.
    pub fn initial_interval(&self) -> Duration {
        self.initial_interval
    }

    /// Exposes the
    /// [max interval](backoff::ExponentialBackoffBuilder::with_max_interval)
    /// of this exponential backoff definition.
    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    /// Exposes the
    /// [randomization factor](backoff::ExponentialBackoffBuilder::with_randomization_factor)
    /// of this exponential backoff definition.
    pub fn randomization_factor(&self) -> f64 {
        self.randomization_factor
    }

    /// Exposes the
    /// [multiplier](backoff::ExponentialBackoffBuilder::with_multiplier)
    /// of this exponential backoff definition.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Exposes the
    /// [max elapsed time](backoff::ExponentialBackoffBuilder::with_max_elapsed_time)
    /// of this exponential backoff definition.
    pub fn max_elapsed_time(&self) -> Option<Duration> {
        self.max_elapsed_time
    }
}

impl BackoffConfig {
    fn default_initial_interval() -> Duration {
        Duration::from_secs(3)
    }

    fn default_max_interval() -> Duration {
        Duration::from_secs(60)
    }

    fn default_randomization_factor() -> f64 {
        0.5
    }

    fn default_multiplier() -> f64 {
        2.0
    }

    fn default_max_elapsed_time() -> Option<Duration> {
        None
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval: Self::default_initial_interval(),
            max_interval: Self::default_max_interval(),
            randomization_factor: Self::default_randomization_factor(),
            multiplier: Self::default_multiplier(),
            max_elapsed_time: Self::default_max_elapsed_time(),
        }
    }
}

impl AsRef<BackoffConfig> for BackoffConfig {
    fn as_ref(&self) -> &BackoffConfig {
        self
    }
}

/// Accepts either a plain number of seconds or a
/// [`humantime`]-formatted duration string (e.g. `"3s"`, `"1m 30s"`).
fn parse_duration_field<'de, D>(value: serde_value::Value) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match value {
        serde_value::Value::String(s) => {
            parse_duration(&s).map_err(|e| DeError::custom(format!("invalid duration: {e}")))
        }
        serde_value::Value::U64(n) => Ok(Duration::from_secs(n)),
        serde_value::Value::F64(n) => Ok(Duration::from_secs_f64(n)),
        other => Err(DeError::custom(format!(
            "expected a duration string or number of seconds, got {:?}",
            other
        ))),
    }
}

impl<'de> Deserialize<'de> for BackoffConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(BackoffConfigVisitor)
    }
}

struct BackoffConfigVisitor;

impl<'de> Visitor<'de> for BackoffConfigVisitor {
    type Value = BackoffConfig;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a map of backoff configuration")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut initial_interval = None;
        let mut max_interval = None;
        let mut randomization_factor = None;
        let mut multiplier = None;
        let mut max_elapsed_time = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "initial_interval" | "initialInterval" => {
                    let raw: serde_value::Value = map.next_value()?;
                    initial_interval = Some(parse_duration_field::<A::Error>(raw)?);
                }
                "max_interval" | "maxInterval" => {
                    let raw: serde_value::Value = map.next_value()?;
                    max_interval = Some(parse_duration_field::<A::Error>(raw)?);
                }
                "randomization_factor" | "randomizationFactor" => {
                    randomization_factor = Some(map.next_value()?);
                }
                "multiplier" => {
                    multiplier = Some(map.next_value()?);
                }
                "max_elapsed_time" | "maxElapsedTime" => {
                    let raw: Option<serde_value::Value> = map.next_value()?;
                    max_elapsed_time = match raw {
                        Some(v) => Some(Some(parse_duration_field::<A::Error>(v)?)),
                        None => Some(None),
                    };
                }
                _ => {
                    let _ignored: serde::de::IgnoredAny = map.next_value()?;
                }
            }
        }

        Ok(BackoffConfig {
            initial_interval: initial_interval
                .unwrap_or_else(BackoffConfig::default_initial_interval),
            max_interval: max_interval.unwrap_or_else(BackoffConfig::default_max_interval),
            randomization_factor: randomization_factor
                .unwrap_or_else(BackoffConfig::default_randomization_factor),
            multiplier: multiplier.unwrap_or_else(BackoffConfig::default_multiplier),
            max_elapsed_time: max_elapsed_time
                .unwrap_or_else(BackoffConfig::default_max_elapsed_time),
        })
    }
}
