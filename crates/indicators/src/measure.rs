//! Measures taken on an observed quantity and statistics across replications.

use crate::ConfigurationError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// What an indicator reports at each instant.
///
/// All measures but [`Measure::Value`] look at the *condition* "observed
/// value is non-zero".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Measure {
    /// The observed value at the instant.
    #[default]
    Value,
    /// Cumulative time the condition held on `[0, instant]`.
    SojournTime,
    /// Number of false-to-true changes of the condition on `[0, instant]`.
    /// A condition already holding at `t = 0` counts as one occurrence.
    NbOccurrences,
    /// 1 once the condition has held at least once, 0 before.
    HadValue,
}

impl Measure {
    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Measure::Value => "value",
            Measure::SojournTime => "sojourn-time",
            Measure::NbOccurrences => "nb-occurrences",
            Measure::HadValue => "had-value",
        }
    }
}

impl FromStr for Measure {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('_', "-").as_str() {
            "value" => Ok(Measure::Value),
            "sojourn-time" => Ok(Measure::SojournTime),
            "nb-occurrences" => Ok(Measure::NbOccurrences),
            "had-value" => Ok(Measure::HadValue),
            _ => Err(ConfigurationError::UnsupportedMeasure(s.to_string())),
        }
    }
}

impl TryFrom<String> for Measure {
    type Error = ConfigurationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statistic over replications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum Stat {
    Mean,
    /// Population standard deviation.
    StdDev,
}

impl Stat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stat::Mean => "mean",
            Stat::StdDev => "stddev",
        }
    }
}

impl FromStr for Stat {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(Stat::Mean),
            "stddev" | "std" => Ok(Stat::StdDev),
            _ => Err(ConfigurationError::UnsupportedStatistic(s.to_string())),
        }
    }
}

impl TryFrom<String> for Stat {
    type Error = ConfigurationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
