use serde::{Deserialize, Serialize};
use std::fmt;

/// Automatic admission mode.
///
/// Persisted as the flat record `{enabled, min, max}`; a range is only
/// meaningful when both bounds are present.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(from = "AutoModeRecord", into = "AutoModeRecord")]
pub enum AutoModeConfig {
    #[default]
    Disabled,
    Unbounded,
    Ranged {
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
struct AutoModeRecord {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
}

impl From<AutoModeRecord> for AutoModeConfig {
    fn from(record: AutoModeRecord) -> Self {
        match (record.enabled, record.min, record.max) {
            (false, _, _) => AutoModeConfig::Disabled,
            (true, Some(min), Some(max)) => AutoModeConfig::Ranged { min, max },
            (true, _, _) => AutoModeConfig::Unbounded,
        }
    }
}

impl From<AutoModeConfig> for AutoModeRecord {
    fn from(config: AutoModeConfig) -> Self {
        match config {
            AutoModeConfig::Disabled => AutoModeRecord::default(),
            AutoModeConfig::Unbounded => AutoModeRecord {
                enabled: true,
                ..Default::default()
            },
            AutoModeConfig::Ranged { min, max } => AutoModeRecord {
                enabled: true,
                min: Some(min),
                max: Some(max),
            },
        }
    }
}

impl AutoModeConfig {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AutoModeConfig::Disabled)
    }

    /// Inclusive range check. Unbounded accepts everything, disabled nothing.
    pub fn covers(&self, amount: f64) -> bool {
        match self {
            AutoModeConfig::Disabled => false,
            AutoModeConfig::Unbounded => true,
            AutoModeConfig::Ranged { min, max } => *min <= amount && amount <= *max,
        }
    }
}

impl fmt::Display for AutoModeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutoModeConfig::Disabled => write!(f, "выключен"),
            AutoModeConfig::Unbounded => write!(f, "включен (любая сумма)"),
            AutoModeConfig::Ranged { min, max } => write!(f, "включен ({:.1} - {:.1})", min, max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_round_trip_shapes() {
        let ranged: AutoModeConfig =
            serde_json::from_str(r#"{"enabled":true,"min":5000,"max":10000}"#).unwrap();
        assert_eq!(
            ranged,
            AutoModeConfig::Ranged {
                min: 5000.0,
                max: 10000.0
            }
        );

        let unbounded: AutoModeConfig =
            serde_json::from_str(r#"{"enabled":true,"min":null,"max":null}"#).unwrap();
        assert_eq!(unbounded, AutoModeConfig::Unbounded);

        let disabled: AutoModeConfig =
            serde_json::from_str(r#"{"enabled":false,"min":1,"max":2}"#).unwrap();
        assert_eq!(disabled, AutoModeConfig::Disabled);

        let json = serde_json::to_value(AutoModeConfig::Unbounded).unwrap();
        assert_eq!(json["enabled"], true);
        assert!(json["min"].is_null());
    }

    #[test]
    fn test_covers_is_inclusive() {
        let ranged = AutoModeConfig::Ranged {
            min: 5000.0,
            max: 10000.0,
        };
        assert!(ranged.covers(5000.0));
        assert!(ranged.covers(10000.0));
        assert!(!ranged.covers(4000.0));
        assert!(!ranged.covers(10000.01));
        assert!(AutoModeConfig::Unbounded.covers(1.0));
        assert!(!AutoModeConfig::Disabled.covers(1.0));
    }
}
