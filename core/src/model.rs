use crate::error::ModelError;
use crate::principal::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Declares a closed set of text choices, stored and rendered by their snake_case value
macro_rules! choices {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(ModelError::InvalidChoice {
                        field: $field,
                        value: other.to_owned(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choices!(
    /// Physical quantity a reading was taken of
    SensorKind, "sensor_type" {
        Moisture => "moisture",
        Temperature => "temperature",
        Humidity => "humidity",
    }
);

choices!(
    AnomalyKind, "anomaly_type" {
        MoistureDrop => "moisture_drop",
        TemperatureHigh => "temperature_high",
        HumidityLow => "humidity_low",
        SensorDrift => "sensor_drift",
    }
);

choices!(
    Severity, "severity" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

/// A farm, the root of every ownership chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FarmProfile {
    pub id: i32,
    pub owner: UserId,
    pub name: String,
    pub location: String,
    /// Size in hectares
    pub size: f64,
    pub crop_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldPlot {
    pub id: i32,
    pub farm: i32,
    pub name: String,
    pub crop_variety: String,
    /// Size in hectares
    pub size: f64,
    pub location_coordinates: Option<String>,
    #[serde(skip)]
    pub owner: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SensorReading {
    pub id: i32,
    pub plot: i32,
    pub sensor_type: SensorKind,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(skip)]
    pub farm: i32,
    #[serde(skip)]
    pub owner: UserId,
}

/// Anomaly flagged by the detection model for one plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnomalyEvent {
    pub id: i32,
    pub plot: i32,
    pub anomaly_type: AnomalyKind,
    pub severity: Severity,
    /// Confidence score reported by the detection model
    pub model_confidence: f64,
    pub detected_at: DateTime<Utc>,
    #[serde(skip)]
    pub farm: i32,
    #[serde(skip)]
    pub owner: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AgentRecommendation {
    pub id: i32,
    pub anomaly_event: i32,
    pub recommended_action: String,
    pub explanation_text: String,
    /// Free-form label, e.g. "high"
    pub confidence: String,
    pub generated_at: DateTime<Utc>,
    #[serde(skip)]
    pub farm: i32,
    #[serde(skip)]
    pub owner: UserId,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_choices_roundtrip_through_text() {
        for kind in SensorKind::ALL {
            assert_eq!(*kind, kind.as_str().parse::<SensorKind>().unwrap());
        }
        for kind in AnomalyKind::ALL {
            assert_eq!(*kind, kind.as_str().parse::<AnomalyKind>().unwrap());
        }
        for severity in Severity::ALL {
            assert_eq!(*severity, severity.as_str().parse::<Severity>().unwrap());
        }
    }

    #[test]
    fn test_invalid_choice() {
        let err = "pressure".parse::<SensorKind>().unwrap_err();
        assert_eq!(
            ModelError::InvalidChoice {
                field: "sensor_type",
                value: "pressure".to_owned()
            },
            err
        );
        assert_eq!(
            "\"pressure\" is not a valid choice for sensor_type",
            err.to_string()
        );
    }

    #[test]
    fn test_choices_serialize_as_values() {
        let json = serde_json::to_string(&AnomalyKind::TemperatureHigh).unwrap();
        assert_eq!("\"temperature_high\"", json);

        let parsed: Severity = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(Severity::Medium, parsed);
    }

    #[test]
    fn test_chain_fields_are_not_rendered() {
        let reading = SensorReading {
            id: 4,
            plot: 2,
            sensor_type: SensorKind::Humidity,
            value: 41.5,
            timestamp: Utc::now(),
            source: "simulator".to_owned(),
            farm: 1,
            owner: 7,
        };

        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(2, json["plot"]);
        assert_eq!("humidity", json["sensor_type"]);
        assert!(json.get("farm").is_none());
        assert!(json.get("owner").is_none());
    }
}
