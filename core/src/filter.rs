//! Optional list filters.
//!
//! Filters only narrow a collection which was already scoped to the
//! principal, they never widen it.

use crate::model::*;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use utoipa::IntoParams;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FarmFilter {
    pub crop_type: Option<String>,
    /// Case-insensitive match on name or location
    pub search: Option<String>,
}

impl FarmFilter {
    pub fn matches(&self, farm: &FarmProfile) -> bool {
        self.crop_type
            .as_ref()
            .map_or(true, |crop_type| &farm.crop_type == crop_type)
            && self.search.as_ref().map_or(true, |term| {
                contains_ignore_case(&farm.name, term) || contains_ignore_case(&farm.location, term)
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PlotFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub farm: Option<i32>,
    pub crop_variety: Option<String>,
    /// Case-insensitive match on name or crop variety
    pub search: Option<String>,
}

impl PlotFilter {
    pub fn matches(&self, plot: &FieldPlot) -> bool {
        self.farm.map_or(true, |farm| plot.farm == farm)
            && self
                .crop_variety
                .as_ref()
                .map_or(true, |variety| &plot.crop_variety == variety)
            && self.search.as_ref().map_or(true, |term| {
                contains_ignore_case(&plot.name, term)
                    || contains_ignore_case(&plot.crop_variety, term)
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReadingFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub plot: Option<i32>,
    pub sensor_type: Option<SensorKind>,
}

impl ReadingFilter {
    pub fn matches(&self, reading: &SensorReading) -> bool {
        self.plot.map_or(true, |plot| reading.plot == plot)
            && self
                .sensor_type
                .map_or(true, |kind| reading.sensor_type == kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnomalyFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub plot: Option<i32>,
    pub anomaly_type: Option<AnomalyKind>,
    pub severity: Option<Severity>,
}

impl AnomalyFilter {
    pub fn matches(&self, anomaly: &AnomalyEvent) -> bool {
        self.plot.map_or(true, |plot| anomaly.plot == plot)
            && self
                .anomaly_type
                .map_or(true, |kind| anomaly.anomaly_type == kind)
            && self
                .severity
                .map_or(true, |severity| anomaly.severity == severity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecommendationFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub anomaly_event: Option<i32>,
    pub confidence: Option<String>,
}

impl RecommendationFilter {
    pub fn matches(&self, recommendation: &AgentRecommendation) -> bool {
        self.anomaly_event
            .map_or(true, |event| recommendation.anomaly_event == event)
            && self
                .confidence
                .as_ref()
                .map_or(true, |confidence| &recommendation.confidence == confidence)
    }
}

/// Id filter where an empty value such as `?plot=` means no filter
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<i32>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integer id or an empty value")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            i32::try_from(value)
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            i32::try_from(value)
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            let value = value.trim();
            if value.is_empty() {
                return Ok(None);
            }
            value
                .parse()
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_option(IdVisitor)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
