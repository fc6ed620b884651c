//! Request bodies of the writable resources.
//!
//! Ownership fields are optional on every payload, they are resolved by the
//! assignment rules and never taken over blindly.

use crate::error::ApiError;
use crate::models::{FarmUpdate, PlotUpdate, ReadingUpdate};
use farmwatch_core::{FarmProfile, FieldPlot, SensorKind, SensorReading, UserId};
use farmwatch_core::DEFAULT_READING_SOURCE;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

const MAX_FARM_NAME: usize = 200;
const MAX_LOCATION: usize = 300;
const MAX_CROP: usize = 100;
const MAX_PLOT_NAME: usize = 100;
const MAX_COORDINATES: usize = 100;
const MAX_SOURCE: usize = 50;

/// Body of POST and PUT /api/farms
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FarmPayload {
    /// Only honoured for administrators
    #[serde(default)]
    pub owner: Option<UserId>,
    pub name: String,
    pub location: String,
    pub size: f64,
    pub crop_type: String,
}

impl FarmPayload {
    pub fn to_update(&self) -> FarmUpdate {
        FarmUpdate {
            name: self.name.clone(),
            location: self.location.clone(),
            size: self.size,
            crop_type: self.crop_type.clone(),
        }
    }
}

/// Body of PATCH /api/farms/{id}
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FarmPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub size: Option<f64>,
    pub crop_type: Option<String>,
}

impl FarmPatch {
    pub fn apply(self, farm: &FarmProfile) -> FarmUpdate {
        FarmUpdate {
            name: self.name.unwrap_or_else(|| farm.name.clone()),
            location: self.location.unwrap_or_else(|| farm.location.clone()),
            size: self.size.unwrap_or(farm.size),
            crop_type: self.crop_type.unwrap_or_else(|| farm.crop_type.clone()),
        }
    }
}

/// Body of POST and PUT /api/plots
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlotPayload {
    /// Required for administrators, overridden for everybody else
    #[serde(default)]
    pub farm: Option<i32>,
    pub name: String,
    pub crop_variety: String,
    pub size: f64,
    #[serde(default)]
    pub location_coordinates: Option<String>,
}

impl PlotPayload {
    pub fn to_update(&self) -> PlotUpdate {
        PlotUpdate {
            name: self.name.clone(),
            crop_variety: self.crop_variety.clone(),
            size: self.size,
            location_coordinates: self.location_coordinates.clone(),
        }
    }
}

/// Body of PATCH /api/plots/{id}
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PlotPatch {
    pub name: Option<String>,
    pub crop_variety: Option<String>,
    pub size: Option<f64>,
    /// `null` clears the coordinates, an absent field keeps them
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, nullable)]
    pub location_coordinates: Option<Option<String>>,
}

impl PlotPatch {
    pub fn apply(self, plot: &FieldPlot) -> PlotUpdate {
        PlotUpdate {
            name: self.name.unwrap_or_else(|| plot.name.clone()),
            crop_variety: self
                .crop_variety
                .unwrap_or_else(|| plot.crop_variety.clone()),
            size: self.size.unwrap_or(plot.size),
            location_coordinates: self
                .location_coordinates
                .unwrap_or_else(|| plot.location_coordinates.clone()),
        }
    }
}

/// Tells an explicit `null` apart from an absent field
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of POST and PUT /api/readings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadingPayload {
    /// Required on create, ignored on update
    #[serde(default)]
    pub plot: Option<i32>,
    pub sensor_type: SensorKind,
    pub value: f64,
    #[serde(default)]
    pub source: Option<String>,
}

impl ReadingPayload {
    /// Fields of a new reading, an omitted source falls back to the default
    pub fn to_update(&self) -> ReadingUpdate {
        ReadingUpdate {
            sensor_type: self.sensor_type,
            value: self.value,
            source: self
                .source
                .clone()
                .unwrap_or_else(|| DEFAULT_READING_SOURCE.to_owned()),
        }
    }

    /// Fields replacing a stored reading, an omitted source is kept
    pub fn replace(&self, reading: &SensorReading) -> ReadingUpdate {
        ReadingUpdate {
            sensor_type: self.sensor_type,
            value: self.value,
            source: self
                .source
                .clone()
                .unwrap_or_else(|| reading.source.clone()),
        }
    }
}

/// Body of PATCH /api/readings/{id}
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReadingPatch {
    pub sensor_type: Option<SensorKind>,
    pub value: Option<f64>,
    pub source: Option<String>,
}

impl ReadingPatch {
    pub fn apply(self, reading: &SensorReading) -> ReadingUpdate {
        ReadingUpdate {
            sensor_type: self.sensor_type.unwrap_or(reading.sensor_type),
            value: self.value.unwrap_or(reading.value),
            source: self.source.unwrap_or_else(|| reading.source.clone()),
        }
    }
}

/// Field level checks, run before anything reaches the store
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

impl Validate for FarmUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        required_text("name", &self.name, MAX_FARM_NAME)?;
        required_text("location", &self.location, MAX_LOCATION)?;
        finite("size", self.size)?;
        required_text("crop_type", &self.crop_type, MAX_CROP)
    }
}

impl Validate for PlotUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        required_text("name", &self.name, MAX_PLOT_NAME)?;
        required_text("crop_variety", &self.crop_variety, MAX_CROP)?;
        finite("size", self.size)?;
        if let Some(coordinates) = &self.location_coordinates {
            max_length("location_coordinates", coordinates, MAX_COORDINATES)?;
        }
        Ok(())
    }
}

impl Validate for ReadingUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        finite("value", self.value)?;
        max_length("source", &self.source, MAX_SOURCE)
    }
}

fn required_text(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} may not be blank", field)));
    }
    max_length(field, value, max)
}

fn max_length(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::Validation(format!(
            "{} is longer than {} characters",
            field, max
        )));
    }
    Ok(())
}

fn finite(field: &str, value: f64) -> Result<(), ApiError> {
    if !value.is_finite() {
        return Err(ApiError::Validation(format!(
            "{} must be a finite number",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;

    fn farm_update(name: &str) -> FarmUpdate {
        FarmUpdate {
            name: name.to_owned(),
            location: "Valley".to_owned(),
            size: 3.0,
            crop_type: "corn".to_owned(),
        }
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let err = farm_update("   ").validate().unwrap_err();
        assert_eq!("name may not be blank", err.to_string());
    }

    #[test]
    fn test_overlong_name_is_rejected() {
        assert!(farm_update(&"x".repeat(200)).validate().is_ok());
        let err = farm_update(&"x".repeat(201)).validate().unwrap_err();
        assert_eq!("name is longer than 200 characters", err.to_string());
    }

    #[test]
    fn test_infinite_size_is_rejected() {
        let mut update = farm_update("Green Acres");
        update.size = f64::INFINITY;
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_reading_source_defaults_to_simulator() {
        let payload: ReadingPayload =
            serde_json::from_str(r#"{"plot": 1, "sensor_type": "humidity", "value": 41.5}"#)
                .unwrap();
        let update = payload.to_update();
        assert_eq!("simulator", update.source);
        assert_eq!(SensorKind::Humidity, update.sensor_type);
    }

    #[test]
    fn test_patch_keeps_unspecified_fields() {
        let plot = FieldPlot {
            id: 3,
            farm: 1,
            name: "North Field".to_owned(),
            crop_variety: "durum".to_owned(),
            size: 2.0,
            location_coordinates: Some("52.5,13.4".to_owned()),
            owner: 7,
        };
        let patch = PlotPatch {
            size: Some(4.5),
            ..Default::default()
        };

        let update = patch.apply(&plot);

        assert_eq!("North Field", update.name);
        assert_eq!(4.5, update.size);
        assert_eq!(Some("52.5,13.4".to_owned()), update.location_coordinates);
    }

    #[test]
    fn test_patch_null_clears_coordinates() {
        let plot = FieldPlot {
            id: 3,
            farm: 1,
            name: "North Field".to_owned(),
            crop_variety: "durum".to_owned(),
            size: 2.0,
            location_coordinates: Some("52.5,13.4".to_owned()),
            owner: 7,
        };

        let cleared: PlotPatch =
            serde_json::from_str(r#"{"location_coordinates": null}"#).unwrap();
        let absent: PlotPatch = serde_json::from_str(r#"{"name": "South Field"}"#).unwrap();
        let replaced: PlotPatch =
            serde_json::from_str(r#"{"location_coordinates": "48.1,11.6"}"#).unwrap();

        assert_eq!(None, cleared.apply(&plot).location_coordinates);
        assert_eq!(
            Some("52.5,13.4".to_owned()),
            absent.apply(&plot).location_coordinates
        );
        assert_eq!(
            Some("48.1,11.6".to_owned()),
            replaced.apply(&plot).location_coordinates
        );
    }

    #[test]
    fn test_update_keeps_stored_source() {
        let reading = SensorReading {
            id: 1,
            plot: 2,
            sensor_type: SensorKind::Moisture,
            value: 0.2,
            timestamp: Utc::now(),
            source: "probe-7".to_owned(),
            farm: 1,
            owner: 7,
        };
        let payload: ReadingPayload =
            serde_json::from_str(r#"{"sensor_type": "humidity", "value": 2.0}"#).unwrap();

        let update = payload.replace(&reading);

        assert_eq!("probe-7", update.source);
        assert_eq!(SensorKind::Humidity, update.sensor_type);
    }

    #[test]
    fn test_reading_patch() {
        let reading = SensorReading {
            id: 1,
            plot: 2,
            sensor_type: SensorKind::Moisture,
            value: 0.2,
            timestamp: Utc::now(),
            source: "probe-7".to_owned(),
            farm: 1,
            owner: 7,
        };
        let update = ReadingPatch {
            value: Some(0.5),
            ..Default::default()
        }
        .apply(&reading);

        assert_eq!(SensorKind::Moisture, update.sensor_type);
        assert_eq!("probe-7", update.source);
        assert_eq!(0.5, update.value);
    }
}
