use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::models::device::classify_device;
use crate::models::error::ApiError;

const ID_PREFIX: &str = "loc_";
const ID_RANDOM_LEN: usize = 9;
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// One stored observation, as returned from `POST /api/locations`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub id: String,
    pub device: String,
    #[serde(serialize_with = "serialize_coordinate")]
    pub latitude: f64,
    #[serde(serialize_with = "serialize_coordinate")]
    pub longitude: f64,
    #[serde(serialize_with = "serialize_accuracy")]
    pub accuracy: f64,
    #[serde(rename = "timestamp")]
    pub observed_at: String,
    #[serde(rename = "userAgent")]
    pub client_identifier: String,
    pub created_at: String,
}

/// Latitude and longitude always carry six fractional digits. Exact ties
/// round away from zero and negative zero prints unsigned.
pub fn format_coordinate(value: f64) -> String {
    let magnitude = value.abs();
    // the only exact ties at six decimals are odd multiples of 2^-7
    let scaled = magnitude * 128.0;
    let magnitude = if scaled.fract() == 0.0 && scaled % 2.0 == 1.0 {
        f64::from_bits(magnitude.to_bits() + 1)
    } else {
        magnitude
    };
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{:.6}", sign, magnitude)
}

pub fn format_accuracy(value: f64) -> String {
    value.to_string()
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whole values go out as JSON integers, matching the stored text.
fn serialize_accuracy<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn serialize_coordinate<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_coordinate(*value))
}

pub fn generate_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}{}", ID_PREFIX, &random[..ID_RANDOM_LEN])
}

/// A number that clients may send either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            NumericInput::Number(n) => *n,
            NumericInput::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// Request body of `POST /api/locations`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub latitude: Option<NumericInput>,
    pub longitude: Option<NumericInput>,
    pub accuracy: Option<NumericInput>,
    pub timestamp: Option<String>,
    pub user_agent: Option<String>,
}

impl NewLocation {
    /// Validates the body and stamps it into a record ingested at `now`.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<LocationRecord, ApiError> {
        let (latitude, longitude) = match (&self.latitude, &self.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(ApiError::Validation(
                    "Latitude and longitude are required".to_string(),
                ))
            }
        };
        let (latitude, longitude) = match (latitude.value(), longitude.value()) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(ApiError::Validation(
                    "Latitude and longitude must be numeric".to_string(),
                ))
            }
        };

        let accuracy = match &self.accuracy {
            None => 0.0,
            Some(accuracy) => accuracy
                .value()
                .ok_or_else(|| ApiError::Validation("Accuracy must be numeric".to_string()))?,
        };

        let created_at = format_timestamp(now);
        let observed_at = self
            .timestamp
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| created_at.clone());
        let client_identifier = self.user_agent.unwrap_or_default();

        Ok(LocationRecord {
            id: generate_id(),
            device: classify_device(&client_identifier).to_string(),
            latitude,
            longitude,
            accuracy,
            observed_at,
            client_identifier,
            created_at,
        })
    }
}
