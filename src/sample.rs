//! Sample normalizer for the raw bridge payload
//!
//! The sensor bridge exposes the latest station sample as a loose JSON
//! object. Every field is optional; unknown fields are ignored. A sample
//! that fails to parse at all is classified upstream as a garbled payload.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when normalizing a bridge payload
#[derive(Debug, Error)]
pub enum SampleError {
    /// The payload was not a well-formed sample object
    #[error("malformed sample payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One normalized telemetry sample from the station bridge.
///
/// Field names mirror the wire format. `rain_mm` is the sensor's cumulative
/// rain counter; its absence means "accept the instantaneous fields, skip
/// rain accounting for this sample".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StationReading {
    #[serde(rename = "battery_mV", default)]
    pub battery_mv: Option<f64>,
    #[serde(default)]
    pub battery_ok: Option<f64>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub firmware: Option<i64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(rename = "temperature_C", default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub wind_dir_deg: Option<f64>,
    #[serde(default)]
    pub wind_avg_m_s: Option<f64>,
    #[serde(default)]
    pub wind_max_m_s: Option<f64>,
    #[serde(default)]
    pub light_lux: Option<f64>,
    #[serde(default)]
    pub uvi: Option<f64>,
    #[serde(default)]
    pub rain_mm: Option<f64>,
    #[serde(rename = "supercap_V", default)]
    pub supercap_v: Option<f64>,
    #[serde(default)]
    pub time: Option<String>,
}

/// Parses a raw bridge response body into a normalized reading.
pub fn parse_reading(body: &str) -> Result<StationReading, SampleError> {
    Ok(serde_json::from_str(body)?)
}
