//! Time-series endpoints (`/time_series_<kind>_<region>`).
//!
//! Records mix a fixed set of descriptive fields with one column per reported
//! date, so the body is parsed into a `serde_json::Value` first and then walked
//! key by key. Unrecognised record keys are treated as date labels.

use crate::de::{float_from_value, int_from_value, kind_of, string_from_value};
use crate::error::{Error, Result};
use crate::method::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    Deaths,
    Confirmed,
    Recovered,
}

impl SeriesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Deaths => "deaths",
            SeriesKind::Confirmed => "confirmed",
            SeriesKind::Recovered => "recovered",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deaths" => Ok(SeriesKind::Deaths),
            "confirmed" => Ok(SeriesKind::Confirmed),
            "recovered" => Ok(SeriesKind::Recovered),
            other => Err(format!(
                "unknown series kind {other:?} (expected deaths, confirmed or recovered)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Us,
    Global,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Global => "global",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "global" => Ok(Region::Global),
            other => Err(format!("unknown region {other:?} (expected us or global)")),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct TimeSeriesBatch {
    #[serde(rename = "Code")]
    pub code: i64,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Document")]
    pub records: Vec<TimeSeriesRecord>,
}

/// One geographic series. `counts` maps the API's date labels (e.g. `1/22/20`)
/// to the case count reported for that day.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct TimeSeriesRecord {
    pub id: i64,
    pub uid: i64,
    pub iso2: String,
    pub iso3: String,
    pub code3: i64,
    pub fips: i64,
    pub admin2: String,
    pub province_state: String,
    pub country_region: String,
    pub combined_key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub population: i64,
    #[serde(flatten)]
    pub counts: HashMap<String, i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSeries {
    pub kind: SeriesKind,
    pub region: Region,
}

impl TimeSeries {
    pub fn new(kind: SeriesKind, region: Region) -> Self {
        Self { kind, region }
    }
}

impl Method for TimeSeries {
    type Response = TimeSeriesBatch;

    fn path(&self) -> Result<String> {
        Ok(format!("time_series_{}_{}", self.kind, self.region))
    }

    fn decode(body: &str) -> Result<TimeSeriesBatch> {
        decode_batch(body)
    }
}

pub fn decode_batch(body: &str) -> Result<TimeSeriesBatch> {
    let value: Value = serde_json::from_str(body)?;
    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(Error::Decode(format!(
                "expected an object at the top level, found {}",
                kind_of(&other)
            )));
        }
    };

    let mut batch = TimeSeriesBatch::default();
    for (key, value) in &fields {
        match key.as_str() {
            "Code" => set_int(&mut batch.code, key, value)?,
            "Message" => set_string(&mut batch.message, key, value)?,
            "Document" => batch.records = decode_document(value)?,
            _ => warn!(key = %key, "unknown key in time series response"),
        }
    }

    Ok(batch)
}

fn decode_document(value: &Value) -> Result<Vec<TimeSeriesRecord>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                decode_record(item).map_err(|err| match err {
                    Error::Decode(msg) => Error::Decode(format!("Document[{index}]: {msg}")),
                    other => other,
                })
            })
            .collect(),
        other => Err(Error::Decode(format!(
            "`Document` must be an array, found {}",
            kind_of(other)
        ))),
    }
}

/// Walks one `Document` element into a record.
///
/// Known keys fill the named fields; any other key is a date label and its
/// value must be numeric. `null` values leave the field (or date) unset.
pub fn decode_record(value: &Value) -> Result<TimeSeriesRecord> {
    let Value::Object(fields) = value else {
        return Err(Error::Decode(format!(
            "expected a record object, found {}",
            kind_of(value)
        )));
    };

    let mut record = TimeSeriesRecord::default();
    for (key, value) in fields {
        match key.as_str() {
            "id" => set_int(&mut record.id, key, value)?,
            "uid" => set_int(&mut record.uid, key, value)?,
            "iso2" => set_string(&mut record.iso2, key, value)?,
            "iso3" => set_string(&mut record.iso3, key, value)?,
            "code3" => set_int(&mut record.code3, key, value)?,
            "fips" => set_int(&mut record.fips, key, value)?,
            "admin2" => set_string(&mut record.admin2, key, value)?,
            "province_state" => set_string(&mut record.province_state, key, value)?,
            "country_region" => set_string(&mut record.country_region, key, value)?,
            "combined_key" => set_string(&mut record.combined_key, key, value)?,
            "latitude" => set_float(&mut record.latitude, key, value)?,
            "longitude" => set_float(&mut record.longitude, key, value)?,
            "population" => set_int(&mut record.population, key, value)?,
            date => {
                if let Some(count) = int_from_value(value).map_err(|msg| field_error(key, msg))? {
                    record.counts.insert(date.to_string(), count);
                }
            }
        }
    }

    Ok(record)
}

fn set_int(target: &mut i64, key: &str, value: &Value) -> Result<()> {
    if let Some(n) = int_from_value(value).map_err(|msg| field_error(key, msg))? {
        *target = n;
    }
    Ok(())
}

fn set_float(target: &mut f64, key: &str, value: &Value) -> Result<()> {
    if let Some(n) = float_from_value(value).map_err(|msg| field_error(key, msg))? {
        *target = n;
    }
    Ok(())
}

fn set_string(target: &mut String, key: &str, value: &Value) -> Result<()> {
    if let Some(s) = string_from_value(value).map_err(|msg| field_error(key, msg))? {
        *target = s;
    }
    Ok(())
}

fn field_error(key: &str, msg: String) -> Error {
    Error::Decode(format!("field `{key}`: {msg}"))
}
