use crate::de::{
    lenient_int, lenient_opt_float, lenient_opt_string, lenient_string, null_as_default,
};
use crate::error::{Error, Result};
use crate::method::Method;
use chrono::{Datelike, Month};
use serde::{Deserialize, Serialize};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DailyReportBatch {
    #[serde(rename = "Code", default, deserialize_with = "lenient_int")]
    pub code: i64,
    #[serde(rename = "Message", default, deserialize_with = "lenient_string")]
    pub message: String,
    #[serde(rename = "Document", default, deserialize_with = "null_as_default")]
    pub reports: Vec<DailyReport>,
}

/// Cases for one country or province. `last_update` is kept as the raw text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DailyReport {
    #[serde(default, deserialize_with = "lenient_int")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub province_state: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country_region: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_update: String,
    #[serde(default, deserialize_with = "lenient_int")]
    pub confirmed: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub deaths: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub recovered: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub active: i64,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub fips: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub combined_key: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_float",
        skip_serializing_if = "Option::is_none"
    )]
    pub case_fatality_ratio: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_float",
        skip_serializing_if = "Option::is_none"
    )]
    pub incidence_rate: Option<f64>,
}

/// The monthly report endpoint, e.g. `/sep2020`.
///
/// The API names months with a four-digit year, so only years 0 through 9999
/// have a path; others fail with `Error::InvalidUrl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyReports {
    // 1..=12, guaranteed by the constructors
    month: u32,
    year: i32,
}

impl DailyReports {
    pub fn new(month: Month, year: i32) -> Self {
        Self {
            month: month.number_from_month(),
            year,
        }
    }

    pub fn at<D: Datelike>(date: &D) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }
}

impl Method for DailyReports {
    type Response = DailyReportBatch;

    fn path(&self) -> Result<String> {
        if !(0..=9999).contains(&self.year) {
            return Err(Error::InvalidUrl(format!(
                "year {} has no four-digit report path",
                self.year
            )));
        }

        let month = MONTH_ABBREVIATIONS[(self.month - 1) as usize];
        Ok(format!("{}{:04}", month, self.year))
    }

    fn decode(body: &str) -> Result<DailyReportBatch> {
        Ok(serde_json::from_str(body)?)
    }
}
