//! Plant detail responses and their typed views.
//!
//! The portal answers every granularity with the same shape: a `data` object
//! mapping a string key to a value that is either a JSON number or a numeric
//! string. Day responses key by `"YYYY-MM-DD HH:MM"`, month responses by day
//! of month, year responses by month, total responses by year.

use super::provider::PortalError;
use super::timespan::Timespan;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

/// Raw series returned by one plant detail query.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailSeries {
    timespan: Timespan,
    values: BTreeMap<String, f64>,
    plant_name: Option<String>,
}

impl DetailSeries {
    pub fn new(timespan: Timespan, values: BTreeMap<String, f64>) -> Self {
        Self {
            timespan,
            values,
            plant_name: None,
        }
    }

    pub fn with_plant_name(mut self, name: impl Into<String>) -> Self {
        self.plant_name = Some(name.into());
        self
    }

    /// Parse the `back` object of a successful detail response.
    pub fn from_back(timespan: Timespan, back: &Value) -> Result<Self, PortalError> {
        let mut values = BTreeMap::new();
        match back.get("data") {
            Some(Value::Object(data)) => {
                for (key, raw) in data {
                    match numeric_value(raw)? {
                        Some(v) => {
                            values.insert(key.clone(), v);
                        }
                        None => warn!(key = %key, ?timespan, "skipping non-finite value"),
                    }
                }
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                return Err(PortalError::Api(format!(
                    "detail data is not an object: {other}"
                )))
            }
        }

        let plant_name = back
            .get("plantData")
            .and_then(|p| p.get("plantName"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            timespan,
            values,
            plant_name,
        })
    }

    pub fn timespan(&self) -> Timespan {
        self.timespan
    }

    /// Raw key→value pairs as delivered.
    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    /// Plant display name, only present on day responses.
    pub fn plant_name(&self) -> Option<&str> {
        self.plant_name.as_deref()
    }

    /// Day view: time of day → watts. The date prefix of each key is dropped.
    pub fn day_samples(&self) -> BTreeMap<String, f64> {
        self.values
            .iter()
            .map(|(key, watts)| {
                let time = key.rsplit(' ').next().unwrap_or(key);
                (time.to_string(), *watts)
            })
            .collect()
    }

    /// Month view: day of month → kWh.
    pub fn month_totals(&self) -> BTreeMap<u32, f64> {
        self.keyed()
    }

    /// Year view: month → kWh.
    pub fn year_totals(&self) -> BTreeMap<u32, f64> {
        self.keyed()
    }

    /// Total view: year → kWh.
    pub fn total_by_year(&self) -> BTreeMap<i32, f64> {
        self.keyed()
    }

    fn keyed<K: FromStr + Ord>(&self) -> BTreeMap<K, f64> {
        let mut out = BTreeMap::new();
        for (key, value) in &self.values {
            match key.trim().parse::<K>() {
                Ok(k) => {
                    out.insert(k, *value);
                }
                Err(_) => warn!(key = %key, timespan = ?self.timespan, "skipping non-numeric key"),
            }
        }
        out
    }
}

/// Read a number that may be encoded as a JSON number or a string.
///
/// `Ok(None)` for finite-check failures (NaN/inf), `Err` for anything that is
/// not numeric at all.
pub(crate) fn numeric_value(raw: &Value) -> Result<Option<f64>, PortalError> {
    let v = match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| PortalError::Api(format!("unrepresentable number {n}")))?,
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| PortalError::Api(format!("non-numeric value '{s}'")))?,
        other => return Err(PortalError::Api(format!("unexpected value {other}"))),
    };
    Ok(v.is_finite().then_some(v))
}
