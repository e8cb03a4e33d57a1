//! Growatt ShinePhone portal.
//!
//! Talks to `server.growatt.com` (or a configured base URL) through an
//! [`AuthSession`]. Requests are issued one at a time, never in parallel.

use super::provider::{EnergyOverview, PortalError, SolarPortal};
use super::series::{numeric_value, DetailSeries};
use super::session::AuthSession;
use super::timespan::Timespan;
use crate::config::{Credentials, PortalSettings};
use crate::domain::Plant;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

/// Growatt portal client.
pub struct GrowattPortal {
    session: AuthSession,
}

impl GrowattPortal {
    pub fn new(settings: &PortalSettings) -> Result<Self, PortalError> {
        Ok(Self {
            session: AuthSession::new(settings)?,
        })
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }
}

impl SolarPortal for GrowattPortal {
    fn name(&self) -> &str {
        "growatt"
    }

    fn login(&mut self, credentials: &Credentials) -> Result<(), PortalError> {
        self.session.login(credentials)
    }

    fn logout(&mut self) {
        self.session.logout();
    }

    fn plant_list(&mut self) -> Result<Vec<Plant>, PortalError> {
        let back = self.session.get_enveloped("PlantListAPI.do", &[])?;
        let entries = back
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| PortalError::Api("plant list has no data array".into()))?;

        let plants = entries
            .iter()
            .filter_map(|entry| {
                let id = match entry.get("plantId")? {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                let name = entry
                    .get("plantName")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Some(Plant { id, name })
            })
            .collect::<Vec<_>>();
        debug!(count = plants.len(), "plant list");
        Ok(plants)
    }

    fn plant_detail(
        &mut self,
        plant_id: &str,
        timespan: Timespan,
        date: NaiveDate,
    ) -> Result<DetailSeries, PortalError> {
        let query = [
            ("plantId", plant_id.to_string()),
            ("type", timespan.code().to_string()),
            ("date", timespan.format_date(date)),
        ];
        let back = self.session.get_enveloped("newPlantDetailAPI.do", &query)?;
        DetailSeries::from_back(timespan, &back)
    }

    fn user_center_energy(&mut self) -> Result<EnergyOverview, PortalError> {
        let body = self.session.post_raw(
            "newPlantAPI.do",
            &[("action", "getUserCenterEnertyData")],
            &[("language", "1")],
        )?;
        let field = |name: &str| -> Result<f64, PortalError> {
            let raw = body
                .get(name)
                .ok_or_else(|| PortalError::Api(format!("user center data lacks '{name}'")))?;
            Ok(numeric_value(raw)?.unwrap_or(0.0))
        };
        Ok(EnergyOverview {
            power_watts: field("powerValue")?,
            today_kwh: field("todayValue")?,
        })
    }
}
