//! Portal trait and structured error types.
//!
//! The SolarPortal trait abstracts over the vendor API so the sync engine can
//! be driven by the real Growatt client or by an in-memory fake in tests.

use super::series::DetailSeries;
use super::timespan::Timespan;
use crate::config::Credentials;
use crate::domain::Plant;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for remote calls.
///
/// These are designed to be displayable by any shell (CLI or GUI).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortalError {
    #[error("login rejected: {0}")]
    Auth(String),

    #[error("no connection to the portal: {0}")]
    Connection(String),

    #[error("portal API error: {0}")]
    Api(String),
}

/// Live figures from the user-center endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyOverview {
    /// Current output in watts.
    pub power_watts: f64,
    /// Energy produced today in kWh.
    pub today_kwh: f64,
}

/// Remote production-data service.
///
/// Methods take `&mut self`: a portal holds one server session and must not be
/// shared between concurrent syncs.
pub trait SolarPortal {
    /// Human-readable name of this portal.
    fn name(&self) -> &str;

    /// Open a session. Rejected credentials are [`PortalError::Auth`].
    fn login(&mut self, credentials: &Credentials) -> Result<(), PortalError>;

    /// Close the session. Best effort; does nothing when not logged in.
    fn logout(&mut self);

    /// All plants registered under the account.
    fn plant_list(&mut self) -> Result<Vec<Plant>, PortalError>;

    /// Production series for one plant at the given granularity.
    fn plant_detail(
        &mut self,
        plant_id: &str,
        timespan: Timespan,
        date: NaiveDate,
    ) -> Result<DetailSeries, PortalError>;

    /// Current power and today's energy for the account.
    fn user_center_energy(&mut self) -> Result<EnergyOverview, PortalError>;
}
