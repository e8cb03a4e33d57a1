//! Shell-facing facade: sync a year, list years, render.

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, SolarviewConfig};
use crate::data::{
    CancelToken, EnergyOverview, GrowattPortal, PortalError, SolarPortal, SyncEngine, SyncOptions,
    SyncOutcome, SyncProgress, YearCache,
};
use crate::domain::YearSnapshot;
use crate::render::{self, Layout, RenderedImage};
use chrono::Datelike;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Portal(#[from] PortalError),
}

/// Everything a shell needs, wired from one config.
pub struct Solarview<P: SolarPortal = GrowattPortal, C: Clock = SystemClock> {
    engine: SyncEngine<P, C>,
    layout: Layout,
}

impl Solarview<GrowattPortal, SystemClock> {
    /// Build the Growatt-backed service described by `config`.
    pub fn from_config(config: &SolarviewConfig) -> Result<Self, ServiceError> {
        let portal = GrowattPortal::new(&config.portal)?;
        Ok(Self::new(SyncEngine::new(
            portal,
            config.year_cache()?,
            config.account.clone(),
        )))
    }
}

impl<P: SolarPortal, C: Clock> Solarview<P, C> {
    pub fn new(engine: SyncEngine<P, C>) -> Self {
        Self {
            engine,
            layout: Layout::default(),
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn cache(&self) -> &YearCache {
        self.engine.cache()
    }

    /// Local years plus the server years seen by the last sync.
    pub fn list_available_years(&self) -> Vec<i32> {
        self.engine.list_available_years()
    }

    /// Sync `year`, reporting progress after each day.
    pub fn sync_year(
        &mut self,
        year: i32,
        progress: Option<&dyn SyncProgress>,
        cancel: Option<&CancelToken>,
    ) -> SyncOutcome {
        let options = SyncOptions { progress, cancel };
        self.engine.sync_year(year, &options)
    }

    /// Sync the current year.
    pub fn sync_current_year(&mut self, progress: Option<&dyn SyncProgress>) -> SyncOutcome {
        let year = self.engine.today().year();
        self.sync_year(year, progress, None)
    }

    pub fn render_image(&self, snapshot: &YearSnapshot) -> RenderedImage {
        render::render(snapshot, &self.layout)
    }

    /// Live power and today's energy.
    pub fn current_energy(&mut self) -> Result<EnergyOverview, PortalError> {
        self.engine.current_energy()
    }
}
