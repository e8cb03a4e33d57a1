//! Portal access, caching and synchronization

pub mod cache;
pub mod growatt;
pub mod password;
pub mod pattern;
pub mod progress;
pub mod provider;
pub mod series;
pub mod session;
pub mod sync;
pub mod timespan;

pub use cache::{CacheError, YearCache};
pub use growatt::GrowattPortal;
pub use password::hash_password;
pub use pattern::{FilePattern, PatternError};
pub use progress::{CancelToken, SyncProgress};
pub use provider::{EnergyOverview, PortalError, SolarPortal};
pub use series::DetailSeries;
pub use session::AuthSession;
pub use sync::{FailureKind, FetchRange, SyncEngine, SyncError, SyncOptions, SyncOutcome};
pub use timespan::Timespan;
