//! Shared application context
//!
//! Owns the single `WeatherState` aggregate (together with the bridge
//! health block, since both are mutated by the poller under one lock) and
//! the handles every component needs: the summary store, the snapshot
//! persistence, the calendar policy, and the config. Cloned freely; all
//! clones share the same state.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::calendar::Calendar;
use crate::config::Config;
use crate::history::store::SummaryStore;
use crate::poller::BridgeHealth;
use crate::state::snapshot::StatePersistence;
use crate::state::WeatherState;

/// Everything guarded by the single mutual-exclusion domain: the live
/// aggregate and the health classification that describes it.
#[derive(Debug, Default)]
pub struct Shared {
    pub weather: WeatherState,
    pub bridge: BridgeHealth,
}

/// Cloneable handle to the process-wide context.
#[derive(Clone)]
pub struct App {
    shared: Arc<Mutex<Shared>>,
    /// `None` when the store failed to open; history queries then return
    /// empty results instead of failing requests
    pub store: Option<Arc<SummaryStore>>,
    pub persistence: Arc<StatePersistence>,
    pub calendar: Calendar,
    pub config: Arc<Config>,
}

impl App {
    pub fn new(
        weather: WeatherState,
        store: Option<SummaryStore>,
        persistence: StatePersistence,
        calendar: Calendar,
        config: Config,
    ) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                weather,
                bridge: BridgeHealth::default(),
            })),
            store: store.map(Arc::new),
            persistence: Arc::new(persistence),
            calendar,
            config: Arc::new(config),
        }
    }

    /// Acquires the exclusion domain. Held only for short, non-blocking
    /// read-and-copy or mutate sections; never across I/O.
    pub fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().expect("state lock poisoned")
    }

    /// Builds the current-state snapshot under the lock.
    pub fn snapshot_json(&self, now: i64) -> serde_json::Value {
        let shared = self.lock();
        shared.weather.build_current_json(
            &shared.bridge,
            now,
            self.config.latitude,
            self.config.longitude,
        )
    }
}
