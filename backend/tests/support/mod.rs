//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use astrocal::db::{CityRepository, LocalRepository};
use astrocal::http::AppState;
use astrocal::services::{
    AuthorizationStatus, LocationTimeZoneManager, ManualLocationProvider, MemoryPreferences,
    Preferences, ReportService, RepositoryGeocoder, Settings,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily changed.
///
/// Access to the process environment is serialized across tests and the
/// previous values come back even if `f` panics.
///
/// `Some(v)` sets a variable, `None` removes it.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    saved: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let saved = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { saved }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.saved.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// In-memory repository holding the built-in cities.
pub fn city_repo() -> Arc<dyn CityRepository> {
    Arc::new(LocalRepository::with_defaults())
}

/// Settings backed by memory with `city` as the default city.
pub fn settings_for(
    repo: &Arc<dyn CityRepository>,
    city: &str,
    provider: Arc<ManualLocationProvider>,
) -> Arc<Settings> {
    let prefs = Preferences {
        default_city: Some(city.to_string()),
        default_gps: Some(false),
    };
    Arc::new(Settings::new(
        Box::new(MemoryPreferences::new(prefs)),
        LocationTimeZoneManager::new(Arc::clone(repo)),
        provider,
        Arc::new(RepositoryGeocoder::new(Arc::clone(repo))),
    ))
}

/// Application state for `city` with GPS permission granted.
pub fn app_state(city: &str) -> AppState {
    let repo = city_repo();
    let provider = Arc::new(ManualLocationProvider::new(
        AuthorizationStatus::AuthorizedWhenInUse,
    ));
    let settings = settings_for(&repo, city, provider);
    AppState::new(repo, Arc::new(ReportService::new(settings)))
}
