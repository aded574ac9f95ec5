//! User preferences and the GPS state machine.
//!
//! [`Settings`] answers "where is the observer and which zone are they in".
//! With GPS off that is the stored default city. With GPS on it is the last
//! accepted fix, named after its reverse-geocoded locality when there is one.
//!
//! ```text
//!  set_gps(true) ──► permission? ──no──► set_gps(false)
//!                        │yes
//!                        ▼
//!              arm timeout, start updates
//!                        │
//!        ┌───────────────┼────────────────────┐
//!        ▼               ▼                    ▼
//!  fix > 100 m      usable fix          timeout fires
//!  (ignored)   stop updates, geocode   set_gps(false),
//!                  cancel timeout       GpsTimeout event
//! ```
//!
//! Every change is announced as [`SettingsEvent::Updated`] on a broadcast
//! channel.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use astrocal_ephem::{EphemError, GeoPosition};
use async_trait::async_trait;
use chrono_tz::Tz;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;

use super::location::LocationTimeZoneManager;
use crate::config::AppConfig;
use crate::db::{CityRepository, RepositoryError};
use crate::models::Location;

/// City used until the user picks one.
pub const DEFAULT_CITY: &str = "london";

/// Search radius for naming a fix after a known city.
pub const GEOCODE_RADIUS_KM: f64 = 50.0;

pub const GPS_TIMEOUT_MESSAGE: &str =
    "GPS timed out. Unable to fetch location. Falling back to your default location in the settings menu.";

pub const PERMISSION_DENIED_MESSAGE: &str =
    "In order to use GPS, please open up the application's settings and change location access to 'Always' or 'When In Use'.";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("failed to access preferences at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse preferences at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown city '{0}'")]
    UnknownCity(String),

    #[error("no time zone known for city '{0}'")]
    UnknownTimeZone(String),

    #[error("reverse geocoding failed: {0}")]
    Geocoding(String),

    #[error("invalid location fix: {0}")]
    InvalidFix(EphemError),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Location access granted to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedAlways,
    AuthorizedWhenInUse,
}

impl AuthorizationStatus {
    pub fn is_authorized(self) -> bool {
        matches!(
            self,
            AuthorizationStatus::AuthorizedAlways | AuthorizationStatus::AuthorizedWhenInUse
        )
    }
}

/// Stored user choices. A missing key means "never set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_gps: Option<bool>,
}

/// Persistent key/value storage for [`Preferences`].
pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> Result<Preferences>;

    /// Apply `f` to the stored preferences and persist the result.
    fn update(&self, f: &mut dyn FnMut(&mut Preferences)) -> Result<Preferences>;
}

/// Preferences kept in a TOML file.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// original, so a crash never leaves a half-written file behind.
pub struct FilePreferences {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read(&self) -> Result<Preferences> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Preferences::default()),
            Err(e) => return Err(self.io_error(e)),
        };
        toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, prefs: &Preferences) -> Result<()> {
        let content = toml::to_string_pretty(prefs)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, content).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

impl PreferenceStore for FilePreferences {
    fn load(&self) -> Result<Preferences> {
        self.read()
    }

    fn update(&self, f: &mut dyn FnMut(&mut Preferences)) -> Result<Preferences> {
        let _guard = self.write_lock.lock();
        let mut prefs = self.read()?;
        f(&mut prefs);
        self.write(&prefs)?;
        Ok(prefs)
    }
}

/// Preferences that live as long as the process.
#[derive(Default)]
pub struct MemoryPreferences {
    prefs: Mutex<Preferences>,
}

impl MemoryPreferences {
    pub fn new(prefs: Preferences) -> Self {
        Self {
            prefs: Mutex::new(prefs),
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn load(&self) -> Result<Preferences> {
        Ok(self.prefs.lock().clone())
    }

    fn update(&self, f: &mut dyn FnMut(&mut Preferences)) -> Result<Preferences> {
        let mut prefs = self.prefs.lock();
        f(&mut prefs);
        Ok(prefs.clone())
    }
}

/// One position report from a location source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above sea level.
    #[serde(default)]
    pub altitude: f64,
    /// Radius of uncertainty in metres.
    pub horizontal_accuracy: f64,
}

impl LocationFix {
    /// Coordinates must be usable as an observing site.
    pub fn validate(&self) -> Result<()> {
        GeoPosition::new(self.longitude, self.latitude, self.altitude)
            .validate()
            .map_err(SettingsError::InvalidFix)
    }
}

/// Reverse-geocoding result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placemark {
    pub locality: Option<String>,
    pub timezone: Option<String>,
}

/// Names a position.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when nothing is known about the position.
    async fn reverse_geocode(&self, fix: &LocationFix) -> Result<Option<Placemark>>;
}

/// Names a fix after the closest known city.
pub struct RepositoryGeocoder {
    repo: Arc<dyn CityRepository>,
    max_distance_km: f64,
}

impl RepositoryGeocoder {
    pub fn new(repo: Arc<dyn CityRepository>) -> Self {
        Self {
            repo,
            max_distance_km: GEOCODE_RADIUS_KM,
        }
    }

    pub fn with_max_distance(mut self, km: f64) -> Self {
        self.max_distance_km = km;
        self
    }
}

#[async_trait]
impl Geocoder for RepositoryGeocoder {
    async fn reverse_geocode(&self, fix: &LocationFix) -> Result<Option<Placemark>> {
        let nearest = self
            .repo
            .nearest_city(fix.latitude, fix.longitude, self.max_distance_km)
            .await?;
        Ok(nearest.map(|record| Placemark {
            locality: Some(record.city),
            timezone: Some(record.timezone),
        }))
    }
}

/// Source of position fixes and of the permission to use them.
pub trait LocationProvider: Send + Sync {
    fn authorization_status(&self) -> AuthorizationStatus;
    fn request_when_in_use_authorization(&self);
    fn start_updating_location(&self);
    fn stop_updating_location(&self);
}

/// Provider whose fixes are pushed in from outside, e.g. over HTTP.
///
/// The authorization status is fixed by configuration unless changed with
/// [`ManualLocationProvider::set_authorization`].
pub struct ManualLocationProvider {
    status: Mutex<AuthorizationStatus>,
    updating: AtomicBool,
    requested: AtomicBool,
}

impl ManualLocationProvider {
    pub fn new(status: AuthorizationStatus) -> Self {
        Self {
            status: Mutex::new(status),
            updating: AtomicBool::new(false),
            requested: AtomicBool::new(false),
        }
    }

    pub fn set_authorization(&self, status: AuthorizationStatus) {
        *self.status.lock() = status;
    }

    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }

    /// Whether authorization has been asked for since creation.
    pub fn authorization_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

impl LocationProvider for ManualLocationProvider {
    fn authorization_status(&self) -> AuthorizationStatus {
        *self.status.lock()
    }

    fn request_when_in_use_authorization(&self) {
        info!("Location authorization requested");
        self.requested.store(true, Ordering::SeqCst);
    }

    fn start_updating_location(&self) {
        self.updating.store(true, Ordering::SeqCst);
    }

    fn stop_updating_location(&self) {
        self.updating.store(false, Ordering::SeqCst);
    }
}

/// Notification sent to every subscriber of [`Settings::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsEvent {
    /// City, GPS flag or GPS position changed.
    Updated,
    GpsTimeout(String),
    PermissionDenied(String),
}

#[derive(Default)]
struct GpsState {
    fix: Option<LocationFix>,
    placemark: Option<Placemark>,
    /// Coordinate-named location used when geocoding found nothing.
    tmp_location: Option<Location>,
    updating: bool,
    timeout: Option<AbortHandle>,
}

impl GpsState {
    fn cancel_timeout(&mut self) {
        if let Some(handle) = self.timeout.take() {
            handle.abort();
        }
    }
}

/// User settings shared by the whole application.
///
/// Methods that may arm the GPS timer take `self: &Arc<Self>` so the
/// timer can hold a weak reference back.
pub struct Settings {
    store: Box<dyn PreferenceStore>,
    locations: LocationTimeZoneManager,
    provider: Arc<dyn LocationProvider>,
    geocoder: Arc<dyn Geocoder>,
    gps_state: Mutex<GpsState>,
    events: broadcast::Sender<SettingsEvent>,
    timeout: Duration,
    max_accuracy_m: f64,
}

impl Settings {
    pub fn new(
        store: Box<dyn PreferenceStore>,
        locations: LocationTimeZoneManager,
        provider: Arc<dyn LocationProvider>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            store,
            locations,
            provider,
            geocoder,
            gps_state: Mutex::new(GpsState::default()),
            events,
            timeout: Duration::from_secs(30),
            max_accuracy_m: 100.0,
        }
    }

    /// Settings wired the way the server runs: a preference file, a manual
    /// location provider and repository-based geocoding.
    pub fn from_config(config: &AppConfig, repo: Arc<dyn CityRepository>) -> Self {
        Self::new(
            Box::new(FilePreferences::new(config.settings.path.clone())),
            LocationTimeZoneManager::new(Arc::clone(&repo)),
            Arc::new(ManualLocationProvider::new(config.gps.authorization)),
            Arc::new(RepositoryGeocoder::new(repo)),
        )
        .with_timeout(Duration::from_secs(config.gps.timeout_secs))
        .with_max_accuracy(config.gps.max_accuracy_m)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_accuracy(mut self, metres: f64) -> Self {
        self.max_accuracy_m = metres;
        self
    }

    pub fn locations(&self) -> &LocationTimeZoneManager {
        &self.locations
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SettingsEvent> {
        self.events.subscribe()
    }

    fn notify(&self, event: SettingsEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    /// Resume GPS tracking if it was left on.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let gps = self.gps()?;
        self.update_location(gps);
        Ok(())
    }

    /// The stored city, storing [`DEFAULT_CITY`] on first use.
    pub fn city(&self) -> Result<String> {
        if let Some(city) = self.store.load()?.default_city {
            return Ok(city);
        }
        let prefs = self.store.update(&mut |p| {
            p.default_city.get_or_insert_with(|| DEFAULT_CITY.to_string());
        })?;
        Ok(prefs.default_city.unwrap_or_else(|| DEFAULT_CITY.to_string()))
    }

    /// The stored GPS flag, storing `false` on first use.
    pub fn gps(&self) -> Result<bool> {
        if let Some(gps) = self.store.load()?.default_gps {
            return Ok(gps);
        }
        let prefs = self.store.update(&mut |p| {
            p.default_gps.get_or_insert(false);
        })?;
        Ok(prefs.default_gps.unwrap_or(false))
    }

    /// Stored city without writing a default.
    fn city_or_default(&self) -> Result<String> {
        Ok(self
            .store
            .load()?
            .default_city
            .unwrap_or_else(|| DEFAULT_CITY.to_string()))
    }

    /// Zone of the default city, or the system zone while GPS is on.
    pub async fn timezone(&self) -> Result<Tz> {
        if self.gps()? {
            return Ok(LocationTimeZoneManager::timezone_from_system());
        }
        let city = self.city_or_default()?;
        self.locations
            .timezone_from_city(&city)
            .await?
            .ok_or(SettingsError::UnknownTimeZone(city))
    }

    /// Where the observer is.
    pub async fn location(&self) -> Result<Location> {
        if !self.gps()? {
            let city = self.city_or_default()?;
            return self
                .locations
                .gps_from_city_name(&city)
                .await?
                .ok_or(SettingsError::UnknownCity(city));
        }

        let state = self.gps_state.lock();
        let named = state.placemark.as_ref().and_then(|p| p.locality.clone());
        if let (Some(locality), Some(fix)) = (named, state.fix) {
            return Ok(Location::new(
                Some(locality),
                fix.longitude,
                fix.latitude,
                fix.altitude,
            ));
        }
        Ok(state
            .tmp_location
            .clone()
            .unwrap_or_else(Location::fetching))
    }

    pub fn set_city_name(&self, city: &str) -> Result<()> {
        let city = city.to_string();
        self.store.update(&mut |p| p.default_city = Some(city.clone()))?;
        info!("Default city set to '{}'", city);
        self.notify(SettingsEvent::Updated);
        Ok(())
    }

    pub fn set_gps(self: &Arc<Self>, enabled: bool) -> Result<()> {
        self.store.update(&mut |p| p.default_gps = Some(enabled))?;
        info!("GPS {}", if enabled { "enabled" } else { "disabled" });
        self.update_location(enabled);
        Ok(())
    }

    /// Start or stop GPS tracking.
    pub fn update_location(self: &Arc<Self>, enabled: bool) {
        if enabled {
            let status = self.provider.authorization_status();
            if self.check_location_permissions(status) {
                {
                    let mut state = self.gps_state.lock();
                    state.placemark = None;
                    state.tmp_location = None;
                    state.updating = true;
                    state.cancel_timeout();
                    state.timeout = self.arm_timeout();
                }
                self.provider.start_updating_location();
            } else if let Err(e) = self.set_gps(false) {
                warn!("Failed to turn GPS off after permission check: {}", e);
            }
        } else {
            {
                let mut state = self.gps_state.lock();
                state.updating = false;
                state.cancel_timeout();
            }
            self.provider.stop_updating_location();
        }

        self.notify(SettingsEvent::Updated);
    }

    fn arm_timeout(self: &Arc<Self>) -> Option<AbortHandle> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, GPS timeout not armed");
            return None;
        };
        let weak: Weak<Self> = Arc::downgrade(self);
        let timeout = self.timeout;
        let task = runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(settings) = weak.upgrade() {
                settings.handle_gps_timeout();
            }
        });
        Some(task.abort_handle())
    }

    /// Whether `status` allows location use, prompting or warning if not.
    pub fn check_location_permissions(&self, status: AuthorizationStatus) -> bool {
        match status {
            AuthorizationStatus::NotDetermined => {
                self.provider.request_when_in_use_authorization();
                false
            }
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => {
                warn!("Location access is {:?}", status);
                self.notify(SettingsEvent::PermissionDenied(
                    PERMISSION_DENIED_MESSAGE.to_string(),
                ));
                false
            }
            AuthorizationStatus::AuthorizedAlways | AuthorizationStatus::AuthorizedWhenInUse => {
                true
            }
        }
    }

    /// React to the user granting or revoking location access.
    pub fn on_authorization_change(&self, status: AuthorizationStatus) -> Result<bool> {
        if self.gps()? {
            return Ok(self.check_location_permissions(status));
        }
        Ok(false)
    }

    /// Feed position reports in. Only the last one is considered.
    ///
    /// Returns whether the fix was accepted. Fixes arriving with GPS off, or
    /// less accurate than the configured limit, are ignored. A fix outside
    /// the valid coordinate ranges is an error and leaves the state alone.
    pub async fn on_location_update(&self, fixes: &[LocationFix]) -> Result<bool> {
        let Some(fix) = fixes.last().copied() else {
            return Ok(false);
        };
        if !self.gps()? {
            debug!("Ignoring location fix while GPS is off");
            return Ok(false);
        }
        if fix.horizontal_accuracy.is_nan() || fix.horizontal_accuracy > self.max_accuracy_m {
            debug!(
                "Ignoring location fix with accuracy {} m",
                fix.horizontal_accuracy
            );
            return Ok(false);
        }
        fix.validate()?;

        // Updates keep running until the fix has been named.
        let placemark = self.geocoder.reverse_geocode(&fix).await?;

        {
            let mut state = self.gps_state.lock();
            state.fix = Some(fix);
            match placemark {
                Some(placemark) => {
                    debug!("Location fix named {:?}", placemark.locality);
                    state.placemark = Some(placemark);
                    state.tmp_location = None;
                }
                None => {
                    state.placemark = None;
                    state.tmp_location = Some(Location::new(
                        Some(format!("{:.2}, {:.2}", fix.latitude, fix.longitude)),
                        fix.longitude,
                        fix.latitude,
                        fix.altitude,
                    ));
                }
            }
            state.updating = false;
            state.cancel_timeout();
        }
        self.provider.stop_updating_location();

        self.notify(SettingsEvent::Updated);
        Ok(true)
    }

    /// No usable fix arrived in time: fall back to the default city.
    pub fn handle_gps_timeout(self: &Arc<Self>) {
        warn!("GPS timed out after {:?}", self.timeout);
        self.gps_state.lock().cancel_timeout();
        if let Err(e) = self.set_gps(false) {
            warn!("Failed to turn GPS off after timeout: {}", e);
        }
        self.notify(SettingsEvent::Updated);
        self.notify(SettingsEvent::GpsTimeout(GPS_TIMEOUT_MESSAGE.to_string()));
    }

    /// Whether a GPS fix is being waited for.
    pub fn is_updating_location(&self) -> bool {
        self.gps_state.lock().updating
    }

    /// Forget the default city.
    pub fn wipe_keys(&self) -> Result<()> {
        self.store.update(&mut |p| p.default_city = None)?;
        Ok(())
    }

    pub fn print_keys(&self) -> Result<()> {
        info!("default_city = {:?}", self.store.load()?.default_city);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;

    fn settings_with(status: AuthorizationStatus) -> (Arc<Settings>, Arc<ManualLocationProvider>) {
        settings_with_timeout(status, Duration::from_secs(30))
    }

    fn settings_with_timeout(
        status: AuthorizationStatus,
        timeout: Duration,
    ) -> (Arc<Settings>, Arc<ManualLocationProvider>) {
        let repo: Arc<dyn CityRepository> = Arc::new(LocalRepository::with_defaults());
        let provider = Arc::new(ManualLocationProvider::new(status));
        let settings = Settings::new(
            Box::new(MemoryPreferences::default()),
            LocationTimeZoneManager::new(Arc::clone(&repo)),
            provider.clone(),
            Arc::new(RepositoryGeocoder::new(repo)),
        )
        .with_timeout(timeout);
        (Arc::new(settings), provider)
    }

    #[test]
    fn test_first_use_stores_defaults() {
        let store = MemoryPreferences::default();
        let repo: Arc<dyn CityRepository> = Arc::new(LocalRepository::new());
        let settings = Settings::new(
            Box::new(store),
            LocationTimeZoneManager::new(Arc::clone(&repo)),
            Arc::new(ManualLocationProvider::new(AuthorizationStatus::Denied)),
            Arc::new(RepositoryGeocoder::new(repo)),
        );
        assert_eq!(settings.city().unwrap(), "london");
        assert!(!settings.gps().unwrap());

        let prefs = settings.store.load().unwrap();
        assert_eq!(prefs.default_city.as_deref(), Some("london"));
        assert_eq!(prefs.default_gps, Some(false));
    }

    #[test]
    fn test_file_preferences_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.toml");
        let store = FilePreferences::new(&path);
        assert_eq!(store.load().unwrap(), Preferences::default());

        store
            .update(&mut |p| {
                p.default_city = Some("paris".into());
                p.default_gps = Some(true);
            })
            .unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("nested").join("prefs.toml.tmp").exists());

        let reopened = FilePreferences::new(&path);
        let prefs = reopened.load().unwrap();
        assert_eq!(prefs.default_city.as_deref(), Some("paris"));
        assert_eq!(prefs.default_gps, Some(true));
    }

    #[test]
    fn test_file_preferences_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        fs::write(&path, "default_gps = \"maybe\"").unwrap();
        assert!(matches!(
            FilePreferences::new(&path).load(),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn test_permission_checks() {
        let (settings, provider) = settings_with(AuthorizationStatus::NotDetermined);
        let mut rx = settings.subscribe();

        assert!(!settings.check_location_permissions(AuthorizationStatus::NotDetermined));
        assert!(provider.authorization_requested());

        assert!(!settings.check_location_permissions(AuthorizationStatus::Restricted));
        assert_eq!(
            rx.try_recv().unwrap(),
            SettingsEvent::PermissionDenied(PERMISSION_DENIED_MESSAGE.to_string())
        );

        assert!(settings.check_location_permissions(AuthorizationStatus::AuthorizedAlways));
        assert!(settings.check_location_permissions(AuthorizationStatus::AuthorizedWhenInUse));
    }

    #[tokio::test]
    async fn test_gps_off_uses_city() {
        let (settings, _) = settings_with(AuthorizationStatus::AuthorizedWhenInUse);
        settings.set_city_name("paris").unwrap();

        let loc = settings.location().await.unwrap();
        assert_eq!(loc.city.as_deref(), Some("paris"));
        assert_eq!(settings.timezone().await.unwrap(), chrono_tz::Europe::Paris);
    }

    #[tokio::test]
    async fn test_unknown_city_is_an_error() {
        let (settings, _) = settings_with(AuthorizationStatus::AuthorizedWhenInUse);
        settings.set_city_name("atlantis").unwrap();
        assert!(matches!(
            settings.location().await,
            Err(SettingsError::UnknownCity(_))
        ));
        assert!(matches!(
            settings.timezone().await,
            Err(SettingsError::UnknownTimeZone(_))
        ));
    }

    #[tokio::test]
    async fn test_denied_gps_turns_itself_off() {
        let (settings, provider) = settings_with(AuthorizationStatus::Denied);
        settings.set_gps(true).unwrap();

        assert!(!settings.gps().unwrap());
        assert!(!provider.is_updating());
        assert!(!settings.is_updating_location());
    }

    #[tokio::test]
    async fn test_fix_named_after_nearby_city() {
        let (settings, provider) = settings_with(AuthorizationStatus::AuthorizedWhenInUse);
        settings.set_gps(true).unwrap();
        assert!(provider.is_updating());
        assert_eq!(
            settings.location().await.unwrap().city.as_deref(),
            Some(crate::models::FETCHING_LOCATION)
        );

        let coarse = LocationFix {
            latitude: 51.5,
            longitude: -0.12,
            altitude: 20.0,
            horizontal_accuracy: 250.0,
        };
        assert!(!settings.on_location_update(&[coarse]).await.unwrap());
        assert!(settings.is_updating_location());

        let good = LocationFix {
            horizontal_accuracy: 10.0,
            ..coarse
        };
        assert!(settings.on_location_update(&[coarse, good]).await.unwrap());
        assert!(!settings.is_updating_location());
        assert!(!provider.is_updating());

        let loc = settings.location().await.unwrap();
        assert_eq!(loc.city.as_deref(), Some("london"));
        assert_eq!(loc.latitude.value(), 51.5);
        assert_eq!(loc.elevation.value(), 20.0);
    }

    #[tokio::test]
    async fn test_fix_far_from_cities_gets_coordinate_name() {
        let (settings, _) = settings_with(AuthorizationStatus::AuthorizedAlways);
        settings.set_gps(true).unwrap();

        let fix = LocationFix {
            latitude: -45.123,
            longitude: -130.456,
            altitude: 0.0,
            horizontal_accuracy: 5.0,
        };
        assert!(settings.on_location_update(&[fix]).await.unwrap());
        let loc = settings.location().await.unwrap();
        assert_eq!(loc.city.as_deref(), Some("-45.12, -130.46"));
        assert_eq!(loc.longitude.value(), -130.456);
    }

    #[tokio::test]
    async fn test_out_of_range_fix_is_rejected() {
        let (settings, provider) = settings_with(AuthorizationStatus::AuthorizedWhenInUse);
        settings.set_gps(true).unwrap();

        let fix = LocationFix {
            latitude: 95.0,
            longitude: 200.0,
            altitude: 0.0,
            horizontal_accuracy: 5.0,
        };
        assert!(matches!(
            settings.on_location_update(&[fix]).await,
            Err(SettingsError::InvalidFix(_))
        ));
        assert!(settings.is_updating_location());
        assert!(provider.is_updating());
        assert_eq!(
            settings.location().await.unwrap().city.as_deref(),
            Some(crate::models::FETCHING_LOCATION)
        );
    }

    #[tokio::test]
    async fn test_fix_ignored_while_gps_off() {
        let (settings, _) = settings_with(AuthorizationStatus::AuthorizedAlways);
        let fix = LocationFix {
            latitude: 51.5,
            longitude: -0.12,
            altitude: 0.0,
            horizontal_accuracy: 5.0,
        };
        assert!(!settings.on_location_update(&[fix]).await.unwrap());
        assert!(!settings.on_location_update(&[]).await.unwrap());
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_city() {
        let (settings, provider) = settings_with_timeout(
            AuthorizationStatus::AuthorizedWhenInUse,
            Duration::from_millis(50),
        );
        let mut rx = settings.subscribe();

        settings.set_gps(true).unwrap();
        assert_eq!(rx.recv().await.unwrap(), SettingsEvent::Updated);

        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(!settings.gps().unwrap());
        assert!(!provider.is_updating());
        let mut saw_timeout = false;
        while let Ok(event) = rx.try_recv() {
            if event == SettingsEvent::GpsTimeout(GPS_TIMEOUT_MESSAGE.to_string()) {
                saw_timeout = true;
            }
        }
        assert!(saw_timeout);
        assert_eq!(
            settings.location().await.unwrap().city.as_deref(),
            Some("london")
        );
    }

    #[tokio::test]
    async fn test_disable_cancels_timeout() {
        let (settings, _) = settings_with_timeout(
            AuthorizationStatus::AuthorizedWhenInUse,
            Duration::from_millis(50),
        );
        settings.set_gps(true).unwrap();
        settings.set_gps(false).unwrap();
        let mut rx = settings.subscribe();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_authorization_change_only_matters_with_gps_on() {
        let (settings, _) = settings_with(AuthorizationStatus::NotDetermined);
        assert!(!settings
            .on_authorization_change(AuthorizationStatus::AuthorizedAlways)
            .unwrap());

        settings
            .store
            .update(&mut |p| p.default_gps = Some(true))
            .unwrap();
        assert!(settings
            .on_authorization_change(AuthorizationStatus::AuthorizedAlways)
            .unwrap());
    }

    #[test]
    fn test_wipe_keys() {
        let (settings, _) = settings_with(AuthorizationStatus::Denied);
        settings.set_city_name("tokyo").unwrap();
        settings.print_keys().unwrap();
        settings.wipe_keys().unwrap();
        assert_eq!(settings.store.load().unwrap().default_city, None);
        assert_eq!(settings.city().unwrap(), "london");
    }

    #[test]
    fn test_authorization_serde_names() {
        let status: AuthorizationStatus =
            serde_json::from_str("\"authorized_when_in_use\"").unwrap();
        assert_eq!(status, AuthorizationStatus::AuthorizedWhenInUse);
        assert!(status.is_authorized());
        assert!(!AuthorizationStatus::Denied.is_authorized());
    }
}
