//! Startup settings read and periodic refresh from the persisted store.

use contracts::{Clock, ContractError, LiveSettings, NetStatus, ParamStore, Scene};
use tracing::{debug, warn};

/// Keys of the persisted settings store
pub mod param_keys {
    pub const IS_METRIC: &str = "IsMetric";
    pub const IS_SELF_VIEW_ONLY: &str = "IsSelfViewOnly";
    pub const IS_DRIVER_VIEW_ENABLED: &str = "IsDriverViewEnabled";
    pub const UI_BRIGHTNESS: &str = "UiBrightness";
    pub const UI_VOLUME_BOOST: &str = "UiVolumeBoost";
    pub const LATERAL_CONTROL_METHOD: &str = "LateralControlMethod";
    pub const DRIVING_RECORD: &str = "DrivingRecord";
    pub const END_TO_END_TOGGLE: &str = "EndToEndToggle";
    pub const AUTO_SCREEN_DIMMING: &str = "AutoScreenDimming";
    pub const BLIND_SPOT_DETECT: &str = "BlindSpotDetect";
    pub const DEBUG_UI1: &str = "DebugUi1";
    pub const DEBUG_UI2: &str = "DebugUi2";
    pub const SPEED_LIMIT_OFFSET: &str = "SpeedLimitOffset";
    pub const LANELESS_MODE: &str = "LanelessMode";
    pub const ENABLE_WIDE_CAMERA: &str = "EnableWideCamera";
    pub const IS_RHD: &str = "IsRHD";
    /// Wall-clock nanoseconds of the last successful backend ping
    pub const LAST_PING_TIME: &str = "LastPingTime";
    /// Forced back to "0" on every startup
    pub const LIMIT_SET_SPEED_CAMERA: &str = "LimitSetSpeedCamera";
}

/// Which refresh ran this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshKind {
    #[default]
    None,
    Settings,
    Connectivity,
}

#[derive(Debug, Clone)]
pub struct ParamsRefresher {
    settings_period: u64,
    connectivity_period: u64,
    ping_staleness_ns: u64,
}

impl ParamsRefresher {
    pub fn new(settings_period: u64, connectivity_period: u64, ping_staleness_ns: u64) -> Self {
        Self {
            settings_period: settings_period.max(1),
            connectivity_period: connectivity_period.max(1),
            ping_staleness_ns,
        }
    }

    /// Startup read of every setting the HUD keeps live.
    ///
    /// Returns the settings plus the wide-camera override when the key is set.
    pub fn read_initial(
        store: &dyn ParamStore,
        base: &LiveSettings,
    ) -> Result<(LiveSettings, Option<bool>), ContractError> {
        let mut settings = base.clone();
        read_periodic(store, &mut settings)?;
        settings.auto_screen_dimming = store.get_bool(param_keys::AUTO_SCREEN_DIMMING)?;
        settings.blind_spot_detect = store.get_bool(param_keys::BLIND_SPOT_DETECT)?;
        settings.debug_ui1 = store.get_bool(param_keys::DEBUG_UI1)?;
        settings.debug_ui2 = store.get_bool(param_keys::DEBUG_UI2)?;
        settings.speed_limit_offset = store.get_i32(param_keys::SPEED_LIMIT_OFFSET)?;
        settings.laneless_mode = store.get_i32(param_keys::LANELESS_MODE)?;

        let wide_camera = store
            .get(param_keys::ENABLE_WIDE_CAMERA)?
            .map(|v| v.trim() == "1");
        Ok((settings, wide_camera))
    }

    /// Run the refresh due at `frame`, if any.
    ///
    /// Store failures leave the previous values in place.
    pub fn refresh(
        &self,
        frame: u64,
        scene: &mut Scene,
        store: &dyn ParamStore,
        clock: &dyn Clock,
    ) -> RefreshKind {
        if frame % self.settings_period == 0 {
            let mut settings = scene.settings.clone();
            match read_periodic(store, &mut settings) {
                Ok(()) => scene.settings = settings,
                Err(e) => warn!(frame, error = %e, "settings refresh failed, keeping previous"),
            }
            RefreshKind::Settings
        } else if frame % self.connectivity_period == 0 {
            match store.get_f64(param_keys::LAST_PING_TIME) {
                Ok(last_ping) => {
                    scene.net_status = self.net_status(last_ping, clock.now_ns());
                    debug!(frame, status = ?scene.net_status, "connectivity refreshed");
                }
                Err(e) => warn!(frame, error = %e, "connectivity refresh failed, keeping previous"),
            }
            RefreshKind::Connectivity
        } else {
            RefreshKind::None
        }
    }

    fn net_status(&self, last_ping: Option<f64>, now_ns: u64) -> NetStatus {
        match last_ping {
            None => NetStatus::Disconnected,
            Some(ping) if (now_ns as f64) - ping < self.ping_staleness_ns as f64 => {
                NetStatus::Connected
            }
            Some(_) => NetStatus::Error,
        }
    }
}

/// Settings re-read on every settings refresh
fn read_periodic(store: &dyn ParamStore, settings: &mut LiveSettings) -> Result<(), ContractError> {
    settings.is_metric = store.get_bool(param_keys::IS_METRIC)?;
    settings.self_view_only = store.get_bool(param_keys::IS_SELF_VIEW_ONLY)?;
    settings.ui_brightness = store.get_i32(param_keys::UI_BRIGHTNESS)?;
    settings.ui_volume_boost = store.get_i32(param_keys::UI_VOLUME_BOOST)?;
    settings.lat_control = store.get_i32(param_keys::LATERAL_CONTROL_METHOD)?;
    settings.driving_record = store.get_bool(param_keys::DRIVING_RECORD)?;
    settings.end_to_end = store.get_bool(param_keys::END_TO_END_TOGGLE)?;
    settings.driver_view = store.get_bool(param_keys::IS_DRIVER_VIEW_ENABLED)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::MemoryParamStore;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_ns(&self) -> u64 {
            self.0
        }
    }

    struct BrokenStore;

    impl ParamStore for BrokenStore {
        fn get(&self, key: &str) -> Result<Option<String>, ContractError> {
            Err(ContractError::param_store(key, "store unavailable"))
        }

        fn put(&mut self, key: &str, _value: &str) -> Result<(), ContractError> {
            Err(ContractError::param_store(key, "store unavailable"))
        }
    }

    fn refresher() -> ParamsRefresher {
        ParamsRefresher::new(100, 120, 70_000_000_000)
    }

    #[test]
    fn test_settings_refresh_on_period() {
        let store = MemoryParamStore::with_values([
            ("IsMetric", "1"),
            ("UiBrightness", "80"),
            ("LateralControlMethod", "2"),
            ("EndToEndToggle", "1"),
        ]);
        let mut scene = Scene::default();
        let clock = FixedClock(0);

        assert_eq!(refresher().refresh(99, &mut scene, &store, &clock), RefreshKind::None);
        assert!(!scene.settings.is_metric);

        assert_eq!(
            refresher().refresh(200, &mut scene, &store, &clock),
            RefreshKind::Settings
        );
        assert!(scene.settings.is_metric);
        assert_eq!(scene.settings.ui_brightness, 80);
        assert_eq!(scene.settings.lat_control, 2);
        assert!(scene.settings.end_to_end);
    }

    #[test]
    fn test_settings_period_wins_over_connectivity() {
        let store = MemoryParamStore::new();
        let mut scene = Scene::default();
        // 600 is a multiple of both periods
        assert_eq!(
            refresher().refresh(600, &mut scene, &store, &FixedClock(0)),
            RefreshKind::Settings
        );
    }

    #[test]
    fn test_connectivity_states() {
        let mut scene = Scene::default();
        let r = refresher();
        let now = 100_000_000_000;

        r.refresh(120, &mut scene, &MemoryParamStore::new(), &FixedClock(now));
        assert_eq!(scene.net_status, NetStatus::Disconnected);

        let fresh = MemoryParamStore::with_values([("LastPingTime", "90000000000")]);
        assert_eq!(
            r.refresh(120, &mut scene, &fresh, &FixedClock(now)),
            RefreshKind::Connectivity
        );
        assert_eq!(scene.net_status, NetStatus::Connected);

        let stale = MemoryParamStore::with_values([("LastPingTime", "10000000000")]);
        r.refresh(120, &mut scene, &stale, &FixedClock(now));
        assert_eq!(scene.net_status, NetStatus::Error);
    }

    #[test]
    fn test_store_failure_keeps_previous_values() {
        let mut scene = Scene::default();
        scene.settings.is_metric = true;
        scene.net_status = NetStatus::Connected;
        let r = refresher();

        assert_eq!(
            r.refresh(100, &mut scene, &BrokenStore, &FixedClock(0)),
            RefreshKind::Settings
        );
        assert!(scene.settings.is_metric);

        r.refresh(120, &mut scene, &BrokenStore, &FixedClock(0));
        assert_eq!(scene.net_status, NetStatus::Connected);
    }

    #[test]
    fn test_read_initial() {
        let store = MemoryParamStore::with_values([
            ("AutoScreenDimming", "1"),
            ("SpeedLimitOffset", "5"),
            ("LanelessMode", "2"),
            ("IsDriverViewEnabled", "1"),
            ("EnableWideCamera", "1"),
        ]);
        let (settings, wide) =
            ParamsRefresher::read_initial(&store, &LiveSettings::default()).unwrap();
        assert!(settings.auto_screen_dimming);
        assert!(settings.driver_view);
        assert_eq!(settings.speed_limit_offset, 5);
        assert_eq!(settings.laneless_mode, 2);
        assert_eq!(wide, Some(true));

        let (_, wide) =
            ParamsRefresher::read_initial(&MemoryParamStore::new(), &LiveSettings::default())
                .unwrap();
        assert_eq!(wide, None);
    }
}
