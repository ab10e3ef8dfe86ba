use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct Components {
    pub solar: bool,
    pub solar_type: String,
    pub battery: bool,
    pub grid: bool,
    pub backup: bool,
    pub gateway: String,
    pub load_meter: bool,
    pub tou_capable: bool,
    pub storm_mode_capable: bool,
    pub battery_type: String,
    pub configurable: bool,
    pub grid_services_enabled: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SiteInfo {
    pub id: String,
    pub site_name: String,
    pub backup_reserve_percent: Option<i64>,
    pub default_real_mode: String,
    pub user_settings: Map<String, Value>,
    pub components: Components,
    pub version: String,
    pub battery_count: i64,
    /* W */
    pub nameplate_power: i64,
    pub installation_time_zone: String,
    /* W */
    pub max_site_meter_power_ac: i64,
    /* W */
    pub min_site_meter_power_ac: i64,
    pub vpp_backup_reserve_percent: i64,
    pub utility: String,
}
