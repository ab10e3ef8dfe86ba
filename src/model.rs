use crate::codec;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

pub type SiteId = i64;

/// Aggregates keyed by meter category (`solar`, `battery`, `site`, `load`).
pub type MeterAggregates = BTreeMap<String, MeterAggregatesData>;

/// One entry of the account's product list. Vehicles share the list with energy
/// sites; their energy fields stay at their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyProduct {
    pub energy_site_id: SiteId,
    pub device_type: String,
    /// `"solar"`, `"battery"`, or a vehicle marker
    pub resource_type: String,
    pub site_name: String,
    #[serde(deserialize_with = "codec::string_or_number::deserialize")]
    pub id: String,
    pub gateway_id: String,
    pub asset_site_id: String,
    pub warp_site_number: String,
    pub percentage_charged: Option<f64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub battery_type: String,
    pub battery_power: Option<f64>,
    pub storm_mode_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Map<String, Value>>,
}

impl EnergyProduct {
    /// Energy products are the entries whose resource type is exactly `solar` or `battery`.
    pub fn is_energy_site(&self) -> bool {
        matches!(self.resource_type.as_str(), "solar" | "battery")
    }
}

/// Snapshot returned by the `live_status` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveStatusData {
    pub solar_power: Option<f64>,
    pub battery_power: Option<f64>,
    pub load_power: Option<f64>,
    pub grid_power: Option<f64>,
    pub energy_left: Option<f64>,
    pub total_pack_energy: Option<f64>,
    pub percentage_charged: Option<f64>,
    pub grid_status: String,
    pub island_status: String,
    pub storm_mode_active: bool,
    pub grid_services_active: bool,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

/// General system information in the shape of the local gateway's `status` call.
///
/// The Fleet API reports only a fraction of it; see [`crate::api::Client::status`]
/// for which fields carry placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusData {
    pub din: String,
    #[serde(with = "codec::non_iso_time::option")]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(rename = "up_time_seconds", with = "codec::duration")]
    pub up_time: Duration,
    pub is_new: bool,
    pub version: String,
    pub git_hash: String,
    pub commission_count: i64,
    pub device_type: String,
    pub sync_type: String,
    pub leader: String,
    pub followers: Option<Value>,
    pub cellular_disabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridData {
    pub grid_code: String,
    pub grid_voltage_setting: i64,
    pub grid_freq_setting: i64,
    pub grid_phase_setting: String,
    pub country: String,
    pub state: String,
    pub distributor: String,
    pub utility: String,
    pub retailer: String,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteInfoData {
    pub site_name: String,
    #[serde(rename = "timezone")]
    pub time_zone: String,
    #[serde(rename = "max_site_meter_power_kW")]
    pub max_site_meter_power_kw: i64,
    #[serde(rename = "min_site_meter_power_kW")]
    pub min_site_meter_power_kw: i64,
    pub measured_frequency: f32,
    #[serde(rename = "max_system_energy_kWh")]
    pub max_system_energy_kwh: f32,
    #[serde(rename = "max_system_power_kW")]
    pub max_system_power_kw: f32,
    #[serde(rename = "nominal_system_energy_kWh")]
    pub nominal_system_energy_kwh: f32,
    #[serde(rename = "nominal_system_power_kW")]
    pub nominal_system_power_kw: f32,
    #[serde(rename = "grid_code")]
    pub grid_data: GridData,
}

/// Statistics across all meters of one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterAggregatesData {
    pub last_communication_time: Option<DateTime<FixedOffset>>,
    pub instant_power: f32,
    pub instant_reactive_power: f32,
    pub instant_apparent_power: f32,
    pub frequency: f32,
    pub energy_exported: f32,
    pub energy_imported: f32,
    pub instant_average_voltage: f32,
    pub instant_average_current: f32,
    pub i_a_current: f32,
    pub i_b_current: f32,
    pub i_c_current: f32,
    pub last_phase_voltage_communication_time: Option<DateTime<FixedOffset>>,
    pub last_phase_power_communication_time: Option<DateTime<FixedOffset>>,
    pub timeout: i64,
    pub num_meters_aggregated: i64,
    pub instant_total_current: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridStatusData {
    pub grid_status: String,
    pub grid_services_active: bool,
}

/// Total charge across all batteries, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SoeData {
    pub percentage: f64,
}

/// Historical series from `calendar_history` or `telemetry_history`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryData {
    pub serial_number: String,
    /// `day`, `week`, `month`, `year` or `lifetime`
    pub period: String,
    pub time_series: Vec<TimePoint>,
}

/// One sample of a history series. Power fields are filled for short-interval
/// series, energy fields for calendar totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub timestamp: DateTime<FixedOffset>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_services_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_power: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar_energy_exported: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_energy_imported: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_energy_exported: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_energy_exported: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_energy_imported: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_energy_imported: Option<f64>,
}

/// Requests-per-minute ceilings for the two upstream tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub realtime_data_rpm: u32,
    pub commands_rpm: u32,
    pub max_monthly_cost: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            realtime_data_rpm: 60,
            commands_rpm: 30,
            max_monthly_cost: 10,
        }
    }
}

/// Counters kept by one client since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ApiUsage {
    pub request_count: u64,
    pub token_refreshes: u64,
    pub rate_limit_wait_seconds: f64,
}

/* Local gateway shapes with no Fleet API source; only ever named by the unsupported stubs */

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationData {
    pub real_mode: String,
    pub backup_reserve_percent: f64,
    pub freq_shift_load_shed_soe: f64,
    pub freq_shift_load_shed_delta_f: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStatusData {
    pub command_source: String,
    pub nominal_full_pack_energy: f64,
    pub nominal_energy_remaining: f64,
    pub max_charge_power: f64,
    pub max_discharge_power: f64,
    pub system_island_state: String,
    pub available_blocks: i64,
    pub grid_faults: Vec<GridFaultData>,
    pub expected_energy_remaining: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridFaultData {
    pub timestamp: i64,
    pub alert_name: String,
    pub alert_is_fault: bool,
    pub alert_raw: i64,
    pub git_hash: String,
    pub site_uid: String,
    pub ecu_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitemasterData {
    pub status: String,
    pub running: bool,
    pub connected_to_tesla: bool,
    pub power_supply_mode: bool,
    pub can_reboot: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkData {
    pub network_name: String,
    pub interface: String,
    pub dhcp: bool,
    pub enabled: bool,
    pub active: bool,
    pub primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterData {
    pub id: i64,
    pub location: String,
    #[serde(rename = "type")]
    pub meter_type: String,
    pub cts: Vec<bool>,
    pub inverted: Vec<bool>,
}
