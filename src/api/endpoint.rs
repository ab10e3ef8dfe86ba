use crate::model::SiteId;

pub type Endpoint = str;

pub const PRODUCTS: &Endpoint = "/api/1/products";

pub const LIVE_STATUS: &Endpoint = "live_status";
pub const SITE_INFO: &Endpoint = "site_info";
pub const TELEMETRY_HISTORY: &Endpoint = "telemetry_history";
pub const CALENDAR_HISTORY: &Endpoint = "calendar_history";
pub const BACKUP: &Endpoint = "backup";
pub const STORM_MODE: &Endpoint = "storm_mode";
pub const SITE_NAME: &Endpoint = "site_name";

/// Path of `endpoint` under the energy site `site_id`.
pub fn energy_site(site_id: SiteId, endpoint: &Endpoint) -> String {
    format!("/api/1/energy_sites/{}/{}", site_id, endpoint)
}
