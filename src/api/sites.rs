use crate::api::endpoint;
use crate::api::response::site_info::SiteInfo;
use crate::api::response::{Envelope, ProductsResponse};
use crate::api::{Client, Result};
use crate::model::{
    EnergyProduct, GridData, GridStatusData, LiveStatusData, MeterAggregates,
    MeterAggregatesData, SiteInfoData, SoeData, StatusData,
};
use std::time::Duration;

impl Client {
    /// Every product on the account, vehicles included, in upstream order.
    pub async fn products(&self) -> Result<Vec<EnergyProduct>> {
        self.trace("Fetching all products...");
        let products = self
            .get_json::<ProductsResponse>(endpoint::PRODUCTS, &[])
            .await?
            .response;
        self.trace(&format!("Found {} total products", products.len()));
        Ok(products)
    }

    /// Products whose resource type is `solar` or `battery`, in upstream order.
    pub async fn energy_products(&self) -> Result<Vec<EnergyProduct>> {
        let products = self.products().await?;
        let total = products.len();

        let energy_products: Vec<EnergyProduct> = products
            .into_iter()
            .filter(EnergyProduct::is_energy_site)
            .collect();

        self.trace(&format!(
            "Found {} energy products (filtered from {} total)",
            energy_products.len(),
            total
        ));
        Ok(energy_products)
    }

    /// Current snapshot of the selected site.
    pub async fn live_status(&self) -> Result<LiveStatusData> {
        let site_id = self.require_site()?;
        self.trace(&format!("Fetching live status for energy site {}...", site_id));

        let path = endpoint::energy_site(site_id, endpoint::LIVE_STATUS);
        Ok(self.get_json::<Envelope<LiveStatusData>>(&path, &[]).await?.response)
    }

    /// Gateway-style status built from the live snapshot.
    ///
    /// The Fleet API has no equivalent of the gateway's identity and uptime fields:
    /// `din` becomes `fleet-api-<site id>`, `start_time` is the snapshot timestamp,
    /// `version` is `fleet-api`, `device_type` is `powerwall` and the rest stay
    /// empty, zero or false.
    pub async fn status(&self) -> Result<StatusData> {
        let live = self.live_status().await?;
        let site_id = self.require_site()?;

        Ok(StatusData {
            din: format!("fleet-api-{}", site_id),
            start_time: live.timestamp,
            up_time: Duration::ZERO,
            is_new: false,
            version: "fleet-api".to_owned(),
            git_hash: String::new(),
            commission_count: 0,
            device_type: "powerwall".to_owned(),
            sync_type: String::new(),
            leader: String::new(),
            followers: None,
            cellular_disabled: false,
        })
    }

    pub async fn site_info(&self) -> Result<SiteInfoData> {
        let site_id = self.require_site()?;
        self.trace(&format!("Fetching site info for energy site {}...", site_id));

        let path = endpoint::energy_site(site_id, endpoint::SITE_INFO);
        let info = self.get_json::<Envelope<SiteInfo>>(&path, &[]).await?.response;

        let info = site_info_data(info);
        self.trace(&format!("Site info retrieved successfully: {}", info.site_name));
        Ok(info)
    }

    /// Instant power per meter category. A category is present only when the
    /// snapshot reports its power.
    pub async fn meters_aggregates(&self) -> Result<MeterAggregates> {
        let live = self.live_status().await?;
        let aggregates = meter_aggregates(&live);
        self.trace(&format!(
            "Power flow data retrieved successfully for {} categories",
            aggregates.len()
        ));
        Ok(aggregates)
    }

    pub async fn soe(&self) -> Result<SoeData> {
        let live = self.live_status().await?;
        Ok(SoeData {
            percentage: live.percentage_charged.unwrap_or(0.0),
        })
    }

    pub async fn grid_status(&self) -> Result<GridStatusData> {
        let live = self.live_status().await?;
        Ok(GridStatusData {
            grid_status: live.grid_status,
            grid_services_active: live.grid_services_active,
        })
    }
}

fn site_info_data(info: SiteInfo) -> SiteInfoData {
    /* W -> kW */
    let system_power_kw = info.nameplate_power as f32 / 1000.0;

    SiteInfoData {
        site_name: info.site_name,
        time_zone: info.installation_time_zone,
        max_site_meter_power_kw: info.max_site_meter_power_ac / 1000,
        min_site_meter_power_kw: info.min_site_meter_power_ac / 1000,
        max_system_power_kw: system_power_kw,
        nominal_system_power_kw: system_power_kw,
        grid_data: GridData {
            utility: info.utility,
            ..GridData::default()
        },
        ..SiteInfoData::default()
    }
}

fn meter_aggregates(live: &LiveStatusData) -> MeterAggregates {
    let categories = [
        ("solar", live.solar_power),
        ("battery", live.battery_power),
        ("site", live.grid_power),
        ("load", live.load_power),
    ];

    categories
        .into_iter()
        .filter_map(|(category, power)| {
            power.map(|power| {
                let data = MeterAggregatesData {
                    last_communication_time: live.timestamp,
                    instant_power: power as f32,
                    ..MeterAggregatesData::default()
                };
                (category.to_owned(), data)
            })
        })
        .collect()
}
