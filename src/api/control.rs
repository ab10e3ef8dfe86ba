use crate::api::endpoint;
use crate::api::{Client, Error, Result};
use serde_json::{json, Value};

pub const MINIMUM_BACKUP_RESERVE: i64 = 5;
pub const MAXIMUM_BACKUP_RESERVE: i64 = 100;

impl Client {
    /// Share of battery capacity held back for outages, 0 to 100 percent.
    pub async fn set_backup_reserve(&self, percent: i64) -> Result<()> {
        let site_id = self.require_site()?;
        if !(0..=MAXIMUM_BACKUP_RESERVE).contains(&percent) {
            return Err(Error::invalid_argument(
                "backup_reserve_percent",
                format!(
                    "backup reserve percent must be between 0 and 100, got {}",
                    percent
                ),
            ));
        }

        self.trace(&format!(
            "Setting backup reserve to {}% for energy site {}...",
            percent, site_id
        ));
        let path = endpoint::energy_site(site_id, endpoint::BACKUP);
        self.post_json::<Value>(&path, &json!({ "backup_reserve_percent": percent }))
            .await?;

        self.trace(&format!("Backup reserve set successfully to {}%", percent));
        Ok(())
    }

    pub async fn set_site_name(&self, name: &str) -> Result<()> {
        let site_id = self.require_site()?;
        if name.is_empty() {
            return Err(Error::invalid_argument(
                "site_name",
                "site name cannot be empty",
            ));
        }

        self.trace(&format!(
            "Setting site name to '{}' for energy site {}...",
            name, site_id
        ));
        let path = endpoint::energy_site(site_id, endpoint::SITE_NAME);
        self.post_json::<Value>(&path, &json!({ "site_name": name }))
            .await?;

        self.trace(&format!("Site name set successfully to '{}'", name));
        Ok(())
    }

    /// Storm Watch charges the battery to full ahead of forecast outages.
    pub async fn set_storm_mode(&self, enabled: bool) -> Result<()> {
        let site_id = self.require_site()?;
        self.trace(&format!(
            "Setting Storm Watch mode to {} for energy site {}...",
            enabled, site_id
        ));

        let path = endpoint::energy_site(site_id, endpoint::STORM_MODE);
        self.post_json::<Value>(&path, &json!({ "enabled": enabled }))
            .await?;

        self.trace(if enabled {
            "Storm Watch mode enabled successfully"
        } else {
            "Storm Watch mode disabled successfully"
        });
        Ok(())
    }

    pub async fn enable_storm_watch(&self) -> Result<()> {
        self.set_storm_mode(true).await
    }

    pub async fn disable_storm_watch(&self) -> Result<()> {
        self.set_storm_mode(false).await
    }

    pub async fn set_minimum_backup_reserve(&self) -> Result<()> {
        self.set_backup_reserve(MINIMUM_BACKUP_RESERVE).await
    }

    pub async fn set_maximum_backup_reserve(&self) -> Result<()> {
        self.set_backup_reserve(MAXIMUM_BACKUP_RESERVE).await
    }
}
