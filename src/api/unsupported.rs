//! Local gateway operations the Fleet API has no counterpart for. They fail
//! straight away and never touch the network.

use crate::api::{Client, Error, Result};
use crate::model::{
    GridFaultData, MeterData, NetworkData, OperationData, SitemasterData, SystemStatusData,
};

fn unsupported<T>(operation: &'static str, reason: &'static str) -> Result<T> {
    Err(Error::Unsupported { operation, reason })
}

impl Client {
    pub fn operation(&self) -> Result<OperationData> {
        unsupported(
            "operation",
            "Fleet API does not provide detailed operation data available from local gateway",
        )
    }

    pub fn system_status(&self) -> Result<SystemStatusData> {
        unsupported(
            "system_status",
            "Fleet API does not provide detailed system diagnostics available from local gateway",
        )
    }

    pub fn sitemaster(&self) -> Result<SitemasterData> {
        unsupported(
            "sitemaster",
            "Fleet API does not expose local gateway clustering information",
        )
    }

    pub fn networks(&self) -> Result<Vec<NetworkData>> {
        unsupported(
            "networks",
            "Fleet API does not expose local network configuration",
        )
    }

    pub fn grid_faults(&self) -> Result<Vec<GridFaultData>> {
        unsupported(
            "grid_faults",
            "Fleet API does not provide detailed grid fault information available from local gateway",
        )
    }

    /// Per-meter details of `category`; use [`Client::meters_aggregates`] instead.
    pub fn meters(&self, _category: &str) -> Result<Vec<MeterData>> {
        unsupported(
            "meters",
            "Fleet API does not provide individual meter details - use meters_aggregates() instead",
        )
    }
}

#[cfg(test)]
mod test {
    use crate::api::{Client, Error, ErrorKind};

    #[test]
    fn stubs_fail_without_a_site() {
        let client = Client::builder("client", "access", "refresh").build().unwrap();

        assert_eq!(ErrorKind::Unsupported, client.operation().unwrap_err().kind());
        assert_eq!(ErrorKind::Unsupported, client.system_status().unwrap_err().kind());
        assert_eq!(ErrorKind::Unsupported, client.sitemaster().unwrap_err().kind());
        assert_eq!(ErrorKind::Unsupported, client.grid_faults().unwrap_err().kind());

        match client.meters("solar").unwrap_err() {
            Error::Unsupported { operation, reason } => {
                assert_eq!("meters", operation);
                assert!(reason.contains("meters_aggregates()"));
            }
            other => panic!("unexpected error: {}", other),
        }
        match client.networks().unwrap_err() {
            Error::Unsupported { operation, .. } => assert_eq!("networks", operation),
            other => panic!("unexpected error: {}", other),
        }
    }
}
