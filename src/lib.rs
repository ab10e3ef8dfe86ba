//! Client for the Tesla Fleet API energy endpoints of a Powerwall site.
//!
//! ```no_run
//! # async fn run() -> powerwall_fleet_rs::Result<()> {
//! use powerwall_fleet_rs::Client;
//!
//! let mut client = Client::new("client-id", "access-token", "refresh-token")?;
//! let sites = client.energy_products().await?;
//! if let Some(site) = sites.first() {
//!     client.select_energy_site(site.energy_site_id);
//!     println!("{:?}", client.soe().await?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod codec;
pub mod model;

pub use api::diagnostics::{Diagnostics, LogDiagnostics, NoopDiagnostics};
pub use api::{Client, ClientBuilder, Error, ErrorKind, Result, TokenKind};
