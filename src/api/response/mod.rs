//! Upstream JSON shapes that don't map one-to-one onto [`crate::model`].

pub mod site_info;
pub mod token;

use crate::model::EnergyProduct;
use serde::Deserialize;

/* Every Fleet API data endpoint wraps its payload in `{"response": ...}` */
#[derive(Deserialize)]
pub struct Envelope<T> {
    pub response: T,
}

#[derive(Deserialize)]
pub struct ProductsResponse {
    pub response: Vec<EnergyProduct>,
    #[serde(default)]
    pub count: Option<u64>,
}
