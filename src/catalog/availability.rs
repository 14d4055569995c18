use crate::catalog::error::CatalogError;
use crate::catalog::resolver::Catalog;
use crate::types::city::City;
use log::info;
use reqwest::{redirect, Client, StatusCode};

/// Probes an operator's public data page to see whether trip data is published.
///
/// Redirects are not followed: only a direct `200 OK` counts as published. A
/// positive answer does not guarantee that any particular month's archive exists.
pub struct AvailabilityChecker {
    client: Client,
}

impl AvailabilityChecker {
    pub fn new() -> Result<Self, CatalogError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| CatalogError::NetworkRequest("<client builder>".to_string(), e))?;
        Ok(Self { client })
    }

    pub async fn city_is_published(
        &self,
        catalog: &Catalog,
        city: City,
    ) -> Result<bool, CatalogError> {
        let url = catalog.landing_page_url(city);
        info!(
            "Checking whether trip data is published for {}",
            city.display_name()
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::NetworkRequest(url.to_string(), e))?;

        Ok(response.status() == StatusCode::OK)
    }
}
