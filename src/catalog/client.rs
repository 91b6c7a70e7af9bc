use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::{
    catalog::{
        error::CatalogError,
        ports::CatalogPort,
        types::{CatalogEntry, CatalogPage, id_from_resource_url},
    },
    config::CatalogConfig,
};

/// HTTP client for a PokeAPI-compatible creature catalog.
#[derive(Debug, Clone)]
pub struct PokeApiCatalog {
    client: Client,
    base_url: Url,
    default_page_limit: u32,
}

impl PokeApiCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let trimmed = config.base_url.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::Config("catalog.base_url cannot be empty".into()));
        }
        if config.default_page_limit == 0 {
            return Err(CatalogError::Config(
                "catalog.default_page_limit must be positive".into(),
            ));
        }

        // Url::join drops the last path segment unless the base ends with '/'.
        let normalized = format!("{}/", trimmed.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|err| {
            CatalogError::Config(format!("catalog.base_url '{trimmed}' is invalid: {err}"))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms.max(1)))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            default_page_limit: config.default_page_limit,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resource_url(&self, resource: &str) -> Result<Url, CatalogError> {
        self.base_url.join(&format!("{resource}/")).map_err(|err| {
            CatalogError::Config(format!("cannot build catalog url for '{resource}': {err}"))
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let started_at = Instant::now();
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        tracing::debug!(
            target: "catalog",
            url = %url,
            status = status.as_u16(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "catalog_response"
        );

        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|err| CatalogError::InvalidResponse(format!("{url}: {err}")))
    }
}

#[async_trait]
impl CatalogPort for PokeApiCatalog {
    async fn list(&self, limit: u32, offset: u32) -> Result<CatalogPage, CatalogError> {
        let limit = if limit == 0 {
            self.default_page_limit
        } else {
            limit
        };

        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());

        let mut page: CatalogPage = self.get_json(url).await?;
        for summary in &mut page.results {
            summary.id = id_from_resource_url(&summary.url);
        }
        Ok(page)
    }

    async fn find_by_id(&self, id: u32) -> Result<CatalogEntry, CatalogError> {
        let url = self.resource_url(&id.to_string())?;
        self.get_json(url).await
    }

    async fn find_by_name(&self, name: &str) -> Result<CatalogEntry, CatalogError> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(CatalogError::NotFound("empty creature name".into()));
        }
        let url = self.resource_url(&name)?;
        self.get_json(url).await
    }
}
