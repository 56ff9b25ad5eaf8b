use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use shopmate_core::config::CatalogConfig;
use shopmate_core::{OrderLookup, ProductHit, ProductSearch};

/// Read-only operations against the external catalog service.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search_products(&self, query: &str) -> Result<ProductSearch>;
    async fn lookup_order(&self, order_id: u64) -> Result<OrderLookup>;
}

const MAX_PRODUCT_RESULTS: usize = 5;

pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("could not build catalog http client")?;

        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_string() })
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn search_products(&self, query: &str) -> Result<ProductSearch> {
        let url = format!("{}/products", self.base_url);
        let response =
            self.client.get(&url).send().await.context("product list request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("product list request returned {status}");
        }

        let items: Vec<ProductHit> =
            response.json().await.context("product list response was not valid JSON")?;

        Ok(ProductSearch { query: query.to_string(), results: filter_products(items, query) })
    }

    async fn lookup_order(&self, order_id: u64) -> Result<OrderLookup> {
        let url = format!("{}/carts/{order_id}", self.base_url);
        let response =
            self.client.get(&url).send().await.context("order lookup request failed")?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(OrderLookup::missing(order_id));
        }
        if !status.is_success() {
            bail!("order lookup request returned {status}");
        }

        let cart: Value =
            response.json().await.context("order lookup response was not valid JSON")?;
        Ok(OrderLookup::found(order_id, cart))
    }
}

/// Case-insensitive title substring match, capped at five hits, keeping the
/// service's ordering.
fn filter_products(items: Vec<ProductHit>, query: &str) -> Vec<ProductHit> {
    let needle = query.to_lowercase();
    items
        .into_iter()
        .filter(|item| item.title.to_lowercase().contains(&needle))
        .take(MAX_PRODUCT_RESULTS)
        .collect()
}
