//! Live adapter for the `Catalog` port using the Emby items API.

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;

use crate::config::EmbyConfig;
use crate::media::{CatalogItem, ExternalIdentity, MediaKind};
use crate::ports::catalog::{Catalog, CatalogFuture};

/// Emby catalog client.
pub struct EmbyCatalog {
    client: Client,
    base_url: String,
    api_key: String,
}

impl EmbyCatalog {
    /// Creates a catalog client from the Emby config section.
    #[must_use]
    pub fn new(config: &EmbyConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn items_url(&self) -> String {
        format!("{}/emby/Items", self.base_url)
    }

    async fn query_items(
        &self,
        params: &[(&str, &str)],
    ) -> Result<Vec<EmbyItem>, Box<dyn std::error::Error + Send + Sync>> {
        let response = self
            .client
            .get(self.items_url())
            .header("X-Emby-Token", &self.api_key)
            .query(params)
            .send()
            .await
            .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
                format!("Emby request failed: {e}").into()
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Emby API error ({})", status.as_u16()).into());
        }

        let body = response.text().await.map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
            format!("Failed to read Emby response: {e}").into()
        })?;
        parse_items(&body).map_err(|e| format!("Failed to parse Emby response: {e}").into())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<EmbyItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EmbyItem {
    path: Option<String>,
    #[serde(default)]
    is_folder: bool,
    #[serde(default)]
    provider_ids: HashMap<String, String>,
}

impl EmbyItem {
    /// IMDb id regardless of how the server capitalises the provider key.
    fn imdb_id(&self) -> Option<&str> {
        self.provider_ids
            .iter()
            .find(|(provider, _)| provider.eq_ignore_ascii_case("imdb"))
            .map(|(_, id)| id.as_str())
            .filter(|id| !id.is_empty())
    }
}

fn parse_items(body: &str) -> Result<Vec<EmbyItem>, serde_json::Error> {
    serde_json::from_str::<ItemsResponse>(body).map(|r| r.items)
}

impl Catalog for EmbyCatalog {
    fn find_by_identity(
        &self,
        identity: &ExternalIdentity,
        _kind: MediaKind,
    ) -> CatalogFuture<'_, Vec<CatalogItem>> {
        let provider = format!("imdb.{identity}");
        Box::pin(async move {
            let items = self
                .query_items(&[
                    ("AnyProviderIdEquals", provider.as_str()),
                    ("Recursive", "true"),
                    ("Fields", "Path,IsFolder"),
                ])
                .await?;
            Ok(items
                .into_iter()
                .filter_map(|item| {
                    item.path.map(|path| CatalogItem { path, is_folder: item.is_folder })
                })
                .collect())
        })
    }

    fn find_by_path(&self, path: &str) -> CatalogFuture<'_, Option<ExternalIdentity>> {
        let path = path.to_string();
        Box::pin(async move {
            let items =
                self.query_items(&[("Path", path.as_str()), ("Fields", "ProviderIds")]).await?;
            Ok(items.first().and_then(EmbyItem::imdb_id).map(ExternalIdentity::new))
        })
    }
}
