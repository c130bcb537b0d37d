//! Item discovery: which fires exist for a state and year.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, instrument};

/// One unit of work: a fire, identified by its year and MTBS fire id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemIdentifier {
    pub group_key: String,
    pub item_key: String,
}

impl ItemIdentifier {
    pub fn new(group_key: impl Into<String>, item_key: impl Into<String>) -> Self {
        Self {
            group_key: group_key.into(),
            item_key: item_key.into(),
        }
    }

    pub fn year(&self) -> &str {
        &self.group_key
    }

    pub fn fire_id(&self) -> &str {
        &self.item_key
    }
}

impl fmt::Display for ItemIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group_key, self.item_key)
    }
}

/// Fires of one year whose id starts with a state prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub year: u16,
    pub state: String,
}

impl CatalogQuery {
    pub fn new(year: u16, state: impl Into<String>) -> Self {
        Self {
            year,
            state: state.into().to_ascii_uppercase(),
        }
    }

    fn type_name(&self) -> String {
        format!("mtbs:mtbs_fire_polygons_{}", self.year)
    }

    fn filter(&self) -> String {
        format!("fire_id LIKE '{}%'", self.state)
    }
}

impl fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} where {}", self.type_name(), self.filter())
    }
}

/// Source of the ordered item list for a query
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_items(&self, query: &CatalogQuery) -> Result<Vec<ItemIdentifier>>;
}

/// MTBS GeoServer WFS `GetFeature` listing
pub struct WfsCatalog {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct WfsResponse {
    #[serde(default)]
    features: Vec<WfsFeature>,
}

#[derive(Deserialize)]
struct WfsFeature {
    properties: WfsProperties,
}

#[derive(Deserialize)]
struct WfsProperties {
    fire_id: String,
    year: YearValue,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearValue {
    Number(i64),
    Text(String),
}

impl YearValue {
    fn into_key(self) -> String {
        match self {
            YearValue::Number(n) => n.to_string(),
            YearValue::Text(s) => s.trim().to_string(),
        }
    }
}

impl WfsCatalog {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn query_url(&self, query: &CatalogQuery) -> Result<Url> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("service", "WFS".to_string()),
                ("version", "1.0.0".to_string()),
                ("request", "GetFeature".to_string()),
                ("typeName", query.type_name()),
                ("propertyName", "fire_id,year".to_string()),
                ("outputFormat", "json".to_string()),
                ("CQL_FILTER", query.filter()),
            ],
        )
        .with_context(|| format!("invalid catalog URL {}", self.base_url))?;
        Ok(url)
    }
}

/// Parse a WFS JSON listing, keeping feature order
fn parse_listing(body: &[u8]) -> Result<Vec<ItemIdentifier>> {
    let response: WfsResponse =
        serde_json::from_slice(body).context("catalog response is not a feature listing")?;
    Ok(response
        .features
        .into_iter()
        .map(|f| ItemIdentifier::new(f.properties.year.into_key(), f.properties.fire_id))
        .collect())
}

#[async_trait]
impl CatalogSource for WfsCatalog {
    #[instrument(skip(self, query), fields(query = %query))]
    async fn list_items(&self, query: &CatalogQuery) -> Result<Vec<ItemIdentifier>> {
        let url = self.query_url(query)?;
        debug!(%url, "Querying catalog");

        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }
        let body = resp.bytes().await?;

        let items = parse_listing(&body)?;
        debug!(count = items.len(), "Catalog listed");
        Ok(items)
    }
}
