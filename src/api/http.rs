//! Implements the `Backend` trait with `reqwest` against the barangay REST backend.

use crate::api::{Backend, SummaryQuery, BUDGET_ITEMS, INCOME_EXPENSE};
use crate::error::Res;
use crate::model::{BudgetItems, GroupedCounts, RawBudgetItem, RawRecord};
use crate::Config;
use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, trace};
use url::Url;

/// List endpoints return either a bare array or a page of results with a link to the next page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Page {
        results: Vec<T>,
        #[serde(default)]
        next: Option<String>,
    },
    All(Vec<T>),
}

pub(crate) struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpBackend {
    pub(crate) async fn new(config: &Config) -> Res<Self> {
        let token = config.token().await?;
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Unable to create the HTTP client")?;
        Ok(Self {
            client,
            base_url: config.api_base_url().clone(),
            token,
        })
    }

    /// GETs `url` and deserializes the JSON body.
    async fn get<T>(&self, url: Url, params: &[(&str, String)]) -> Res<T>
    where
        T: DeserializeOwned + Send,
    {
        trace!("GET {url} {params:?}");
        let mut request = self.client.get(url.clone()).query(params);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("Request to {url} returned {status}");
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("Unable to parse the response from {url}"))
    }

    /// GETs every page of a list endpoint.
    async fn get_all<T>(&self, path: &str, params: &[(&str, String)]) -> Res<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        let mut url = self.endpoint(path)?;
        let mut params = params.to_vec();
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        loop {
            match self.get::<Listing<T>>(url, &params).await? {
                Listing::All(mut all) => {
                    items.append(&mut all);
                    break;
                }
                Listing::Page { mut results, next } => {
                    items.append(&mut results);
                    match next {
                        Some(next) => {
                            // The next link already carries the query string.
                            url = next_page(&mut visited, &next)?;
                            params.clear();
                        }
                        None => break,
                    }
                }
            }
        }
        debug!("Fetched {} items from {path}", items.len());
        Ok(items)
    }

    fn endpoint(&self, path: &str) -> Res<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Unable to join '{path}' onto {}", self.base_url))
    }
}

/// Parses a next page link. Fails if the link was already followed, which would never end.
fn next_page(visited: &mut HashSet<Url>, next: &str) -> Res<Url> {
    let url = Url::parse(next).with_context(|| format!("Invalid next page link '{next}'"))?;
    if !visited.insert(url.clone()) {
        bail!("The next page link {url} was already fetched");
    }
    Ok(url)
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn income_expense(&mut self, year: i32) -> Res<Vec<RawRecord>> {
        self.get_all(INCOME_EXPENSE, &[("year", year.to_string())])
            .await
            .context("Failed to fetch income and expense records")
    }

    async fn budget_items(&mut self, year: i32) -> Res<BudgetItems> {
        let items: Vec<RawBudgetItem> = self
            .get_all(BUDGET_ITEMS, &[("year", year.to_string())])
            .await
            .context("Failed to fetch budget items")?;
        Ok(items.into())
    }

    async fn summary(&mut self, query: SummaryQuery) -> Res<GroupedCounts> {
        let url = self.endpoint(query.kind.path())?;
        self.get(url, &query.params())
            .await
            .with_context(|| format!("Failed to fetch the {query}"))
    }
}
