use crate::{PageSource, QueryOptions};
use async_trait::async_trait;
use blog_kit_core::{Error, PrismicConfig, Result, SearchResponse};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("blog-kit/", env!("CARGO_PKG_VERSION"));

/// Build an `at` predicate, e.g. `[at(document.type, "posts")]`
pub fn predicate_at(path: &str, value: &str) -> String {
    format!("[at({}, \"{}\")]", path, value.replace('"', "\\\""))
}

/// Prismic content API client
pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

/// API root response, only the refs are needed
#[derive(Debug, Deserialize)]
struct ApiInfo {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    id: String,
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

impl PrismicClient {
    /// Create new Prismic API client
    pub fn new(config: &PrismicConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the master ref, which every search must be pinned to
    pub async fn master_ref(&self) -> Result<String> {
        let mut request = self.client.get(&self.endpoint);
        if let Some(token) = &self.access_token {
            request = request.query(&[("access_token", token)]);
        }

        let info: ApiInfo = self.get_json(request, &self.endpoint).await?;

        info.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| {
                debug!(id = %r.id, reference = %r.reference, "Resolved master ref");
                r.reference
            })
            .ok_or_else(|| Error::InvalidData("Prismic API returned no master ref".to_string()))
    }

    /// Run a predicate query against the search endpoint
    pub async fn query(
        &self,
        predicates: &[String],
        options: &QueryOptions,
    ) -> Result<SearchResponse> {
        let master_ref = self.master_ref().await?;
        let url = format!("{}/documents/search", self.endpoint);

        let mut params: Vec<(&str, String)> = vec![
            ("ref", master_ref),
            ("q", format!("[{}]", predicates.concat())),
            ("pageSize", options.page_size.to_string()),
        ];
        if !options.fetch.is_empty() {
            params.push(("fetch", options.fetch.join(",")));
        }
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.clone()));
        }

        let request = self.client.get(&url).query(&params);
        self.get_json(request, &url).await
    }

    /// Follow an opaque `next_page` URL
    pub async fn fetch_page(&self, url: &str) -> Result<SearchResponse> {
        let request = self.client.get(url);
        self.get_json(request, url).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T> {
        debug!(url, "GET");
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Prismic request failed");
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl PageSource for PrismicClient {
    async fn first_page(&self, options: &QueryOptions) -> Result<SearchResponse> {
        let predicates = [predicate_at("document.type", &options.document_type)];
        self.query(&predicates, options).await
    }

    async fn next_page(&self, url: &str) -> Result<SearchResponse> {
        self.fetch_page(url).await
    }
}
