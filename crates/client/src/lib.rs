// Prismic content API access and the build-time static props loader

pub mod loader;
pub mod prismic;

use async_trait::async_trait;
use blog_kit_core::{PrismicConfig, Result, SearchResponse};

pub use loader::load_static_props;
pub use prismic::{PrismicClient, predicate_at};

/// Options for the first page of a document query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub document_type: String,
    pub fetch: Vec<String>,
    pub page_size: u32,
}

impl QueryOptions {
    pub fn from_config(config: &PrismicConfig) -> Self {
        QueryOptions {
            document_type: config.document_type.clone(),
            fetch: config.fetch.clone(),
            page_size: config.page_size,
        }
    }
}

/// Where pages of documents come from.
///
/// The first page is a predicate query; every later page is reached by
/// following the opaque `next_page` URL of the previous one.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn first_page(&self, options: &QueryOptions) -> Result<SearchResponse>;

    async fn next_page(&self, url: &str) -> Result<SearchResponse>;
}
