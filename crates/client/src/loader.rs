use crate::{PageSource, QueryOptions};
use blog_kit_core::{HomeProps, PrismicConfig, Result};
use tracing::info;

/// Build-time data fetch for the home page.
///
/// Queries the first page of documents and maps them to posts. Publication
/// dates pass through unformatted. Errors are returned as-is; there is no
/// retry.
pub async fn load_static_props(
    source: &dyn PageSource,
    config: &PrismicConfig,
) -> Result<HomeProps> {
    let options = QueryOptions::from_config(config);
    let response = source.first_page(&options).await?;

    let posts_pagination = response.into_pagination();
    info!(
        posts = posts_pagination.results.len(),
        has_more = posts_pagination.next_page.is_some(),
        page_size = options.page_size,
        "Loaded static props"
    );

    Ok(HomeProps { posts_pagination })
}
