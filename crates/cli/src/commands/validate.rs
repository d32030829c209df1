use blog_kit_core::config::MAX_PAGE_SIZE;
use std::path::PathBuf;

use super::load_config;

pub async fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating blog at: {}", path.display());

    let config = load_config(&path)?;

    println!("✓ blog.toml valid");
    println!("  Site: {}", config.site.title);
    println!("  Endpoint: {}", config.prismic.endpoint);
    println!("  Document type: {}", config.prismic.document_type);
    println!(
        "  Page size: {} (max {})",
        config.prismic.page_size, MAX_PAGE_SIZE
    );
    println!("  Fetch: {}", config.prismic.fetch.join(", "));
    println!(
        "  Access token: {}",
        if config.prismic.access_token.is_some() {
            "set"
        } else {
            "not set"
        }
    );

    Ok(())
}
