use anyhow::{Context, Result};
use blog_kit_client::{PrismicClient, load_static_props};
use blog_kit_core::{HomeProps, SiteConfig};
use blog_kit_generator::generate_site;
use std::fs;
use std::path::{Path, PathBuf};

use super::load_config;

/// Build static site for deployment
///
/// A failed Prismic query aborts the build before anything is written.
pub async fn run(path: PathBuf, output: PathBuf) -> Result<()> {
    println!("🔨 Building static site...");
    println!("   Source: {}", path.display());
    println!("   Output: {}", output.display());
    println!();

    let config = load_config(&path)?;
    println!("✓ Loaded: {}", config.site.title);
    let client = PrismicClient::new(&config.prismic).context("Failed to create Prismic client")?;
    println!("  Endpoint: {}", client.endpoint());
    println!("  Page size: {}", config.prismic.page_size);
    println!();

    println!("📡 Querying Prismic...");
    let props = load_static_props(&client, &config.prismic)
        .await
        .context("Failed to query Prismic for posts")?;

    let pagination = &props.posts_pagination;
    println!("   ✓ Fetched {} posts", pagination.results.len());
    if pagination.next_page.is_some() {
        println!("   ✓ More pages available via load-more");
    }

    println!("📄 Generating site...");
    let written = write_site(&props, &config.site, &output)?;
    println!("   ✓ Wrote {} files", written);

    println!();
    println!("✅ Build complete!");
    println!("   Output: {}", output.display());
    println!();
    println!("To test locally:");
    println!("   cd {} && python3 -m http.server 8000", output.display());
    println!();

    Ok(())
}

/// Render the site and write every page and asset under `output`
pub fn write_site(props: &HomeProps, site: &SiteConfig, output: &Path) -> Result<usize> {
    let generated = generate_site(props, site).context("Failed to generate site")?;

    fs::create_dir_all(output).context("Failed to create output directory")?;

    let mut written = 0;
    for (name, html) in &generated.pages {
        let dst = output.join(name);
        fs::write(&dst, html).with_context(|| format!("Failed to write {}", dst.display()))?;
        written += 1;
    }
    for (name, data) in &generated.assets {
        let dst = output.join(name);
        fs::write(&dst, data).with_context(|| format!("Failed to write {}", dst.display()))?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_blog_toml(dir: &Path, endpoint: &str) {
        fs::write(
            dir.join("blog.toml"),
            format!("[prismic]\nendpoint = \"{}\"\npage_size = 1\n", endpoint),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_build_writes_site() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "refs": [{"id": "master", "ref": "MASTER", "isMasterRef": true}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "next_page": "https://blog.cdn.prismic.io/api/v2/documents/search?page=2",
                "results": [{
                    "uid": "a",
                    "first_publication_date": "2021-03-25T19:27:35+0000",
                    "data": {"title": "Post A", "subtitle": "S", "author": "Au"}
                }]
            })))
            .mount(&server)
            .await;

        let blog = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_blog_toml(blog.path(), &format!("{}/api/v2", server.uri()));

        run(blog.path().to_path_buf(), out.path().join("site"))
            .await
            .unwrap();

        let index = fs::read_to_string(out.path().join("site/index.html")).unwrap();
        assert!(index.contains("Post A"));
        assert!(index.contains("25 mar 2021"));
        assert!(index.contains("Carregar mais posts"));
        assert!(out.path().join("site/load-more.js").exists());

        let payload: HomeProps =
            serde_json::from_slice(&fs::read(out.path().join("site/posts.json")).unwrap())
                .unwrap();
        assert_eq!(payload.posts_pagination.results.len(), 1);
    }

    #[tokio::test]
    async fn test_build_fails_when_cms_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let blog = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_blog_toml(blog.path(), &format!("{}/api/v2", server.uri()));

        let result = run(blog.path().to_path_buf(), out.path().join("site")).await;

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to query Prismic"));
        assert!(!out.path().join("site/index.html").exists());
    }

    #[tokio::test]
    async fn test_build_requires_config() {
        let blog = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let result = run(blog.path().to_path_buf(), out.path().to_path_buf()).await;
        assert!(result.unwrap_err().to_string().contains("blog.toml not found"));
    }

    #[test]
    fn test_write_site_counts_files() {
        let out = TempDir::new().unwrap();
        let written = write_site(&HomeProps::default(), &SiteConfig::default(), out.path()).unwrap();
        assert_eq!(written, 3);
        let index = fs::read_to_string(out.path().join("index.html")).unwrap();
        assert!(!index.contains("Carregar mais posts"));
    }
}
