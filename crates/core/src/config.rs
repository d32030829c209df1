use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides `prismic.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Largest page Prismic will serve
pub const MAX_PAGE_SIZE: u32 = 100;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_DOCUMENT_TYPE: &str = "posts";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Complete blog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConfig {
    pub site: SiteConfig,
    pub prismic: PrismicConfig,
}

/// Site presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    pub logo: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            title: "spacetraveling".to_string(),
            logo: "/Logo.svg".to_string(),
        }
    }
}

/// Content API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrismicConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub document_type: String,
    pub page_size: u32,
    pub fetch: Vec<String>,
    pub timeout: Duration,
}

impl PrismicConfig {
    /// Config with default query options for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        PrismicConfig {
            endpoint: endpoint.into(),
            access_token: None,
            document_type: DEFAULT_DOCUMENT_TYPE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            fetch: default_fetch(DEFAULT_DOCUMENT_TYPE),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Raw TOML configuration structure
/// This matches the blog.toml file structure exactly
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    site: Option<RawSite>,
    prismic: RawPrismic,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    title: Option<String>,
    logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPrismic {
    endpoint: String,
    access_token: Option<String>,
    document_type: Option<String>,
    page_size: Option<u32>,
    fetch: Option<Vec<String>>,
    timeout_secs: Option<u64>,
}

fn default_fetch(document_type: &str) -> Vec<String> {
    ["title", "subtitle", "author"]
        .iter()
        .map(|field| format!("{}.{}", document_type, field))
        .collect()
}

/// Parse blog.toml from a file path.
///
/// A non-empty `PRISMIC_ACCESS_TOKEN` in the environment replaces the
/// token from the file.
pub fn parse_blog_toml<P: AsRef<Path>>(path: P) -> Result<BlogConfig> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_blog_toml_str(&content)?;

    if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV)
        && !token.trim().is_empty()
    {
        config.prismic.access_token = Some(token);
    }

    Ok(config)
}

/// Parse blog.toml from a string (useful for testing)
pub fn parse_blog_toml_str(content: &str) -> Result<BlogConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    let defaults = SiteConfig::default();
    let site = match raw.site {
        Some(site) => SiteConfig {
            title: site.title.unwrap_or(defaults.title),
            logo: site.logo.unwrap_or(defaults.logo),
        },
        None => defaults,
    };

    let endpoint = validate_endpoint(&raw.prismic.endpoint)?;

    let document_type = raw
        .prismic
        .document_type
        .unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string());
    if document_type.trim().is_empty() {
        return Err(Error::ConfigParse(
            "prismic.document_type must not be empty".to_string(),
        ));
    }

    let page_size = validate_page_size(raw.prismic.page_size.unwrap_or(DEFAULT_PAGE_SIZE))?;

    let fetch = raw
        .prismic
        .fetch
        .unwrap_or_else(|| default_fetch(&document_type));
    if fetch.is_empty() || fetch.iter().any(|f| f.trim().is_empty()) {
        return Err(Error::ConfigParse(
            "prismic.fetch must list at least one field, e.g. \"posts.title\"".to_string(),
        ));
    }

    let timeout_secs = raw.prismic.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(Error::ConfigParse(
            "prismic.timeout_secs must be greater than zero".to_string(),
        ));
    }

    let access_token = raw
        .prismic
        .access_token
        .filter(|token| !token.trim().is_empty());

    Ok(BlogConfig {
        site,
        prismic: PrismicConfig {
            endpoint,
            access_token,
            document_type,
            page_size,
            fetch,
            timeout: Duration::from_secs(timeout_secs),
        },
    })
}

/// Check the API endpoint is an absolute http(s) URL and strip any trailing slash
fn validate_endpoint(endpoint: &str) -> Result<String> {
    let parsed = url::Url::parse(endpoint.trim()).map_err(|e| {
        Error::ConfigParse(format!("Invalid prismic.endpoint '{}': {}", endpoint, e))
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::ConfigParse(format!(
            "prismic.endpoint must use http or https: '{}'",
            endpoint
        )));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Page size must be between 1 and Prismic's maximum
fn validate_page_size(page_size: u32) -> Result<u32> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(Error::ConfigParse(format!(
            "prismic.page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, page_size
        )));
    }
    Ok(page_size)
}
