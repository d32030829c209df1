use anyhow::{Context, Result};
use blog_kit_core::config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, parse_blog_toml_str};
use std::fs;
use std::path::{Path, PathBuf};

use super::{CONFIG_FILE, config_path};

const PLACEHOLDER_ENDPOINT: &str = "https://your-repository.cdn.prismic.io/api/v2";

/// Escape a string for safe inclusion in a TOML basic string
///
/// The template keeps its comments, so it is assembled by hand rather than
/// serialized with the toml crate.
///
/// See: https://toml.io/en/v1.0.0#string
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\x08', "\\b")
        .replace('\x0C', "\\f")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Initialize a blog directory with a commented blog.toml
///
/// # Errors
///
/// Returns an error if:
/// - The directory doesn't exist
/// - blog.toml already exists in the directory
/// - The endpoint given is not an http(s) URL
pub async fn run(path: PathBuf, title: Option<String>, endpoint: Option<String>) -> Result<()> {
    println!("Initializing blog directory: {}", path.display());

    if !path.exists() {
        anyhow::bail!(
            "Directory '{}' does not exist. Create it first: mkdir {}",
            path.display(),
            path.display()
        );
    }

    let blog_toml_path = config_path(&path);
    if blog_toml_path.exists() {
        anyhow::bail!(
            "{} already exists at {}\nHint: Delete it first or use a different directory",
            CONFIG_FILE,
            blog_toml_path.display()
        );
    }

    generate_blog_toml(&path, title.as_deref(), endpoint.as_deref())?;

    println!("\n✓ Initialization complete!");
    println!("\nGenerated structure:");
    println!("  {}/", path.display());
    println!("  └── {}            ← Set your Prismic endpoint here", CONFIG_FILE);

    println!("\nNext steps:");
    println!("  1. Edit {} (endpoint, page size)", CONFIG_FILE);
    println!("  2. Export PRISMIC_ACCESS_TOKEN if your repository is private");
    println!("  3. Preview: blog-kit preview {}", path.display());

    Ok(())
}

fn generate_blog_toml(base: &Path, title: Option<&str>, endpoint: Option<&str>) -> Result<()> {
    let site_title = toml_escape_string(title.unwrap_or("spacetraveling"));
    let api_endpoint = toml_escape_string(endpoint.unwrap_or(PLACEHOLDER_ENDPOINT));

    let endpoint_comment = if endpoint.is_some() {
        ""
    } else {
        "  # TODO: Set your repository endpoint"
    };

    let toml = format!(
        "# Generated by blog-kit init\n\
# Edit this file to customize your blog\n\
\n\
[site]\n\
title = \"{site_title}\"\n\
logo = \"/Logo.svg\"\n\
\n\
[prismic]\n\
endpoint = \"{api_endpoint}\"{endpoint_comment}\n\
# access_token = \"...\"  # Or export PRISMIC_ACCESS_TOKEN\n\
# Prismic repeats the token in its next_page URLs, which build writes into\n\
# the public index.html (data-next-page) and posts.json\n\
document_type = \"posts\"\n\
# Posts per page, 1 to {MAX_PAGE_SIZE}\n\
page_size = {DEFAULT_PAGE_SIZE}\n\
fetch = [\"posts.title\", \"posts.subtitle\", \"posts.author\"]\n\
timeout_secs = 30\n"
    );

    // Validate the generated config with the real parser
    parse_blog_toml_str(&toml).context("Generated blog.toml is invalid")?;

    fs::write(base.join(CONFIG_FILE), toml)?;

    Ok(())
}
