pub mod browse;
pub mod build;
pub mod init;
pub mod preview;
pub mod validate;

use anyhow::{Context, Result};
use blog_kit_core::{BlogConfig, parse_blog_toml};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "blog.toml";

/// Locate and parse blog.toml in a blog directory
pub fn load_config(path: &Path) -> Result<BlogConfig> {
    if !path.exists() {
        anyhow::bail!("Blog directory does not exist: {}", path.display());
    }

    let config_path = config_path(path);
    if !config_path.exists() {
        anyhow::bail!(
            "{} not found in {}\nRun 'blog-kit init {}' first",
            CONFIG_FILE,
            path.display(),
            path.display()
        );
    }

    parse_blog_toml(&config_path).with_context(|| format!("Failed to parse {}", CONFIG_FILE))
}

pub fn config_path(path: &Path) -> PathBuf {
    path.join(CONFIG_FILE)
}
