pub mod config;
pub mod date;
pub mod error;
pub mod types;

pub use config::{BlogConfig, PrismicConfig, SiteConfig, parse_blog_toml};
pub use date::{display_date, format_publication_date};
pub use error::{Error, Result};
pub use types::*;
