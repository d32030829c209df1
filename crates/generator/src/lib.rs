// Static site generation for the blog home page

pub mod template;
pub mod view;

use blog_kit_core::{HomeProps, Result, SiteConfig};

pub use template::{RenderMode, generate_load_more_js, render_home};
pub use view::{Cursor, LoadMoreError, LoadOutcome, LoadTicket, PostListView};

pub struct GeneratedSite {
    pub pages: Vec<(String, String)>,   // (path, html)
    pub assets: Vec<(String, Vec<u8>)>, // (path, data)
}

/// Render the built site from the static props
pub fn generate_site(props: &HomeProps, site: &SiteConfig) -> Result<GeneratedSite> {
    let view = PostListView::new(props.posts_pagination.clone());
    let index = render_home(&view, site, RenderMode::Static);
    let payload = serde_json::to_vec_pretty(props)?;

    Ok(GeneratedSite {
        pages: vec![("index.html".to_string(), index)],
        assets: vec![
            ("posts.json".to_string(), payload),
            (
                "load-more.js".to_string(),
                generate_load_more_js().as_bytes().to_vec(),
            ),
        ],
    })
}
