use crate::view::PostListView;
use blog_kit_core::{Post, SiteConfig, display_date};

/// Label of the load-more control
pub const LOAD_MORE_LABEL: &str = "Carregar mais posts";

/// Where the rendered page will be served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Built site: load-more runs in the browser via `load-more.js`
    Static,
    /// Preview server: load-more posts back to the server, plus hot reload
    Preview,
}

/// HTML-escape a string to prevent XSS attacks
///
/// Escapes: & < > " '
pub fn html_escape(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#x27;".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

/// Render one post summary.
///
/// The date shown is derived from the stored ISO value; the post itself is
/// not touched. Posts without a uid are rendered without a link.
pub fn render_post_summary(post: &Post) -> String {
    let iso = post.first_publication_date.as_deref();
    let date = html_escape(&display_date(iso));
    let datetime = html_escape(iso.unwrap_or(""));

    let body = format!(
        r#"<h2>{}</h2>
            <p>{}</p>
            <div class="info">
                <time datetime="{}">{}</time>
                <span class="author">{}</span>
            </div>"#,
        html_escape(&post.data.title),
        html_escape(&post.data.subtitle),
        datetime,
        date,
        html_escape(&post.data.author)
    );

    match post.href() {
        Some(href) => format!(
            r#"<article class="post"><a href="{}">
            {}
        </a></article>"#,
            html_escape(&href),
            body
        ),
        None => format!(
            r#"<article class="post">
            {}
        </article>"#,
            body
        ),
    }
}

/// Render every post currently held by the view, in order
pub fn render_posts(view: &PostListView) -> String {
    view.posts()
        .iter()
        .map(render_post_summary)
        .collect::<Vec<_>>()
        .join("\n        ")
}

/// Render the load-more control, or nothing once pagination is exhausted
pub fn render_load_more(view: &PostListView) -> String {
    let Some(next_page) = view.next_page() else {
        return String::new();
    };

    let disabled = if view.is_loading() { " disabled" } else { "" };

    format!(
        r#"<form class="load-more" action="/more" method="post">
            <button type="submit" data-next-page="{}"{}>{}</button>
        </form>"#,
        html_escape(next_page),
        disabled,
        LOAD_MORE_LABEL
    )
}

/// Inline error region; replaces a blocking alert
fn render_error(view: &PostListView) -> String {
    let message = view
        .last_error()
        .map(|e| html_escape(&e.to_string()))
        .unwrap_or_default();
    let hidden = if message.is_empty() { " hidden" } else { "" };

    format!(
        r#"<p class="load-error" role="alert"{}>{}</p>"#,
        hidden, message
    )
}

/// Generate the complete HTML for the home page
///
/// Shared between preview and build so the preview shows what gets built.
pub fn render_home(view: &PostListView, site: &SiteConfig, mode: RenderMode) -> String {
    let is_preview = mode == RenderMode::Preview;

    let preview_badge = if is_preview {
        r#"<div class="preview-badge">PREVIEW MODE - Live Reload Active</div>"#
    } else {
        ""
    };

    let scripts = if is_preview {
        r#"<script>
        // Hot reload via Server-Sent Events
        const eventSource = new EventSource('/_reload');
        eventSource.onmessage = () => location.reload();
        eventSource.onerror = () => eventSource.close();
    </script>"#
    } else {
        r#"<script src="/load-more.js" defer></script>"#
    };

    let escaped_title = html_escape(&site.title);

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Home | {}</title>
    <link rel="preconnect" href="https://fonts.gstatic.com">
    <link href="https://fonts.googleapis.com/css2?family=Inter:wght@400;600;700&display=swap" rel="stylesheet">
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: "Inter", sans-serif;
            background: #1a1d23;
            color: #d7d7d7;
        }}
        header, main {{
            max-width: 720px;
            margin: 0 auto;
            padding: 0 1rem;
        }}
        header {{ padding-top: 5rem; padding-bottom: 5rem; }}
        .post {{ margin-bottom: 3rem; }}
        .post a {{ color: inherit; text-decoration: none; }}
        .post h2 {{ color: #f8f8f8; font-size: 1.75rem; font-weight: 700; }}
        .post p {{ margin: 0.5rem 0 1.5rem; font-size: 1.125rem; }}
        .post .info {{ display: flex; gap: 1.5rem; font-size: 0.875rem; }}
        .load-more button {{
            background: none;
            border: 0;
            color: #ff57b2;
            font: inherit;
            font-size: 1.125rem;
            font-weight: 600;
            cursor: pointer;
            margin-bottom: 5rem;
        }}
        .load-more button:disabled {{ opacity: 0.5; cursor: wait; }}
        .load-error {{ color: #ff8a8a; margin-bottom: 2rem; }}
        .preview-badge {{
            background: #ff57b2;
            color: #000;
            padding: 0.5rem 1rem;
            display: inline-block;
            font-weight: bold;
        }}
    </style>
</head>
<body>
    {}
    <header>
        <a href="/"><img src="{}" alt="logo"></a>
    </header>
    <main>
        <div class="posts">
        {}
        </div>
        {}
        {}
    </main>
    {}
</body>
</html>"#,
        escaped_title,
        preview_badge,
        html_escape(&site.logo),
        render_posts(view),
        render_error(view),
        render_load_more(view),
        scripts
    )
}

/// In-browser load-more.
///
/// Follows `data-next-page`, appends the fetched summaries, and removes the
/// control once the cursor is falsy. A second click while a request is in
/// flight is ignored. Failures are shown inline and leave the list and the
/// cursor as they were.
pub fn generate_load_more_js() -> &'static str {
    r#"// Incremental post list
(() => {
    const MONTHS = ['jan', 'fev', 'mar', 'abr', 'mai', 'jun', 'jul', 'ago', 'set', 'out', 'nov', 'dez'];

    const formatDate = (iso) => {
        if (!iso) return '';
        const normalized = iso.replace(/([+-]\d{2})(\d{2})$/, '$1:$2');
        const match = normalized.match(/^(\d{4})-(\d{2})-(\d{2})T/);
        if (!match || isNaN(Date.parse(normalized))) return iso;
        return `${match[3]} ${MONTHS[Number(match[2]) - 1]} ${match[1]}`;
    };

    const field = (value) => {
        if (typeof value === 'string') return value;
        if (Array.isArray(value)) {
            return value.map((block) => block && block.text).filter(Boolean).join(' ');
        }
        return '';
    };

    const el = (tag, text) => {
        const node = document.createElement(tag);
        if (text !== undefined) node.textContent = text;
        return node;
    };

    const renderPost = (doc) => {
        const data = doc.data || {};
        const article = el('article');
        article.className = 'post';

        const info = el('div');
        info.className = 'info';
        const time = el('time', formatDate(doc.first_publication_date));
        time.setAttribute('datetime', doc.first_publication_date || '');
        const author = el('span', field(data.author));
        author.className = 'author';
        info.append(time, author);

        const content = [el('h2', field(data.title)), el('p', field(data.subtitle)), info];
        if (doc.uid) {
            const link = el('a');
            link.href = `/post/${encodeURIComponent(doc.uid)}`;
            link.append(...content);
            article.append(link);
        } else {
            article.append(...content);
        }
        return article;
    };

    document.addEventListener('DOMContentLoaded', () => {
        const form = document.querySelector('.load-more');
        if (!form) return;

        const button = form.querySelector('button');
        const list = document.querySelector('.posts');
        const errorBox = document.querySelector('.load-error');
        let inFlight = false;

        form.addEventListener('submit', async (event) => {
            event.preventDefault();
            const nextPage = button.dataset.nextPage;
            if (inFlight || !nextPage) return;

            inFlight = true;
            button.disabled = true;
            try {
                const response = await fetch(nextPage);
                if (!response.ok) throw new Error(`HTTP ${response.status}`);
                const page = await response.json();

                (page.results || []).forEach((doc) => list.append(renderPost(doc)));
                errorBox.hidden = true;
                errorBox.textContent = '';

                if (page.next_page) {
                    button.dataset.nextPage = page.next_page;
                } else {
                    form.remove();
                }
            } catch (err) {
                errorBox.textContent = `Failed to load more posts: ${err.message}`;
                errorBox.hidden = false;
            } finally {
                inFlight = false;
                button.disabled = false;
            }
        });
    });
})();
"#
}
