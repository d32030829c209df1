use anyhow::{Context, Result};
use blog_kit_client::{PageSource, PrismicClient, load_static_props};
use blog_kit_core::{Post, display_date};
use blog_kit_generator::{LoadOutcome, PostListView};
use std::io::{self, Write};
use std::path::PathBuf;

use super::load_config;

/// Helper to read user input
fn read_input(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Yes unless the answer is an explicit no; empty means yes
fn wants_more(answer: &str) -> bool {
    !matches!(
        answer.to_lowercase().as_str(),
        "n" | "no" | "nao" | "não" | "q" | "quit"
    )
}

/// Page through posts in the terminal, one load-more per confirmation
pub async fn run(path: PathBuf) -> Result<()> {
    let config = load_config(&path)?;
    let client = PrismicClient::new(&config.prismic).context("Failed to create Prismic client")?;

    let props = load_static_props(&client, &config.prismic)
        .await
        .context("Failed to query Prismic for posts")?;

    println!("📰 {}\n", config.site.title);

    let view = PostListView::new(props.posts_pagination);
    let mut stdout = io::stdout();
    let view = browse(view, &client, &mut stdout, || {
        read_input("\nCarregar mais posts? [Y/n] ").map(|answer| wants_more(&answer))
    })
    .await?;

    println!("\n{} posts shown", view.posts().len());
    Ok(())
}

/// Drive the list view until the cursor is exhausted or the user stops.
///
/// A failed load is reported and the prompt is offered again; the list and
/// cursor are unchanged, so answering yes retries the same page.
async fn browse<W, F>(
    mut view: PostListView,
    source: &dyn PageSource,
    out: &mut W,
    mut confirm: F,
) -> Result<PostListView>
where
    W: Write,
    F: FnMut() -> Result<bool>,
{
    write_posts(out, view.posts(), 0)?;

    while view.show_load_more() {
        if !confirm()? {
            break;
        }

        let shown = view.posts().len();
        match view.load_more(source).await {
            LoadOutcome::Appended(_) => write_posts(out, &view.posts()[shown..], shown)?,
            LoadOutcome::Failed(e) => writeln!(out, "⚠ {}", e)?,
            LoadOutcome::Busy | LoadOutcome::Exhausted => break,
        }
    }

    if !view.show_load_more() {
        writeln!(out, "\n— fim —")?;
    }

    Ok(view)
}

fn write_posts<W: Write>(out: &mut W, posts: &[Post], offset: usize) -> Result<()> {
    for (i, post) in posts.iter().enumerate() {
        writeln!(out, "{}", format_summary(offset + i + 1, post))?;
    }
    Ok(())
}

fn format_summary(number: usize, post: &Post) -> String {
    let mut summary = format!("{:>3}. {}", number, post.data.title);
    if !post.data.subtitle.is_empty() {
        summary.push_str(&format!("\n     {}", post.data.subtitle));
    }

    let date = display_date(post.first_publication_date.as_deref());
    let meta: Vec<&str> = [date.as_str(), post.data.author.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if !meta.is_empty() {
        summary.push_str(&format!("\n     {}", meta.join(" · ")));
    }
    if let Some(href) = post.href() {
        summary.push_str(&format!("\n     {}", href));
    }

    summary
}
