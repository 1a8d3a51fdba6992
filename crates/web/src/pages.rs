//! HTML page rendering
//!
//! Pages are plain functions from data to HTML. The index page is split in
//! two so the server can flush the static chrome (including "Welcome")
//! before the post list has been fetched.

use pulldown_cmark::{html, Event, Options, Parser};

use penmark_common::{Post, PostSummary, Result};

use crate::assets::Chunk;
use crate::routes::Route;

/// Site title shown in the header
pub const SITE_TITLE: &str = "Penmark";

/// Escape text for HTML element content and attribute values
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape`]
pub fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn head(title: &str, chunks: &[Chunk]) -> String {
    let tags = chunks.iter().map(Chunk::tags).collect::<Vec<_>>().join("\n    ");
    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{title}</title>
    {tags}
  </head>
  <body>
    <header><a href="/" data-link>{site}</a></header>
    <main>
"#,
        title = escape(title),
        site = SITE_TITLE,
    )
}

fn tail() -> &'static str {
    "    </main>\n  </body>\n</html>\n"
}

/// Index chrome up to and including the welcome banner
pub fn index_head() -> String {
    format!("{}      <h1>Welcome</h1>\n", head(SITE_TITLE, &[Chunk::App]))
}

/// Post list, empty state or error banner
pub fn index_posts(result: &Result<Vec<PostSummary>>) -> String {
    let posts = match result {
        Ok(posts) => posts,
        Err(_) => {
            return r#"      <p class="alert" role="alert">Posts could not be loaded.</p>
"#
            .to_string()
        }
    };

    if posts.is_empty() {
        return "      <p class=\"hint\">No posts yet.</p>\n".to_string();
    }

    let mut out = String::from("      <ul class=\"posts\">\n");
    for post in posts {
        let href = escape(&Route::Post(post.id.clone()).path());
        out.push_str(&format!(
            r#"        <li>
          <h2>{title}</h2>
          <p class="excerpt">{excerpt}</p>
          <a class="read" href="{href}" data-link>Read</a>
        </li>
"#,
            title = escape(&post.title),
            excerpt = escape(&post.excerpt),
        ));
    }
    out.push_str("      </ul>\n");
    out
}

/// Closing markup for the index page
pub fn index_tail() -> &'static str {
    tail()
}

/// Complete index page
pub fn index_page(result: &Result<Vec<PostSummary>>) -> String {
    format!("{}{}{}", index_head(), index_posts(result), index_tail())
}

/// Post detail page
pub fn post_page(post: &Post) -> String {
    let published = post
        .published_at
        .map(|at| {
            format!(
                "      <p class=\"hint\"><time datetime=\"{}\">{}</time></p>\n",
                at.to_rfc3339(),
                at.format("%B %-d, %Y")
            )
        })
        .unwrap_or_default();

    format!(
        r#"{head}      <article>
        <h1>{title}</h1>
{published}        {body}
      </article>
      <p><a href="/" data-link>All posts</a></p>
{tail}"#,
        head = head(&post.title, &[Chunk::App, Chunk::Markdown]),
        title = escape(&post.title),
        body = render_markdown(&post.body),
        tail = tail(),
    )
}

/// 404 page
pub fn not_found_page(path: &str) -> String {
    format!(
        r#"{head}      <h1>Page not found</h1>
      <p>Nothing lives at <code>{path}</code>.</p>
      <p><a href="/" data-link>Back to all posts</a></p>
{tail}"#,
        head = head("Page not found", &[Chunk::App]),
        path = escape(path),
        tail = tail(),
    )
}

/// Error page for failed fetches other than not-found
pub fn error_page(message: &str) -> String {
    format!(
        r#"{head}      <h1>Something went wrong</h1>
      <p class="alert" role="alert">{message}</p>
      <p><a href="/" data-link>Back to all posts</a></p>
{tail}"#,
        head = head("Error", &[Chunk::App]),
        message = escape(message),
        tail = tail(),
    )
}

/// Render markdown to HTML; raw HTML in the source is escaped, not passed through
pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(source, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(source.len() * 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use penmark_common::{Error, PostId};

    fn summaries() -> Vec<PostSummary> {
        vec![
            PostSummary {
                id: PostId::from(1u64),
                title: "First post".to_string(),
                excerpt: "Hello".to_string(),
            },
            PostSummary {
                id: PostId::from("two"),
                title: "<b>Bold</b>".to_string(),
                excerpt: String::new(),
            },
        ]
    }

    #[test]
    fn test_escape_round_trip() {
        let s = r#"<a href="x">Tom & 'Jerry'</a>"#;
        assert_eq!(unescape(&escape(s)), s);
        assert!(!escape(s).contains('<'));
    }

    #[test]
    fn test_index_head_has_welcome_and_no_markdown_chunk() {
        let head = index_head();
        assert!(head.contains("<h1>Welcome</h1>"));
        assert!(head.contains("/assets/app.css"));
        assert!(!head.contains("markdown.css"));
    }

    #[test]
    fn test_index_lists_read_links() {
        let html = index_page(&Ok(summaries()));
        assert_eq!(html.matches(">Read</a>").count(), 2);
        assert!(html.contains(r#"href="/posts/1""#));
        assert!(html.contains("&lt;b&gt;Bold&lt;/b&gt;"));
    }

    #[test]
    fn test_index_empty_and_error_states() {
        let empty = index_page(&Ok(vec![]));
        assert!(empty.contains("No posts yet."));
        assert!(empty.contains("Welcome"));

        let failed = index_page(&Err(Error::Network("refused".into())));
        assert!(failed.contains(r#"role="alert""#));
        assert!(failed.contains("Welcome"));
        assert!(!failed.contains("refused"));
    }

    #[test]
    fn test_post_page_heading_and_markdown_chunk() {
        let post = Post {
            id: PostId::from(1u64),
            title: "First post".to_string(),
            body: "Some *text*\n\n```rust\nlet x = 1;\n```".to_string(),
            published_at: None,
        };
        let html = post_page(&post);
        assert!(html.contains("<h1>First post</h1>"));
        assert!(html.contains("/assets/markdown.css"));
        assert!(html.contains("<em>text</em>"));
        assert!(html.contains(r#"<code class="language-rust">"#));
    }

    #[test]
    fn test_markdown_escapes_raw_html() {
        let html = render_markdown("hi <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_markdown_tables() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_not_found_page_escapes_path() {
        let html = not_found_page("/<x>");
        assert!(html.contains("Page not found"));
        assert!(html.contains("/&lt;x&gt;"));
    }
}
