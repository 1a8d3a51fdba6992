//! Static asset chunks
//!
//! Assets are grouped into chunks. Every page pulls in `app`; only the post
//! detail page pulls in `markdown`, so list views never download the
//! markdown styling and code highlighter.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// URL prefix assets are served under
pub const ASSET_PREFIX: &str = "/assets";

/// A named group of assets loaded together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk {
    App,
    Markdown,
}

impl Chunk {
    pub fn name(&self) -> &'static str {
        match self {
            Chunk::App => "app",
            Chunk::Markdown => "markdown",
        }
    }

    /// File names belonging to this chunk
    pub fn files(&self) -> &'static [&'static str] {
        match self {
            Chunk::App => &["app.css", "app.js"],
            Chunk::Markdown => &["markdown.css", "highlight.js"],
        }
    }

    /// `<link>`/`<script>` tags that load this chunk
    pub fn tags(&self) -> String {
        self.files()
            .iter()
            .map(|file| {
                if file.ends_with(".css") {
                    format!(r#"<link rel="stylesheet" href="{ASSET_PREFIX}/{file}">"#)
                } else {
                    format!(r#"<script defer src="{ASSET_PREFIX}/{file}"></script>"#)
                }
            })
            .collect::<Vec<_>>()
            .join("\n    ")
    }
}

/// Look up an embedded asset by file name
pub fn lookup(file: &str) -> Option<&'static str> {
    match file {
        "app.css" => Some(APP_CSS),
        "app.js" => Some(APP_JS),
        "markdown.css" => Some(MARKDOWN_CSS),
        "highlight.js" => Some(HIGHLIGHT_JS),
        _ => None,
    }
}

/// Serve an asset
pub fn serve(file: &str) -> Response {
    match lookup(file) {
        Some(content) => {
            let mime = mime_guess::from_path(file).first_or_octet_stream();
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime.as_ref().to_string()),
                    (header::CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
                ],
                content,
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "File not found").into_response(),
    }
}

const APP_CSS: &str = r#"
body { font-family: ui-sans-serif, system-ui, -apple-system, Segoe UI, Roboto, Helvetica, Arial; margin: 0; color: #111827; }
header { border-bottom: 1px solid #e5e7eb; padding: 12px 18px; }
header a { color: inherit; text-decoration: none; font-weight: 600; }
main { max-width: 760px; margin: 0 auto; padding: 18px; }
.posts { list-style: none; padding: 0; }
.posts li { border: 1px solid #e5e7eb; border-radius: 10px; padding: 12px 16px; margin: 12px 0; }
.posts h2 { margin: 0 0 6px; font-size: 1.15rem; }
.excerpt { color: #4b5563; }
.alert { border: 1px solid #fca5a5; background: #fef2f2; color: #991b1b; border-radius: 8px; padding: 10px 14px; }
.hint { color: #6b7280; }
"#;

// Swaps <main> on same-origin link clicks so navigation does not reload the page.
const APP_JS: &str = r#"
(function () {
  async function go(url, push) {
    const resp = await fetch(url, { headers: { 'accept': 'text/html' } });
    const html = await resp.text();
    const doc = new DOMParser().parseFromString(html, 'text/html');
    const next = doc.querySelector('main');
    if (!next) { window.location.assign(url); return; }
    document.querySelector('main').replaceWith(next);
    document.title = doc.title;
    for (const tag of doc.querySelectorAll('head link[rel=stylesheet], head script[src]')) {
      const attr = tag.tagName === 'LINK' ? 'href' : 'src';
      const value = tag.getAttribute(attr);
      if (!document.head.querySelector(tag.tagName + '[' + attr + '="' + value + '"]')) {
        const copy = document.createElement(tag.tagName);
        for (const a of tag.attributes) copy.setAttribute(a.name, a.value);
        document.head.appendChild(copy);
      }
    }
    if (push) history.pushState({}, '', url);
    if (window.penmarkHighlight) window.penmarkHighlight(document);
  }

  document.addEventListener('click', function (ev) {
    const link = ev.target.closest('a[data-link]');
    if (!link || ev.metaKey || ev.ctrlKey || ev.shiftKey || link.origin !== location.origin) return;
    ev.preventDefault();
    go(link.href, true).catch(function () { window.location.assign(link.href); });
  });

  window.addEventListener('popstate', function () {
    go(location.href, false).catch(function () { window.location.reload(); });
  });
})();
"#;

const MARKDOWN_CSS: &str = r#"
article pre { background: #0b1020; color: #e5e7eb; padding: 12px; border-radius: 10px; overflow: auto; }
article code { font-family: ui-monospace, SFMono-Regular, Menlo, monospace; }
article table { border-collapse: collapse; }
article td, article th { border: 1px solid #e5e7eb; padding: 4px 8px; }
.tok-kw { color: #c084fc; }
.tok-str { color: #86efac; }
.tok-num { color: #fbbf24; }
.tok-com { color: #9ca3af; font-style: italic; }
"#;

const HIGHLIGHT_JS: &str = r#"
(function () {
  const KEYWORDS = /\b(fn|let|mut|pub|struct|enum|impl|match|if|else|for|while|loop|return|use|mod|async|await|const|function|var|class|import|export|def)\b/g;
  function esc(s) { return s.replace(/&/g, '&amp;').replace(/</g, '&lt;').replace(/>/g, '&gt;'); }
  function highlight(code) {
    return esc(code)
      .replace(/(\/\/[^\n]*)/g, '<span class="tok-com">$1</span>')
      .replace(/(&quot;|")([^"\n]*)"/g, '<span class="tok-str">"$2"</span>')
      .replace(/\b(\d+)\b/g, '<span class="tok-num">$1</span>')
      .replace(KEYWORDS, '<span class="tok-kw">$1</span>');
  }
  window.penmarkHighlight = function (root) {
    for (const block of root.querySelectorAll('pre code[class^="language-"]:not([data-hl])')) {
      block.innerHTML = highlight(block.textContent);
      block.setAttribute('data-hl', '1');
    }
  };
  document.addEventListener('DOMContentLoaded', function () { window.penmarkHighlight(document); });
})();
"#;
