//! Core types for Penmark

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// Maximum excerpt length in characters
pub const EXCERPT_CHARS: usize = 160;

/// Post identifier
///
/// Backends emit either numeric or string ids; both deserialize into the
/// same textual form, which is also the detail-route path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<u64> for PostId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PostIdVisitor;

        impl<'de> de::Visitor<'de> for PostIdVisitor {
            type Value = PostId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer post id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<PostId, E> {
                if v.is_empty() {
                    return Err(E::invalid_value(de::Unexpected::Str(v), &self));
                }
                Ok(PostId::new(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<PostId, E> {
                Ok(PostId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<PostId, E> {
                Ok(PostId(v.to_string()))
            }
        }

        deserializer.deserialize_any(PostIdVisitor)
    }
}

/// Post as listed on the index page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
}

/// Full post as shown on its detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    /// Markdown source
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Derive the list entry for this post
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            excerpt: excerpt(&self.body),
        }
    }
}

/// First non-empty paragraph of a markdown body, clipped to `EXCERPT_CHARS`.
pub fn excerpt(body: &str) -> String {
    let paragraph = body
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty() && !p.starts_with('#') && !p.starts_with("```"))
        .unwrap_or_default();

    let flat: String = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat;
    }

    let clipped: String = flat.chars().take(EXCERPT_CHARS).collect();
    format!("{}…", clipped.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_id_from_number_and_string() {
        let summaries: Vec<PostSummary> = serde_json::from_str(
            r#"[{"id": 7, "title": "Seven"}, {"id": "abc", "title": "Letters", "excerpt": "x"}]"#,
        )
        .unwrap();
        assert_eq!(summaries[0].id.as_str(), "7");
        assert_eq!(summaries[0].excerpt, "");
        assert_eq!(summaries[1].id, PostId::from("abc"));
    }

    #[test]
    fn test_post_id_serializes_as_string() {
        let json = serde_json::to_string(&PostId::from(42u64)).unwrap();
        assert_eq!(json, r#""42""#);
    }

    #[test]
    fn test_empty_post_id_rejected() {
        let result: Result<PostId, _> = serde_json::from_str(r#""""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_excerpt_skips_headings_and_clips() {
        let body = format!("# Title\n\n{}\n\nSecond paragraph", "word ".repeat(60));
        let e = excerpt(&body);
        assert!(e.ends_with('…'));
        assert!(e.chars().count() <= EXCERPT_CHARS + 1);
        assert!(e.starts_with("word word"));
    }

    #[test]
    fn test_summary_keeps_id_and_title() {
        let post = Post {
            id: PostId::from(1u64),
            title: "First post".to_string(),
            body: "Hello\nthere.".to_string(),
            published_at: None,
        };
        let summary = post.summary();
        assert_eq!(summary.title, "First post");
        assert_eq!(summary.excerpt, "Hello there.");
    }
}
