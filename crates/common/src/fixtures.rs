//! Built-in fixture posts
//!
//! Used by the server's fixture mode and by tests that need deterministic
//! data without a backend.

use chrono::{TimeZone, Utc};

use crate::types::{Post, PostId};

/// The fixed post list. The first entry is titled "First post".
pub fn sample_posts() -> Vec<Post> {
    vec![
        Post {
            id: PostId::from(1u64),
            title: "First post".to_string(),
            body: "Hello, and thanks for stopping by.\n\n\
                   This is where it all starts.\n\n\
                   ```rust\nfn main() {\n    println!(\"hello\");\n}\n```\n"
                .to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).single(),
        },
        Post {
            id: PostId::from(2u64),
            title: "Second post".to_string(),
            body: "A follow-up with a table.\n\n\
                   | Name | Value |\n|------|-------|\n| a    | 1     |\n"
                .to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 2, 3, 18, 30, 0).single(),
        },
        Post {
            id: PostId::from(3u64),
            title: "Notes on <markup> & escaping".to_string(),
            body: "Titles may contain characters that need escaping.".to_string(),
            published_at: None,
        },
    ]
}
