//! Records produced by the extraction pipeline
//!
//! Records are built once by the extractors and never mutated afterwards;
//! comments are attached by consuming the article record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One extracted article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    /// Canonical article URL, unique within a run
    pub url: String,

    /// Platform post id derived from the URL
    pub id: Option<String>,

    pub title: String,

    pub subtitle: String,

    pub author: Option<String>,

    pub published_at: Option<DateTime<Utc>>,

    /// Lowercase, deduplicated tags
    pub tags: BTreeSet<String>,

    pub claps: u64,

    pub read_time_minutes: Option<f64>,

    /// Plain-text body; empty when the body could not be extracted
    pub body_text: String,

    pub comments: Vec<CommentRecord>,
}

impl ArticleRecord {
    /// Attaches the article's comments, consuming the record
    pub fn with_comments(self, comments: Vec<CommentRecord>) -> Self {
        Self { comments, ..self }
    }

    /// Returns true if the article carries the given (lowercase) tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }
}

/// One response/comment on an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    /// Unique within the owning article
    pub id: String,

    pub author: String,

    pub text: String,

    pub posted_at: Option<DateTime<Utc>>,

    /// Back-reference to the comment this one replies to
    pub parent_id: Option<String>,
}

impl CommentRecord {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}
