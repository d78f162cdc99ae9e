//! Markdown digest generation
//!
//! This module renders exported articles as a human-readable Markdown
//! document: one section per article with its metadata, body and comments.

use crate::model::{ArticleRecord, CommentRecord};

/// Longest body excerpt rendered per article, in characters
const BODY_EXCERPT_CHARS: usize = 600;

/// Formats articles as a Markdown digest
///
/// # Arguments
///
/// * `articles` - Articles in discovery order
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_digest(articles: &[ArticleRecord]) -> String {
    let mut md = String::new();

    md.push_str("# Article Digest\n\n");
    md.push_str(&format!("- **Articles**: {}\n", articles.len()));
    md.push_str(&format!(
        "- **Comments**: {}\n\n",
        articles.iter().map(ArticleRecord::comment_count).sum::<usize>()
    ));

    for article in articles {
        push_article(&mut md, article);
    }

    md
}

fn push_article(md: &mut String, article: &ArticleRecord) {
    md.push_str(&format!("## [{}]({})\n\n", escape(&article.title), article.url));

    if !article.subtitle.is_empty() {
        md.push_str(&format!("_{}_\n\n", escape(&article.subtitle)));
    }

    if let Some(author) = &article.author {
        md.push_str(&format!("- **Author**: {}\n", escape(author)));
    }
    if let Some(published) = &article.published_at {
        md.push_str(&format!("- **Published**: {}\n", published.format("%Y-%m-%d")));
    }
    if !article.tags.is_empty() {
        let tags: Vec<&str> = article.tags.iter().map(String::as_str).collect();
        md.push_str(&format!("- **Tags**: {}\n", tags.join(", ")));
    }
    md.push_str(&format!("- **Claps**: {}\n", article.claps));
    if let Some(minutes) = article.read_time_minutes {
        md.push_str(&format!("- **Read time**: {} min\n", minutes));
    }
    md.push('\n');

    if !article.body_text.is_empty() {
        md.push_str(&excerpt(&article.body_text));
        md.push_str("\n\n");
    }

    if !article.comments.is_empty() {
        md.push_str(&format!("### Comments ({})\n\n", article.comments.len()));
        for comment in &article.comments {
            push_comment(md, comment);
        }
        md.push('\n');
    }
}

fn push_comment(md: &mut String, comment: &CommentRecord) {
    let indent = if comment.is_reply() { "  " } else { "" };
    let text = comment.text.split_whitespace().collect::<Vec<_>>().join(" ");
    md.push_str(&format!(
        "{}- **{}**: {}\n",
        indent,
        escape(&comment.author),
        escape(&text)
    ));
}

fn excerpt(body: &str) -> String {
    if body.chars().count() <= BODY_EXCERPT_CHARS {
        return body.to_string();
    }
    let cut: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Escapes characters that would start Markdown emphasis or links
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '_' | '[' | ']' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
