//! Article export
//!
//! Writes the filtered articles to the output directory in one of the
//! supported formats.

use crate::config::OutputFormat;
use crate::model::ArticleRecord;
use crate::output::markdown::format_markdown_digest;
use crate::output::traits::OutputResult;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Base name of every export file
const EXPORT_STEM: &str = "articles";

/// Flattened CSV row; one per article
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow<'a> {
    url: &'a str,
    id: &'a str,
    title: &'a str,
    subtitle: &'a str,
    author: &'a str,
    published_at: String,
    tags: String,
    claps: u64,
    read_time_minutes: Option<f64>,
    comment_count: usize,
    body_text: &'a str,
}

impl<'a> From<&'a ArticleRecord> for CsvRow<'a> {
    fn from(article: &'a ArticleRecord) -> Self {
        Self {
            url: &article.url,
            id: article.id.as_deref().unwrap_or_default(),
            title: &article.title,
            subtitle: &article.subtitle,
            author: article.author.as_deref().unwrap_or_default(),
            published_at: article
                .published_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
            tags: article
                .tags
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(";"),
            claps: article.claps,
            read_time_minutes: article.read_time_minutes,
            comment_count: article.comment_count(),
            body_text: &article.body_text,
        }
    }
}

/// Exports articles to `<dir>/articles.<ext>`
///
/// The directory is created if needed and an existing export is replaced.
///
/// # Arguments
///
/// * `articles` - Articles to write, in discovery order
/// * `format` - Output format
/// * `dir` - Output directory
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(OutputError)` - Failed to create the directory or write the file
pub fn export_articles(
    articles: &[ArticleRecord],
    format: OutputFormat,
    dir: &Path,
) -> OutputResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", EXPORT_STEM, format.extension()));

    match format {
        OutputFormat::Json => write_json(articles, &path)?,
        OutputFormat::Csv => write_csv(articles, &path)?,
        OutputFormat::Markdown => {
            let mut file = File::create(&path)?;
            file.write_all(format_markdown_digest(articles).as_bytes())?;
        }
    }

    tracing::info!(
        path = %path.display(),
        articles = articles.len(),
        "Exported articles"
    );
    Ok(path)
}

fn write_json(articles: &[ArticleRecord], path: &Path) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, articles)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn write_csv(articles: &[ArticleRecord], path: &Path) -> OutputResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for article in articles {
        writer.serialize(CsvRow::from(article))?;
    }
    writer.flush()?;
    Ok(())
}
