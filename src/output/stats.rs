//! Run statistics
//!
//! This module computes the statistics block stored next to the exported
//! articles, and prints it (or the stored run history) to stdout.

use crate::crawler::ScrapeResult;
use crate::model::ArticleRecord;
use crate::storage::RunRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Statistics of one run, computed over the exported (filtered) articles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeStats {
    pub total_articles_scraped: usize,

    /// Sum of comment counts of the exported articles
    pub total_comments_scraped: usize,

    /// Wall time, formatted as `"12.3 seconds"`
    pub time_taken: String,

    pub resolved_count: usize,
    pub extracted_count: usize,
    pub failed_count: usize,
    pub partial: bool,
}

impl ScrapeStats {
    /// Computes statistics for a run
    ///
    /// # Arguments
    ///
    /// * `exported` - The articles that survived tag filtering
    /// * `result` - The raw scrape result
    /// * `elapsed` - Wall time of the run
    pub fn compute(exported: &[ArticleRecord], result: &ScrapeResult, elapsed: Duration) -> Self {
        Self {
            total_articles_scraped: exported.len(),
            total_comments_scraped: exported.iter().map(ArticleRecord::comment_count).sum(),
            time_taken: format_elapsed(elapsed),
            resolved_count: result.resolved_count,
            extracted_count: result.extracted_count,
            failed_count: result.failed_count,
            partial: result.partial,
        }
    }

    /// Emits the completion event carrying every statistic as a field
    pub fn log_completed(&self) {
        tracing::info!(
            total_articles_scraped = self.total_articles_scraped,
            total_comments_scraped = self.total_comments_scraped,
            time_taken = %self.time_taken,
            resolved_count = self.resolved_count,
            extracted_count = self.extracted_count,
            failed_count = self.failed_count,
            partial = self.partial,
            "Scraping completed successfully"
        );
    }
}

/// Formats a duration as seconds with one decimal
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1} seconds", elapsed.as_secs_f64())
}

/// Prints run statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &ScrapeStats) {
    println!("=== Scrape Statistics ===\n");

    println!("Overview:");
    println!("  Articles exported: {}", stats.total_articles_scraped);
    println!("  Comments exported: {}", stats.total_comments_scraped);
    println!("  Time taken: {}", stats.time_taken);
    println!();

    println!("Extraction:");
    println!("  Resolved: {}", stats.resolved_count);
    println!("  Extracted: {}", stats.extracted_count);
    println!("  Failed: {}", stats.failed_count);

    let success_rate = if stats.resolved_count > 0 {
        (stats.extracted_count as f64 / stats.resolved_count as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "\nSuccess Rate: {:.1}% ({} / {} articles extracted)",
        success_rate, stats.extracted_count, stats.resolved_count
    );

    if stats.partial {
        println!("Note: this run is PARTIAL; some data is missing.");
    }
}

/// Prints the runs recorded in the dataset store, newest first
pub fn print_run_history(runs: &[RunRecord]) {
    println!("=== Recorded Runs ===\n");

    if runs.is_empty() {
        println!("  (none)");
        return;
    }

    for run in runs {
        println!(
            "  #{} {} [{}] started {}{}",
            run.id,
            run.author_url,
            run.status.to_db_string(),
            run.started_at,
            run.finished_at
                .as_ref()
                .map(|finished| format!(", finished {}", finished))
                .unwrap_or_default()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommentRecord;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn article(comments: usize) -> ArticleRecord {
        ArticleRecord {
            url: "https://medium.com/@writer/post-1a2b3c4d5e6f".to_string(),
            id: None,
            title: "Post".to_string(),
            subtitle: String::new(),
            author: None,
            published_at: None,
            tags: Default::default(),
            claps: 0,
            read_time_minutes: None,
            body_text: String::new(),
            comments: (0..comments)
                .map(|i| CommentRecord {
                    id: format!("c{}", i),
                    author: "reader".to_string(),
                    text: "hi".to_string(),
                    posted_at: None,
                    parent_id: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_compute_sums_exported_comments() {
        let result = ScrapeResult {
            resolved_count: 3,
            extracted_count: 3,
            ..ScrapeResult::default()
        };
        let exported = vec![article(2), article(5)];

        let stats = ScrapeStats::compute(&exported, &result, Duration::from_millis(12_340));

        assert_eq!(stats.total_articles_scraped, 2);
        assert_eq!(stats.total_comments_scraped, 7);
        assert_eq!(stats.time_taken, "12.3 seconds");
        assert_eq!(stats.resolved_count, 3);
        assert!(!stats.partial);
    }

    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_completion_event_carries_stats() {
        let result = ScrapeResult {
            resolved_count: 4,
            extracted_count: 3,
            failed_count: 1,
            ..ScrapeResult::default()
        };
        let stats = ScrapeStats::compute(&[article(2)], &result, Duration::from_millis(2_500));

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || Capture(Arc::clone(&sink)))
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || stats.log_completed());

        let logged = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("Scraping completed successfully"));
        assert!(logged.contains("total_articles_scraped=1"));
        assert!(logged.contains("total_comments_scraped=2"));
        assert!(logged.contains("time_taken=2.5 seconds"));
        assert!(logged.contains("failed_count=1"));
        assert!(logged.contains("partial=false"));
    }

    #[test]
    fn test_stats_json_keys() {
        let stats = ScrapeStats::compute(&[], &ScrapeResult::default(), Duration::ZERO);
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["total_articles_scraped"], 0);
        assert_eq!(json["time_taken"], "0.0 seconds");
    }
}
