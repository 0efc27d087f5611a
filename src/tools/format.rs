//! Text rendering for tool output

use crate::api::types::{label_name, Article, Subscription, Tag, UnreadCount};
use chrono::{Duration, Utc};
use std::fmt::Write;

/// Characters of summary shown per article in lists.
const SUMMARY_PREVIEW_CHARS: usize = 200;

/// Feeds shown in the statistics breakdown.
const TOP_FEEDS: usize = 10;

/// UNIX timestamp `days` days ago, or `None` for `0`.
pub fn days_to_timestamp(days: u32) -> Option<i64> {
    (days > 0).then(|| (Utc::now() - Duration::days(i64::from(days))).timestamp())
}

/// Subscriptions sorted case-insensitively by title.
pub fn format_feed_list(feeds: &[Subscription]) -> String {
    if feeds.is_empty() {
        return "No feeds found in your Inoreader account.".to_string();
    }

    let mut sorted: Vec<&Subscription> = feeds.iter().collect();
    sorted.sort_by_key(|feed| feed.title.to_lowercase());

    let mut out = format!("Found {} feeds:\n\n", sorted.len());
    for feed in sorted {
        let _ = writeln!(out, "- **{}**", feed.title);
        let _ = writeln!(out, "  ID: {}", feed.id);
        if !feed.categories.is_empty() {
            let folders: Vec<&str> = feed.categories.iter().map(|c| c.label.as_str()).collect();
            let _ = writeln!(out, "  Folders: {}", folders.join(", "));
        }
        if !feed.html_url.is_empty() {
            let _ = writeln!(out, "  Website: {}", feed.html_url);
        }
    }
    out
}

/// Numbered article list with a short summary preview.
pub fn format_article_list(articles: &[Article]) -> String {
    let mut out = String::new();
    for (i, article) in articles.iter().enumerate() {
        let _ = writeln!(out, "{}. **{}**", i + 1, article.display_title());
        let _ = writeln!(
            out,
            "   Feed: {} | Date: {} | {}",
            article.feed_title(),
            article.published_date(),
            if article.is_read() { "Read" } else { "Unread" }
        );
        let _ = writeln!(out, "   ID: {}", article.id);
        if let Some(url) = article.url() {
            let _ = writeln!(out, "   URL: {}", url);
        }
        let summary = article.summary_text();
        if !summary.is_empty() {
            let _ = writeln!(out, "   {}", preview(&summary, SUMMARY_PREVIEW_CHARS));
        }
        out.push('\n');
    }
    out
}

/// Full view of one article.
pub fn format_article_detail(article: &Article) -> String {
    let mut out = format!("**{}**\n", article.display_title());
    let _ = writeln!(out, "Author: {}", article.display_author());
    let _ = writeln!(out, "Feed: {}", article.feed_title());
    let _ = writeln!(out, "Date: {}", article.published_date());
    let _ = writeln!(
        out,
        "🔗 **Link**: {}",
        article.url().unwrap_or("No URL available")
    );
    let _ = writeln!(
        out,
        "Status: {}",
        if article.is_read() { "Read" } else { "Unread" }
    );

    let body = article.body_text();
    out.push_str("\n---\n\n");
    if body.is_empty() {
        out.push_str("No content available for this article.");
    } else {
        out.push_str(&body);
    }
    out
}

/// Total unread across feeds plus the busiest feeds.
///
/// Only `feed/` streams count; folder and state totals would double count.
pub fn format_stats(counts: &[UnreadCount]) -> String {
    let mut feeds: Vec<&UnreadCount> = counts
        .iter()
        .filter(|c| c.count > 0 && c.id.starts_with("feed/"))
        .collect();
    let total: u64 = feeds.iter().map(|c| c.count).sum();

    let mut out = String::from("**Inoreader Statistics:**\n\n");
    let _ = writeln!(out, "Total unread articles: {}\n", total);

    if !feeds.is_empty() {
        feeds.sort_by(|a, b| b.count.cmp(&a.count));
        out.push_str("Top feeds with unread articles:\n");
        for feed in feeds.into_iter().take(TOP_FEEDS) {
            let _ = writeln!(out, "- {}: {} unread", feed_display_name(&feed.id), feed.count);
        }
    }
    out
}

/// Folders and tags with their stream IDs.
pub fn format_tag_list(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return "No tags/folders found in your Inoreader account.".to_string();
    }
    let mut out = format!("Found {} tags/folders:\n\n", tags.len());
    for tag in tags {
        let _ = writeln!(out, "- {} (ID: {})", label_name(&tag.id), tag.id);
    }
    out
}

/// `feed/https://example.com/rss` becomes `example.com/rss`.
fn feed_display_name(stream_id: &str) -> &str {
    let name = stream_id.strip_prefix("feed/").unwrap_or(stream_id);
    name.rsplit_once("://").map(|(_, rest)| rest).unwrap_or(name)
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article(value: serde_json::Value) -> Article {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_days_to_timestamp() {
        assert!(days_to_timestamp(0).is_none());
        let ts = days_to_timestamp(7).unwrap();
        let expected = Utc::now().timestamp() - 7 * 86_400;
        assert!((ts - expected).abs() <= 2);
    }

    #[test]
    fn test_feed_list_sorted_case_insensitive() {
        let feeds: Vec<Subscription> = serde_json::from_value(json!([
            {"id": "feed/b", "title": "beta"},
            {"id": "feed/a", "title": "Alpha", "categories": [{"id": "user/-/label/News", "label": "News"}]},
        ]))
        .unwrap();

        let out = format_feed_list(&feeds);
        assert!(out.starts_with("Found 2 feeds:"));
        let alpha = out.find("**Alpha**").unwrap();
        let beta = out.find("**beta**").unwrap();
        assert!(alpha < beta);
        assert!(out.contains("Folders: News"));
    }

    #[test]
    fn test_empty_feed_list() {
        assert_eq!(
            format_feed_list(&[]),
            "No feeds found in your Inoreader account."
        );
    }

    #[test]
    fn test_article_list_truncates_summary() {
        let long = "word ".repeat(100);
        let items = vec![article(json!({
            "id": "item-1",
            "title": "Hello",
            "summary": {"content": long}
        }))];
        let out = format_article_list(&items);
        assert!(out.starts_with("1. **Hello**"));
        assert!(out.contains("ID: item-1"));
        assert!(out.contains("..."));
        assert!(out.contains("Unread"));
    }

    #[test]
    fn test_article_detail_without_body() {
        let out = format_article_detail(&article(json!({"id": "x", "title": "T"})));
        assert!(out.starts_with("**T**\n"));
        assert!(out.contains("🔗 **Link**: No URL available"));
        assert!(out.ends_with("No content available for this article."));
    }

    #[test]
    fn test_stats_counts_only_feeds_and_ranks() {
        let counts: Vec<UnreadCount> = serde_json::from_value(json!([
            {"id": "user/-/state/com.google/reading-list", "count": 99},
            {"id": "user/-/label/Tech", "count": 40},
            {"id": "feed/https://small.example/rss", "count": 3},
            {"id": "feed/https://big.example/rss", "count": 30},
            {"id": "feed/http://zero.example", "count": 0}
        ]))
        .unwrap();

        let out = format_stats(&counts);
        assert!(out.contains("Total unread articles: 33"));
        let big = out.find("- big.example/rss: 30 unread").unwrap();
        let small = out.find("- small.example/rss: 3 unread").unwrap();
        assert!(big < small);
        assert!(!out.contains("zero.example"));
    }

    #[test]
    fn test_stats_top_ten_only() {
        let counts: Vec<UnreadCount> = (1..=12)
            .map(|i| UnreadCount {
                id: format!("feed/https://f{i}.example"),
                count: i,
            })
            .collect();
        let out = format_stats(&counts);
        assert_eq!(out.matches(" unread\n").count(), 10);
        assert!(!out.contains("f1.example:"));
    }

    #[test]
    fn test_tag_list_strips_label_prefix() {
        let tags: Vec<Tag> = serde_json::from_value(json!([
            {"id": "user/1005/label/Tech", "type": "folder"},
            {"id": "user/1005/state/com.google/starred"}
        ]))
        .unwrap();
        let out = format_tag_list(&tags);
        assert!(out.contains("- Tech (ID: user/1005/label/Tech)"));
        assert!(out.contains("(ID: user/1005/state/com.google/starred)"));
    }
}
