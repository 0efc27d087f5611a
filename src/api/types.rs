//! Inoreader API wire models and stream identifiers
//!
//! Only the fields the tools render are modelled. Every optional field
//! carries `#[serde(default)]` because the API omits keys freely.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Every article the user is subscribed to.
pub const READING_LIST: &str = "user/-/state/com.google/reading-list";
/// Read-state tag.
pub const READ_STATE: &str = "user/-/state/com.google/read";
/// Starred-state tag.
pub const STARRED_STATE: &str = "user/-/state/com.google/starred";
/// Broadcast (shared) tag.
pub const BROADCAST_STATE: &str = "user/-/state/com.google/broadcast";
/// Liked-state tag.
pub const LIKE_STATE: &str = "user/-/state/com.google/like";
/// Prefix of user folder and tag stream IDs.
pub const LABEL_PREFIX: &str = "user/-/label/";

/// Expands a bare folder or tag name to its stream ID.
///
/// Values that already look like stream IDs are returned unchanged.
///
/// # Examples
///
/// ```
/// use inoreader_mcp::api::types::label_stream_id;
///
/// assert_eq!(label_stream_id("Tech"), "user/-/label/Tech");
/// assert_eq!(label_stream_id("user/-/label/Tech"), "user/-/label/Tech");
/// ```
pub fn label_stream_id(name: &str) -> String {
    if name.starts_with("user/") || name.starts_with("feed/") {
        name.to_string()
    } else {
        format!("{LABEL_PREFIX}{name}")
    }
}

/// Display name of a label stream ID (`user/-/label/Tech` becomes `Tech`).
pub fn label_name(stream_id: &str) -> &str {
    stream_id
        .rsplit_once(LABEL_PREFIX)
        .map(|(_, name)| name)
        .unwrap_or(stream_id)
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// `subscription/list` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionList {
    /// Subscribed feeds.
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

/// One subscribed feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Stream ID, `feed/<url>`.
    pub id: String,
    /// Feed title.
    #[serde(default)]
    pub title: String,
    /// Folders the feed belongs to.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Feed URL.
    #[serde(default)]
    pub url: String,
    /// Website URL.
    #[serde(default)]
    pub html_url: String,
}

/// Folder membership of a subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    /// Folder stream ID.
    pub id: String,
    /// Folder name.
    #[serde(default)]
    pub label: String,
}

/// `subscription/quickadd` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAddResult {
    /// Query that was submitted.
    #[serde(default)]
    pub query: String,
    /// Number of feeds subscribed, `0` on failure.
    #[serde(default)]
    pub num_results: u32,
    /// Stream ID of the new subscription.
    #[serde(default)]
    pub stream_id: String,
    /// Title of the new subscription.
    #[serde(default)]
    pub stream_name: String,
}

// ---------------------------------------------------------------------------
// Tags and counts
// ---------------------------------------------------------------------------

/// `tag/list` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagList {
    /// Folders, tags, and system states.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// One folder or tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tag {
    /// Stream ID.
    pub id: String,
    /// Node type (`folder`, `tag`, `active_search`), when reported.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// `unread-count` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnreadCounts {
    /// Per-stream counts.
    #[serde(default)]
    pub unreadcounts: Vec<UnreadCount>,
}

/// Unread count of one stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnreadCount {
    /// Stream ID.
    pub id: String,
    /// Unread articles.
    #[serde(default)]
    pub count: u64,
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

/// `stream/contents` and `stream/items/contents` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamContents {
    /// Articles, newest first.
    #[serde(default)]
    pub items: Vec<Article>,
    /// Opaque token for the next page.
    #[serde(default)]
    pub continuation: Option<String>,
}

/// One article.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Article {
    /// Item ID (`tag:google.com,2005:reader/item/...`).
    pub id: String,
    /// Headline.
    #[serde(default)]
    pub title: String,
    /// Author, when known.
    #[serde(default)]
    pub author: String,
    /// Publication time, UNIX seconds.
    #[serde(default)]
    pub published: i64,
    /// Tags and states applied to the article.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Preferred link.
    #[serde(default)]
    pub canonical: Vec<Link>,
    /// Alternate links.
    #[serde(default)]
    pub alternate: Vec<Link>,
    /// Short body.
    #[serde(default)]
    pub summary: Option<TextBody>,
    /// Full body, when the feed supplies one.
    #[serde(default)]
    pub content: Option<TextBody>,
    /// Feed the article came from.
    #[serde(default)]
    pub origin: Option<Origin>,
}

/// A hyperlink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Link {
    /// Target URL.
    #[serde(default)]
    pub href: String,
}

/// HTML body wrapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBody {
    /// HTML content.
    #[serde(default)]
    pub content: String,
}

/// Source feed of an article.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    /// Feed stream ID.
    #[serde(default)]
    pub stream_id: String,
    /// Feed title.
    #[serde(default)]
    pub title: String,
}

impl Article {
    /// Title, or a placeholder when the feed sent none.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    /// Author, or `Unknown`.
    pub fn display_author(&self) -> &str {
        if self.author.trim().is_empty() {
            "Unknown"
        } else {
            &self.author
        }
    }

    /// Title of the source feed, or `Unknown feed`.
    pub fn feed_title(&self) -> &str {
        self.origin
            .as_ref()
            .map(|o| o.title.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or("Unknown feed")
    }

    /// Canonical link, falling back to the first alternate link.
    pub fn url(&self) -> Option<&str> {
        self.canonical
            .iter()
            .chain(self.alternate.iter())
            .map(|l| l.href.as_str())
            .find(|href| !href.is_empty())
    }

    /// Whether the read state is applied.
    pub fn is_read(&self) -> bool {
        self.categories.iter().any(|c| c.ends_with("/state/com.google/read"))
    }

    /// Whether the starred state is applied.
    pub fn is_starred(&self) -> bool {
        self.categories
            .iter()
            .any(|c| c.ends_with("/state/com.google/starred"))
    }

    /// Publication time as `YYYY-MM-DD HH:MM UTC`, or `Unknown date`.
    pub fn published_date(&self) -> String {
        DateTime::<Utc>::from_timestamp(self.published, 0)
            .filter(|_| self.published > 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "Unknown date".to_string())
    }

    /// Summary with markup removed.
    pub fn summary_text(&self) -> String {
        self.summary
            .as_ref()
            .map(|s| strip_html(&s.content))
            .unwrap_or_default()
    }

    /// Best available body: full content, else summary, markup removed.
    pub fn body_text(&self) -> String {
        match &self.content {
            Some(body) if !body.content.trim().is_empty() => strip_html(&body.content),
            _ => self.summary_text(),
        }
    }
}

/// Removes tags and collapses whitespace.
pub fn strip_html(html: &str) -> String {
    static TAG_RE: OnceLock<Option<Regex>> = OnceLock::new();
    let text = match TAG_RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").ok()) {
        Some(re) => re.replace_all(html, " ").into_owned(),
        None => html.to_string(),
    };
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_article() -> Article {
        serde_json::from_value(json!({
            "id": "tag:google.com,2005:reader/item/0000000123",
            "title": "Rust 2.0 announced",
            "author": "Ferris",
            "published": 1_700_000_000,
            "categories": [
                "user/1005/state/com.google/reading-list",
                "user/1005/state/com.google/read",
                "user/1005/label/Tech"
            ],
            "canonical": [{"href": "https://blog.rust-lang.org/2.0"}],
            "alternate": [{"href": "https://alt.example/2.0", "type": "text/html"}],
            "summary": {"direction": "ltr", "content": "<p>Big&nbsp;news <b>today</b></p>"},
            "origin": {"streamId": "feed/https://blog.rust-lang.org/feed.xml", "title": "Rust Blog"}
        }))
        .unwrap()
    }

    #[test]
    fn test_article_accessors() {
        let article = sample_article();
        assert_eq!(article.display_title(), "Rust 2.0 announced");
        assert_eq!(article.feed_title(), "Rust Blog");
        assert_eq!(article.url(), Some("https://blog.rust-lang.org/2.0"));
        assert!(article.is_read());
        assert!(!article.is_starred());
        assert_eq!(article.published_date(), "2023-11-14 22:13 UTC");
        assert_eq!(article.summary_text(), "Big news today");
        assert_eq!(article.body_text(), "Big news today");
    }

    #[test]
    fn test_sparse_article_decodes_with_placeholders() {
        let article: Article = serde_json::from_value(json!({"id": "x"})).unwrap();
        assert_eq!(article.display_title(), "Untitled");
        assert_eq!(article.display_author(), "Unknown");
        assert_eq!(article.feed_title(), "Unknown feed");
        assert!(article.url().is_none());
        assert!(!article.is_read());
        assert_eq!(article.published_date(), "Unknown date");
    }

    #[test]
    fn test_url_falls_back_to_alternate() {
        let article: Article = serde_json::from_value(json!({
            "id": "x",
            "alternate": [{"href": "https://alt.example/a"}]
        }))
        .unwrap();
        assert_eq!(article.url(), Some("https://alt.example/a"));
    }

    #[test]
    fn test_body_prefers_full_content() {
        let article: Article = serde_json::from_value(json!({
            "id": "x",
            "summary": {"content": "short"},
            "content": {"content": "<div>long form</div>"}
        }))
        .unwrap();
        assert_eq!(article.body_text(), "long form");
    }

    #[test]
    fn test_label_helpers() {
        assert_eq!(label_stream_id("News"), "user/-/label/News");
        assert_eq!(label_stream_id("feed/http://x"), "feed/http://x");
        assert_eq!(label_name("user/1005/label/News"), "News");
        assert_eq!(label_name("user/-/state/com.google/starred"), "user/-/state/com.google/starred");
    }

    #[test]
    fn test_subscription_list_decodes_camel_case() {
        let list: SubscriptionList = serde_json::from_value(json!({
            "subscriptions": [{
                "id": "feed/http://example.com/rss",
                "title": "Example",
                "categories": [{"id": "user/1005/label/News", "label": "News"}],
                "url": "http://example.com/rss",
                "htmlUrl": "http://example.com"
            }]
        }))
        .unwrap();
        assert_eq!(list.subscriptions[0].html_url, "http://example.com");
        assert_eq!(list.subscriptions[0].categories[0].label, "News");
    }

    #[test]
    fn test_strip_html_entities_and_whitespace() {
        assert_eq!(strip_html("a &amp; b\n\n<br/>c"), "a & b c");
    }
}
