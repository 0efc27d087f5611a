//! Article tools: listing, search, content, read state, statistics

use crate::api::Acknowledgement;
use crate::error::Result;
use crate::tools::format::{
    days_to_timestamp, format_article_detail, format_article_list, format_stats,
};
use crate::tools::{failure, parse_args, ToolContext, ToolExecutor, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

fn default_list_limit() -> usize {
    20
}

fn default_search_limit() -> usize {
    50
}

fn default_days() -> u32 {
    7
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// inoreader_list_articles
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListArticlesParams {
    #[serde(default = "default_list_limit")]
    limit: usize,
    #[serde(default = "default_days")]
    days: u32,
    #[serde(default)]
    feed_id: Option<String>,
    #[serde(default = "default_true")]
    unread_only: bool,
}

/// Lists recent articles, optionally from one feed or folder.
pub struct ListArticlesTool {
    ctx: ToolContext,
}

impl ListArticlesTool {
    /// Creates the tool.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, args: Value) -> Result<ToolResult> {
        let params: ListArticlesParams = parse_args(args)?;
        let limit = self.ctx.clamp_limit(params.limit);
        let feed_id = params.feed_id.as_deref().filter(|f| !f.trim().is_empty());
        tracing::info!(
            feed_id = feed_id.unwrap_or("reading-list"),
            limit,
            unread_only = params.unread_only,
            days = params.days,
            "Listing articles"
        );

        let mut client = self.ctx.client()?;
        let contents = client
            .stream_contents(
                feed_id,
                limit,
                params.unread_only,
                days_to_timestamp(params.days),
            )
            .await?;

        if contents.items.is_empty() {
            let mut filters = Vec::new();
            if params.unread_only {
                filters.push("unread".to_string());
            }
            if params.days > 0 {
                filters.push(format!("from the last {} days", params.days));
            }
            if let Some(feed) = feed_id {
                filters.push(format!("in feed {feed}"));
            }
            let suffix = if filters.is_empty() {
                String::new()
            } else {
                format!(" {}", filters.join(" "))
            };
            return Ok(ToolResult::success(format!("No articles found{suffix}.")));
        }

        let mut header = format!("Found {} articles", contents.items.len());
        if params.unread_only {
            header.push_str(" (unread only)");
        }
        if params.days > 0 {
            header.push_str(&format!(" from the last {} days", params.days));
        }
        header.push_str(":\n\n");

        Ok(ToolResult::success(
            header + &format_article_list(&contents.items),
        ))
    }
}

#[async_trait]
impl ToolExecutor for ListArticlesTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": "inoreader_list_articles",
            "description": "List recent articles with optional filters",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "description": "Number of articles to return (default: 20)"
                    },
                    "days": {
                        "type": "integer",
                        "description": "Articles from last N days (default: 7, 0 for no limit)"
                    },
                    "feed_id": {
                        "type": "string",
                        "description": "Optional feed ID or folder name to filter articles"
                    },
                    "unread_only": {
                        "type": "boolean",
                        "description": "Only show unread articles (default: true)"
                    }
                },
                "required": []
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        Ok(self.run(args).await.unwrap_or_else(|e| failure("list articles", e)))
    }
}

// ---------------------------------------------------------------------------
// inoreader_search
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default = "default_days")]
    days: u32,
    #[serde(default = "default_search_limit")]
    limit: usize,
}

/// Keyword search over recent articles.
pub struct SearchTool {
    ctx: ToolContext,
}

impl SearchTool {
    /// Creates the tool.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, args: Value) -> Result<ToolResult> {
        let params: SearchParams = parse_args(args)?;
        let limit = self.ctx.clamp_limit(params.limit);
        let mut client = self.ctx.client()?;
        let articles = client
            .search(&params.query, limit, days_to_timestamp(params.days))
            .await?;

        if articles.is_empty() {
            return Ok(ToolResult::success(format!(
                "No articles found matching '{}'",
                params.query
            )));
        }

        let mut header = format!(
            "Found {} articles matching '{}'",
            articles.len(),
            params.query
        );
        if params.days > 0 {
            header.push_str(&format!(" from the last {} days", params.days));
        }
        header.push_str(":\n\n");

        Ok(ToolResult::success(header + &format_article_list(&articles)))
    }
}

#[async_trait]
impl ToolExecutor for SearchTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": "inoreader_search",
            "description": "Search for articles by keyword",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search query"},
                    "days": {
                        "type": "integer",
                        "description": "Search within the last N days (default: 7)"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Number of articles to return (default: 50)"
                    }
                },
                "required": ["query"]
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        Ok(self.run(args).await.unwrap_or_else(|e| failure("search articles", e)))
    }
}

// ---------------------------------------------------------------------------
// inoreader_get_content
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GetContentParams {
    article_id: String,
}

/// Full content of a single article.
pub struct GetContentTool {
    ctx: ToolContext,
}

impl GetContentTool {
    /// Creates the tool.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, args: Value) -> Result<ToolResult> {
        let params: GetContentParams = parse_args(args)?;
        let mut client = self.ctx.client()?;
        let items = client
            .stream_item_contents(std::slice::from_ref(&params.article_id))
            .await?;

        match items.first() {
            Some(article) => Ok(ToolResult::success(format_article_detail(article))),
            None => Ok(ToolResult::error(format!(
                "Article with ID {} not found.",
                params.article_id
            ))),
        }
    }
}

#[async_trait]
impl ToolExecutor for GetContentTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": "inoreader_get_content",
            "description": "Get full content of a specific article",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "article_id": {
                        "type": "string",
                        "description": "Article ID to get content for"
                    }
                },
                "required": ["article_id"]
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        Ok(self.run(args).await.unwrap_or_else(|e| failure("get article content", e)))
    }
}

// ---------------------------------------------------------------------------
// inoreader_mark_as_read
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ArticleIdsParams {
    article_ids: Vec<String>,
}

/// Marks articles read in chunks.
pub struct MarkAsReadTool {
    ctx: ToolContext,
}

impl MarkAsReadTool {
    /// Creates the tool.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, args: Value) -> Result<ToolResult> {
        let params: ArticleIdsParams = parse_args(args)?;
        if params.article_ids.is_empty() {
            return Ok(ToolResult::error("No article IDs provided."));
        }

        let mut client = self.ctx.client()?;
        let outcome = client.mark_as_read(&params.article_ids).await?;

        if outcome.is_complete() {
            Ok(ToolResult::success(format!(
                "Successfully marked {} article(s) as read.",
                outcome.marked
            )))
        } else if outcome.marked > 0 {
            Ok(ToolResult::success(format!(
                "Marked {} out of {} articles as read.",
                outcome.marked, outcome.requested
            )))
        } else {
            Ok(ToolResult::error("Failed to mark articles as read."))
        }
    }
}

#[async_trait]
impl ToolExecutor for MarkAsReadTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": "inoreader_mark_as_read",
            "description": "Mark articles as read",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "article_ids": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of article IDs to mark as read"
                    }
                },
                "required": ["article_ids"]
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        Ok(self.run(args).await.unwrap_or_else(|e| failure("mark articles as read", e)))
    }
}

// ---------------------------------------------------------------------------
// inoreader_mark_all_as_read
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MarkAllAsReadParams {
    stream_id: String,
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Marks a whole stream read.
pub struct MarkAllAsReadTool {
    ctx: ToolContext,
}

impl MarkAllAsReadTool {
    /// Creates the tool.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, args: Value) -> Result<ToolResult> {
        let params: MarkAllAsReadParams = parse_args(args)?;
        let mut client = self.ctx.client()?;
        let ack = client
            .mark_all_as_read(&params.stream_id, params.timestamp)
            .await?;

        Ok(match ack {
            Acknowledgement::Accepted => ToolResult::success(format!(
                "✓ Successfully marked all articles as read in: {}",
                params.stream_id
            )),
            Acknowledgement::Rejected(raw) => {
                ToolResult::error(format!("Failed to mark all as read: {raw}"))
            }
        })
    }
}

#[async_trait]
impl ToolExecutor for MarkAllAsReadTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": "inoreader_mark_all_as_read",
            "description": "Mark all articles in a stream/folder as read",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "stream_id": {
                        "type": "string",
                        "description": "Stream ID to mark all as read"
                    },
                    "timestamp": {
                        "type": "integer",
                        "description": "Optional Unix timestamp - mark as read up to this time"
                    }
                },
                "required": ["stream_id"]
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        Ok(self.run(args).await.unwrap_or_else(|e| failure("mark all as read", e)))
    }
}

// ---------------------------------------------------------------------------
// inoreader_stats
// ---------------------------------------------------------------------------

/// Unread statistics across feeds.
pub struct StatsTool {
    ctx: ToolContext,
}

impl StatsTool {
    /// Creates the tool.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn run(&self) -> Result<ToolResult> {
        let mut client = self.ctx.client()?;
        let counts = client.unread_count().await?;
        Ok(ToolResult::success(format_stats(&counts.unreadcounts)))
    }
}

#[async_trait]
impl ToolExecutor for StatsTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": "inoreader_stats",
            "description": "Get statistics about unread articles",
            "inputSchema": {"type": "object", "properties": {}, "required": []}
        })
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult> {
        Ok(self
            .run()
            .await
            .unwrap_or_else(|e| failure("get statistics", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_defaults() {
        let params: ListArticlesParams = parse_args(json!({})).unwrap();
        assert_eq!(params.limit, 20);
        assert_eq!(params.days, 7);
        assert!(params.unread_only);
        assert!(params.feed_id.is_none());
    }

    #[test]
    fn test_search_params_require_query() {
        assert!(parse_args::<SearchParams>(json!({"limit": 5})).is_err());
        let params: SearchParams = parse_args(json!({"query": "rust"})).unwrap();
        assert_eq!(params.limit, 50);
        assert_eq!(params.days, 7);
    }

    #[test]
    fn test_article_ids_must_be_array() {
        assert!(parse_args::<ArticleIdsParams>(json!({"article_ids": "one"})).is_err());
    }
}
