//! Subscription tools

use crate::api::{Acknowledgement, SubscriptionEdit};
use crate::error::Result;
use crate::tools::format::format_feed_list;
use crate::tools::{failure, parse_args, ToolContext, ToolExecutor, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// Lists every subscribed feed.
pub struct ListFeedsTool {
    ctx: ToolContext,
}

impl ListFeedsTool {
    /// Creates the tool.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn run(&self) -> Result<ToolResult> {
        let mut client = self.ctx.client()?;
        let list = client.subscription_list().await?;
        Ok(ToolResult::success(format_feed_list(&list.subscriptions)))
    }
}

#[async_trait]
impl ToolExecutor for ListFeedsTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": "inoreader_list_feeds",
            "description": "List all subscribed feeds in Inoreader",
            "inputSchema": {"type": "object", "properties": {}, "required": []}
        })
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult> {
        Ok(self.run().await.unwrap_or_else(|e| failure("list feeds", e)))
    }
}

#[derive(Debug, Deserialize)]
struct AddFeedParams {
    feed_url: String,
}

/// Subscribes to a feed by URL.
pub struct AddFeedTool {
    ctx: ToolContext,
}

impl AddFeedTool {
    /// Creates the tool.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, args: Value) -> Result<ToolResult> {
        let params: AddFeedParams = parse_args(args)?;
        let mut client = self.ctx.client()?;
        let result = client.quick_add(&params.feed_url).await?;

        if result.num_results > 0 {
            let name = if result.stream_name.is_empty() {
                "Unknown"
            } else {
                result.stream_name.as_str()
            };
            Ok(ToolResult::success(format!(
                "✓ Successfully subscribed to: {}\nStream ID: {}",
                name, result.stream_id
            )))
        } else {
            Ok(ToolResult::error(format!(
                "Failed to subscribe to feed: {}",
                params.feed_url
            )))
        }
    }
}

#[async_trait]
impl ToolExecutor for AddFeedTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": "inoreader_add_feed",
            "description": "Subscribe to new feed",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "feed_url": {
                        "type": "string",
                        "description": "URL of the feed to subscribe to"
                    }
                },
                "required": ["feed_url"]
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        Ok(self.run(args).await.unwrap_or_else(|e| failure("add feed", e)))
    }
}

#[derive(Debug, Deserialize)]
struct EditFeedParams {
    stream_id: String,
    #[serde(default)]
    new_title: Option<String>,
    #[serde(default)]
    add_to_folder: Option<String>,
    #[serde(default)]
    remove_from_folder: Option<String>,
}

/// Renames a feed or moves it between folders.
pub struct EditFeedTool {
    ctx: ToolContext,
}

impl EditFeedTool {
    /// Creates the tool.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, args: Value) -> Result<ToolResult> {
        let params: EditFeedParams = parse_args(args)?;
        let edit = SubscriptionEdit {
            title: non_empty(params.new_title),
            add_to_folder: non_empty(params.add_to_folder),
            remove_from_folder: non_empty(params.remove_from_folder),
        };

        let mut changes = Vec::new();
        if let Some(title) = &edit.title {
            changes.push(format!("renamed to '{title}'"));
        }
        if let Some(folder) = &edit.add_to_folder {
            changes.push(format!("added to folder '{folder}'"));
        }
        if let Some(folder) = &edit.remove_from_folder {
            changes.push(format!("removed from folder '{folder}'"));
        }
        if changes.is_empty() {
            return Ok(ToolResult::error(
                "No changes requested: set new_title, add_to_folder or remove_from_folder",
            ));
        }

        let mut client = self.ctx.client()?;
        Ok(match client.edit_subscription(&params.stream_id, &edit).await? {
            Acknowledgement::Accepted => {
                ToolResult::success(format!("✓ Feed {}", changes.join(", ")))
            }
            Acknowledgement::Rejected(raw) => {
                ToolResult::error(format!("Failed to edit feed: {raw}"))
            }
        })
    }
}

#[async_trait]
impl ToolExecutor for EditFeedTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": "inoreader_edit_feed",
            "description": "Edit feed",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "stream_id": {
                        "type": "string",
                        "description": "Stream ID of the feed to edit"
                    },
                    "new_title": {
                        "type": "string",
                        "description": "New title for the feed"
                    },
                    "add_to_folder": {
                        "type": "string",
                        "description": "Folder to add feed to"
                    },
                    "remove_from_folder": {
                        "type": "string",
                        "description": "Folder to remove feed from"
                    }
                },
                "required": ["stream_id"]
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        Ok(self.run(args).await.unwrap_or_else(|e| failure("edit feed", e)))
    }
}

#[derive(Debug, Deserialize)]
struct StreamParams {
    stream_id: String,
}

/// Removes a subscription.
pub struct UnsubscribeFeedTool {
    ctx: ToolContext,
}

impl UnsubscribeFeedTool {
    /// Creates the tool.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, args: Value) -> Result<ToolResult> {
        let params: StreamParams = parse_args(args)?;
        let mut client = self.ctx.client()?;
        Ok(match client.unsubscribe(&params.stream_id).await? {
            Acknowledgement::Accepted => ToolResult::success(format!(
                "✓ Successfully unsubscribed from feed: {}",
                params.stream_id
            )),
            Acknowledgement::Rejected(raw) => {
                ToolResult::error(format!("Failed to unsubscribe: {raw}"))
            }
        })
    }
}

#[async_trait]
impl ToolExecutor for UnsubscribeFeedTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": "inoreader_unsubscribe_feed",
            "description": "Unsubscribe from feed",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "stream_id": {
                        "type": "string",
                        "description": "Stream ID of the feed to unsubscribe from"
                    }
                },
                "required": ["stream_id"]
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        Ok(self.run(args).await.unwrap_or_else(|e| failure("unsubscribe", e)))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
