//! Folder, tag, and per-article state tools

use crate::api::{Acknowledgement, InoreaderClient};
use crate::error::Result;
use crate::tools::format::format_tag_list;
use crate::tools::{failure, parse_args, ToolContext, ToolExecutor, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// Lists folders and tags.
pub struct ListTagsTool {
    ctx: ToolContext,
}

impl ListTagsTool {
    /// Creates the tool.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn run(&self) -> Result<ToolResult> {
        let mut client = self.ctx.client()?;
        let list = client.tag_list().await?;
        Ok(ToolResult::success(format_tag_list(&list.tags)))
    }
}

#[async_trait]
impl ToolExecutor for ListTagsTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": "inoreader_list_tags",
            "description": "List all folders/tags",
            "inputSchema": {"type": "object", "properties": {}, "required": []}
        })
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult> {
        Ok(self.run().await.unwrap_or_else(|e| failure("list tags", e)))
    }
}

#[derive(Debug, Deserialize)]
struct RenameTagParams {
    source: String,
    destination: String,
}

/// Renames a folder or tag.
pub struct RenameTagTool {
    ctx: ToolContext,
}

impl RenameTagTool {
    /// Creates the tool.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, args: Value) -> Result<ToolResult> {
        let params: RenameTagParams = parse_args(args)?;
        let mut client = self.ctx.client()?;
        Ok(
            match client.rename_tag(&params.source, &params.destination).await? {
                Acknowledgement::Accepted => ToolResult::success(format!(
                    "✓ Successfully renamed tag '{}' to '{}'",
                    params.source, params.destination
                )),
                Acknowledgement::Rejected(raw) => {
                    ToolResult::error(format!("Failed to rename tag: {raw}"))
                }
            },
        )
    }
}

#[async_trait]
impl ToolExecutor for RenameTagTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": "inoreader_rename_tag",
            "description": "Rename a tag/folder",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "source": {"type": "string", "description": "Current tag name"},
                    "destination": {"type": "string", "description": "New tag name"}
                },
                "required": ["source", "destination"]
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        Ok(self.run(args).await.unwrap_or_else(|e| failure("rename tag", e)))
    }
}

#[derive(Debug, Deserialize)]
struct DeleteTagParams {
    tag_name: String,
}

/// Deletes a folder or tag.
pub struct DeleteTagTool {
    ctx: ToolContext,
}

impl DeleteTagTool {
    /// Creates the tool.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, args: Value) -> Result<ToolResult> {
        let params: DeleteTagParams = parse_args(args)?;
        let mut client = self.ctx.client()?;
        Ok(match client.delete_tag(&params.tag_name).await? {
            Acknowledgement::Accepted => ToolResult::success(format!(
                "✓ Successfully deleted tag: {}",
                params.tag_name
            )),
            Acknowledgement::Rejected(raw) => {
                ToolResult::error(format!("Failed to delete tag: {raw}"))
            }
        })
    }
}

#[async_trait]
impl ToolExecutor for DeleteTagTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": "inoreader_delete_tag",
            "description": "Delete a tag/folder",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "tag_name": {"type": "string", "description": "Name of the tag to delete"}
                },
                "required": ["tag_name"]
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        Ok(self.run(args).await.unwrap_or_else(|e| failure("delete tag", e)))
    }
}

// ---------------------------------------------------------------------------
// Per-article states
// ---------------------------------------------------------------------------

/// A system state applied to or removed from articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleState {
    /// Apply the starred state.
    Star,
    /// Remove the starred state.
    Unstar,
    /// Apply the broadcast state.
    Broadcast,
    /// Apply the liked state.
    Like,
}

impl ArticleState {
    fn tool_name(self) -> &'static str {
        match self {
            Self::Star => "inoreader_star_article",
            Self::Unstar => "inoreader_unstar_article",
            Self::Broadcast => "inoreader_broadcast_article",
            Self::Like => "inoreader_like_article",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Star => "Star articles",
            Self::Unstar => "Unstar articles",
            Self::Broadcast => "Broadcast articles (share publicly)",
            Self::Like => "Like articles",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Star => "star",
            Self::Unstar => "unstar",
            Self::Broadcast => "broadcast",
            Self::Like => "like",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Self::Star => "starred",
            Self::Unstar => "unstarred",
            Self::Broadcast => "broadcast",
            Self::Like => "liked",
        }
    }

    async fn apply(self, client: &mut InoreaderClient, ids: &[String]) -> Result<Acknowledgement> {
        match self {
            Self::Star => client.star(ids).await,
            Self::Unstar => client.unstar(ids).await,
            Self::Broadcast => client.broadcast(ids).await,
            Self::Like => client.like(ids).await,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArticleIdsParams {
    article_ids: Vec<String>,
}

/// Applies one [`ArticleState`] to a set of articles.
pub struct ArticleStateTool {
    ctx: ToolContext,
    state: ArticleState,
}

impl ArticleStateTool {
    /// Creates the tool for `state`.
    pub fn new(ctx: ToolContext, state: ArticleState) -> Self {
        Self { ctx, state }
    }

    async fn run(&self, args: Value) -> Result<ToolResult> {
        let params: ArticleIdsParams = parse_args(args)?;
        if params.article_ids.is_empty() {
            return Ok(ToolResult::error("No article IDs provided."));
        }

        let mut client = self.ctx.client()?;
        Ok(match self.state.apply(&mut client, &params.article_ids).await? {
            Acknowledgement::Accepted => ToolResult::success(format!(
                "✓ Successfully {} {} article(s)",
                self.state.past_tense(),
                params.article_ids.len()
            )),
            Acknowledgement::Rejected(raw) => ToolResult::error(format!(
                "Failed to {} articles: {raw}",
                self.state.verb()
            )),
        })
    }
}

#[async_trait]
impl ToolExecutor for ArticleStateTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": self.state.tool_name(),
            "description": self.state.description(),
            "inputSchema": {
                "type": "object",
                "properties": {
                    "article_ids": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": format!("List of article IDs to {}", self.state.verb())
                    }
                },
                "required": ["article_ids"]
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let action = format!("{} articles", self.state.verb());
        Ok(self.run(args).await.unwrap_or_else(|e| failure(&action, e)))
    }
}

#[derive(Debug, Deserialize)]
struct TagArticlesParams {
    article_ids: Vec<String>,
    tag_name: String,
}

/// Adds or removes a user tag on articles.
pub struct TagArticlesTool {
    ctx: ToolContext,
    remove: bool,
}

impl TagArticlesTool {
    /// Tool that adds a tag.
    pub fn tag(ctx: ToolContext) -> Self {
        Self { ctx, remove: false }
    }

    /// Tool that removes a tag.
    pub fn untag(ctx: ToolContext) -> Self {
        Self { ctx, remove: true }
    }

    async fn run(&self, args: Value) -> Result<ToolResult> {
        let params: TagArticlesParams = parse_args(args)?;
        if params.article_ids.is_empty() {
            return Ok(ToolResult::error("No article IDs provided."));
        }

        let mut client = self.ctx.client()?;
        let ack = if self.remove {
            client.untag_articles(&params.article_ids, &params.tag_name).await?
        } else {
            client.tag_articles(&params.article_ids, &params.tag_name).await?
        };

        let count = params.article_ids.len();
        Ok(match (ack, self.remove) {
            (Acknowledgement::Accepted, false) => ToolResult::success(format!(
                "✓ Successfully tagged {count} article(s) with '{}'",
                params.tag_name
            )),
            (Acknowledgement::Accepted, true) => ToolResult::success(format!(
                "✓ Successfully removed tag '{}' from {count} article(s)",
                params.tag_name
            )),
            (Acknowledgement::Rejected(raw), false) => {
                ToolResult::error(format!("Failed to tag articles: {raw}"))
            }
            (Acknowledgement::Rejected(raw), true) => {
                ToolResult::error(format!("Failed to untag articles: {raw}"))
            }
        })
    }
}

#[async_trait]
impl ToolExecutor for TagArticlesTool {
    fn tool_definition(&self) -> Value {
        let (name, description, verb, tag_description) = if self.remove {
            (
                "inoreader_untag_article",
                "Remove custom tag from articles",
                "untag",
                "Tag name to remove",
            )
        } else {
            (
                "inoreader_tag_article",
                "Add custom tag to articles",
                "tag",
                "Tag name to add",
            )
        };
        json!({
            "name": name,
            "description": description,
            "inputSchema": {
                "type": "object",
                "properties": {
                    "article_ids": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": format!("List of article IDs to {verb}")
                    },
                    "tag_name": {
                        "type": "string",
                        "description": tag_description
                    }
                },
                "required": ["article_ids", "tag_name"]
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let action = if self.remove { "untag articles" } else { "tag articles" };
        Ok(self.run(args).await.unwrap_or_else(|e| failure(action, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ResponseCache;
    use crate::config::Config;
    use std::sync::Arc;

    fn ctx() -> ToolContext {
        ToolContext::new(Arc::new(Config::default()), Arc::new(ResponseCache::new()))
    }

    #[test]
    fn test_state_tool_definitions() {
        let tool = ArticleStateTool::new(ctx(), ArticleState::Broadcast);
        let def = tool.tool_definition();
        assert_eq!(def["name"], "inoreader_broadcast_article");
        assert_eq!(def["inputSchema"]["required"], json!(["article_ids"]));
    }

    #[tokio::test]
    async fn test_empty_ids_rejected_before_connecting() {
        let tool = ArticleStateTool::new(ctx(), ArticleState::Star);
        let result = tool.execute(json!({"article_ids": []})).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.to_message(), "Error: No article IDs provided.");
    }

    #[test]
    fn test_untag_definition() {
        let def = TagArticlesTool::untag(ctx()).tool_definition();
        assert_eq!(def["name"], "inoreader_untag_article");
        assert_eq!(def["inputSchema"]["required"], json!(["article_ids", "tag_name"]));
    }

    #[tokio::test]
    async fn test_missing_tag_name_is_error_result() {
        let tool = TagArticlesTool::tag(ctx());
        let result = tool.execute(json!({"article_ids": ["a"]})).await.unwrap();
        assert!(!result.success);
        assert!(result.to_message().contains("invalid arguments"));
    }
}
