//! Tool registry assembly
//!
//! Registers the full Inoreader catalog in the order `tools/list` reports it.

use std::sync::Arc;

use crate::api::ResponseCache;
use crate::config::Config;
use crate::tools::articles::{
    GetContentTool, ListArticlesTool, MarkAllAsReadTool, MarkAsReadTool, SearchTool, StatsTool,
};
use crate::tools::feeds::{AddFeedTool, EditFeedTool, ListFeedsTool, UnsubscribeFeedTool};
use crate::tools::tags::{
    ArticleState, ArticleStateTool, DeleteTagTool, ListTagsTool, RenameTagTool, TagArticlesTool,
};
use crate::tools::{ToolContext, ToolExecutor, ToolRegistry};

/// Builds the registry of every Inoreader tool.
///
/// # Examples
///
/// ```
/// use inoreader_mcp::api::ResponseCache;
/// use inoreader_mcp::config::Config;
/// use inoreader_mcp::tools::build_registry;
/// use std::sync::Arc;
///
/// let registry = build_registry(Arc::new(Config::default()), Arc::new(ResponseCache::new()));
/// assert_eq!(registry.len(), 19);
/// ```
pub fn build_registry(config: Arc<Config>, cache: Arc<ResponseCache>) -> ToolRegistry {
    let ctx = ToolContext::new(config, cache);

    let executors: Vec<Arc<dyn ToolExecutor>> = vec![
        Arc::new(ListFeedsTool::new(ctx.clone())),
        Arc::new(ListArticlesTool::new(ctx.clone())),
        Arc::new(SearchTool::new(ctx.clone())),
        Arc::new(GetContentTool::new(ctx.clone())),
        Arc::new(MarkAsReadTool::new(ctx.clone())),
        Arc::new(StatsTool::new(ctx.clone())),
        Arc::new(AddFeedTool::new(ctx.clone())),
        Arc::new(EditFeedTool::new(ctx.clone())),
        Arc::new(UnsubscribeFeedTool::new(ctx.clone())),
        Arc::new(ListTagsTool::new(ctx.clone())),
        Arc::new(RenameTagTool::new(ctx.clone())),
        Arc::new(DeleteTagTool::new(ctx.clone())),
        Arc::new(MarkAllAsReadTool::new(ctx.clone())),
        Arc::new(ArticleStateTool::new(ctx.clone(), ArticleState::Star)),
        Arc::new(ArticleStateTool::new(ctx.clone(), ArticleState::Unstar)),
        Arc::new(ArticleStateTool::new(ctx.clone(), ArticleState::Broadcast)),
        Arc::new(ArticleStateTool::new(ctx.clone(), ArticleState::Like)),
        Arc::new(TagArticlesTool::tag(ctx.clone())),
        Arc::new(TagArticlesTool::untag(ctx)),
    ];

    let mut registry = ToolRegistry::new();
    for executor in executors {
        let name = executor.tool_definition()["name"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        registry.register(name, executor);
    }

    tracing::debug!(tools = registry.len(), "Tool registry built");
    registry
}
