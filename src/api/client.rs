//! Authenticated request layer for the Inoreader reader API
//!
//! [`InoreaderClient`] owns the current [`TokenRecord`] for the lifetime of
//! one tool call. Every request first makes sure the token is fresh,
//! refreshing and persisting it when it has expired, then attaches the
//! bearer token and application headers.
//!
//! Responses are classified into [`ApiResponse`] before any caller looks at
//! them, so HTTP failures, undecodable bodies, and plain-text
//! acknowledgements are kept apart.

use crate::api::cache::ResponseCache;
use crate::api::types::{
    label_stream_id, Article, QuickAddResult, StreamContents, SubscriptionList, TagList,
    UnreadCounts, BROADCAST_STATE, LIKE_STATE, READING_LIST, READ_STATE, STARRED_STATE,
};
use crate::auth::{OAuthFlow, TokenRecord, TokenStore};
use crate::config::Config;
use crate::error::{InoreaderMcpError, Result};

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const SUBSCRIPTION_LIST_KEY: &str = "subscription_list";
const TAG_LIST_KEY: &str = "tag_list";
const UNREAD_COUNT_KEY: &str = "unread_count";

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

/// Classified outcome of one API request.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// 2xx with a body that decoded as JSON.
    Success(Value),
    /// Non-2xx status; the body is kept verbatim.
    ApiFailure {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// 2xx whose body is not JSON.
    MalformedResponse {
        /// Raw response body.
        raw: String,
    },
}

/// Outcome of a mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    /// The server answered `OK` (or returned a JSON document).
    Accepted,
    /// The server answered 2xx with some other text.
    Rejected(String),
}

impl Acknowledgement {
    /// Returns `true` for [`Acknowledgement::Accepted`].
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Classifies a raw response.
///
/// Non-2xx statuses are failures regardless of body. A JSON content type
/// must decode; any other content type is still tried as JSON because the
/// API labels some JSON bodies `text/plain`.
///
/// # Examples
///
/// ```
/// use inoreader_mcp::api::client::{classify_response, ApiResponse};
///
/// let resp = classify_response(200, Some("text/plain"), "OK");
/// assert_eq!(resp, ApiResponse::MalformedResponse { raw: "OK".to_string() });
/// ```
pub fn classify_response(status: u16, content_type: Option<&str>, body: &str) -> ApiResponse {
    if !(200..300).contains(&status) {
        return ApiResponse::ApiFailure {
            status,
            body: body.to_string(),
        };
    }

    let declared_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);

    match serde_json::from_str::<Value>(body) {
        Ok(value) => ApiResponse::Success(value),
        Err(e) => {
            if declared_json {
                tracing::warn!("Response declared JSON but failed to decode: {}", e);
            }
            ApiResponse::MalformedResponse {
                raw: body.to_string(),
            }
        }
    }
}

impl ApiResponse {
    /// Converts a read response to JSON.
    ///
    /// A malformed body yields `empty` instead of an error.
    ///
    /// # Errors
    ///
    /// Returns [`InoreaderMcpError::Api`] for non-2xx responses.
    pub fn into_json_or(self, empty: Value) -> Result<Value> {
        match self {
            Self::Success(value) => Ok(value),
            Self::ApiFailure { status, body } => Err(InoreaderMcpError::Api { status, body }.into()),
            Self::MalformedResponse { raw } => {
                tracing::warn!(
                    raw = %truncate(&raw, 200),
                    "Unexpected non-JSON response, using empty result"
                );
                Ok(empty)
            }
        }
    }

    /// Converts a mutation response to an [`Acknowledgement`].
    ///
    /// # Errors
    ///
    /// Returns [`InoreaderMcpError::Api`] for non-2xx responses.
    pub fn into_acknowledgement(self) -> Result<Acknowledgement> {
        match self {
            Self::Success(_) => Ok(Acknowledgement::Accepted),
            Self::ApiFailure { status, body } => Err(InoreaderMcpError::Api { status, body }.into()),
            Self::MalformedResponse { raw } if raw.trim() == "OK" => Ok(Acknowledgement::Accepted),
            Self::MalformedResponse { raw } => Ok(Acknowledgement::Rejected(raw)),
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Result of a chunked mark-as-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkReadOutcome {
    /// IDs submitted.
    pub requested: usize,
    /// IDs in chunks the server accepted.
    pub marked: usize,
}

impl MarkReadOutcome {
    /// Every chunk was accepted.
    pub fn is_complete(&self) -> bool {
        self.marked == self.requested
    }
}

/// Edit applied by `subscription/edit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionEdit {
    /// New title.
    pub title: Option<String>,
    /// Folder to add the feed to.
    pub add_to_folder: Option<String>,
    /// Folder to remove the feed from.
    pub remove_from_folder: Option<String>,
}

/// Authenticated Inoreader API client for one tool call.
#[derive(Debug)]
pub struct InoreaderClient {
    http: reqwest::Client,
    base_url: Url,
    app_id: String,
    app_key: String,
    token: TokenRecord,
    store: TokenStore,
    flow: OAuthFlow,
    cache: Arc<ResponseCache>,
    expiry_buffer_seconds: i64,
    mark_read_chunk_size: usize,
    search_window: usize,
}

impl InoreaderClient {
    /// Loads stored tokens and builds a client.
    ///
    /// # Errors
    ///
    /// Returns [`InoreaderMcpError::NotAuthenticated`] when no token file
    /// exists, or a configuration error when credentials are missing.
    pub fn connect(config: &Config, cache: Arc<ResponseCache>) -> Result<Self> {
        let store = TokenStore::new(config.token_path()?);
        let token = store.load()?.ok_or(InoreaderMcpError::NotAuthenticated)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.request_timeout_seconds))
            .build()
            .map_err(|e| InoreaderMcpError::Config(format!("failed to build HTTP client: {e}")))?;

        let app_id = config.app_id()?.to_string();
        let app_key = config.app_key()?.to_string();
        let flow = OAuthFlow::with_client(
            http.clone(),
            app_id.clone(),
            app_key.clone(),
            config.inoreader.oauth_auth_url.clone(),
            config.inoreader.oauth_token_url.clone(),
        );

        // A trailing slash makes Url::join append rather than replace the
        // last path segment.
        let mut base = config.inoreader.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)
            .map_err(|e| InoreaderMcpError::Config(format!("invalid API base URL: {e}")))?;

        Ok(Self {
            http,
            base_url,
            app_id,
            app_key,
            token,
            store,
            flow,
            cache,
            expiry_buffer_seconds: config.auth.expiry_buffer_seconds,
            mark_read_chunk_size: config.api.mark_read_chunk_size.max(1),
            search_window: config.api.search_window,
        })
    }

    /// Token currently held by the client.
    pub fn token(&self) -> &TokenRecord {
        &self.token
    }

    /// Refreshes and persists the token when it is within the expiry buffer.
    ///
    /// # Errors
    ///
    /// Returns an auth error if the refresh is refused, or an I/O error if
    /// the new record cannot be written.
    pub async fn ensure_fresh_token(&mut self) -> Result<()> {
        if !self.token.is_expired_with_buffer(self.expiry_buffer_seconds) {
            return Ok(());
        }

        tracing::info!("Access token expired, refreshing");
        let refreshed = self.flow.refresh(&self.token.refresh_token).await?;
        self.store.save(&refreshed)?;
        self.token = refreshed;
        tracing::debug!(
            seconds_remaining = self.token.seconds_remaining(),
            "Stored refreshed token"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// All subscriptions (cached).
    pub async fn subscription_list(&mut self) -> Result<SubscriptionList> {
        let value = self
            .cached_get(SUBSCRIPTION_LIST_KEY, "subscription/list", json!({"subscriptions": []}))
            .await?;
        decode(value)
    }

    /// Articles of a stream, newest first.
    ///
    /// `stream` defaults to the reading list; bare names are treated as
    /// folders or tags.
    pub async fn stream_contents(
        &mut self,
        stream: Option<&str>,
        count: usize,
        exclude_read: bool,
        newer_than: Option<i64>,
    ) -> Result<StreamContents> {
        let stream_id = stream
            .filter(|s| !s.trim().is_empty())
            .map(label_stream_id)
            .unwrap_or_else(|| READING_LIST.to_string());

        let mut query = vec![("n", count.to_string())];
        if exclude_read {
            query.push(("xt", READ_STATE.to_string()));
        }
        if let Some(ts) = newer_than {
            query.push(("ot", ts.to_string()));
        }

        tracing::debug!(stream = %stream_id, count, exclude_read, "Fetching stream contents");
        let request = self.http.get(self.stream_url(&stream_id)?).query(&query);
        let resp = self.send(request).await?;
        decode(resp.into_json_or(json!({"items": []}))?)
    }

    /// Full items for the given article IDs.
    pub async fn stream_item_contents(&mut self, ids: &[String]) -> Result<Vec<Article>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let form: Vec<(&str, &str)> = ids.iter().map(|id| ("i", id.as_str())).collect();
        let request = self.http.post(self.endpoint("stream/items/contents")?).form(&form);
        let resp = self.send(request).await?;
        let contents: StreamContents = decode(resp.into_json_or(json!({"items": []}))?)?;
        Ok(contents.items)
    }

    /// Per-stream unread counts (cached).
    pub async fn unread_count(&mut self) -> Result<UnreadCounts> {
        let value = self
            .cached_get(UNREAD_COUNT_KEY, "unread-count", json!({"unreadcounts": []}))
            .await?;
        decode(value)
    }

    /// Folders and tags (cached).
    pub async fn tag_list(&mut self) -> Result<TagList> {
        let value = self
            .cached_get(TAG_LIST_KEY, "tag/list", json!({"tags": []}))
            .await?;
        decode(value)
    }

    /// Case-insensitive keyword match over title and summary.
    ///
    /// Scans the most recent window of the reading list and keeps at most
    /// `count` matches.
    pub async fn search(
        &mut self,
        query: &str,
        count: usize,
        newer_than: Option<i64>,
    ) -> Result<Vec<Article>> {
        let needle = query.trim().to_lowercase();
        let window = self.search_window.max(count);
        let contents = self.stream_contents(None, window, false, newer_than).await?;

        let matches: Vec<Article> = contents
            .items
            .into_iter()
            .filter(|article| {
                needle.is_empty()
                    || article.title.to_lowercase().contains(&needle)
                    || article.summary_text().to_lowercase().contains(&needle)
            })
            .take(count)
            .collect();

        tracing::debug!(query, window, matches = matches.len(), "Search complete");
        Ok(matches)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Adds and removes tags on a set of articles.
    pub async fn edit_tag(
        &mut self,
        ids: &[String],
        add: Option<&str>,
        remove: Option<&str>,
    ) -> Result<Acknowledgement> {
        let mut form: Vec<(&str, &str)> = ids.iter().map(|id| ("i", id.as_str())).collect();
        if let Some(tag) = add {
            form.push(("a", tag));
        }
        if let Some(tag) = remove {
            form.push(("r", tag));
        }
        let request = self.http.post(self.endpoint("edit-tag")?).form(&form);
        let resp = self.send(request).await?;
        resp.into_acknowledgement()
    }

    /// Marks articles read in sequential chunks.
    ///
    /// A failed chunk is logged and counted as unmarked; later chunks are
    /// still sent.
    pub async fn mark_as_read(&mut self, ids: &[String]) -> Result<MarkReadOutcome> {
        let mut marked = 0;
        for chunk in ids.chunks(self.mark_read_chunk_size) {
            match self.edit_tag(chunk, Some(READ_STATE), None).await {
                Ok(Acknowledgement::Accepted) => marked += chunk.len(),
                Ok(Acknowledgement::Rejected(raw)) => {
                    tracing::warn!(size = chunk.len(), response = %raw, "Mark-as-read chunk rejected");
                }
                Err(e) => {
                    tracing::warn!(size = chunk.len(), "Mark-as-read chunk failed: {}", e);
                }
            }
        }
        Ok(MarkReadOutcome {
            requested: ids.len(),
            marked,
        })
    }

    /// Applies the starred state.
    pub async fn star(&mut self, ids: &[String]) -> Result<Acknowledgement> {
        self.edit_tag(ids, Some(STARRED_STATE), None).await
    }

    /// Removes the starred state.
    pub async fn unstar(&mut self, ids: &[String]) -> Result<Acknowledgement> {
        self.edit_tag(ids, None, Some(STARRED_STATE)).await
    }

    /// Applies the broadcast state.
    pub async fn broadcast(&mut self, ids: &[String]) -> Result<Acknowledgement> {
        self.edit_tag(ids, Some(BROADCAST_STATE), None).await
    }

    /// Applies the liked state.
    pub async fn like(&mut self, ids: &[String]) -> Result<Acknowledgement> {
        self.edit_tag(ids, Some(LIKE_STATE), None).await
    }

    /// Adds a user tag.
    pub async fn tag_articles(&mut self, ids: &[String], tag: &str) -> Result<Acknowledgement> {
        let tag = label_stream_id(tag);
        self.edit_tag(ids, Some(&tag), None).await
    }

    /// Removes a user tag.
    pub async fn untag_articles(&mut self, ids: &[String], tag: &str) -> Result<Acknowledgement> {
        let tag = label_stream_id(tag);
        self.edit_tag(ids, None, Some(&tag)).await
    }

    /// Subscribes to a feed URL.
    pub async fn quick_add(&mut self, feed_url: &str) -> Result<QuickAddResult> {
        let request = self
            .http
            .post(self.endpoint("subscription/quickadd")?)
            .form(&[("quickadd", feed_url)]);
        let resp = self.send(request).await?;
        decode(resp.into_json_or(json!({"numResults": 0}))?)
    }

    /// Renames a subscription or moves it between folders.
    pub async fn edit_subscription(
        &mut self,
        stream_id: &str,
        edit: &SubscriptionEdit,
    ) -> Result<Acknowledgement> {
        let add = edit.add_to_folder.as_deref().map(label_stream_id);
        let remove = edit.remove_from_folder.as_deref().map(label_stream_id);

        let mut form: Vec<(&str, &str)> = vec![("ac", "edit"), ("s", stream_id)];
        if let Some(title) = edit.title.as_deref() {
            form.push(("t", title));
        }
        if let Some(folder) = add.as_deref() {
            form.push(("a", folder));
        }
        if let Some(folder) = remove.as_deref() {
            form.push(("r", folder));
        }

        let request = self.http.post(self.endpoint("subscription/edit")?).form(&form);
        let resp = self.send(request).await?;
        resp.into_acknowledgement()
    }

    /// Removes a subscription.
    pub async fn unsubscribe(&mut self, stream_id: &str) -> Result<Acknowledgement> {
        let request = self
            .http
            .post(self.endpoint("subscription/edit")?)
            .form(&[("ac", "unsubscribe"), ("s", stream_id)]);
        let resp = self.send(request).await?;
        resp.into_acknowledgement()
    }

    /// Renames a folder or tag.
    pub async fn rename_tag(&mut self, source: &str, destination: &str) -> Result<Acknowledgement> {
        let source = label_stream_id(source);
        let dest = label_stream_id(destination);
        let request = self
            .http
            .post(self.endpoint("rename-tag")?)
            .form(&[("s", source.as_str()), ("dest", dest.as_str())]);
        let resp = self.send(request).await?;
        resp.into_acknowledgement()
    }

    /// Deletes a folder or tag.
    pub async fn delete_tag(&mut self, tag: &str) -> Result<Acknowledgement> {
        let tag = label_stream_id(tag);
        let request = self
            .http
            .post(self.endpoint("disable-tag")?)
            .form(&[("s", tag.as_str())]);
        let resp = self.send(request).await?;
        resp.into_acknowledgement()
    }

    /// Marks every article in a stream read, optionally only up to `timestamp`.
    pub async fn mark_all_as_read(
        &mut self,
        stream_id: &str,
        timestamp: Option<i64>,
    ) -> Result<Acknowledgement> {
        let stream_id = label_stream_id(stream_id);
        let mut form = vec![("s", stream_id)];
        if let Some(ts) = timestamp {
            // The API expects microseconds.
            form.push(("ts", ts.saturating_mul(1_000_000).to_string()));
        }
        let request = self.http.post(self.endpoint("mark-all-as-read")?).form(&form);
        let resp = self.send(request).await?;
        resp.into_acknowledgement()
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    async fn cached_get(&mut self, key: &str, path: &str, empty: Value) -> Result<Value> {
        if let Some(hit) = self.cache.get(key) {
            return Ok(hit);
        }
        let request = self.http.get(self.endpoint(path)?);
        let resp = self.send(request).await?;
        // Only decoded bodies are cached; a malformed one falls back to
        // `empty` for this call alone.
        let cacheable = matches!(resp, ApiResponse::Success(_));
        let value = resp.into_json_or(empty)?;
        if cacheable {
            self.cache.put(key, value.clone());
        }
        Ok(value)
    }

    async fn send(&mut self, request: reqwest::RequestBuilder) -> Result<ApiResponse> {
        self.ensure_fresh_token().await?;

        let resp = request
            .bearer_auth(&self.token.access_token)
            .header("AppId", &self.app_id)
            .header("AppKey", &self.app_key)
            .send()
            .await
            .map_err(InoreaderMcpError::Http)?;

        let status: StatusCode = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await.map_err(InoreaderMcpError::Http)?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "API response received");
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %truncate(&body, 200), "API request failed");
        }

        Ok(classify_response(status.as_u16(), content_type.as_deref(), &body))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| InoreaderMcpError::Config(format!("invalid endpoint path {path}: {e}")).into())
    }

    fn stream_url(&self, stream_id: &str) -> Result<Url> {
        let mut url = self.endpoint("stream/contents/")?;
        url.path_segments_mut()
            .map_err(|_| InoreaderMcpError::Config("API base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(stream_id);
        Ok(url)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| InoreaderMcpError::Serialization(e).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_non_success_is_failure() {
        let resp = classify_response(401, Some("application/json"), "{\"error\":\"denied\"}");
        assert_eq!(
            resp,
            ApiResponse::ApiFailure {
                status: 401,
                body: "{\"error\":\"denied\"}".to_string()
            }
        );
    }

    #[test]
    fn test_classify_json_content_type() {
        let resp = classify_response(200, Some("application/json; charset=utf-8"), "{\"a\":1}");
        assert_eq!(resp, ApiResponse::Success(json!({"a": 1})));
    }

    #[test]
    fn test_classify_json_body_with_text_plain() {
        let resp = classify_response(200, Some("text/plain"), "{\"items\":[]}");
        assert_eq!(resp, ApiResponse::Success(json!({"items": []})));
    }

    #[test]
    fn test_classify_declared_json_that_does_not_decode() {
        let resp = classify_response(200, Some("application/json"), "<html>");
        assert_eq!(
            resp,
            ApiResponse::MalformedResponse {
                raw: "<html>".to_string()
            }
        );
    }

    #[test]
    fn test_into_json_or_substitutes_empty_for_malformed() {
        let resp = ApiResponse::MalformedResponse {
            raw: "garbage".to_string(),
        };
        assert_eq!(resp.into_json_or(json!({"items": []})).unwrap(), json!({"items": []}));
    }

    #[test]
    fn test_into_json_or_propagates_api_failure() {
        let resp = ApiResponse::ApiFailure {
            status: 503,
            body: "busy".to_string(),
        };
        let err = resp.into_json_or(json!({})).unwrap_err();
        match err.downcast_ref::<InoreaderMcpError>() {
            Some(InoreaderMcpError::Api { status, body }) => {
                assert_eq!(*status, 503);
                assert_eq!(body, "busy");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_acknowledgement_ok_text() {
        let resp = classify_response(200, Some("text/plain"), "OK");
        assert_eq!(resp.into_acknowledgement().unwrap(), Acknowledgement::Accepted);

        let resp = classify_response(200, Some("text/plain"), "OK\n");
        assert!(resp.into_acknowledgement().unwrap().is_accepted());
    }

    #[test]
    fn test_acknowledgement_other_text_is_rejected() {
        let resp = classify_response(200, Some("text/plain"), "Error=BadToken");
        assert_eq!(
            resp.into_acknowledgement().unwrap(),
            Acknowledgement::Rejected("Error=BadToken".to_string())
        );
    }

    #[test]
    fn test_mark_read_outcome() {
        let outcome = MarkReadOutcome {
            requested: 45,
            marked: 40,
        };
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
