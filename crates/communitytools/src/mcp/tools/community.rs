use communitytools_core::query::{ConversationStyle, SortOrder};
use serde::Deserialize;

use crate::prelude::eprintln;

use super::{CallToolResult, Content, JsonRpcError};

fn invalid_params(message: String) -> JsonRpcError {
    JsonRpcError {
        code: -32602,
        message,
        data: None,
    }
}

fn parse_arguments<T: serde::de::DeserializeOwned>(
    arguments: Option<serde_json::Value>,
) -> Result<T, JsonRpcError> {
    serde_json::from_value(arguments.unwrap_or(serde_json::Value::Null))
        .map_err(|e| invalid_params(format!("Invalid arguments: {e}")))
}

fn validate_limit(limit: usize) -> Result<usize, JsonRpcError> {
    match limit {
        1..=100 => Ok(limit),
        _ => Err(invalid_params(format!(
            "limit must be between 1 and 100, got {limit}"
        ))),
    }
}

fn require_non_empty(value: &str, name: &str) -> Result<(), JsonRpcError> {
    if value.trim().is_empty() {
        return Err(invalid_params(format!("{name} must not be empty")));
    }
    Ok(())
}

/// Wrap a query outcome in an MCP tool result. Upstream and transport
/// failures are reported as an error payload inside a successful call so
/// that clients surface them to the model instead of aborting the request.
fn tool_result<T: serde::Serialize>(
    outcome: crate::prelude::Result<T>,
) -> Result<serde_json::Value, JsonRpcError> {
    let text = match outcome {
        Ok(envelope) => serde_json::to_string_pretty(&envelope).map_err(|e| JsonRpcError {
            code: -32603,
            message: format!("Serialization error: {e}"),
            data: None,
        })?,
        Err(e) => serde_json::to_string_pretty(&serde_json::json!({ "error": e.to_string() }))
            .map_err(|e| JsonRpcError {
                code: -32603,
                message: format!("Serialization error: {e}"),
                data: None,
            })?,
    };

    let result = CallToolResult {
        content: vec![Content::Text { text }],
        is_error: None,
    };

    serde_json::to_value(result).map_err(|e| JsonRpcError {
        code: -32603,
        message: format!("Internal error: {e}"),
        data: None,
    })
}

pub async fn handle_search_community(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct SearchCommunityArgs {
        #[serde(rename = "searchTerms")]
        search_terms: String,
        style: Option<ConversationStyle>,
        limit: Option<usize>,
        offset: Option<usize>,
        #[serde(rename = "sortOrder")]
        sort_order: Option<SortOrder>,
    }

    let args: SearchCommunityArgs = parse_arguments(arguments)?;
    require_non_empty(&args.search_terms, "searchTerms")?;
    let limit = validate_limit(args.limit.unwrap_or(25))?;

    if global.verbose {
        eprintln!(
            "Calling searchCommunity: terms={}, style={:?}, limit={limit}",
            args.search_terms, args.style
        );
    }

    tool_result(
        crate::community::search::search_data(
            &args.search_terms,
            args.style,
            limit,
            args.offset.unwrap_or(0),
            args.sort_order.unwrap_or(SortOrder::Desc),
            global,
        )
        .await,
    )
}

pub async fn handle_search_by_tags(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct SearchByTagsArgs {
        #[serde(rename = "searchTerms")]
        search_terms: Option<String>,
        tags: Vec<String>,
        limit: Option<usize>,
        offset: Option<usize>,
        #[serde(rename = "sortOrder")]
        sort_order: Option<SortOrder>,
    }

    let args: SearchByTagsArgs = parse_arguments(arguments)?;
    if args.tags.iter().all(|tag| tag.trim().is_empty()) {
        return Err(invalid_params(
            "tags must contain at least one non-empty tag".to_string(),
        ));
    }
    let limit = validate_limit(args.limit.unwrap_or(25))?;

    if global.verbose {
        eprintln!(
            "Calling searchByTags: tags={:?}, terms={:?}, limit={limit}",
            args.tags, args.search_terms
        );
    }

    tool_result(
        crate::community::search::search_tags_data(
            args.search_terms.as_deref().unwrap_or(""),
            &args.tags,
            limit,
            args.offset.unwrap_or(0),
            args.sort_order.unwrap_or(SortOrder::Desc),
            global,
        )
        .await,
    )
}

pub async fn handle_top_posts_by_views(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct TopPostsArgs {
        tag: String,
        limit: Option<usize>,
        offset: Option<usize>,
    }

    let args: TopPostsArgs = parse_arguments(arguments)?;
    require_non_empty(&args.tag, "tag")?;
    let limit = validate_limit(args.limit.unwrap_or(25))?;

    if global.verbose {
        eprintln!("Calling getTopPostsByViews: tag={}, limit={limit}", args.tag);
    }

    tool_result(
        crate::community::top::top_data(&args.tag, limit, args.offset.unwrap_or(0), global).await,
    )
}

pub async fn handle_most_recent_posts(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct RecentPostsArgs {
        style: Option<ConversationStyle>,
        limit: Option<usize>,
        offset: Option<usize>,
    }

    let args: RecentPostsArgs = parse_arguments(arguments)?;
    let limit = validate_limit(args.limit.unwrap_or(25))?;

    if global.verbose {
        eprintln!(
            "Calling getMostRecentPosts: style={:?}, limit={limit}",
            args.style
        );
    }

    tool_result(
        crate::community::recent::recent_data(
            args.style,
            None,
            limit,
            args.offset.unwrap_or(0),
            global,
        )
        .await,
    )
}

pub async fn handle_most_recent_posts_by_tag(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct RecentPostsByTagArgs {
        tag: String,
        style: Option<ConversationStyle>,
        limit: Option<usize>,
        offset: Option<usize>,
    }

    let args: RecentPostsByTagArgs = parse_arguments(arguments)?;
    require_non_empty(&args.tag, "tag")?;
    let limit = validate_limit(args.limit.unwrap_or(25))?;

    if global.verbose {
        eprintln!(
            "Calling getMostRecentPostsByTag: tag={}, style={:?}, limit={limit}",
            args.tag, args.style
        );
    }

    tool_result(
        crate::community::recent::recent_data(
            args.style,
            Some(&args.tag),
            limit,
            args.offset.unwrap_or(0),
            global,
        )
        .await,
    )
}

pub async fn handle_user_content(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct UserContentArgs {
        username: String,
        #[serde(rename = "includeAnswers")]
        include_answers: Option<bool>,
        limit: Option<usize>,
        offset: Option<usize>,
    }

    let args: UserContentArgs = parse_arguments(arguments)?;
    require_non_empty(&args.username, "username")?;
    let limit = validate_limit(args.limit.unwrap_or(25))?;

    if global.verbose {
        eprintln!(
            "Calling getUserContent: username={}, includeAnswers={:?}",
            args.username, args.include_answers
        );
    }

    tool_result(
        crate::community::user::user_data(
            &args.username,
            args.include_answers.unwrap_or(false),
            limit,
            args.offset.unwrap_or(0),
            global,
        )
        .await,
    )
}

pub async fn handle_post_answers(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct PostAnswersArgs {
        #[serde(rename = "postId")]
        post_id: String,
        limit: Option<usize>,
        offset: Option<usize>,
    }

    let args: PostAnswersArgs = parse_arguments(arguments)?;
    require_non_empty(&args.post_id, "postId")?;
    let limit = validate_limit(args.limit.unwrap_or(25))?;

    if global.verbose {
        eprintln!("Calling getPostAnswers: postId={}, limit={limit}", args.post_id);
    }

    tool_result(
        crate::community::answers::answers_data(
            &args.post_id,
            limit,
            args.offset.unwrap_or(0),
            global,
        )
        .await,
    )
}

pub async fn handle_popular_tags(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct PopularTagsArgs {
        limit: Option<usize>,
    }

    let args: PopularTagsArgs = parse_arguments(arguments)?;
    let limit = validate_limit(args.limit.unwrap_or(20))?;

    if global.verbose {
        eprintln!("Calling getPopularTags: limit={limit}");
    }

    tool_result(crate::community::tags::tags_data(limit, global).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_global() -> crate::Global {
        crate::Global {
            base_url: None,
            expose_popular_tags: false,
            verbose: false,
        }
    }

    #[test]
    fn limit_outside_range_is_rejected() {
        assert!(validate_limit(1).is_ok_and(|limit| limit == 1));
        assert!(validate_limit(100).is_ok_and(|limit| limit == 100));
        let err = validate_limit(101).unwrap_err();
        assert_eq!(err.code, -32602);
        assert!(err.message.contains("between 1 and 100"));
        let err = validate_limit(0).unwrap_err();
        assert_eq!(err.code, -32602);
    }

    #[tokio::test]
    async fn explicit_zero_limit_is_rejected() {
        let global = quiet_global();
        let err = handle_most_recent_posts(Some(serde_json::json!({ "limit": 0 })), &global)
            .await
            .unwrap_err();
        assert_eq!(err.code, -32602);
        assert!(err.message.contains("limit"));
    }

    #[tokio::test]
    async fn missing_required_argument_is_invalid_params() {
        let global = quiet_global();
        let err = handle_search_community(Some(serde_json::json!({})), &global)
            .await
            .unwrap_err();
        assert_eq!(err.code, -32602);
    }

    #[tokio::test]
    async fn blank_search_terms_are_rejected() {
        let global = quiet_global();
        let err = handle_search_community(
            Some(serde_json::json!({ "searchTerms": "   " })),
            &global,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, -32602);
        assert!(err.message.contains("searchTerms"));
    }

    #[tokio::test]
    async fn tags_list_of_blanks_is_rejected() {
        let global = quiet_global();
        let err = handle_search_by_tags(
            Some(serde_json::json!({ "tags": ["", "  "] })),
            &global,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, -32602);
        assert!(err.message.contains("tags"));
    }

    #[tokio::test]
    async fn unknown_style_is_invalid_params() {
        let global = quiet_global();
        let err = handle_most_recent_posts(
            Some(serde_json::json!({ "style": "podcast" })),
            &global,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, -32602);
    }

    #[test]
    fn failed_outcome_becomes_error_payload() {
        let outcome: crate::prelude::Result<serde_json::Value> =
            Err(crate::prelude::eyre!("API responded with status: 500"));
        let value = tool_result(outcome).unwrap();
        let text = value["content"][0]["text"].as_str().unwrap();
        let payload: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["error"], "API responded with status: 500");
    }
}
