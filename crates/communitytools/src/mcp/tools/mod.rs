mod community;

use serde::{Deserialize, Serialize};

// Re-export types needed by tool handlers
pub use super::{JsonRpcError, Tool};

// MCP Protocol types for tools
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Serialize)]
pub struct ToolsCapability {}

#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
pub struct ToolsList {
    pub tools: Vec<Tool>,
}

#[derive(Debug, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CallToolResult {
    pub content: Vec<Content>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Content {
    #[serde(rename = "text")]
    Text { text: String },
}

pub fn handle_initialize() -> Result<serde_json::Value, JsonRpcError> {
    let result = InitializeResult {
        protocol_version: "2024-11-05".to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {}),
        },
        server_info: ServerInfo {
            name: "communitytools".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };

    serde_json::to_value(result).map_err(|e| JsonRpcError {
        code: -32603,
        message: format!("Internal error: {e}"),
        data: None,
    })
}

fn pagination_properties() -> serde_json::Value {
    serde_json::json!({
        "limit": {
            "type": "number",
            "description": "Maximum number of results to return (default: 25, range 1-100)"
        },
        "offset": {
            "type": "number",
            "description": "Number of results to skip, for pagination (default: 0)"
        }
    })
}

fn with_pagination(mut properties: serde_json::Value) -> serde_json::Value {
    if let (Some(map), Some(pagination)) =
        (properties.as_object_mut(), pagination_properties().as_object())
    {
        for (key, value) in pagination {
            map.insert(key.clone(), value.clone());
        }
    }
    properties
}

pub fn handle_tools_list(global: &crate::Global) -> Result<serde_json::Value, JsonRpcError> {
    let mut tools = vec![
        Tool {
            name: "searchCommunity".to_string(),
            description: "Search Atlassian Community posts and articles by free-text terms. Matches against post subjects and bodies. Optionally restrict results to Q&A threads ('qanda') or blog articles ('blog'). Each result includes a 'communityLink' field with a direct URL to the post.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": with_pagination(serde_json::json!({
                    "searchTerms": {
                        "type": "string",
                        "description": "Terms to search for in post subjects and bodies"
                    },
                    "style": {
                        "type": "string",
                        "description": "Restrict results to one conversation style",
                        "enum": ["qanda", "blog"]
                    },
                    "sortOrder": {
                        "type": "string",
                        "description": "Sorting order by post date (default: desc)",
                        "enum": ["asc", "desc"]
                    }
                })),
                "required": ["searchTerms"]
            }),
        },
        Tool {
            name: "searchByTags".to_string(),
            description: "Search Atlassian Community posts by free-text terms restricted to one or more tags. Tags match exactly; results are sorted by post date.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": with_pagination(serde_json::json!({
                    "searchTerms": {
                        "type": "string",
                        "description": "Terms to search for in post subjects and bodies"
                    },
                    "tags": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Tags to filter by (at least one)"
                    },
                    "sortOrder": {
                        "type": "string",
                        "description": "Sorting order by post date (default: desc)",
                        "enum": ["asc", "desc"]
                    }
                })),
                "required": ["tags"]
            }),
        },
        Tool {
            name: "getTopPostsByViews".to_string(),
            description: "Get the top Atlassian Community posts by view count for a given tag. Fetches a pool of recent posts and ranks them by views, so results favor recent popular posts.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": with_pagination(serde_json::json!({
                    "tag": {
                        "type": "string",
                        "description": "Tag to rank posts for"
                    }
                })),
                "required": ["tag"]
            }),
        },
        Tool {
            name: "getMostRecentPosts".to_string(),
            description: "Get the most recent Atlassian Community posts across all tags, newest first. Optionally restrict results to Q&A threads ('qanda') or blog articles ('blog').".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": with_pagination(serde_json::json!({
                    "style": {
                        "type": "string",
                        "description": "Restrict results to one conversation style",
                        "enum": ["qanda", "blog"]
                    }
                })),
                "required": []
            }),
        },
        Tool {
            name: "getMostRecentPostsByTag".to_string(),
            description: "Get the most recent Atlassian Community posts carrying a specific tag, newest first. Optionally restrict results to Q&A threads ('qanda') or blog articles ('blog').".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": with_pagination(serde_json::json!({
                    "tag": {
                        "type": "string",
                        "description": "Tag to filter by"
                    },
                    "style": {
                        "type": "string",
                        "description": "Restrict results to one conversation style",
                        "enum": ["qanda", "blog"]
                    }
                })),
                "required": ["tag"]
            }),
        },
        Tool {
            name: "getUserContent".to_string(),
            description: "Get Atlassian Community content authored by a specific user. Returns top-level posts by default; set includeAnswers to also return their answers to other posts.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": with_pagination(serde_json::json!({
                    "username": {
                        "type": "string",
                        "description": "Login name of the author"
                    },
                    "includeAnswers": {
                        "type": "boolean",
                        "description": "Also include answers, i.e. replies nested under other posts (default: false)"
                    }
                })),
                "required": ["username"]
            }),
        },
        Tool {
            name: "getPostAnswers".to_string(),
            description: "Get all answers nested under a specific Atlassian Community post, in chronological order.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": with_pagination(serde_json::json!({
                    "postId": {
                        "type": "string",
                        "description": "ID of the post to list answers for"
                    }
                })),
                "required": ["postId"]
            }),
        },
    ];

    // The upstream aggregation endpoint intermittently answers 400, so this
    // tool is only registered when explicitly enabled.
    if global.expose_popular_tags {
        tools.push(Tool {
            name: "getPopularTags".to_string(),
            description: "Get the most popular Atlassian Community tags by post count.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of tags to return (default: 20, range 1-100)"
                    }
                },
                "required": []
            }),
        });
    }

    let result = ToolsList { tools };

    serde_json::to_value(result).map_err(|e| JsonRpcError {
        code: -32603,
        message: format!("Internal error: {e}"),
        data: None,
    })
}

pub async fn handle_tools_call(
    params: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: CallToolParams = serde_json::from_value(params.unwrap_or(serde_json::Value::Null))
        .map_err(|e| JsonRpcError {
            code: -32602,
            message: format!("Invalid params: {e}"),
            data: None,
        })?;

    match params.name.as_str() {
        "searchCommunity" => community::handle_search_community(params.arguments, global).await,
        "searchByTags" => community::handle_search_by_tags(params.arguments, global).await,
        "getTopPostsByViews" => {
            community::handle_top_posts_by_views(params.arguments, global).await
        }
        "getMostRecentPosts" => {
            community::handle_most_recent_posts(params.arguments, global).await
        }
        "getMostRecentPostsByTag" => {
            community::handle_most_recent_posts_by_tag(params.arguments, global).await
        }
        "getUserContent" => community::handle_user_content(params.arguments, global).await,
        "getPostAnswers" => community::handle_post_answers(params.arguments, global).await,
        "getPopularTags" if global.expose_popular_tags => {
            community::handle_popular_tags(params.arguments, global).await
        }
        _ => Err(JsonRpcError {
            code: -32602,
            message: format!("Unknown tool: {}", params.name),
            data: None,
        }),
    }
}
