//! Normalization of raw Atlassian Community search responses
//!
//! The search API returns loosely-shaped JSON. These functions reshape it
//! into a stable envelope that downstream consumers (CLI rendering, MCP
//! tool payloads) can rely on. Formatting is total: malformed input becomes
//! a `success: false` envelope, never a panic or an error.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default values applied when a raw field is absent.
pub mod defaults {
    pub const UNKNOWN_ID: &str = "Unknown ID";
    pub const NO_TITLE: &str = "No title";
    pub const UNKNOWN_AUTHOR: &str = "Unknown author";
    pub const UNKNOWN_DATE: &str = "Unknown date";
    pub const NO_TAGS: &str = "No tags";
    pub const UNKNOWN_CONTENT_TYPE: &str = "unknown";
    pub const UNKNOWN_TAG_NAME: &str = "Unknown";
    /// Board segment used in the canonical URL when the post has no board.
    pub const BOARD: &str = "forums";
    /// Slug segment used in the canonical URL when the post has no subject.
    pub const SLUG: &str = "post";
}

const COMMUNITY_BASE_URL: &str = "https://community.atlassian.com/t5";
const EXCERPT_MAX_CHARS: usize = 200;

const TIP_LINK_HINT: &str =
    "When results are found, each item includes a 'communityLink' field with a direct URL to the post.";
const TIP_LINK_FIELD: &str =
    "Each result includes a 'communityLink' field with a direct URL to the post on the Atlassian Community site.";
const TIP_TAGS_INVALID: &str =
    "Use the searchByTags tool with valid tags to find relevant posts.";
const TIP_TAGS_EMPTY: &str = "Try a broader search to find available tags.";
const TIP_TAGS_FOUND: &str =
    "Use these tags with the searchByTags tool to find relevant posts.";
const TIP_TAGS_ERROR: &str =
    "Try again with a different query or contact support if the issue persists.";

/// One raw message record from the search API. Every field is optional;
/// the formatter applies [`defaults`] consistently.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RawPost {
    pub id: Option<String>,
    pub subject: Option<String>,
    pub author: Option<RawAuthor>,
    #[serde(rename = "postTime")]
    pub post_time: Option<String>,
    pub tags: Option<Vec<RawTag>>,
    #[serde(rename = "viewCount")]
    pub view_count: Option<u64>,
    #[serde(rename = "replyCount")]
    pub reply_count: Option<u64>,
    #[serde(rename = "acceptedSolutionId")]
    pub accepted_solution_id: Option<String>,
    pub body: Option<String>,
    pub board: Option<RawBoard>,
    pub conversation: Option<RawConversation>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RawAuthor {
    pub login: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RawTag {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RawBoard {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RawConversation {
    pub style: Option<String>,
}

/// Uniform post representation derived from a [`RawPost`].
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPost {
    pub id: String,
    pub title: String,
    pub author: String,
    pub post_date: String,
    /// Comma-joined tag labels, or "No tags".
    pub tags: String,
    pub view_count: u64,
    pub reply_count: u64,
    pub has_accepted_solution: bool,
    pub content_type: String,
    pub is_blog: bool,
    #[serde(rename = "isQandA")]
    pub is_qanda: bool,
    pub url: String,
    /// Always identical to `url`; kept as an explicit alias for consumers.
    pub community_link: String,
    pub excerpt: String,
    /// The decoded raw record, retained for caller introspection.
    pub raw: RawPost,
}

/// Pagination metadata attached to a [`SearchEnvelope`].
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub showing: usize,
    pub start_index: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

impl Pagination {
    fn zeroed() -> Self {
        Pagination {
            total: 0,
            showing: 0,
            start_index: 0,
            current_page: 0,
            total_pages: 0,
        }
    }
}

/// Stable envelope around zero or more normalized posts.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SearchEnvelope {
    pub success: bool,
    pub message: String,
    pub items: Vec<NormalizedPost>,
    pub pagination: Pagination,
    pub tip: String,
}

/// One aggregated tag with its post count.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TagSummary {
    pub name: String,
    pub count: u64,
}

/// Envelope around the popular-tags aggregation.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TagsEnvelope {
    pub success: bool,
    pub message: String,
    pub tags: Vec<TagSummary>,
    pub tip: String,
}

// Raw response envelope: { data: { items, size, startIndex, totalSize } }
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawResponse {
    data: Option<RawData>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawData {
    items: Option<serde_json::Value>,
    size: Option<u64>,
    #[serde(rename = "startIndex")]
    start_index: Option<u64>,
    #[serde(rename = "totalSize")]
    total_size: Option<u64>,
}

// Aggregation row from the popular-tags query. The grouping key keeps its
// dotted projection name in the raw JSON.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawTagRow {
    #[serde(rename = "tags.text")]
    name: Option<String>,
    tag_count: Option<u64>,
}

/// Lowercase the subject and collapse every run of non-alphanumeric
/// characters into a single hyphen, stripped at both ends.
fn slugify(subject: &str) -> String {
    let lowered = subject.to_lowercase();
    let re = Regex::new(r"[^a-z0-9]+").unwrap();
    let hyphenated = re.replace_all(&lowered, "-");
    hyphenated.trim_matches('-').to_string()
}

/// Strip `<...>` tag markup and truncate to the excerpt length.
///
/// Simple non-nested tag stripping, not a full HTML parse.
fn excerpt_from_body(body: &str) -> String {
    let re = Regex::new(r"<[^>]*>").unwrap();
    let text = re.replace_all(body, "");
    if text.chars().count() > EXCERPT_MAX_CHARS {
        let prefix: String = text.chars().take(EXCERPT_MAX_CHARS).collect();
        format!("{prefix}...")
    } else {
        text.into_owned()
    }
}

/// Format an ISO-8601 timestamp for display, normalized to UTC. Missing or
/// unparseable timestamps fall back to the "Unknown date" default.
fn format_post_date(post_time: Option<&str>) -> String {
    post_time
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|dt| {
            dt.with_timezone(&Utc)
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string()
        })
        .unwrap_or_else(|| defaults::UNKNOWN_DATE.to_string())
}

/// Normalize a single raw post. Total: every field access is defaulted.
pub fn format_post(post: &RawPost) -> NormalizedPost {
    let id = post
        .id
        .clone()
        .unwrap_or_else(|| defaults::UNKNOWN_ID.to_string());
    let title = post
        .subject
        .clone()
        .unwrap_or_else(|| defaults::NO_TITLE.to_string());
    let author = post
        .author
        .as_ref()
        .and_then(|a| a.login.clone())
        .unwrap_or_else(|| defaults::UNKNOWN_AUTHOR.to_string());
    let post_date = format_post_date(post.post_time.as_deref());

    let tags = match &post.tags {
        Some(tags) => tags
            .iter()
            .map(|tag| tag.text.clone().unwrap_or_default())
            .collect::<Vec<_>>()
            .join(", "),
        None => defaults::NO_TAGS.to_string(),
    };

    let has_accepted_solution = post
        .accepted_solution_id
        .as_ref()
        .is_some_and(|id| !id.is_empty());

    let content_type = post
        .conversation
        .as_ref()
        .and_then(|c| c.style.clone())
        .unwrap_or_else(|| defaults::UNKNOWN_CONTENT_TYPE.to_string());
    let is_blog = content_type == "blog";
    let is_qanda = content_type == "qanda";

    // Canonical URL: https://community.atlassian.com/t5/{board}/{slug}/td-p/{id}
    let board_id = post
        .board
        .as_ref()
        .and_then(|b| b.id.clone())
        .unwrap_or_else(|| defaults::BOARD.to_string());
    let slug = match &post.subject {
        Some(subject) => slugify(subject),
        None => defaults::SLUG.to_string(),
    };
    let url = format!("{COMMUNITY_BASE_URL}/{board_id}/{slug}/td-p/{id}");

    let excerpt = post
        .body
        .as_deref()
        .map(excerpt_from_body)
        .unwrap_or_default();

    NormalizedPost {
        id,
        title,
        author,
        post_date,
        tags,
        view_count: post.view_count.unwrap_or(0),
        reply_count: post.reply_count.unwrap_or(0),
        has_accepted_solution,
        content_type,
        is_blog,
        is_qanda,
        community_link: url.clone(),
        url,
        excerpt,
        raw: post.clone(),
    }
}

// The upstream deployment treated zero-valued size/totalSize metadata as
// absent and fell back to the item count.
fn metadata_or(count: usize, value: Option<u64>) -> usize {
    match value {
        Some(v) if v > 0 => v as usize,
        _ => count,
    }
}

fn current_page(start_index: usize, size: usize) -> usize {
    if size > 0 {
        start_index / size + 1
    } else {
        1
    }
}

fn total_pages(total_size: usize, size: usize) -> usize {
    if size > 0 {
        total_size.div_ceil(size).max(1)
    } else {
        1
    }
}

fn search_failure(message: String) -> SearchEnvelope {
    SearchEnvelope {
        success: false,
        message,
        items: Vec::new(),
        pagination: Pagination::zeroed(),
        tip: TIP_LINK_HINT.to_string(),
    }
}

/// Reshape a raw search response into a [`SearchEnvelope`]. Never raises:
/// absent or malformed shapes become `success: false` envelopes, and any
/// decode failure inside item mapping is caught and reported in `message`.
pub fn format_search_results(raw: &serde_json::Value) -> SearchEnvelope {
    match try_format_search_results(raw) {
        Ok(envelope) => envelope,
        Err(err) => search_failure(format!("Error formatting results: {err}")),
    }
}

fn try_format_search_results(raw: &serde_json::Value) -> Result<SearchEnvelope, serde_json::Error> {
    // A null response body counts as an invalid shape, not a decode error.
    let response = serde_json::from_value::<Option<RawResponse>>(raw.clone())?.unwrap_or_default();
    let Some(data) = response.data.as_ref() else {
        return Ok(search_failure(
            "No results found or invalid response format.".to_string(),
        ));
    };
    let Some(items) = data.items.as_ref().and_then(|items| items.as_array()) else {
        return Ok(search_failure(
            "No results found or invalid response format.".to_string(),
        ));
    };

    let size = metadata_or(items.len(), data.size);
    let start_index = data.start_index.unwrap_or(0) as usize;
    let total_size = metadata_or(items.len(), data.total_size);

    if items.is_empty() {
        return Ok(SearchEnvelope {
            success: true,
            message: "No matching results found.".to_string(),
            items: Vec::new(),
            pagination: Pagination {
                total: total_size,
                showing: 0,
                start_index,
                current_page: current_page(start_index, size),
                total_pages: total_pages(total_size, size),
            },
            tip: TIP_LINK_HINT.to_string(),
        });
    }

    let posts = items
        .iter()
        .map(|item| serde_json::from_value::<RawPost>(item.clone()).map(|post| format_post(&post)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SearchEnvelope {
        success: true,
        message: format!(
            "Found {total_size} total results. Showing {} results starting from {start_index}.",
            posts.len()
        ),
        pagination: Pagination {
            total: total_size,
            showing: posts.len(),
            start_index,
            current_page: current_page(start_index, size),
            total_pages: total_pages(total_size, size),
        },
        items: posts,
        tip: TIP_LINK_FIELD.to_string(),
    })
}

fn tags_failure(message: String, tip: &str) -> TagsEnvelope {
    TagsEnvelope {
        success: false,
        message,
        tags: Vec::new(),
        tip: tip.to_string(),
    }
}

/// Reshape a raw tag-aggregation response into a [`TagsEnvelope`]. Same
/// shape-guard and error-containment policy as [`format_search_results`].
pub fn format_tags_results(raw: &serde_json::Value) -> TagsEnvelope {
    match try_format_tags_results(raw) {
        Ok(envelope) => envelope,
        Err(err) => tags_failure(
            format!("Error formatting tag results: {err}"),
            TIP_TAGS_ERROR,
        ),
    }
}

fn try_format_tags_results(raw: &serde_json::Value) -> Result<TagsEnvelope, serde_json::Error> {
    let response = serde_json::from_value::<Option<RawResponse>>(raw.clone())?.unwrap_or_default();
    let Some(data) = response.data.as_ref() else {
        return Ok(tags_failure(
            "No tag results found or invalid response format.".to_string(),
            TIP_TAGS_INVALID,
        ));
    };
    let Some(items) = data.items.as_ref().and_then(|items| items.as_array()) else {
        return Ok(tags_failure(
            "No tag results found or invalid response format.".to_string(),
            TIP_TAGS_INVALID,
        ));
    };

    if items.is_empty() {
        return Ok(TagsEnvelope {
            success: true,
            message: "No matching tags found.".to_string(),
            tags: Vec::new(),
            tip: TIP_TAGS_EMPTY.to_string(),
        });
    }

    let total_size = metadata_or(items.len(), data.total_size);

    let tags = items
        .iter()
        .map(|item| {
            serde_json::from_value::<RawTagRow>(item.clone()).map(|row| TagSummary {
                name: row
                    .name
                    .unwrap_or_else(|| defaults::UNKNOWN_TAG_NAME.to_string()),
                count: row.tag_count.unwrap_or(0),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TagsEnvelope {
        success: true,
        message: format!(
            "Found {total_size} total tags. Showing {} most popular tags.",
            tags.len()
        ),
        tags,
        tip: TIP_TAGS_FOUND.to_string(),
    })
}
