//! Builders for Atlassian Community search-language queries
//!
//! The community search API accepts a single SQL-like query string. These
//! builders assemble that string deterministically from typed parameters.
//! Predicates are always emitted in the same order: depth, conversation
//! style, free-text match, tag filter, author filter.

use std::fmt;

/// Sort direction for caller-controlled sorting on search operations.
///
/// Listing operations (most-recent, by-tag, by-user, top-by-views, answers)
/// hard-code their direction and do not take a `SortOrder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversation style of a top-level post.
///
/// Q&A threads carry the style `qanda`, long-form articles `blog`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ConversationStyle {
    #[serde(rename = "qanda")]
    QandA,
    #[serde(rename = "blog")]
    Blog,
}

impl ConversationStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStyle::QandA => "qanda",
            ConversationStyle::Blog => "blog",
        }
    }
}

impl fmt::Display for ConversationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hard cap on the number of rows fetched for the top-by-views heuristic.
pub const TOP_VIEWS_FETCH_CAP: usize = 100;

/// Escape a user-supplied string literal for embedding in a query.
///
/// The search language uses the standard SQL convention of doubling embedded
/// single quotes. Every literal interpolated into a query must pass through
/// here exactly once.
pub fn escape_literal(literal: &str) -> String {
    literal.replace('\'', "''")
}

fn style_predicate(style: Option<ConversationStyle>) -> String {
    match style {
        Some(style) => format!(" AND conversation.style = '{style}'"),
        None => String::new(),
    }
}

/// Build a free-text search query, optionally restricted to one
/// conversation style.
pub fn search_query(
    terms: &str,
    style: Option<ConversationStyle>,
    limit: usize,
    offset: usize,
    order: SortOrder,
) -> String {
    let terms = escape_literal(terms);
    format!(
        "SELECT * FROM messages WHERE depth = 0{}{} ORDER BY post_time {order} LIMIT {limit} OFFSET {offset}",
        style_predicate(style),
        text_predicate(&terms),
    )
}

fn text_predicate(escaped_terms: &str) -> String {
    format!(" AND (subject MATCHES '{escaped_terms}' OR body MATCHES '{escaped_terms}')")
}

/// Build a free-text search query with a tag membership filter.
///
/// Tags render as `tags.text IN ('a', 'b')` preserving input order; the
/// predicate is omitted entirely when the list is empty.
pub fn tag_search_query(
    terms: &str,
    tags: &[String],
    limit: usize,
    offset: usize,
    order: SortOrder,
) -> String {
    let terms = escape_literal(terms);
    let mut query = format!(
        "SELECT * FROM messages WHERE depth = 0{}",
        text_predicate(&terms)
    );

    if !tags.is_empty() {
        let list = tags
            .iter()
            .map(|tag| format!("'{}'", escape_literal(tag)))
            .collect::<Vec<_>>()
            .join(", ");
        query.push_str(&format!(" AND tags.text IN ({list})"));
    }

    query.push_str(&format!(
        " ORDER BY post_time {order} LIMIT {limit} OFFSET {offset}"
    ));
    query
}

/// Build a most-recent listing query, optionally restricted to one
/// conversation style and/or a single tag. Always newest first.
pub fn recent_query(
    style: Option<ConversationStyle>,
    tag: Option<&str>,
    limit: usize,
    offset: usize,
) -> String {
    let mut query = format!(
        "SELECT * FROM messages WHERE depth = 0{}",
        style_predicate(style)
    );

    if let Some(tag) = tag {
        query.push_str(&format!(" AND tags.text = '{}'", escape_literal(tag)));
    }

    query.push_str(&format!(
        " ORDER BY post_time DESC LIMIT {limit} OFFSET {offset}"
    ));
    query
}

/// Over-fetch size for the top-by-views heuristic.
///
/// The API does not order reliably by view count, so callers fetch a larger
/// recent-in-time candidate pool, re-sort it by view count client-side, and
/// truncate to the requested limit.
pub fn top_views_fetch_limit(limit: usize) -> usize {
    (limit * 3).min(TOP_VIEWS_FETCH_CAP)
}

/// Build the candidate-pool query for top-by-views-for-tag.
///
/// `fetch_limit` should come from [`top_views_fetch_limit`].
pub fn top_views_query(tag: &str, fetch_limit: usize, offset: usize) -> String {
    format!(
        "SELECT * FROM messages WHERE depth = 0 AND tags.text = '{}' ORDER BY post_time DESC LIMIT {fetch_limit} OFFSET {offset}",
        escape_literal(tag)
    )
}

/// Build a query for content authored by one user.
///
/// With `include_answers` the depth predicate is omitted entirely, so both
/// top-level posts and nested answers match.
pub fn user_content_query(
    username: &str,
    include_answers: bool,
    limit: usize,
    offset: usize,
) -> String {
    let depth = if include_answers { "" } else { "depth = 0 AND " };
    format!(
        "SELECT * FROM messages WHERE {depth}author.login = '{}' ORDER BY post_time DESC LIMIT {limit} OFFSET {offset}",
        escape_literal(username)
    )
}

/// Build a query for the answers nested under one post, chronological order.
pub fn answers_query(post_id: &str, limit: usize, offset: usize) -> String {
    format!(
        "SELECT * FROM messages WHERE depth > 0 AND parent.id = '{}' ORDER BY post_time ASC LIMIT {limit} OFFSET {offset}",
        escape_literal(post_id)
    )
}

/// Build the tag-aggregation query for popular tags.
///
/// This is a `GROUP BY` projection rather than a row listing, so it takes
/// only a limit and no offset.
pub fn popular_tags_query(limit: usize) -> String {
    format!(
        "SELECT tags.text, COUNT(*) AS tag_count FROM messages WHERE depth = 0 AND tags.text IS NOT NULL GROUP BY tags.text ORDER BY tag_count DESC LIMIT {limit}"
    )
}
