use crate::prelude::*;
use communitytools_core::format::SearchEnvelope;
use communitytools_core::query::{ConversationStyle, SortOrder};

use super::{output_search, service, SortOrderArg, StyleArg};

#[derive(Debug, clap::Args, serde::Serialize, Clone)]
pub struct SearchOptions {
    /// Terms to search for in post subjects and bodies
    #[arg(value_name = "TERMS")]
    pub terms: String,

    /// Restrict results to posts carrying any of these tags
    #[arg(short, long, value_delimiter = ',', conflicts_with = "style")]
    pub tags: Vec<String>,

    /// Restrict results to one conversation style
    #[arg(long, value_enum)]
    pub style: Option<StyleArg>,

    /// Maximum number of results to return (1-100)
    #[arg(short, long, default_value_t = 25, value_parser = clap::value_parser!(u64).range(1..=100))]
    pub limit: u64,

    /// Number of results to skip (for pagination)
    #[arg(short, long, default_value_t = 0)]
    pub offset: u64,

    /// Sorting order by post date
    #[arg(long, value_enum, default_value = "desc")]
    pub sort_order: SortOrderArg,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: SearchOptions, global: crate::Global) -> Result<()> {
    let envelope = if options.tags.is_empty() {
        search_data(
            &options.terms,
            options.style.map(Into::into),
            options.limit as usize,
            options.offset as usize,
            options.sort_order.into(),
            &global,
        )
        .await?
    } else {
        search_tags_data(
            &options.terms,
            &options.tags,
            options.limit as usize,
            options.offset as usize,
            options.sort_order.into(),
            &global,
        )
        .await?
    };

    let heading = f!("Search results for \"{}\"", options.terms);
    output_search(&envelope, &heading, options.json)
}

/// Free-text search data, shared by the CLI and the MCP handlers.
pub async fn search_data(
    terms: &str,
    style: Option<ConversationStyle>,
    limit: usize,
    offset: usize,
    order: SortOrder,
    global: &crate::Global,
) -> Result<SearchEnvelope> {
    service(global)
        .search_posts(terms, style, limit, offset, order)
        .await
}

/// Tag-filtered search data, shared by the CLI and the MCP handlers.
pub async fn search_tags_data(
    terms: &str,
    tags: &[String],
    limit: usize,
    offset: usize,
    order: SortOrder,
    global: &crate::Global,
) -> Result<SearchEnvelope> {
    service(global)
        .search_by_tags(terms, tags, limit, offset, order)
        .await
}
