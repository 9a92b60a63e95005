use crate::prelude::*;
use communitytools_core::format::SearchEnvelope;
use communitytools_core::query::ConversationStyle;

use super::{output_search, service, StyleArg};

#[derive(Debug, clap::Args, serde::Serialize, Clone)]
pub struct RecentOptions {
    /// Only list posts carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Restrict results to one conversation style
    #[arg(long, value_enum)]
    pub style: Option<StyleArg>,

    /// Maximum number of results to return (1-100)
    #[arg(short, long, default_value_t = 25, value_parser = clap::value_parser!(u64).range(1..=100))]
    pub limit: u64,

    /// Number of results to skip (for pagination)
    #[arg(short, long, default_value_t = 0)]
    pub offset: u64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: RecentOptions, global: crate::Global) -> Result<()> {
    let envelope = recent_data(
        options.style.map(Into::into),
        options.tag.as_deref(),
        options.limit as usize,
        options.offset as usize,
        &global,
    )
    .await?;

    let heading = match &options.tag {
        Some(tag) => f!("Most recent posts tagged \"{tag}\""),
        None => "Most recent posts".to_string(),
    };
    output_search(&envelope, &heading, options.json)
}

/// Most-recent listing data, shared by the CLI and the MCP handlers.
pub async fn recent_data(
    style: Option<ConversationStyle>,
    tag: Option<&str>,
    limit: usize,
    offset: usize,
    global: &crate::Global,
) -> Result<SearchEnvelope> {
    service(global).recent_posts(style, tag, limit, offset).await
}
