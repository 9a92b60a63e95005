use crate::prelude::*;
use communitytools_core::format::SearchEnvelope;

use super::{output_search, service};

#[derive(Debug, clap::Args, serde::Serialize, Clone)]
pub struct TopOptions {
    /// Tag to rank posts for
    #[arg(value_name = "TAG")]
    pub tag: String,

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

pub async fn run(options: TopOptions, global: crate::Global) -> Result<()> {
    let envelope = top_data(
        &options.tag,
        options.limit as usize,
        options.offset as usize,
        &global,
    )
    .await?;

    let heading = f!("Top posts by views for \"{}\"", options.tag);
    output_search(&envelope, &heading, options.json)
}

/// Top-by-views data, shared by the CLI and the MCP handlers.
pub async fn top_data(
    tag: &str,
    limit: usize,
    offset: usize,
    global: &crate::Global,
) -> Result<SearchEnvelope> {
    service(global).top_posts_by_views(tag, limit, offset).await
}
