use crate::prelude::*;
use communitytools_core::format::TagsEnvelope;

use super::{output_tags, service};

#[derive(Debug, clap::Args, serde::Serialize, Clone)]
pub struct TagsOptions {
    /// Maximum number of tags to return (1-100)
    #[arg(short, long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..=100))]
    pub limit: u64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: TagsOptions, global: crate::Global) -> Result<()> {
    let envelope = tags_data(options.limit as usize, &global).await?;
    output_tags(&envelope, options.json)
}

/// Popular-tags aggregation data, shared by the CLI and the MCP handlers.
pub async fn tags_data(limit: usize, global: &crate::Global) -> Result<TagsEnvelope> {
    service(global).popular_tags(limit).await
}
