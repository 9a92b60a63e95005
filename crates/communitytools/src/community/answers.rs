use crate::prelude::*;
use communitytools_core::format::SearchEnvelope;

use super::{output_search, service};

#[derive(Debug, clap::Args, serde::Serialize, Clone)]
pub struct AnswersOptions {
    /// ID of the post to list answers for
    #[arg(value_name = "POST_ID")]
    pub post_id: String,

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

pub async fn run(options: AnswersOptions, global: crate::Global) -> Result<()> {
    let envelope = answers_data(
        &options.post_id,
        options.limit as usize,
        options.offset as usize,
        &global,
    )
    .await?;

    let heading = f!("Answers for post \"{}\"", options.post_id);
    output_search(&envelope, &heading, options.json)
}

/// Answers-for-post data, shared by the CLI and the MCP handlers.
pub async fn answers_data(
    post_id: &str,
    limit: usize,
    offset: usize,
    global: &crate::Global,
) -> Result<SearchEnvelope> {
    service(global).answers_for_post(post_id, limit, offset).await
}
