use crate::prelude::*;
use communitytools_core::format::SearchEnvelope;

use super::{output_search, service};

#[derive(Debug, clap::Args, serde::Serialize, Clone)]
pub struct UserOptions {
    /// Login name of the author
    #[arg(value_name = "USERNAME")]
    pub username: String,

    /// Also include answers (replies nested under other posts)
    #[arg(long)]
    pub include_answers: bool,

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

pub async fn run(options: UserOptions, global: crate::Global) -> Result<()> {
    let envelope = user_data(
        &options.username,
        options.include_answers,
        options.limit as usize,
        options.offset as usize,
        &global,
    )
    .await?;

    let heading = f!("Content by \"{}\"", options.username);
    output_search(&envelope, &heading, options.json)
}

/// By-user content data, shared by the CLI and the MCP handlers.
pub async fn user_data(
    username: &str,
    include_answers: bool,
    limit: usize,
    offset: usize,
    global: &crate::Global,
) -> Result<SearchEnvelope> {
    service(global)
        .content_by_user(username, include_answers, limit, offset)
        .await
}
