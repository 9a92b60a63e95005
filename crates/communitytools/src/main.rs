use crate::prelude::*;
use clap::Parser;

mod community;
mod error;
mod mcp;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Query tools for the Atlassian Community forums"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Override the community search API base URL
    #[clap(long, env = "COMMUNITY_API_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Expose the getPopularTags MCP tool. Off by default: the upstream
    /// aggregation endpoint intermittently answers 400.
    #[clap(
        long,
        env = "COMMUNITY_EXPOSE_POPULAR_TAGS",
        global = true,
        default_value = "false"
    )]
    expose_popular_tags: bool,

    /// Whether to display additional information.
    #[clap(
        long,
        env = "COMMUNITY_VERBOSE",
        global = true,
        default_value = "false"
    )]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Atlassian Community (community.atlassian.com) operations
    Community(crate::community::App),

    /// Model Context Protocol server
    MCP(crate::mcp::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Community(sub_app) => crate::community::run(sub_app, app.global).await,
        SubCommands::MCP(sub_app) => crate::mcp::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
