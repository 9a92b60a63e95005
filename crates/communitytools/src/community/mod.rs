use crate::prelude::{eprintln, println, *};
use colored::Colorize;

use communitytools_core::format::{SearchEnvelope, TagsEnvelope};
use communitytools_core::query::{ConversationStyle, SortOrder};

pub mod answers;
pub mod recent;
pub mod search;
pub mod service;
pub mod tags;
pub mod top;
pub mod user;

pub use service::{CommunityService, ConsoleObserver, Executor, RequestObserver};

/// Fixed search endpoint of the Atlassian Community forums.
const API_BASE_URL: &str = "https://community.atlassian.com/forums/s/api/2.0/search";

#[derive(Debug, clap::Parser)]
#[command(name = "community")]
#[command(about = "Atlassian Community (community.atlassian.com) operations")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Search community posts by free-text terms, optionally tag-filtered
    #[clap(name = "search")]
    Search(search::SearchOptions),

    /// List the most recent posts
    #[clap(name = "recent")]
    Recent(recent::RecentOptions),

    /// Top posts by view count for a tag
    #[clap(name = "top")]
    Top(top::TopOptions),

    /// Posts (and optionally answers) by a specific user
    #[clap(name = "user")]
    User(user::UserOptions),

    /// Answers nested under a specific post
    #[clap(name = "answers")]
    Answers(answers::AnswersOptions),

    /// Most popular tags by post count
    #[clap(name = "tags")]
    Tags(tags::TagsOptions),
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Community API Base: {}", api_base(&global));
        println!();
    }

    match app.command {
        Commands::Search(options) => search::run(options, global).await,
        Commands::Recent(options) => recent::run(options, global).await,
        Commands::Top(options) => top::run(options, global).await,
        Commands::User(options) => user::run(options, global).await,
        Commands::Answers(options) => answers::run(options, global).await,
        Commands::Tags(options) => tags::run(options, global).await,
    }
}

pub fn api_base(global: &crate::Global) -> String {
    global
        .base_url
        .clone()
        .unwrap_or_else(|| API_BASE_URL.to_string())
}

/// Production [`Executor`]: URL-encode the query onto the search endpoint,
/// GET it, fail on non-success status.
pub struct ApiExecutor {
    client: reqwest::Client,
    base_url: String,
    verbose: bool,
}

impl ApiExecutor {
    pub fn new(base_url: String, verbose: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            verbose,
        }
    }
}

impl Executor for ApiExecutor {
    async fn execute(&self, query: &str, label: &str) -> Result<serde_json::Value> {
        let url = f!("{}?q={}", self.base_url, urlencoding::encode(query));

        if self.verbose {
            eprintln!("==== API REQUEST ==== [{label}] {url}");
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::ApiStatus(response.status().as_u16()).into());
        }

        response
            .json()
            .await
            .map_err(|e| Error::Network(e.to_string()).into())
    }
}

/// Build the query service for one invocation: production executor, with a
/// console observer attached when `--verbose` is set.
pub fn service(global: &crate::Global) -> CommunityService<ApiExecutor> {
    let executor = ApiExecutor::new(api_base(global), global.verbose);
    let service = CommunityService::new(executor);
    if global.verbose {
        service.with_observer(Box::new(ConsoleObserver))
    } else {
        service
    }
}

/// CLI-facing sort order, mapped onto the core type.
#[derive(Debug, Clone, Copy, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrderArg {
    Asc,
    Desc,
}

impl From<SortOrderArg> for SortOrder {
    fn from(arg: SortOrderArg) -> Self {
        match arg {
            SortOrderArg::Asc => SortOrder::Asc,
            SortOrderArg::Desc => SortOrder::Desc,
        }
    }
}

/// CLI-facing conversation style filter, mapped onto the core type.
#[derive(Debug, Clone, Copy, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleArg {
    Qanda,
    Blog,
}

impl From<StyleArg> for ConversationStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Qanda => ConversationStyle::QandA,
            StyleArg::Blog => ConversationStyle::Blog,
        }
    }
}

/// Render a search envelope as colored text for terminal output.
pub fn format_search_text(envelope: &SearchEnvelope, heading: &str) -> String {
    let mut result = String::new();

    result.push_str(&f!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&f!("{}\n", heading.to_uppercase().bright_cyan().bold()));
    result.push_str(&f!("{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&f!("\n{}\n", envelope.message.bright_white()));

    if !envelope.success {
        return result;
    }

    for (idx, item) in envelope.items.iter().enumerate() {
        let number = envelope.pagination.start_index + idx + 1;
        result.push_str(&f!(
            "\n{} {}\n",
            f!("[{number}]").yellow().bold(),
            item.title.white().bold()
        ));
        result.push_str(&f!(
            "    {}: {} | {}: {} | {}: {} | {}: {}\n",
            "By".green(),
            item.author.bright_white(),
            "Posted".green(),
            item.post_date.bright_black(),
            "Views".green(),
            item.view_count.to_string().bright_yellow(),
            "Replies".green(),
            item.reply_count.to_string().bright_magenta(),
        ));
        result.push_str(&f!(
            "    {}: {} | {}: {}\n",
            "Type".green(),
            item.content_type.bright_white(),
            "Solved".green(),
            if item.has_accepted_solution {
                "yes".bright_green()
            } else {
                "no".bright_black()
            },
        ));
        result.push_str(&f!(
            "    {}: {}\n",
            "Tags".green(),
            item.tags.bright_white()
        ));
        result.push_str(&f!(
            "    {}: {}\n",
            "Link".green(),
            item.community_link.cyan().underline()
        ));
        if !item.excerpt.is_empty() {
            result.push_str(&f!("    {}\n", item.excerpt.bright_black()));
        }
    }

    result.push_str(&f!(
        "\n{} {} {} {} ({} {})\n",
        "Showing page".bright_white(),
        envelope
            .pagination
            .current_page
            .to_string()
            .bright_cyan()
            .bold(),
        "of".bright_white(),
        envelope
            .pagination
            .total_pages
            .to_string()
            .bright_cyan()
            .bold(),
        envelope.pagination.total.to_string().bright_cyan().bold(),
        "total results".bright_white(),
    ));
    result.push_str(&f!("\n{}\n", envelope.tip.bright_black()));
    result
}

/// Render a tags envelope as colored text for terminal output.
pub fn format_tags_text(envelope: &TagsEnvelope) -> String {
    let mut result = String::new();

    result.push_str(&f!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&f!("{}\n", "POPULAR TAGS".bright_cyan().bold()));
    result.push_str(&f!("{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&f!("\n{}\n", envelope.message.bright_white()));

    if envelope.success {
        for (idx, tag) in envelope.tags.iter().enumerate() {
            result.push_str(&f!(
                "\n{} {} ({} {})",
                f!("[{}]", idx + 1).yellow().bold(),
                tag.name.white().bold(),
                tag.count.to_string().bright_yellow(),
                "posts".bright_white(),
            ));
        }
        result.push('\n');
    }

    result.push_str(&f!("\n{}\n", envelope.tip.bright_black()));
    result
}

/// Print an envelope either as pretty JSON or as colored text.
pub fn output_search(envelope: &SearchEnvelope, heading: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(envelope)?);
    } else {
        print!("{}", format_search_text(envelope, heading));
    }
    Ok(())
}

pub fn output_tags(envelope: &TagsEnvelope, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(envelope)?);
    } else {
        print!("{}", format_tags_text(envelope));
    }
    Ok(())
}
