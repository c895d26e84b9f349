//! Headless log viewer.
//!
//! Resolves the available months for a channel/user pair and prints one
//! month of chat as plain text.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use log_viewer_lib::render::{emote_links, format_line};
use logs_client::instance::INSTANCE_PARAM;
use logs_client::{Location, LogPeriod, LogsError, latest_period, text_log_url};

/// Browse archived chat logs for a channel/user pair.
#[derive(Parser)]
#[command(name = "log-viewer")]
#[command(version)]
struct Cli {
    /// Channel name or `id:<digits>`.
    #[arg(required_unless_present = "channels")]
    channel: Option<String>,

    /// Username or `id:<digits>`.
    #[arg(required_unless_present = "channels")]
    username: Option<String>,

    /// Print the archive's logged channels and exit.
    #[arg(long, conflicts_with = "list")]
    channels: bool,

    /// Year to show; defaults to the most recent month with logs.
    #[arg(long, requires = "month")]
    year: Option<String>,

    /// Month to show (1-12).
    #[arg(long, requires = "year")]
    month: Option<String>,

    /// Archive instance to fetch messages from.
    #[arg(long)]
    instance: Option<String>,

    /// Oldest message first.
    #[arg(long)]
    ascending: bool,

    /// Print the available months and exit.
    #[arg(long)]
    list: bool,

    /// Print decoded messages as JSON lines.
    #[arg(long)]
    json: bool,

    /// Follow each line with the image URL of every emote it uses.
    #[arg(long, value_name = "SCALE", num_args = 0..=1, default_missing_value = "1.0")]
    emote_links: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut location = Location::default();
    if let Some(instance) = &cli.instance {
        location.replace(INSTANCE_PARAM, instance);
    }
    let state = log_viewer_lib::init_foundation(location)?;
    if cli.ascending {
        state.update_settings(|s| s.new_on_bottom = true).await;
    }
    let client = state.client();

    if cli.channels {
        for channel in client.fetch_channels().await? {
            println!("{}\tid:{}", channel.name, channel.user_id);
        }
        return Ok(());
    }

    let (Some(channel), Some(username)) = (cli.channel, cli.username) else {
        anyhow::bail!("a channel and a username are required");
    };
    state.select(&channel, &username).await;

    let periods = match client
        .fetch_periods(Some(channel.as_str()), Some(username.as_str()))
        .await
    {
        Ok(periods) => periods,
        Err(LogsError::OptedOut) => {
            anyhow::bail!("{username} has opted out of being logged");
        }
        Err(e) => return Err(e.into()),
    };

    if cli.list {
        for period in &periods {
            println!("{}/{}", period.year, period.month);
        }
        return Ok(());
    }

    let period = match (cli.year, cli.month) {
        (Some(year), Some(month)) => LogPeriod::new(year, month),
        _ => match latest_period(&periods) {
            Some(period) => period.clone(),
            None => {
                println!("No logs found");
                return Ok(());
            }
        },
    };

    let settings = state.settings().await.clone();
    let base = client.session().current_base().await;
    let txt = text_log_url(&base, &channel, &username, &period.year, &period.month)?;
    tracing::info!(%txt, "Plain-text log");

    let messages = state
        .month(&channel, &username, &period.year, &period.month)
        .await;

    if messages.is_empty() {
        println!("No logs found for {}/{}", period.year, period.month);
        return Ok(());
    }

    for msg in messages.iter() {
        if cli.json {
            println!("{}", serde_json::to_string(msg)?);
            continue;
        }
        println!("{}", format_line(msg, &settings));
        if let Some(scale) = cli.emote_links.as_deref().filter(|_| settings.show_emotes) {
            for link in emote_links(msg, scale) {
                println!("    {link}");
            }
        }
    }

    Ok(())
}
