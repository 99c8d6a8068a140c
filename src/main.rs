use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use news_updater::{
    api::{ApiLevel, CliUpdater, WebUpdater},
    config::{Config, LogLevel, Mode, Target},
    scheduling::UpdateRunner,
};

#[derive(Parser)]
#[command(name = "news-updater", version)]
#[command(about = "Updates the feeds of a News installation in parallel")]
struct Cli {
    /// How many feeds should be fetched in parallel, defaults to 10
    #[arg(short, long)]
    threads: Option<usize>,

    /// Maximum number of seconds for updating a feed, defaults to 5
    /// minutes; 0 disables the limit
    #[arg(short = 's', long)]
    timeout: Option<u64>,

    /// Update interval between fetching the next round of updates in
    /// seconds, defaults to 15 minutes. The update run time is subtracted
    /// from the interval
    #[arg(short, long)]
    interval: Option<u64>,

    /// API level. Use v2 for News 9.0.0 or greater, v15 for News 15.0.0 or
    /// greater, v1-2 for older versions
    #[arg(short, long)]
    apilevel: Option<ApiLevel>,

    /// Log granularity: info logs all commands and received payloads,
    /// error only logs failures
    #[arg(short, long)]
    loglevel: Option<LogLevel>,

    /// Path to a config file defining the same keys in an [updater] table
    #[arg(short, long)]
    config: Option<String>,

    /// Custom absolute path to the php.ini file to use for the console
    /// updater. If omitted, the default one is used
    #[arg(short = 'P', long)]
    phpini: Option<String>,

    /// Admin username. Must be given on the command line or in the config
    /// file when updating over HTTP
    #[arg(short, long)]
    user: Option<String>,

    /// Admin password when updating over HTTP
    #[arg(short, long)]
    password: Option<String>,

    /// endless runs the update again after the configured interval,
    /// singlerun executes the update only once
    #[arg(short, long)]
    mode: Option<Mode>,

    /// The URL or absolute path of the News installation. URLs starting
    /// with http:// or https:// use the HTTP API and require a user and
    /// password; otherwise the console API is used
    url: Option<String>,
}

fn init_logging(loglevel: LogLevel) {
    let default_filter = match loglevel {
        LogLevel::Info => "news_updater=info",
        LogLevel::Error => "news_updater=error",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    // command line arguments override config file values
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(timeout) = args.timeout {
        config.timeout = timeout;
    }
    if let Some(interval) = args.interval {
        config.interval = interval;
    }
    if let Some(apilevel) = args.apilevel {
        config.apilevel = apilevel;
    }
    if let Some(loglevel) = args.loglevel {
        config.loglevel = loglevel;
    }
    if let Some(phpini) = args.phpini {
        config.phpini = Some(phpini);
    }
    if let Some(user) = args.user {
        config.user = Some(user);
    }
    if let Some(password) = args.password {
        config.password = password;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(url) = args.url {
        config.url = Some(url);
    }

    let target = match config.validate() {
        Ok(target) => target,
        Err(messages) => {
            for message in &messages {
                eprintln!("Error: {message}");
            }
            eprintln!();
            eprintln!("{}", Cli::command().render_help());
            std::process::exit(1);
        }
    };

    init_logging(config.loglevel);
    info!("Starting news updater v{}", env!("CARGO_PKG_VERSION"));

    match target {
        Target::Web {
            base_url,
            user,
            password,
        } => {
            let api = Arc::new(WebUpdater::new(
                &base_url,
                &user,
                &password,
                config.apilevel,
                config.timeout,
            )?);
            UpdateRunner::new(&config, api.clone(), api).run().await;
        }
        Target::Console { directory, phpini } => {
            let api = Arc::new(CliUpdater::new(
                &directory,
                phpini.as_deref(),
                config.apilevel,
                config.timeout,
            ));
            UpdateRunner::new(&config, api.clone(), api).run().await;
        }
    }

    Ok(())
}
