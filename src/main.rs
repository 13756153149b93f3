//! Binary entrypoint for the threadrelay CLI.
//!
//! Commands:
//! - `start [--bind <addr>]` - register the webhook and serve it
//! - `init` - create a starter `config.toml` and default topic table
//! - `status` - print topic table summary without starting the bot
//!
//! See the library crate docs for module-level details: `threadrelay::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use threadrelay::config::Config;
use threadrelay::relay::RelayServer;
use threadrelay::storage::{Topic, TopicStore};
use threadrelay::telegram::BotClient;

#[derive(Parser)]
#[command(name = "threadrelay")]
#[command(about = "Keyword-routing relay bot for channel posts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay bot
    Start {
        /// Webhook listener bind address
        #[arg(short, long, default_value = "0.0.0.0:3000")]
        bind: String,
    },
    /// Initialize a new configuration and starter topic table
    Init,
    /// Show topic table status without starting the bot
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config early to configure logging (except for Init which writes it later)
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start { bind } => {
            let mut config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            config.apply_env()?;
            config.validate()?;
            info!("Starting threadrelay v{}", env!("CARGO_PKG_VERSION"));

            let api = BotClient::new(&config.bot.token);
            let server = RelayServer::new(config, api).await?;
            server.run(&bind).await?;
        }
        Commands::Init => {
            info!("Initializing new relay configuration");
            let config = Config::default();
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);

            // Starter topic table with the well-known broadcast-test topic.
            let mut store = TopicStore::new(&config.storage.topics_file);
            store.insert_topic(
                "gift",
                Topic {
                    thread_id: 42,
                    keywords: vec!["promo".to_string(), "sale".to_string()],
                },
            );
            store.save().await?;
            info!("Starter topic table written to {}", config.storage.topics_file);
        }
        Commands::Status => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            let mut store = TopicStore::new(&config.storage.topics_file);
            match store.load().await {
                Ok(()) => {
                    let (topics, keywords) = store.stats();
                    println!("Topic table: {}", config.storage.topics_file);
                    println!("  Topics:   {}", topics);
                    println!("  Keywords: {}", keywords);
                    for (name, topic) in store.topics() {
                        println!(
                            "  - {} -> thread {} ({} keywords)",
                            name,
                            topic.thread_id,
                            topic.keywords.len()
                        );
                    }
                }
                Err(e) => println!("Topic table unavailable: {}", e),
            }
            println!("Admins: {}", config.bot.admin_ids.len());
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // Base level from CLI verbosity overrides config
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| match c.logging.level.as_str() {
                "trace" => log::LevelFilter::Trace,
                "debug" => log::LevelFilter::Debug,
                "warn" => log::LevelFilter::Warn,
                "error" => log::LevelFilter::Error,
                _ => log::LevelFilter::Info,
            })
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config.as_ref().and_then(|c| c.logging.file.clone());
    if let Some(file) = log_file {
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
        {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        } else {
            builder.format(default_format);
        }
    } else {
        builder.format(default_format);
    }
    let _ = builder.try_init();
}

fn default_format(
    fmt: &mut env_logger::fmt::Formatter,
    record: &log::Record<'_>,
) -> std::io::Result<()> {
    use std::io::Write;
    writeln!(
        fmt,
        "{} [{}] {}",
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
        record.level(),
        record.args()
    )
}
