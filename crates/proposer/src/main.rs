use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use proposer::cli::{Cli, Commands};
use proposer::handler;
use serde::Serialize;
use tracing::{Level, Subscriber, info};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt};

/// One line per event: local timestamp, padded level, target module, then the fields.
/// Span context is left out since the allocator logs from many concurrent tasks.
struct SimpleFmt;

impl<S, N> FormatEvent<S, N> for SimpleFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        // Timestamp with milliseconds
        write!(writer, "{} ", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))?;

        // Level, padded to five columns
        let level = event.metadata().level();
        match *level {
            Level::ERROR => write!(writer, "ERROR ")?,
            Level::WARN => write!(writer, "WARN  ")?,
            Level::INFO => write!(writer, "INFO  ")?,
            Level::DEBUG => write!(writer, "DEBUG ")?,
            Level::TRACE => write!(writer, "TRACE ")?,
        }

        // Full module path, e.g. flow::context
        write!(writer, "[{}] ", event.metadata().target())?;

        // Message and fields without span context
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn init_logging(log_level: &str) -> Result<()> {
    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // Logs go to stderr so stdout stays machine readable
    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(SimpleFmt)
        .with_ansi(false)
        .with_writer(std::io::stderr);

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = config::Config::from_env(cli.env_file.as_deref())?;
    info!(
        "Admin account {} with key indexes {:?} via {}",
        config.admin_address, config.admin_key_indexes, config.access_api_host
    );
    let (ctx, account) = handler::build(&config)?;

    match cli.command {
        Commands::ProposalKeys { count } => {
            for key in handler::proposal_keys(&ctx, &account, count).await? {
                print_json(&key)?;
            }
        }
        Commands::Sign { message, hex } => {
            print_json(&handler::sign(&account, &message, hex)?)?;
        }
        Commands::Keys => {
            for report in handler::keys(&ctx, &account).await? {
                print_json(&report)?;
            }
        }
    }

    Ok(())
}
