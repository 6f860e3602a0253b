use clap::Parser as ClapParser;
use journey_log::{Error, JsonLinesCodec, Level, RecordKind};
use std::path::PathBuf;
use tokio::fs::File;
use tokio_stream::StreamExt;
use tracing::error;

/// Async reader for durable journey logs
#[derive(Debug, clap::Parser)]
struct Opts {
    /// Only print records at least this severe
    #[clap(long, default_value = "debug")]
    pub level: Level,

    /// A combined.log or error.log file
    pub log: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let opts = Opts::parse();

    let log = File::open(&opts.log).await?;

    let mut reader = tokio_util::codec::FramedRead::new(log, JsonLinesCodec::new());

    let mut counts = [0usize; 3];
    while let Some(value) = reader.next().await {
        let record = match value {
            Ok(r) => r,
            Err(e) => {
                error!("{e}");
                break;
            }
        };

        let level = record
            .get("level")
            .and_then(|l| l.as_str())
            .and_then(|l| l.parse::<Level>().ok())
            .unwrap_or_default();
        if !level.enabled_at(opts.level) {
            continue;
        }
        counts[RecordKind::from(level) as usize] += 1;

        let field = |k: &str| record.get(k).and_then(|v| v.as_str()).unwrap_or("-");
        println!(
            "{} {:<5} {:<11} {:<24} {}",
            field("timestamp"),
            level,
            field("step"),
            field("operation"),
            field("userId"),
        );
    }

    println!(
        "{} events, {} warnings, {} errors",
        counts[0], counts[1], counts[2]
    );

    Ok(())
}
