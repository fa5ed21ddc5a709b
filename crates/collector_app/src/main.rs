mod config;
mod logging;
mod replay;

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use collector_engine::{EngineHandle, FileBlobStore, StreamEngine};
use collector_logging::collector_info;

use crate::config::AppConfig;

const USAGE: &str = "usage: collector_app <transcript.jsonl> [--config <file.ron>]";
const DEFAULT_CONFIG: &str = "collector.ron";

struct Args {
    transcript: PathBuf,
    config: PathBuf,
}

fn parse_args() -> Result<Args> {
    let mut transcript = None;
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config = args.next().map(PathBuf::from).context(USAGE)?;
            }
            "-h" | "--help" => bail!(USAGE),
            _ if transcript.is_none() => transcript = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument {arg:?}\n{USAGE}"),
        }
    }
    Ok(Args {
        transcript: transcript.context(USAGE)?,
        config,
    })
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let config = AppConfig::load(&args.config)?;
    logging::initialize(
        config.log_destination,
        config.level_filter()?,
        &config.log_file,
    );

    let text = fs::read_to_string(&args.transcript)
        .with_context(|| format!("failed to read transcript {}", args.transcript.display()))?;
    let messages = replay::parse_transcript(&text)?;

    let blobs = FileBlobStore::new(&config.data_dir);
    let mut engine = StreamEngine::new(config.engine_config(), Box::new(blobs));
    replay::register_builtin_commands(&mut engine);
    let handle = EngineHandle::spawn(engine);

    collector_info!(
        "Replaying {} messages from {}",
        messages.len(),
        args.transcript.display()
    );
    let packages = replay::replay(&handle, &messages);
    let events = handle.shutdown();

    print!("{}", replay::render_summary(&packages, &events));
    Ok(())
}
