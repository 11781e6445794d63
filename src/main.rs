use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use cardocr::{
    scan_stream, Assembly, CardScanner, DebugDirObserver, FrameSource, ImageFileSource,
    MjpegStream, NoopObserver, ScanConfig, StageObserver,
};

#[derive(Parser)]
#[command(name = "cardocr")]
#[command(about = "Read payment card numbers from images or a phone camera stream")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE", required_unless_present = "stream")]
    image_path: Option<PathBuf>,

    /// Read frames from a network camera, as HOST or HOST:PORT
    #[arg(long, value_name = "HOST[:PORT]", conflicts_with = "image_path")]
    stream: Option<String>,

    /// Reference image with the digits 0-9 from left to right
    #[arg(long, value_name = "PATH")]
    reference: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Search the still image for the card outline first
    #[arg(long)]
    locate_card: bool,

    /// Give up after this many streamed frames
    #[arg(long, value_name = "N")]
    max_frames: Option<usize>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if let Some(reference) = &args.reference {
        config.reference_path = reference.clone();
    }
    if let Some(stream) = &args.stream {
        apply_stream_address(&mut config, stream)?;
    }

    let scanner = CardScanner::new(config)?;

    let mut observer: Box<dyn StageObserver> = match args.debug_out {
        Some(dir) => Box::new(DebugDirObserver::new(dir)?),
        None => Box::new(NoopObserver),
    };

    let (mut source, locate_card): (Box<dyn FrameSource>, bool) = match &args.image_path {
        Some(path) => {
            log::info!("Loading image: {}", path.display());
            (Box::new(ImageFileSource::new(path)), args.locate_card)
        }
        None => (Box::new(MjpegStream::connect(&scanner.config().stream)?), true),
    };

    let assembly = scan_stream(
        &scanner,
        source.as_mut(),
        locate_card,
        args.max_frames,
        observer.as_mut(),
    )?;

    Ok(report(&assembly))
}

fn apply_stream_address(config: &mut ScanConfig, address: &str) -> anyhow::Result<()> {
    match address.rsplit_once(':') {
        Some((host, port)) => {
            config.stream.host = host.to_string();
            config.stream.port = port
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid stream port '{}': {}", port, e))?;
        }
        None => config.stream.host = address.to_string(),
    }
    Ok(())
}

fn report(assembly: &Assembly) -> ExitCode {
    match assembly {
        Assembly::Recognized(reading) => {
            println!("Card Type: {}", reading.network);
            println!("Card Number: {}", reading.digits);
            ExitCode::SUCCESS
        }
        Assembly::UnrecognizedNetwork { digits, leading } => {
            println!("Card Type: unrecognized ({})", leading);
            println!("Card Number: {}", digits);
            ExitCode::SUCCESS
        }
        Assembly::NotFound => {
            println!("No card number found");
            ExitCode::FAILURE
        }
    }
}
