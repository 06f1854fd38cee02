use clap::{Parser, Subcommand};
use frame_mark::assets::AssetPaths;
use frame_mark::batch::{self, BatchWorker};
use frame_mark::config::{self, RunConfig};
use frame_mark::imaging::{FontBook, RustBackend};
use frame_mark::logos::LogoResolver;
use frame_mark::{metadata, output};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// `run` flags; each one overrides the config file.
#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Directory of source JPEGs
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Directory for framed copies (created if missing)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Config file layered over the stock defaults
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Draw a white frame around the photo
    #[arg(long, overrides_with = "no_frame")]
    frame: bool,

    /// Only add the band below the photo
    #[arg(long, overrides_with = "frame")]
    no_frame: bool,

    /// Collapse empty text slots instead of reserving their row
    #[arg(long)]
    auto_align: bool,

    /// Border thickness as a fraction of the longer edge
    #[arg(long)]
    border_ratio: Option<f64>,

    /// Logo key to force on every image, or "Auto" to match by make
    #[arg(long)]
    logo: Option<String>,

    /// JPEG quality, 1-100
    #[arg(long)]
    quality: Option<u32>,
}

#[derive(Parser)]
#[command(name = "frame-mark")]
#[command(about = "Batch-frame photos with an EXIF information band")]
#[command(long_about = "\
Batch-frame photos with an EXIF information band

Every JPEG in the input directory is copied to the output directory with a
white band underneath showing camera model, lens, exposure and capture time,
plus the brand logo matched from the camera make.

Assets are looked up next to the executable (or under --assets):

  logos/                 # Canon.png, Nikon.png, FUJIFILM.png, ...
  font/                  # .ttf/.otf faces of the configured family

Text slots (defaults):

  left_top:     camera model        right_top:     exposure summary
  left_bottom:  lens model          right_bottom:  capture time

Run 'frame-mark gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Asset root holding logos/ and font/
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Frame every JPEG of the input directory
    Run(RunArgs),
    /// Show the metadata and slot text of one image
    Inspect {
        /// Image to inspect
        file: PathBuf,

        /// Config file whose text slots to render
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Print the metadata record as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the available logos in match order
    Logos,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => {
            let assets = AssetPaths::resolve(cli.assets.as_deref())?;
            let config = run_config(&args)?;
            run(config, &assets)?;
        }
        Command::Inspect { file, config, json } => {
            let bytes = std::fs::read(&file)?;
            let record = metadata::decode(&bytes)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
                return Ok(());
            }
            let config = config::load_config(config.as_deref())?;
            let assets = AssetPaths::resolve(cli.assets.as_deref())?;
            let logos = load_logos(&assets.logos);
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            output::print_inspect(
                &name,
                &record,
                logos.resolve(&config.logo, &record.make),
                &config.text,
            );
        }
        Command::Logos => {
            let assets = AssetPaths::resolve(cli.assets.as_deref())?;
            let logos = LogoResolver::from_dir(&assets.logos)?;
            output::print_logos(&logos, &assets.logos);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so progress lines on stdout stay clean. `RUST_LOG` wins
/// over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file (or stock defaults) with command-line overrides applied.
fn run_config(args: &RunArgs) -> Result<RunConfig, config::ConfigError> {
    let mut config = config::load_config(args.config.as_deref())?;
    if let Some(input) = &args.input {
        config.input_dir = input.clone();
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if args.frame {
        config.add_frame = true;
    }
    if args.no_frame {
        config.add_frame = false;
    }
    if args.auto_align {
        config.auto_align = true;
    }
    if let Some(ratio) = args.border_ratio {
        config.border_ratio = ratio;
    }
    if let Some(logo) = &args.logo {
        config.logo = logo.clone();
    }
    if let Some(quality) = args.quality {
        config.quality = quality;
    }
    config.validate()?;
    Ok(config)
}

fn run(config: RunConfig, assets: &AssetPaths) -> Result<(), Box<dyn std::error::Error>> {
    let backend = Arc::new(RustBackend::new(FontBook::load(&assets.fonts, &config.font)));
    let mut worker = BatchWorker::new(backend, assets.logos.clone());

    let input = config.input_dir.clone();
    let output_dir = config.output_dir.clone();

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_progress_event(&event);
        }
    });

    let count = worker.init(config, batch::channel_callback(tx))?;
    for line in output::format_run_header(count, &input, &output_dir) {
        println!("{}", line);
    }
    worker.start()?;
    let result = worker.wait()?;
    worker.clean()?;
    // The callback (and its sender) went away with the finished run.
    drop(worker);
    printer
        .join()
        .map_err(|_| "progress printer panicked")?;

    output::print_summary(&result, &output_dir);
    Ok(())
}

/// Logos for `inspect`; a missing directory just means no logo.
fn load_logos(dir: &Path) -> LogoResolver {
    LogoResolver::from_dir(dir).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "logos unavailable");
        LogoResolver::default()
    })
}
