use clap::{Parser, Subcommand};
use imgparity::fetch::{Fetcher, HttpFetcher};
use imgparity::imaging::{self, FilterKind, OutputStrategy, RustBackend, TransformRequest};
use imgparity::{config, output, search};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "imgparity")]
#[command(about = "Match image quality across delivery pipelines, and resize images")]
#[command(long_about = "\
Match image quality across delivery pipelines, and resize images

search:
  For every configured image and size, fetch the reference rendition once,
  then bisect the candidate pipeline's quality setting (1-100, at most 7
  requests) for the output whose byte size is closest.

    reference: {reference_base}{image}?tr=h-{height},w-{width}
    candidate: {candidate_base}/{width}x{height}/filters:quality({q}){image}

transform:
  Resize one image the way a url/w/h/q front end would:
    -w and -H   scale to cover, then center-crop to exactly WxH
    -w only     scale proportionally to width W
    -H only     scale proportionally to height H
    neither     re-encode unchanged

Run 'imgparity gen-config' to generate a documented imgparity.toml.")]
#[command(version)]
struct Cli {
    /// Config file (stock defaults are used when it does not exist)
    #[arg(long, default_value = "imgparity.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find the candidate quality matching the reference for every image and size
    Search {
        /// Print results as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Resize and re-encode a single image
    #[command(allow_negative_numbers = true)]
    Transform {
        /// Local path or http(s) URL of the source image
        source: String,
        /// Target width (0 = unset)
        #[arg(short = 'w', long, default_value_t = 0)]
        width: i64,
        /// Target height (0 = unset)
        #[arg(short = 'H', long, default_value_t = 0)]
        height: i64,
        /// Encoding quality (defaults to transform.quality from config)
        #[arg(short, long)]
        quality: Option<i32>,
        /// Resampling filter, overrides config
        #[arg(long)]
        filter: Option<FilterKind>,
        /// Output strategy, overrides config
        #[arg(long)]
        strategy: Option<OutputStrategy>,
        /// Where to write the encoded image
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a stock imgparity.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Search { json } => {
            let config = config::load_config(&cli.config)?;
            let jobs = config.search.jobs();
            if jobs.is_empty() {
                return Err(format!(
                    "no images configured: add paths to search.images in {}",
                    cli.config.display()
                )
                .into());
            }
            let fetcher = HttpFetcher::new(&config.fetch)?;

            if json {
                let outcomes =
                    search::run_batch(&fetcher, jobs, config.search.max_concurrency, None)?;
                output::print_search_json(&outcomes)?;
            } else {
                // Result blocks stream as jobs complete; the summary follows.
                let (tx, rx) = std::sync::mpsc::channel();
                let printer = std::thread::spawn(move || {
                    for event in rx {
                        for line in output::format_search_event(&event) {
                            println!("{}", line);
                        }
                    }
                });
                let outcomes =
                    search::run_batch(&fetcher, jobs, config.search.max_concurrency, Some(tx))?;
                printer
                    .join()
                    .map_err(|_| "progress printer thread panicked")?;
                output::print_search_summary(&outcomes);
            }
        }
        Command::Transform {
            source,
            width,
            height,
            quality,
            filter,
            strategy,
            output: output_path,
        } => {
            let config = config::load_config(&cli.config)?;
            let mut transform_config = config.transform;
            if let Some(filter) = filter {
                transform_config.filter = filter;
            }
            if let Some(strategy) = strategy {
                transform_config.strategy = strategy;
            }

            let bytes = read_source(&source, &config.fetch)?;
            let mut request = TransformRequest::new(width, height);
            if let Some(q) = quality {
                request = request.with_quality(q);
            }

            let result =
                imaging::transform_bytes(&RustBackend::new(), &bytes, &request, &transform_config)?;
            std::fs::write(&output_path, &result.bytes)?;
            output::print_transform_summary(&output_path, &result, &transform_config);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Read source bytes from an http(s) URL or a local file.
fn read_source(
    source: &str,
    fetch: &config::FetchConfig,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        Ok(HttpFetcher::new(fetch)?.fetch(source)?)
    } else {
        Ok(std::fs::read(Path::new(source))?)
    }
}

/// Log to stderr so stdout stays the report. `RUST_LOG` overrides the level.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
