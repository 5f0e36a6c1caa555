//! Main entry point for the tubefetch CLI

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tubefetch::cli::{Args, OutputFormatter};
use tubefetch::core::{Action, Downloader, Mode};
use tubefetch::error::FetchError;
use tubefetch::platform::ytdlp::YtDlpConfig;
use tubefetch::platform::{FfmpegTranscoder, MediaResolver, Transcoder, YtDlpResolver};

const EXIT_USAGE: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version land here too, with exit code 0
            let _ = e.print();
            return ExitCode::from(e.exit_code().clamp(0, 255) as u8);
        }
    };

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let formatter = Arc::new(OutputFormatter::new(
        args.verbosity_level(),
        !args.no_progress,
    ));

    tokio::select! {
        result = run(&args, formatter.clone()) => match result {
            Ok(code) => code,
            Err(e) => {
                formatter.clear();
                formatter.error(&format!("{:#}", e));
                exit_code_for(&e)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            formatter.clear();
            formatter.error("Interrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}

async fn run(args: &Args, formatter: Arc<OutputFormatter>) -> Result<ExitCode> {
    let request = args.to_request()?;
    info!("Starting tubefetch with args: {:?}", args);

    if args.playlist_flag_ignored() {
        warn!("--playlist given for a non-playlist URL");
        formatter.warning("URL is not a playlist; downloading a single video");
    }

    let resolver = YtDlpResolver::with_config(YtDlpConfig {
        binary: args.yt_dlp.clone(),
        socket_timeout: args.timeout_duration(),
        ..YtDlpConfig::default()
    })?;
    resolver.check_available().await?;

    let transcoder = FfmpegTranscoder::new().with_binary(args.ffmpeg.clone());
    if request.mode() == Mode::AudioOnly && request.action() == Action::Download {
        transcoder.check_available().await?;
    }

    let events = formatter.clone();
    let downloader = Downloader::new(Arc::new(resolver), Arc::new(transcoder))
        .with_request(&request)
        .with_playlist_delay(args.delay_duration())
        .with_playlist_limit(args.playlist_limit())
        .with_max_retries(args.retries)
        .with_events(move |event| events.handle_event(event));
    debug!("Download options: {:?}", downloader.options());

    let start_time = Instant::now();
    match (request.action(), request.is_playlist()) {
        (Action::ListQualities, _) => {
            let item = downloader.list_qualities(request.url()).await?;
            formatter.print_quality_table(&item);
            Ok(ExitCode::SUCCESS)
        }
        (Action::Download, true) => {
            let summary = downloader.download_playlist(request.url()).await?;
            if summary.total() == 0 {
                formatter.warning("Playlist has no downloadable entries");
            }
            formatter.print_batch_summary(&summary, start_time.elapsed());
            info!("Playlist finished: {}", summary.summary_line());
            Ok(if summary.is_complete_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        (Action::Download, false) => {
            let (item, path) = downloader.download(request.url()).await?;
            info!("Downloaded \"{}\" to {}", item.title, path.display());
            formatter.print_download_complete(&path, start_time.elapsed());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<FetchError>() {
        Some(FetchError::Usage(_)) => ExitCode::from(EXIT_USAGE),
        _ => ExitCode::FAILURE,
    }
}

/// Initialize logging system; `RUST_LOG` overrides the defaults
fn init_logging(verbose: bool) -> Result<()> {
    let default_directives = if verbose {
        "warn,tubefetch=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}
