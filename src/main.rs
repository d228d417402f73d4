use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::time::{Duration, Instant};

use yt_community_archiver::cli_args::CommandLineArgs;
use yt_community_archiver::common::constants::PROGRESS_SPINNER_TEMPLATE;
use yt_community_archiver::settings::Settings;
use yt_community_archiver::{
    ensure_dir_exists, ArchiveLedger, Archiver, AttachmentResolver, PageProgress, PostWriter,
    RunOptions, RunStats, YoutubeClient, YoutubeFeed,
};

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let start_time = Instant::now();
    info!(
        "YT Community Archiver v{} starting up...",
        env!("CARGO_PKG_VERSION")
    );

    debug!("Parsing command line arguments...");
    let cli_args = CommandLineArgs::parse_args();
    let settings = Settings::from_args(&cli_args)?;

    let ledger = load_archive(&settings);

    ensure_dir_exists(&settings.output_dir).map_err(|e| {
        error!("[ytca] failed to create output directory");
        anyhow::Error::new(e).context(format!(
            "Failed to create output directory {}",
            settings.output_dir.display()
        ))
    })?;
    info!("[ytca] saving posts to {}", settings.output_dir.display());

    let client = YoutubeClient::new(&settings.http, &settings.cookies)
        .context("Failed to build HTTP client")?;
    let mut archiver = Archiver::new(
        YoutubeFeed::new(&client, client.base_url(), client.client_version()),
        PostWriter::new(&settings.output_dir, settings.track_dates),
        AttachmentResolver::new(&client),
        ledger,
        RunOptions {
            reverse: settings.reverse,
            skip_download: settings.skip_download,
        },
    );

    let stats = process_all_links(&mut archiver, &cli_args.links)?;
    finish_processing(&stats, start_time.elapsed());
    info!("[ytca] finished");

    Ok(())
}

fn load_archive(settings: &Settings) -> ArchiveLedger {
    let usable_archive = settings
        .post_archive
        .as_deref()
        .and_then(ArchiveLedger::prepare);

    ArchiveLedger::load(usable_archive.as_deref())
}

fn process_all_links(
    archiver: &mut Archiver<'_, YoutubeClient>,
    links: &[String],
) -> Result<RunStats> {
    let mut stats = RunStats::default();
    if links.is_empty() {
        warn!("[ytca] no links given, nothing to do");
        return Ok(stats);
    }

    for link in links {
        let pb = create_spinner();
        let mut on_page = |progress: PageProgress| {
            pb.set_message(format!(
                "page {} fetched, {} posts found",
                progress.page, progress.post_count
            ));
        };

        let result = archiver.run_link(link, &mut on_page);
        pb.finish_and_clear();

        let link_stats = result.with_context(|| format!("Failed to archive {}", link))?;
        stats.merge(link_stats);
    }

    Ok(stats)
}

fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template(PROGRESS_SPINNER_TEMPLATE) {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn finish_processing(stats: &RunStats, elapsed: Duration) {
    if stats.failed > 0 {
        warn!(
            "[ytca] {} posts written, {} skipped, {} failed out of {}",
            stats.written,
            stats.skipped,
            stats.failed,
            stats.total()
        );
    } else {
        info!(
            "[ytca] {} posts written, {} skipped",
            stats.written, stats.skipped
        );
    }
    info!("Processing completed in {:.2} seconds", elapsed.as_secs_f64());
}
