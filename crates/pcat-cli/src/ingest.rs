//! `pcat ingest`: run the pipeline over a URL file and record the run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use pcat_core::{AppConfig, RunStats, ScoringConfig, Vocabulary};
use pcat_ingest::{MemoryStore, Pipeline};
use pcat_scraper::{ImageDownloader, InputFormat, PageClient, UrlEntry};

#[derive(Debug)]
pub(crate) struct IngestOptions {
    pub file: PathBuf,
    pub format: Option<InputFormat>,
    pub dry_run: bool,
    pub no_images: bool,
    pub json: bool,
}

/// Read the URL file and process every entry.
///
/// Scoring config and vocabulary are loaded before anything is fetched, so
/// a bad config fails the command up front. Without `--dry-run` the run is
/// recorded in `pipeline_runs`.
///
/// # Errors
///
/// Returns an error if the config, vocabulary or input file cannot be
/// loaded, if the database is unreachable, or if every URL failed.
/// Individual URL failures are counted, not propagated.
pub(crate) async fn run_ingest(config: &AppConfig, options: &IngestOptions) -> anyhow::Result<()> {
    let scoring = pcat_core::load_scoring_config(&config.scoring_config_path).with_context(|| {
        format!(
            "failed to load scoring config from {}",
            config.scoring_config_path.display()
        )
    })?;
    let vocabulary = pcat_core::load_vocabulary(config.vocabulary_path.as_deref())
        .context("failed to load vocabulary")?;
    let entries = pcat_scraper::read_input_file(&options.file, options.format)?;
    if entries.is_empty() {
        tracing::warn!(file = %options.file.display(), "input file lists no URLs");
        return Ok(());
    }

    let client = PageClient::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
        config.scraper_max_retries,
        config.scraper_retry_backoff_base_secs,
    )?;
    let cooldown = Duration::from_millis(config.scraper_cooldown_ms);

    let stats = if options.dry_run {
        let store = MemoryStore::new();
        Pipeline::<_, _, ImageDownloader>::new(&client, &store, None, &vocabulary, &scoring)
            .with_cooldown(cooldown)
            .run(&entries)
            .await
    } else {
        let images = (!options.no_images)
            .then(|| ImageDownloader::new(client.clone(), config.images_dir.clone()));
        let run = RecordedRun {
            config,
            client: &client,
            images: images.as_ref(),
            vocabulary: &vocabulary,
            scoring: &scoring,
            cooldown,
        };
        run.execute(&options.file, &entries).await?
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{stats}");
    }
    Ok(())
}

struct RecordedRun<'a> {
    config: &'a AppConfig,
    client: &'a PageClient,
    images: Option<&'a ImageDownloader>,
    vocabulary: &'a Vocabulary,
    scoring: &'a ScoringConfig,
    cooldown: Duration,
}

impl RecordedRun<'_> {
    /// Create → start → pipeline → complete/fail, mirroring each step in
    /// `pipeline_runs`.
    async fn execute(&self, file: &Path, entries: &[UrlEntry]) -> anyhow::Result<RunStats> {
        let pool = pcat_db::connect_pool_from_config(self.config)
            .await
            .context("failed to connect to database")?;
        let store = pcat_db::PgCatalogStore::new(pool.clone());

        let run = pcat_db::create_pipeline_run(&pool, &file.display().to_string()).await?;
        if let Err(e) = pcat_db::start_pipeline_run(&pool, run.id).await {
            fail_run_best_effort(&pool, run.id, &RunStats::default(), format!("{e:#}")).await;
            return Err(e.into());
        }
        tracing::info!(
            run_id = run.id,
            public_id = %run.public_id,
            urls = entries.len(),
            "ingest run started"
        );

        let stats = Pipeline::new(self.client, &store, self.images, self.vocabulary, self.scoring)
            .with_cooldown(self.cooldown)
            .run(entries)
            .await;

        if stats.succeeded() == 0 {
            let message = format!("all {} URLs failed", stats.total_candidates);
            fail_run_best_effort(&pool, run.id, &stats, message.clone()).await;
            anyhow::bail!("{message}");
        }

        if let Err(err) = pcat_db::complete_pipeline_run(&pool, run.id, &stats).await {
            fail_run_best_effort(&pool, run.id, &stats, format!("{err:#}")).await;
            return Err(err.into());
        }
        Ok(stats)
    }
}

/// Attempt to mark a pipeline run as failed, logging any secondary error.
async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, stats: &RunStats, message: String) {
    if let Err(mark_err) = pcat_db::fail_pipeline_run(pool, run_id, stats, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark ingest run as failed"
        );
    }
}
