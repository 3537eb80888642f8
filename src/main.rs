use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use review_bot::cache::{
    COMPONENTS_DIR, DiskKeyValueCache, InvalidationCursor, PR_LABELS_DIR, PrLabelCache,
};
use review_bot::checks::default_checks;
use review_bot::config::{BotConfig, JIRA_REQUEST_TIMEOUT};
use review_bot::effects::EffectExecutor;
use review_bot::github::OctocrabClient;
use review_bot::labeler::ComponentLabeler;
use review_bot::review::{ReviewEngine, ReviewSettings, Roles};
use review_bot::tracker::{CachedComponents, JiraConnector, RetryConfig, RetryingTracker};
use review_bot::worker::{
    CacheInvalidation, ComponentLabeling, MentionScan, NewPullRequestScan, run_periodic,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "review_bot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BotConfig::from_env().context("failed to load configuration")?;
    info!(?config, "starting review bot");

    let client = OctocrabClient::from_token(config.github_token.clone(), config.repo.clone())
        .context("failed to build GitHub client")?;
    let github = Arc::new(EffectExecutor::new(client));

    let shutdown = CancellationToken::new();
    let tracker = Arc::new(RetryingTracker::new(
        JiraConnector {
            base_url: config.jira_url.clone(),
            project: config.jira_project.clone(),
            timeout: JIRA_REQUEST_TIMEOUT,
        },
        RetryConfig::default(),
        shutdown.clone(),
    ));

    let components_dir = config.data_dir.join(COMPONENTS_DIR);
    let components = CachedComponents::new(
        Arc::clone(&tracker),
        DiskKeyValueCache::open(&components_dir).context("failed to open component cache")?,
    );
    let pr_labels = PrLabelCache::open(config.data_dir.join(PR_LABELS_DIR))
        .context("failed to open pull request label cache")?;
    let cursor =
        InvalidationCursor::open(&config.data_dir).context("failed to read invalidation cursor")?;
    let swept = DiskKeyValueCache::<Vec<String>>::open(&components_dir)
        .context("failed to open component cache")?;

    let engine = Arc::new(ReviewEngine::new(
        Arc::clone(&github),
        Arc::clone(&tracker),
        ReviewSettings {
            repo: config.repo.clone(),
            bot: config.bot.clone(),
            roles: Roles::new(&config.committers, &config.pmc),
            project: config.jira_project.clone(),
            checks: default_checks(&config.jira_url),
        },
    ));
    let labeler = ComponentLabeler::new(
        Arc::clone(&github),
        components,
        pr_labels,
        config.jira_project.clone(),
    );

    let poll = &config.poll;
    let tasks = vec![
        tokio::spawn(run_periodic(
            NewPullRequestScan {
                engine: Arc::clone(&engine),
            },
            poll.new_pr_interval,
            shutdown.clone(),
        )),
        tokio::spawn(run_periodic(
            MentionScan {
                engine: Arc::clone(&engine),
            },
            poll.notification_interval,
            shutdown.clone(),
        )),
        tokio::spawn(run_periodic(
            ComponentLabeling { labeler },
            poll.labeler_interval,
            shutdown.clone(),
        )),
        tokio::spawn(run_periodic(
            CacheInvalidation {
                cursor,
                tracker: Arc::clone(&tracker),
                components: swept,
            },
            poll.invalidation_interval,
            shutdown.clone(),
        )),
    ];

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested, waiting for running passes");
    shutdown.cancel();

    for task in tasks {
        task.await.context("periodic task panicked")?;
    }
    info!("review bot stopped");
    Ok(())
}
