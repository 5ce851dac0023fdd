pub mod leaderboard;
pub mod movement_summary;
pub mod notifications;
pub mod user_stats;

use std::future::Future;
use std::time::Duration;

use stride_database::Database;
use stride_push::PushService;
use stride_utils::formatting::format_compact_duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::config::JobConfig;

/// Starts the periodic jobs on the current runtime.
pub fn spawn_jobs(db: &Database, push: Option<PushService>, config: &JobConfig) {
    if !config.enabled {
        info!("Background jobs disabled (set JOBS_ENABLED=true to enable).");
        return;
    }

    spawn_periodic("leaderboard", config.leaderboard_interval, db, |db| async move {
        leaderboard::run(&db).await
    });
    spawn_periodic("user_stats", config.stats_interval, db, |db| async move {
        user_stats::run(&db).await
    });
    spawn_periodic(
        "movement_summary",
        config.movement_summary_interval,
        db,
        |db| async move { movement_summary::run(&db).await },
    );

    match push {
        Some(push) => {
            spawn_periodic(
                "notifications",
                config.notification_interval,
                db,
                move |db| {
                    let push = push.clone();
                    async move { notifications::run(&db, &push).await }
                },
            );
        }
        None => info!("Push delivery disabled; scheduled notifications stay pending."),
    }
}

fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, db: &Database, job: F)
where
    F: Fn(Database) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<usize>> + Send + 'static,
{
    let db = db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            job = name,
            every = %format_compact_duration(period.as_secs()),
            "background job scheduled"
        );

        loop {
            interval.tick().await;
            match job(db.clone()).await {
                Ok(processed) => info!(job = name, processed, "background job finished"),
                Err(err) => error!(job = name, ?err, "background job failed"),
            }
        }
    });
}
