use std::path::PathBuf;
use std::time::Duration;

use matchday_storage::Storage;
use serde::Deserialize;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[derive(Debug, Deserialize)]
struct Env {
    data_dir: PathBuf,
    backup_dir: PathBuf,
    session_cleanup_minutes: Option<u64>,
    backup_interval_minutes: Option<u64>,
    backup_retention_days: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let env = envy::from_env::<Env>()?;

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    let storage = Storage::new(&env.data_dir, &env.backup_dir).await?;

    // A crash during a result announcement leaves its journal behind; finish
    // the job before anything else touches the documents.
    if storage.resume_announcement().await? {
        info!("finished an interrupted result announcement");
    }

    let session_cleanup = Duration::from_secs(env.session_cleanup_minutes.unwrap_or(24 * 60) * 60);
    let backup_interval = Duration::from_secs(env.backup_interval_minutes.unwrap_or(6 * 60) * 60);
    let retention_days = env.backup_retention_days.unwrap_or(7);

    tokio::select! {
        _ = run(&storage, session_cleanup, backup_interval, retention_days) => {}
        _ = signal::ctrl_c() => {
            tracing::warn!("Received SIGINT. Exiting.");
        }
    }

    Ok(())
}

async fn run(
    storage: &Storage,
    session_cleanup: Duration,
    backup_interval: Duration,
    retention_days: u64,
) {
    info!("starting maintenance loop");

    let mut sessions = tokio::time::interval(session_cleanup);
    let mut backups = tokio::time::interval(backup_interval);
    // Both intervals fire immediately on the first tick; swallow those so the
    // first real run happens one full period after startup.
    sessions.tick().await;
    backups.tick().await;

    loop {
        tokio::select! {
            _ = sessions.tick() => {
                match storage.sessions.cleanup().await {
                    Ok(cleaned) => info!(cleaned, "session cleanup finished"),
                    Err(e) => error!("Session cleanup failed: {e:#}"),
                }
            }
            _ = backups.tick() => {
                match storage.backups.create().await {
                    Ok(path) => {
                        info!(path = %path.display(), "backup finished");
                        match storage.backups.clean_old(retention_days).await {
                            Ok(deleted) => info!(deleted, "backup pruning finished"),
                            Err(e) => error!("Backup pruning failed: {e:#}"),
                        }
                    }
                    Err(e) => error!("Backup failed: {e:#}"),
                }
            }
        }
    }
}
