use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::engine::Engine;

/// Background task that rewrites the WAL as a snapshot once enough
/// appends have accumulated since the last compaction.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        maybe_compact(&engine, threshold).await;
    }
}

async fn maybe_compact(engine: &Engine, threshold: u64) {
    let appends = engine.wal_appends_since_compact().await;
    if appends < threshold {
        return;
    }
    match engine.compact_wal().await {
        Ok(()) => info!("compacted WAL after {appends} appends"),
        Err(e) => warn!("WAL compaction failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BusinessHours;
    use crate::notify::NotifyHub;
    use std::path::PathBuf;

    fn test_wal_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("venuebook_test_compactor");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    async fn engine_with_clients(name: &str, count: usize) -> Arc<Engine> {
        let notify = Arc::new(NotifyHub::new());
        let engine =
            Arc::new(Engine::new(test_wal_path(name), notify, BusinessHours::default()).unwrap());
        for i in 0..count {
            engine
                .add_client(format!("Client {i}"), String::new(), String::new(), String::new())
                .await
                .unwrap();
        }
        engine
    }

    #[tokio::test]
    async fn compacts_once_over_threshold() {
        let engine = engine_with_clients("over.wal", 5).await;
        assert_eq!(engine.wal_appends_since_compact().await, 5);

        maybe_compact(&engine, 3).await;
        assert_eq!(engine.wal_appends_since_compact().await, 0);
        assert_eq!(engine.list_clients().len(), 5);
    }

    #[tokio::test]
    async fn leaves_quiet_wal_alone() {
        let engine = engine_with_clients("quiet.wal", 2).await;

        maybe_compact(&engine, 1000).await;
        assert_eq!(engine.wal_appends_since_compact().await, 2);
    }
}
