use {futures::future::BoxFuture, tokio_util::task::TaskTracker, tracing::debug};

/// Executor for detached background work (record persistence, "more
/// images"). Spawned tasks are not linked to the event that started them.
pub trait TaskSpawner: Send + Sync {
    fn spawn(&self, name: &'static str, task: BoxFuture<'static, ()>);
}

/// Spawns onto the current Tokio runtime and tracks tasks so callers can
/// wait for them to drain.
#[derive(Debug, Clone, Default)]
pub struct TokioSpawner {
    tracker: TaskTracker,
}

impl TokioSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks still running.
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every task spawned so far has finished. New tasks may be
    /// spawned again afterwards.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

impl TaskSpawner for TokioSpawner {
    fn spawn(&self, name: &'static str, task: BoxFuture<'static, ()>) {
        debug!(task = name, "spawning background task");
        self.tracker.spawn(task);
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    #[tokio::test]
    async fn wait_idle_drains_spawned_tasks() {
        let spawner = TokioSpawner::new();
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let done = Arc::clone(&done);
            spawner.spawn(
                "test",
                Box::pin(async move {
                    tokio::task::yield_now().await;
                    done.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        spawner.wait_idle().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(spawner.active(), 0);
    }

    #[tokio::test]
    async fn spawner_is_reusable_after_wait() {
        let spawner = TokioSpawner::new();
        spawner.wait_idle().await;

        let done = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&done);
        spawner.spawn(
            "test",
            Box::pin(async move {
                flag.fetch_add(1, Ordering::SeqCst);
            }),
        );
        spawner.wait_idle().await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
