use crate::state::messages::LoaderRequest;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Re-reads the pool directory every 30 seconds so edits to results and
/// picks files show up without a restart.
pub struct PeriodicRefresher {
    loader_requests: mpsc::Sender<LoaderRequest>,
}

impl PeriodicRefresher {
    pub fn new(loader_requests: mpsc::Sender<LoaderRequest>) -> Self {
        Self { loader_requests }
    }

    pub async fn run(self) {
        let mut reload_interval = interval(Duration::from_secs(30));
        // First tick fires immediately; startup already requested a load.
        reload_interval.tick().await;

        loop {
            reload_interval.tick().await;
            if self.loader_requests.send(LoaderRequest::LoadPool).await.is_err() {
                break;
            }
        }
    }
}
