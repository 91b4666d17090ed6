use crate::state::messages::{LoaderRequest, LoaderResponse};
use crate::state::pool::{load_pool, read_saved_picks, save_picks};
use anyhow::Context;
use bracket_engine::{BracketRecord, OddsSettings};
use log::{debug, error, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Owns all pool file I/O. Requests are served one at a time off the UI task.
pub struct LoaderWorker {
    pool_dir: PathBuf,
    odds: OddsSettings,
    requests: mpsc::Receiver<LoaderRequest>,
    responses: mpsc::Sender<LoaderResponse>,
    is_loading: Arc<AtomicBool>,
}

impl LoaderWorker {
    pub fn new(
        pool_dir: PathBuf,
        odds: OddsSettings,
        requests: mpsc::Receiver<LoaderRequest>,
        responses: mpsc::Sender<LoaderResponse>,
    ) -> Self {
        Self {
            pool_dir,
            odds,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let result = match request {
                LoaderRequest::LoadPool => self.handle_load_pool().await,
                LoaderRequest::SavePicks { path, record } => self.handle_save_picks(path, record).await,
                LoaderRequest::LoadSavedPicks { path } => self.handle_load_saved_picks(path).await,
            };

            debug!("loader request complete");
            self.stop_loading_animation(result.is_ok()).await;

            let response = result.unwrap_or_else(|err| LoaderResponse::Error {
                message: format!("{err:#}"),
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send loader response: {e}");
                break;
            }
        }
    }

    async fn handle_load_pool(&self) -> anyhow::Result<LoaderResponse> {
        debug!("loading pool from {}", self.pool_dir.display());
        let dir = self.pool_dir.clone();
        let odds = self.odds.clone();
        let pool = tokio::task::spawn_blocking(move || {
            let mut pool = load_pool(&dir)?;
            // Odds are extra: a failure here still shows the standings.
            match pool.win_odds(&odds) {
                Ok(report) => pool.odds = Some(report),
                Err(e) => warn!("cannot compute win odds: {e:#}"),
            }
            anyhow::Ok(pool)
        })
        .await
        .context("pool loader task failed")??;
        Ok(LoaderResponse::PoolLoaded { pool: Box::new(pool) })
    }

    async fn handle_load_saved_picks(&self, path: PathBuf) -> anyhow::Result<LoaderResponse> {
        debug!("looking for saved picks at {}", path.display());
        let source = path.clone();
        let picks = tokio::task::spawn_blocking(move || read_saved_picks(&source))
            .await
            .context("picks reader task failed")?
            .with_context(|| format!("cannot resume picks from {}", path.display()))?;
        Ok(LoaderResponse::SavedPicksLoaded { path, picks: picks.map(Box::new) })
    }

    async fn handle_save_picks(&self, path: PathBuf, record: BracketRecord) -> anyhow::Result<LoaderResponse> {
        debug!("saving picks to {}", path.display());
        let target = path.clone();
        tokio::task::spawn_blocking(move || save_picks(&target, &record))
            .await
            .context("picks writer task failed")??;
        Ok(LoaderResponse::PicksSaved { path })
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(LoaderResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(LoaderResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(LoaderResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::pool::{TEAMS_FILE, picks_path, save_picks};
    use bracket_engine::{Bracket, Region, RoundKind, Team};

    async fn round_trip(dir: PathBuf, request: LoaderRequest) -> LoaderResponse {
        let (req_tx, req_rx) = mpsc::channel(10);
        let (resp_tx, mut resp_rx) = mpsc::channel(100);
        let odds = OddsSettings {
            max_simulations: 500,
            rng_seed: Some(1),
            ..OddsSettings::default()
        };
        let worker = tokio::spawn(LoaderWorker::new(dir, odds, req_rx, resp_tx).run());
        req_tx.send(request).await.unwrap();

        let response = loop {
            match resp_rx.recv().await.unwrap() {
                LoaderResponse::LoadingStateChanged { .. } => continue,
                other => break other,
            }
        };
        worker.abort();
        response
    }

    #[tokio::test]
    async fn missing_pool_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let response = round_trip(dir.path().to_path_buf(), LoaderRequest::LoadPool).await;
        assert!(matches!(response, LoaderResponse::Error { message } if message.contains(TEAMS_FILE)));
    }

    #[tokio::test]
    async fn saved_picks_land_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("picks").join("alex.json");
        let request = LoaderRequest::SavePicks {
            path: path.clone(),
            record: BracketRecord::default(),
        };
        let response = round_trip(dir.path().to_path_buf(), request).await;
        assert!(matches!(response, LoaderResponse::PicksSaved { path: saved } if saved == path));
        let json = std::fs::read_to_string(&path).unwrap();
        assert_eq!(BracketRecord::from_json(&json).unwrap(), BracketRecord::default());
    }

    fn field() -> Vec<Team> {
        Region::ALL
            .into_iter()
            .flat_map(|region| (1..=16).map(move |seed| Team::new(format!("{region} {seed}"), seed, region)))
            .collect()
    }

    #[tokio::test]
    async fn loaded_pool_carries_win_odds() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TEAMS_FILE), serde_json::to_string(&field()).unwrap()).unwrap();
        let mut picks = Bracket::from_teams(&field()).unwrap();
        let east1 = picks.game(RoundKind::First, 0).unwrap().team1.clone().unwrap();
        picks.select_winner(RoundKind::First, 0, &east1).unwrap();
        save_picks(&picks_path(dir.path(), "alex").unwrap(), &BracketRecord::from(&picks)).unwrap();

        let response = round_trip(dir.path().to_path_buf(), LoaderRequest::LoadPool).await;
        let LoaderResponse::PoolLoaded { pool } = response else {
            panic!("expected a loaded pool");
        };
        let odds = pool.odds.as_ref().unwrap();
        // A lone participant wins every outcome.
        assert_eq!(odds.get("alex").unwrap().win_probability, 1.0);
    }

    #[tokio::test]
    async fn saved_picks_are_read_off_the_ui_task() {
        let dir = tempfile::tempdir().unwrap();
        let path = picks_path(dir.path(), "alex").unwrap();

        let request = LoaderRequest::LoadSavedPicks { path: path.clone() };
        let response = round_trip(dir.path().to_path_buf(), request).await;
        assert!(matches!(response, LoaderResponse::SavedPicksLoaded { picks: None, .. }));

        let mut picks = Bracket::from_teams(&field()).unwrap();
        let east16 = picks.game(RoundKind::First, 0).unwrap().team2.clone().unwrap();
        picks.select_winner(RoundKind::First, 0, &east16).unwrap();
        save_picks(&path, &BracketRecord::from(&picks)).unwrap();

        let request = LoaderRequest::LoadSavedPicks { path: path.clone() };
        let response = round_trip(dir.path().to_path_buf(), request).await;
        let LoaderResponse::SavedPicksLoaded { path: from, picks: Some(loaded) } = response else {
            panic!("expected saved picks");
        };
        assert_eq!(from, path);
        assert_eq!(loaded.game(RoundKind::First, 0).unwrap().winner_name(), Some("East 16"));
    }
}
