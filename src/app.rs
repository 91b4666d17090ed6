use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use crate::state::messages::LoaderRequest;
use crate::state::pool::Pool;
use bracket_engine::{Bracket, BracketRecord, Slot};
use log::{debug, info};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Standings,
    Stakes,
    PickWizard,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        let app = Self {
            state: AppState::new(),
            settings,
        };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    // -----------------------------------------------------------------------
    // Loader response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    /// Returns a follow-up request when the pick wizard needs its saved picks.
    pub fn on_pool_loaded(&mut self, pool: Pool) -> Option<LoaderRequest> {
        self.state.last_error = pool.skipped.first().map(|s| format!("skipped picks {s}"));
        self.state.standings.load(pool.standings(self.settings.apply_seed_bonus));
        self.state.stakes.load(pool.remaining_games());
        self.state.pool = Some(pool);
        if self.state.active_tab == MenuItem::PickWizard && self.state.pick_wizard.bracket.is_none() {
            return self.start_pick_wizard();
        }
        None
    }

    pub fn on_picks_saved(&mut self, path: PathBuf) {
        info!("picks saved to {}", path.display());
        self.state.notice = Some(format!("saved {}", path.display()));
        self.state.pick_wizard.saved_to = Some(path);
    }

    /// Saved picks arrive after the wizard has already been seeded; they only
    /// replace it while nothing has been picked yet.
    pub fn on_saved_picks_loaded(&mut self, path: PathBuf, picks: Option<Bracket>) {
        let Some(saved) = picks else {
            debug!("no saved picks at {}", path.display());
            return;
        };
        if self.state.pick_wizard.bracket.is_none() || self.state.pick_wizard.decided() > 0 {
            debug!("keeping current picks over {}", path.display());
            return;
        }
        info!("resuming picks from {}", path.display());
        self.state.pick_wizard.resume(saved);
    }

    pub fn on_error(&mut self, message: String) {
        self.state.last_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) -> Option<LoaderRequest> {
        if self.state.active_tab == next {
            return None;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        if next == MenuItem::PickWizard && self.state.pick_wizard.bracket.is_none() {
            return self.start_pick_wizard();
        }
        None
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Standings / stakes navigation
    // -----------------------------------------------------------------------

    pub fn select_next(&mut self) {
        match self.state.active_tab {
            MenuItem::Standings => self.state.standings.select_next(),
            MenuItem::Stakes => self.state.stakes.select_next(),
            _ => {}
        }
    }

    pub fn select_prev(&mut self) {
        match self.state.active_tab {
            MenuItem::Standings => self.state.standings.select_prev(),
            MenuItem::Stakes => self.state.stakes.select_prev(),
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Pick wizard
    // -----------------------------------------------------------------------

    /// Seed a fresh bracket from the pool's team feed. The returned request
    /// asks the loader for the user's saved picks file, if any.
    pub fn start_pick_wizard(&mut self) -> Option<LoaderRequest> {
        let Some(pool) = &self.state.pool else {
            self.state.last_error = Some("Pick wizard needs a loaded pool".to_string());
            return None;
        };
        let bracket = match pool.blank_bracket() {
            Ok(bracket) => bracket,
            Err(e) => {
                self.state.last_error = Some(format!("cannot seed bracket: {e:#}"));
                return None;
            }
        };
        let path = pool.picks_path(&self.settings.username);
        self.state.pick_wizard.start(bracket);

        match path {
            Ok(path) => Some(LoaderRequest::LoadSavedPicks { path }),
            Err(e) => {
                self.state.last_error = Some(format!("{e:#}"));
                None
            }
        }
    }

    pub fn pick_wizard_pick(&mut self, slot: Slot) {
        if let Err(e) = self.state.pick_wizard.pick(slot) {
            self.state.last_error = Some(e.to_string());
        }
    }

    pub fn pick_wizard_back(&mut self) {
        self.state.pick_wizard.back();
    }

    /// The record to write and where, once every game has a pick.
    pub fn export_picks(&mut self) -> Option<(PathBuf, BracketRecord)> {
        if !self.state.pick_wizard.completed {
            self.state.notice = Some(format!(
                "{} of 63 games picked; finish the bracket before saving",
                self.state.pick_wizard.decided()
            ));
            return None;
        }
        let pool = self.state.pool.as_ref()?;
        let path = match pool.picks_path(&self.settings.username) {
            Ok(path) => path,
            Err(e) => {
                self.state.last_error = Some(format!("{e:#}"));
                return None;
            }
        };
        let record = self.state.pick_wizard.to_export()?;
        Some((path, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::pool::{TEAMS_FILE, load_pool};
    use bracket_engine::{Region, RoundKind, Team};
    use tempfile::TempDir;

    fn app_with_pool(username: &str) -> (TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let teams: Vec<Team> = Region::ALL
            .into_iter()
            .flat_map(|region| (1..=16).map(move |seed| Team::new(format!("{region} {seed}"), seed, region)))
            .collect();
        std::fs::write(dir.path().join(TEAMS_FILE), serde_json::to_string(&teams).unwrap()).unwrap();

        let settings = AppSettings {
            full_screen: false,
            log_level: None,
            pool_dir: dir.path().to_path_buf(),
            apply_seed_bonus: true,
            username: username.to_string(),
            max_simulations: 1000,
        };
        let mut app = App::new(settings);
        app.on_pool_loaded(load_pool(dir.path()).unwrap());
        (dir, app)
    }

    fn first_winner(app: &App) -> Option<String> {
        let bracket = app.state.pick_wizard.bracket.as_ref()?;
        bracket.game(RoundKind::First, 0)?.winner_name().map(str::to_string)
    }

    #[test]
    fn opening_picks_asks_the_loader_for_saved_picks() {
        let (dir, mut app) = app_with_pool("alex");
        let request = app.update_tab(MenuItem::PickWizard);
        let expected = dir.path().join("picks").join("alex.json");
        assert!(matches!(request, Some(LoaderRequest::LoadSavedPicks { path }) if path == expected));
        assert!(app.state.pick_wizard.bracket.is_some());
        assert_eq!(app.state.pick_wizard.decided(), 0);

        // Already seeded: switching back does not ask again.
        app.update_tab(MenuItem::Standings);
        assert!(app.update_tab(MenuItem::PickWizard).is_none());
    }

    #[test]
    fn saved_picks_only_replace_an_untouched_wizard() {
        let (_dir, mut app) = app_with_pool("alex");
        app.update_tab(MenuItem::PickWizard);
        let mut saved = app.state.pick_wizard.bracket.clone().unwrap();
        let underdog = saved.game(RoundKind::First, 0).unwrap().team2.clone().unwrap();
        saved.select_winner(RoundKind::First, 0, &underdog).unwrap();

        app.on_saved_picks_loaded(PathBuf::from("alex.json"), Some(saved.clone()));
        assert_eq!(first_winner(&app).as_deref(), Some("East 16"));
        assert_eq!(app.state.pick_wizard.current_index, 1);

        let (_dir, mut app) = app_with_pool("alex");
        app.update_tab(MenuItem::PickWizard);
        app.pick_wizard_pick(Slot::Team1);
        app.on_saved_picks_loaded(PathBuf::from("alex.json"), Some(saved));
        assert_eq!(first_winner(&app).as_deref(), Some("East 1"));
    }

    #[test]
    fn user_name_outside_picks_dir_is_refused() {
        let (_dir, mut app) = app_with_pool("../escape");
        assert!(app.update_tab(MenuItem::PickWizard).is_none());
        assert!(app.state.last_error.as_deref().is_some_and(|e| e.contains("../escape")));
    }
}
