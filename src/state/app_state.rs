use crate::app::MenuItem;
use crate::state::pool::Pool;
use bracket_engine::{Bracket, BracketRecord, BracketResult, Game, GameRef, Slot, Standing};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct StandingsState {
    pub rows: Vec<Standing>,
    pub selected: usize,
}

impl StandingsState {
    pub fn load(&mut self, rows: Vec<Standing>) {
        self.rows = rows;
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Stakes: remaining games and who has what riding on them
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct StakesState {
    pub games: Vec<GameRef>,
    pub selected: usize,
}

impl StakesState {
    /// Replace the game list, staying on the same game when it is still open.
    pub fn load(&mut self, games: Vec<GameRef>) {
        let previous = self.selected_game();
        self.games = games;
        self.selected = previous
            .and_then(|at| self.games.iter().position(|&g| g == at))
            .unwrap_or_else(|| self.selected.min(self.games.len().saturating_sub(1)));
    }

    pub fn selected_game(&self) -> Option<GameRef> {
        self.games.get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.games.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Pick wizard: walk all 63 games in round order
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PickWizardState {
    pub bracket: Option<Bracket>,
    pub order: Vec<GameRef>,
    pub current_index: usize,
    pub completed: bool,
    pub saved_to: Option<PathBuf>,
}

impl PickWizardState {
    pub fn start(&mut self, bracket: Bracket) {
        self.order = bracket.games().map(|(at, _)| at).collect();
        self.bracket = Some(bracket);
        self.current_index = 0;
        self.completed = false;
        self.saved_to = None;
    }

    /// Resume from a previously exported bracket: jump to the first game
    /// still without a pick.
    pub fn resume(&mut self, saved: Bracket) {
        self.start(saved);
        let Some(bracket) = &self.bracket else {
            return;
        };
        self.completed = bracket.is_complete();
        self.current_index = self
            .order
            .iter()
            .position(|&at| bracket.get(at).is_some_and(|g| !g.is_decided()))
            .unwrap_or_else(|| self.order.len().saturating_sub(1));
    }

    pub fn current(&self) -> Option<(GameRef, &Game)> {
        let at = *self.order.get(self.current_index)?;
        Some((at, self.bracket.as_ref()?.get(at)?))
    }

    pub fn decided(&self) -> usize {
        self.bracket.as_ref().map_or(0, Bracket::decided_count)
    }

    /// Pick one side of the current game, clear later picks the change makes
    /// impossible, then move on. An empty slot is ignored.
    pub fn pick(&mut self, slot: Slot) -> BracketResult<()> {
        let Some((at, game)) = self.current() else {
            return Ok(());
        };
        let Some(team) = game.team(slot).cloned() else {
            return Ok(());
        };
        let Some(bracket) = self.bracket.as_mut() else {
            return Ok(());
        };
        bracket.select_winner(at.round, at.index, &team)?;
        bracket.invalidate_downstream(at.round, at.index);
        self.saved_to = None;
        self.advance();
        Ok(())
    }

    pub fn advance(&mut self) {
        if self.current_index + 1 < self.order.len() {
            self.current_index += 1;
        }
        self.completed = self.bracket.as_ref().is_some_and(Bracket::is_complete);
    }

    pub fn back(&mut self) {
        self.current_index = self.current_index.saturating_sub(1);
        self.completed = false;
    }

    pub fn to_export(&self) -> Option<BracketRecord> {
        self.bracket.as_ref().map(BracketRecord::from)
    }
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub last_error: Option<String>,
    pub notice: Option<String>,
    pub pool: Option<Pool>,
    pub standings: StandingsState,
    pub stakes: StakesState,
    pub pick_wizard: PickWizardState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
