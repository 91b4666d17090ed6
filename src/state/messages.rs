use crate::state::loader::LoadingState;
use crate::state::pool::Pool;
use bracket_engine::{Bracket, BracketRecord};
use crossterm::event::KeyEvent;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum LoaderRequest {
    LoadPool,
    SavePicks { path: PathBuf, record: BracketRecord },
    /// Read the user's earlier picks so the wizard can pick up where they left off.
    LoadSavedPicks { path: PathBuf },
}

#[derive(Debug)]
pub enum LoaderResponse {
    LoadingStateChanged { loading_state: LoadingState },
    PoolLoaded { pool: Box<Pool> },
    PicksSaved { path: PathBuf },
    SavedPicksLoaded { path: PathBuf, picks: Option<Box<Bracket>> },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
