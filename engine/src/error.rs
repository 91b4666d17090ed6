use crate::RoundKind;

pub type BracketResult<T> = Result<T, BracketError>;

#[derive(Debug, thiserror::Error)]
pub enum BracketError {
    #[error("no teams supplied")]
    NoTeams,

    #[error("{round} has no game {index}")]
    GameNotFound { round: RoundKind, index: usize },

    /// Selecting a winner that is not one of the game's two teams.
    #[error("{team} is not playing in {round} game {index}")]
    TeamNotInGame { team: String, round: RoundKind, index: usize },

    #[error("{round} has {found} games, expected {expected}")]
    RoundSize { round: RoundKind, expected: usize, found: usize },

    #[error("unknown team: {0}")]
    UnknownTeam(String),

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("seed {seed} for {team} is outside 1..=16")]
    InvalidSeed { team: String, seed: u8 },

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}
