pub mod builder;
pub mod error;
pub mod model;
pub mod odds;
pub mod propagate;
pub mod record;
pub mod scoring;
pub mod stake;
pub mod standings;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{BracketError, BracketResult};
pub use model::ScoringConfig;
pub use odds::{
    BonusStars, DEFAULT_MAX_SIMULATIONS, OddsReport, OddsSettings, WinOdds, hypothetical, parse_bonus_stars,
    pending_games, win_probabilities,
};
pub use propagate::next_slot;
pub use record::{BracketRecord, GameRecord, TeamRecord, parse_teams};
pub use scoring::{ScoreReport, TeamSeeds, compute_score, team_seeds};
pub use stake::{GameStake, alive_teams, possible_remaining, remaining_games, stake_in_game};
pub use standings::{Participant, Standing, compute_standings, game_stakes};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Domain types: one bracket per party (official results or one entrant)
// ---------------------------------------------------------------------------

/// The four regions, in the fixed order they occupy round 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Region {
    #[default]
    East,
    West,
    South,
    Midwest,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::East, Region::West, Region::South, Region::Midwest];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Region::East => "East",
            Region::West => "West",
            Region::South => "South",
            Region::Midwest => "Midwest",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Region {
    type Err = BracketError;

    /// Case-insensitive; spreadsheets export "EAST", "east" and "East" interchangeably.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "east" => Ok(Region::East),
            "west" => Ok(Region::West),
            "south" => Ok(Region::South),
            "midwest" => Ok(Region::Midwest),
            _ => Err(BracketError::UnknownRegion(s.to_string())),
        }
    }
}

impl TryFrom<String> for Region {
    type Error = BracketError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.label().to_string()
    }
}

/// Elimination stage. Ordered from earliest to latest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoundKind {
    #[default]
    First, // Round of 64
    Second, // Round of 32
    Sweet16,
    Elite8,
    FinalFour, // National semifinals
    Championship,
}

impl RoundKind {
    pub const ALL: [RoundKind; 6] = [
        RoundKind::First,
        RoundKind::Second,
        RoundKind::Sweet16,
        RoundKind::Elite8,
        RoundKind::FinalFour,
        RoundKind::Championship,
    ];

    /// 1-based round number, as used by the scoring vectors.
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(RoundKind::First),
            2 => Some(RoundKind::Second),
            3 => Some(RoundKind::Sweet16),
            4 => Some(RoundKind::Elite8),
            5 => Some(RoundKind::FinalFour),
            6 => Some(RoundKind::Championship),
            _ => None,
        }
    }

    /// 0-based position in the bracket's round list.
    pub fn index(self) -> usize {
        self as usize
    }

    /// 32, 16, 8, 4, 2, 1.
    pub fn game_count(self) -> usize {
        32 >> self.index()
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoundKind::First => "1st Round",
            RoundKind::Second => "2nd Round",
            RoundKind::Sweet16 => "Sweet 16",
            RoundKind::Elite8 => "Elite Eight",
            RoundKind::FinalFour => "Final Four",
            RoundKind::Championship => "Championship",
        }
    }

    pub fn prev(self) -> Option<Self> {
        match self {
            RoundKind::First => None,
            RoundKind::Second => Some(RoundKind::First),
            RoundKind::Sweet16 => Some(RoundKind::Second),
            RoundKind::Elite8 => Some(RoundKind::Sweet16),
            RoundKind::FinalFour => Some(RoundKind::Elite8),
            RoundKind::Championship => Some(RoundKind::FinalFour),
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            RoundKind::First => Some(RoundKind::Second),
            RoundKind::Second => Some(RoundKind::Sweet16),
            RoundKind::Sweet16 => Some(RoundKind::Elite8),
            RoundKind::Elite8 => Some(RoundKind::FinalFour),
            RoundKind::FinalFour => Some(RoundKind::Championship),
            RoundKind::Championship => None,
        }
    }
}

impl fmt::Display for RoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    pub name: String, // unique within a tournament; the identity used for every comparison
    pub seed: u8,
    pub region: Region,
}

impl Team {
    pub fn new(name: impl Into<String>, seed: u8, region: Region) -> Self {
        Self { name: name.into(), seed, region }
    }
}

/// Address of one game: round plus index within that round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameRef {
    pub round: RoundKind,
    pub index: usize,
}

impl GameRef {
    pub fn new(round: RoundKind, index: usize) -> Self {
        Self { round, index }
    }
}

impl fmt::Display for GameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} game {}", self.round, self.index + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Team1,
    Team2,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Game {
    pub id: String,
    pub round: RoundKind,
    pub region: Option<Region>, // round 1 only
    pub team1: Option<Team>,    // None = not yet known
    pub team2: Option<Team>,
    pub winner: Option<Team>,
    /// The two games feeding this one, by address. `None` in round 1.
    pub parents: Option<[GameRef; 2]>,
}

impl Game {
    pub fn new(round: RoundKind, index: usize, region: Option<Region>) -> Self {
        Self {
            id: format!("r{}g{}", round.number(), index + 1),
            round,
            region,
            ..Self::default()
        }
    }

    pub fn team(&self, slot: Slot) -> Option<&Team> {
        match slot {
            Slot::Team1 => self.team1.as_ref(),
            Slot::Team2 => self.team2.as_ref(),
        }
    }

    pub fn team_mut(&mut self, slot: Slot) -> &mut Option<Team> {
        match slot {
            Slot::Team1 => &mut self.team1,
            Slot::Team2 => &mut self.team2,
        }
    }

    /// Which side `name` is playing on, compared by name.
    pub fn slot_of(&self, name: &str) -> Option<Slot> {
        if self.team1.as_ref().is_some_and(|t| t.name == name) {
            Some(Slot::Team1)
        } else if self.team2.as_ref().is_some_and(|t| t.name == name) {
            Some(Slot::Team2)
        } else {
            None
        }
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    pub fn has_both_teams(&self) -> bool {
        self.team1.is_some() && self.team2.is_some()
    }

    pub fn winner_name(&self) -> Option<&str> {
        self.winner.as_ref().map(|t| t.name.as_str())
    }
}

/// The full 63-game tree for one party. Built by [`Bracket::empty`] or
/// [`Bracket::from_teams`], then filled one game at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Bracket {
    rounds: [Vec<Game>; 6],
    pub winner: Option<Team>,
}

impl Bracket {
    pub fn round(&self, round: RoundKind) -> &[Game] {
        &self.rounds[round.index()]
    }

    pub fn game(&self, round: RoundKind, index: usize) -> Option<&Game> {
        self.rounds[round.index()].get(index)
    }

    pub fn game_mut(&mut self, round: RoundKind, index: usize) -> Option<&mut Game> {
        self.rounds[round.index()].get_mut(index)
    }

    pub fn get(&self, at: GameRef) -> Option<&Game> {
        self.game(at.round, at.index)
    }

    /// Every game, earliest round first.
    pub fn games(&self) -> impl Iterator<Item = (GameRef, &Game)> {
        RoundKind::ALL.into_iter().flat_map(move |round| {
            self.round(round)
                .iter()
                .enumerate()
                .map(move |(index, game)| (GameRef::new(round, index), game))
        })
    }

    pub fn decided_count(&self) -> usize {
        self.games().filter(|(_, g)| g.is_decided()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.games().all(|(_, g)| g.is_decided())
    }
}

pub(crate) fn same_team(a: Option<&Team>, b: Option<&Team>) -> bool {
    a.map(|t| t.name.as_str()) == b.map(|t| t.name.as_str())
}
