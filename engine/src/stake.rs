use crate::model::ScoringConfig;
use crate::{Bracket, GameRef, RoundKind, Slot};
use serde::Serialize;
use std::collections::HashSet;

/// Teams not yet eliminated: every team sitting in an undecided results game.
pub fn alive_teams(results: &Bracket) -> HashSet<&str> {
    results
        .games()
        .filter(|(_, g)| !g.is_decided())
        .flat_map(|(_, g)| [g.team1.as_ref(), g.team2.as_ref()])
        .flatten()
        .map(|t| t.name.as_str())
        .collect()
}

/// Base points still available to `picks`: every undecided results game
/// where the participant picked a team that is still alive. Upset bonus is
/// not counted.
pub fn possible_remaining(results: &Bracket, picks: &Bracket, config: &ScoringConfig) -> u32 {
    let alive = alive_teams(results);

    results
        .games()
        .filter(|(_, result)| !result.is_decided())
        .filter_map(|(at, _)| {
            let picked = picks.get(at)?.winner_name()?;
            alive.contains(picked).then(|| config.points(at.round))
        })
        .sum()
}

/// Undecided results games with both teams known, earliest round first.
pub fn remaining_games(results: &Bracket) -> Vec<GameRef> {
    results
        .games()
        .filter(|(_, g)| !g.is_decided() && g.has_both_teams())
        .map(|(at, _)| at)
        .collect()
}

/// Points one participant has riding on each side of an undecided game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameStake {
    pub team1: u32,
    pub team2: u32,
    pub has_pick: bool,
    pub picked_team: Option<String>,
}

impl GameStake {
    pub fn backing(&self) -> Option<Slot> {
        match (self.team1, self.team2) {
            (0, 0) => None,
            (_, 0) => Some(Slot::Team1),
            _ => Some(Slot::Team2),
        }
    }

    pub fn total(&self) -> u32 {
        self.team1 + self.team2
    }
}

/// How many points ride on `picks` for one results game.
///
/// The backed side earns this round's points plus every later round in which
/// the participant's own bracket still has that team winning, stopping at the
/// first round it does not. A pick naming neither contender (an earlier
/// elimination) is zero on both sides with `has_pick` false, and so is a game
/// that already has a result. `None` when either bracket has no such game.
pub fn stake_in_game(
    results: &Bracket,
    picks: &Bracket,
    round: RoundKind,
    index: usize,
    config: &ScoringConfig,
) -> Option<GameStake> {
    let game = results.game(round, index)?;
    let pick = picks.game(round, index)?;
    if game.is_decided() {
        return Some(GameStake::default());
    }

    let Some(picked) = pick.winner_name() else {
        return Some(GameStake::default());
    };
    let Some(side) = game.slot_of(picked) else {
        return Some(GameStake::default());
    };

    let mut stake = config.points(round);
    let mut later = round.next();
    while let Some(next) = later {
        let carried = picks.round(next).iter().any(|g| g.winner_name() == Some(picked));
        if !carried {
            break;
        }
        stake += config.points(next);
        later = next.next();
    }

    let mut result = GameStake {
        has_pick: true,
        picked_team: Some(picked.to_string()),
        ..GameStake::default()
    };
    match side {
        Slot::Team1 => result.team1 = stake,
        Slot::Team2 => result.team2 = stake,
    }
    Some(result)
}
