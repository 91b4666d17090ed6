use crate::model::ScoringConfig;
use crate::{Bracket, Game, RoundKind, Team};
use serde::Serialize;
use std::collections::HashMap;

/// Authoritative seeds by team name. Preferred over the seed carried on a
/// team inside a bracket, which may be stale in hand-edited picks.
pub type TeamSeeds = HashMap<String, u8>;

pub fn team_seeds(teams: &[Team]) -> TeamSeeds {
    teams.iter().map(|t| (t.name.clone(), t.seed)).collect()
}

pub fn seed_of(team: &Team, seeds: &TeamSeeds) -> u8 {
    seeds.get(&team.name).copied().unwrap_or(team.seed)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    pub total_score: u32,
    pub correct_picks: u32,
    /// Portion of `total_score` that came from upsets.
    pub seed_bonus: u32,
    /// Points per round number, bonus included (index 0 unused).
    pub round_breakdown: [u32; 7],
}

impl ScoreReport {
    pub fn round(&self, round: RoundKind) -> u32 {
        self.round_breakdown[usize::from(round.number())]
    }
}

/// Score `picks` against `results`, game by game and by team name.
///
/// A game counts only when both sides have a winner and the names match.
/// With `apply_seed_bonus`, a correctly picked upset also earns
/// `(winner seed - better seed) * seed factor` for that round.
pub fn compute_score(
    results: &Bracket,
    picks: &Bracket,
    seeds: &TeamSeeds,
    config: &ScoringConfig,
    apply_seed_bonus: bool,
) -> ScoreReport {
    let mut report = ScoreReport::default();

    for (at, result) in results.games() {
        let Some(pick) = picks.get(at) else {
            continue;
        };
        let (Some(actual), Some(picked)) = (result.winner.as_ref(), pick.winner.as_ref()) else {
            continue;
        };
        if actual.name != picked.name {
            continue;
        }

        let mut points = config.points(at.round);
        report.correct_picks += 1;

        if apply_seed_bonus {
            let bonus = upset_bonus(result, actual, seeds, config.factor(at.round));
            report.seed_bonus += bonus;
            points += bonus;
        }

        report.total_score += points;
        report.round_breakdown[usize::from(at.round.number())] += points;
    }

    report
}

/// Seeds come from the results game. No bonus unless all three resolve.
fn upset_bonus(game: &Game, winner: &Team, seeds: &TeamSeeds, factor: u32) -> u32 {
    let lookup = |team: Option<&Team>| team.map(|t| seed_of(t, seeds)).filter(|&seed| seed > 0);

    let (Some(seed1), Some(seed2), Some(won)) =
        (lookup(game.team1.as_ref()), lookup(game.team2.as_ref()), lookup(Some(winner)))
    else {
        return 0;
    };

    let expected = seed1.min(seed2);
    u32::from(won.saturating_sub(expected)) * factor
}
