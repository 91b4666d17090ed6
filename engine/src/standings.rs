use crate::model::ScoringConfig;
use crate::scoring::{TeamSeeds, compute_score};
use crate::stake::{GameStake, possible_remaining, stake_in_game};
use crate::{Bracket, RoundKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub name: String,
    pub picks: Bracket,
}

/// One row of the pool table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub name: String,
    pub score: u32,
    pub correct_picks: u32,
    pub seed_bonus: u32,
    pub possible_remaining: u32,
    pub max_possible: u32,
    pub round_breakdown: [u32; 7],
}

/// Score every participant against the same results bracket.
///
/// Sorted by score, then by how much each could still reach, then by name.
/// Ties on score share a rank (1, 2, 2, 4).
pub fn compute_standings(
    results: &Bracket,
    participants: &[Participant],
    seeds: &TeamSeeds,
    config: &ScoringConfig,
    apply_seed_bonus: bool,
) -> Vec<Standing> {
    let mut rows: Vec<Standing> = participants
        .iter()
        .map(|p| {
            let report = compute_score(results, &p.picks, seeds, config, apply_seed_bonus);
            let remaining = possible_remaining(results, &p.picks, config);
            Standing {
                rank: 0,
                name: p.name.clone(),
                score: report.total_score,
                correct_picks: report.correct_picks,
                seed_bonus: report.seed_bonus,
                possible_remaining: remaining,
                max_possible: report.total_score + remaining,
                round_breakdown: report.round_breakdown,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.max_possible.cmp(&a.max_possible))
            .then_with(|| a.name.cmp(&b.name))
    });

    for i in 0..rows.len() {
        rows[i].rank = match i {
            0 => 1,
            _ if rows[i].score == rows[i - 1].score => rows[i - 1].rank,
            _ => i + 1,
        };
    }

    rows
}

/// Every participant's stake in one results game, in participant order.
pub fn game_stakes<'a>(
    results: &Bracket,
    participants: &'a [Participant],
    round: RoundKind,
    index: usize,
    config: &ScoringConfig,
) -> Vec<(&'a str, GameStake)> {
    participants
        .iter()
        .filter_map(|p| {
            let stake = stake_in_game(results, &p.picks, round, index, config)?;
            Some((p.name.as_str(), stake))
        })
        .collect()
}
