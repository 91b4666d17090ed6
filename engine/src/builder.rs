use crate::model::round1_position;
use crate::propagate::feeders;
use crate::{Bracket, BracketError, BracketResult, Game, Region, RoundKind, Team};
use log::warn;
use std::collections::HashMap;

impl Bracket {
    /// All 63 games present with every slot empty and parent links wired.
    pub fn empty() -> Self {
        let rounds = RoundKind::ALL.map(|round| {
            (0..round.game_count())
                .map(|index| {
                    let region = match round {
                        RoundKind::First => round1_position(index).map(|(region, _)| region),
                        _ => None,
                    };
                    Game::new(round, index, region)
                })
                .collect::<Vec<_>>()
        });

        let mut bracket = Self { rounds, winner: None };
        bracket.relink_parents();
        bracket
    }

    /// Seed round 1 from a flat team list.
    ///
    /// Teams are grouped by region and placed by the canonical seed pairing.
    /// A seed missing from the feed leaves its slot empty instead of failing,
    /// so partial feeds (e.g. before play-in games finish) still load.
    pub fn from_teams(teams: &[Team]) -> BracketResult<Self> {
        if teams.is_empty() {
            return Err(BracketError::NoTeams);
        }

        let mut by_region: HashMap<Region, Vec<&Team>> = HashMap::new();
        for team in teams {
            by_region.entry(team.region).or_default().push(team);
        }
        for field in by_region.values_mut() {
            field.sort_by_key(|t| t.seed);
        }

        let mut bracket = Self::empty();
        for (index, game) in bracket.rounds[RoundKind::First.index()].iter_mut().enumerate() {
            let Some((region, (high, low))) = round1_position(index) else {
                continue;
            };
            let field = by_region.get(&region).map(Vec::as_slice).unwrap_or_default();
            game.team1 = seeded(field, region, high);
            game.team2 = seeded(field, region, low);
        }

        Ok(bracket)
    }

    /// Re-derive every game's parent links from the advancement table.
    pub fn relink_parents(&mut self) {
        for round in RoundKind::ALL {
            for (index, game) in self.rounds[round.index()].iter_mut().enumerate() {
                game.parents = feeders(round, index);
            }
        }
    }
}

impl Default for Bracket {
    fn default() -> Self {
        Self::empty()
    }
}

fn seeded(field: &[&Team], region: Region, seed: u8) -> Option<Team> {
    let mut candidates = field.iter().filter(|t| t.seed == seed);
    let Some(team) = candidates.next() else {
        warn!("{region} has no {seed} seed; leaving its slot empty");
        return None;
    };
    if let Some(extra) = candidates.next() {
        warn!("{region} has more than one {seed} seed; ignoring {}", extra.name);
    }
    Some((*team).clone())
}
