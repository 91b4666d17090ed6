use crate::model::ScoringConfig;
use crate::propagate::feeders;
use crate::scoring::{TeamSeeds, compute_score};
use crate::standings::Participant;
use crate::{Bracket, BracketError, BracketResult, GameRef, Slot};
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Above this many outcomes the remaining games are sampled instead of
/// enumerated.
pub const DEFAULT_MAX_SIMULATIONS: u64 = 100_000;

/// Flat points added to a participant's bracket score, keyed by name.
pub type BonusStars = HashMap<String, u32>;

/// Parse a `{"name": points, ...}` object.
pub fn parse_bonus_stars(json: &str) -> BracketResult<BonusStars> {
    Ok(serde_json::from_str(json)?)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OddsSettings {
    pub apply_seed_bonus: bool,
    pub max_simulations: u64,
    /// Fixed seed for sampled runs; a random one is drawn (and logged) when unset.
    pub rng_seed: Option<u64>,
}

impl Default for OddsSettings {
    fn default() -> Self {
        Self {
            apply_seed_bonus: true,
            max_simulations: DEFAULT_MAX_SIMULATIONS,
            rng_seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinOdds {
    pub name: String,
    /// Share of outcomes this participant finishes first in. A tie for first
    /// splits the outcome between the tied participants.
    pub win_probability: f64,
    /// Mean finishing place, 1 = first. Tied scores share the better place.
    pub average_place: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsReport {
    /// Games played out per outcome.
    pub games: usize,
    /// Outcomes scored: every combination when `exhaustive`, else samples.
    pub outcomes: u64,
    pub exhaustive: bool,
    /// Best chance first.
    pub odds: Vec<WinOdds>,
}

impl OddsReport {
    pub fn get(&self, name: &str) -> Option<&WinOdds> {
        self.odds.iter().find(|o| o.name == name)
    }
}

/// Undecided games that can still be played out from `results`, earliest
/// round first: both teams are known, or a side is empty only because the
/// game feeding it is itself in the list.
pub fn pending_games(results: &Bracket) -> Vec<GameRef> {
    let mut pending = Vec::new();
    let mut playable = HashSet::new();

    for (at, game) in results.games() {
        if game.is_decided() {
            continue;
        }
        let parents = feeders(at.round, at.index);
        let filled = |slot: Slot, side: usize| {
            game.team(slot).is_some() || parents.is_some_and(|p| playable.contains(&p[side]))
        };
        if filled(Slot::Team1, 0) && filled(Slot::Team2, 1) {
            playable.insert(at);
            pending.push(at);
        }
    }
    pending
}

/// Copy of `results` with every game in `games` decided by `outcome`: bit `i`
/// set means team1 wins `games[i]`, clear means team2. Games must be in round
/// order so each winner is in place before the next round reads it.
pub fn hypothetical(results: &Bracket, games: &[GameRef], outcome: u64) -> BracketResult<Bracket> {
    let mut bracket = results.clone();
    for (bit, &at) in games.iter().enumerate() {
        let slot = match (outcome >> bit) & 1 {
            1 => Slot::Team1,
            _ => Slot::Team2,
        };
        let team = bracket
            .get(at)
            .and_then(|g| g.team(slot))
            .cloned()
            .ok_or(BracketError::GameNotFound { round: at.round, index: at.index })?;
        bracket.select_winner(at.round, at.index, &team)?;
    }
    Ok(bracket)
}

/// Each participant's chance of finishing first and their average place,
/// over every way the pending games can go.
///
/// When there are more outcomes than `settings.max_simulations`, that many
/// outcomes are sampled uniformly instead. A finished tournament is a single
/// outcome.
pub fn win_probabilities(
    results: &Bracket,
    participants: &[Participant],
    seeds: &TeamSeeds,
    config: &ScoringConfig,
    bonus_stars: &BonusStars,
    settings: &OddsSettings,
) -> BracketResult<OddsReport> {
    let games = pending_games(results);
    let budget = settings.max_simulations.max(1);
    let exhaustive = u32::try_from(games.len())
        .ok()
        .and_then(|n| 1u64.checked_shl(n))
        .filter(|&total| total <= budget);

    let mut tally = Tally::new(participants.len());
    let score_outcome = |tally: &mut Tally, outcome: u64| -> BracketResult<()> {
        let bracket = hypothetical(results, &games, outcome)?;
        let scores: Vec<u32> = participants
            .iter()
            .map(|p| {
                let report = compute_score(&bracket, &p.picks, seeds, config, settings.apply_seed_bonus);
                report.total_score + bonus_stars.get(&p.name).copied().unwrap_or_default()
            })
            .collect();
        tally.record(&scores);
        Ok(())
    };

    let outcomes = match exhaustive {
        Some(total) => {
            debug!("enumerating {total} outcomes of {} games", games.len());
            for outcome in 0..total {
                score_outcome(&mut tally, outcome)?;
            }
            total
        }
        None => {
            let seed = settings.rng_seed.unwrap_or_else(rand::random);
            info!("sampling {budget} of 2^{} outcomes (seed {seed})", games.len());
            let mut rng = SmallRng::seed_from_u64(seed);
            for _ in 0..budget {
                score_outcome(&mut tally, rng.random::<u64>())?;
            }
            budget
        }
    };

    let mut odds: Vec<WinOdds> = participants
        .iter()
        .zip(tally.wins.iter().zip(&tally.places))
        .map(|(p, (&wins, &places))| WinOdds {
            name: p.name.clone(),
            win_probability: wins / outcomes as f64,
            average_place: places as f64 / outcomes as f64,
        })
        .collect();
    odds.sort_by(|a, b| {
        b.win_probability
            .total_cmp(&a.win_probability)
            .then(a.average_place.total_cmp(&b.average_place))
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(OddsReport {
        games: games.len(),
        outcomes,
        exhaustive: exhaustive.is_some(),
        odds,
    })
}

struct Tally {
    wins: Vec<f64>,
    places: Vec<u64>,
}

impl Tally {
    fn new(participants: usize) -> Self {
        Self {
            wins: vec![0.0; participants],
            places: vec![0; participants],
        }
    }

    fn record(&mut self, scores: &[u32]) {
        let Some(&best) = scores.iter().max() else {
            return;
        };
        let leaders = scores.iter().filter(|&&s| s == best).count() as f64;
        for (i, &score) in scores.iter().enumerate() {
            let ahead = scores.iter().filter(|&&other| other > score).count();
            self.places[i] += ahead as u64 + 1;
            if score == best {
                self.wins[i] += 1.0 / leaders;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::team_seeds;
    use crate::testutil::{chalk, decide, field, seeded_bracket};
    use crate::{Region, RoundKind, Team};

    fn participant(name: &str, picks: Bracket) -> Participant {
        Participant { name: name.to_string(), picks }
    }

    fn chalk_picks() -> Bracket {
        let mut picks = seeded_bracket();
        chalk(&mut picks);
        picks
    }

    fn run(results: &Bracket, participants: &[Participant], stars: &BonusStars, settings: &OddsSettings) -> OddsReport {
        let seeds = team_seeds(&field());
        win_probabilities(results, participants, &seeds, &ScoringConfig::default(), stars, settings).unwrap()
    }

    /// Chalk results with the championship still to play.
    fn title_game_left() -> Bracket {
        let mut results = chalk_picks();
        results.game_mut(RoundKind::Championship, 0).unwrap().winner = None;
        results.winner = None;
        results
    }

    #[test]
    fn every_game_is_pending_before_tipoff() {
        let results = seeded_bracket();
        let pending = pending_games(&results);
        assert_eq!(pending.len(), 63);
        assert_eq!(pending[0], GameRef::new(RoundKind::First, 0));
        assert_eq!(pending[62], GameRef::new(RoundKind::Championship, 0));
    }

    #[test]
    fn unknown_team_blocks_its_path() {
        let mut results = seeded_bracket();
        results.game_mut(RoundKind::First, 0).unwrap().team2 = None;
        let pending = pending_games(&results);
        // Round-1 game 0 and every game it would feed drop out.
        assert_eq!(pending.len(), 63 - 6);
        assert!(!pending.contains(&GameRef::new(RoundKind::Second, 0)));
        assert!(pending.contains(&GameRef::new(RoundKind::Second, 1)));
        assert!(!pending.contains(&GameRef::new(RoundKind::Championship, 0)));
    }

    #[test]
    fn outcome_bits_pick_the_winners() {
        let results = seeded_bracket();
        let games = [GameRef::new(RoundKind::First, 0), GameRef::new(RoundKind::First, 1)];
        let bracket = hypothetical(&results, &games, 0b01).unwrap();

        assert_eq!(bracket.game(RoundKind::First, 0).unwrap().winner_name(), Some("East 1"));
        assert_eq!(bracket.game(RoundKind::First, 1).unwrap().winner_name(), Some("East 9"));
        let second = bracket.game(RoundKind::Second, 0).unwrap();
        assert_eq!(second.team1.as_ref().map(|t| t.name.as_str()), Some("East 1"));
        assert_eq!(second.team2.as_ref().map(|t| t.name.as_str()), Some("East 9"));
        // The input bracket is untouched.
        assert!(!results.game(RoundKind::First, 0).unwrap().is_decided());
    }

    #[test]
    fn hypothetical_plays_later_rounds_from_simulated_winners() {
        let results = seeded_bracket();
        let games = pending_games(&results);
        let bracket = hypothetical(&results, &games, u64::MAX).unwrap();
        assert!(bracket.is_complete());
        // Team1 wins everything: East 1 takes the title.
        assert_eq!(bracket.winner, Some(Team::new("East 1", 1, Region::East)));
    }

    #[test]
    fn finished_tournament_is_certain() {
        let results = chalk_picks();
        let participants = vec![participant("blank", seeded_bracket()), participant("chalk", chalk_picks())];
        let report = run(&results, &participants, &BonusStars::new(), &OddsSettings::default());

        assert_eq!(report.games, 0);
        assert_eq!(report.outcomes, 1);
        assert!(report.exhaustive);
        let chalk = report.get("chalk").unwrap();
        assert_eq!(chalk.win_probability, 1.0);
        assert_eq!(chalk.average_place, 1.0);
        let blank = report.get("blank").unwrap();
        assert_eq!(blank.win_probability, 0.0);
        assert_eq!(blank.average_place, 2.0);
        assert_eq!(report.odds[0].name, "chalk");
    }

    #[test]
    fn opposite_champions_split_the_title_game() {
        let results = title_game_left();
        let mut rival = chalk_picks();
        decide(&mut rival, RoundKind::Championship, 0, Slot::Team2);
        let participants = vec![participant("chalk", chalk_picks()), participant("rival", rival)];

        let report = run(&results, &participants, &BonusStars::new(), &OddsSettings::default());
        assert_eq!(report.games, 1);
        assert_eq!(report.outcomes, 2);
        assert!(report.exhaustive);
        for odds in &report.odds {
            assert_eq!(odds.win_probability, 0.5, "{}", odds.name);
            assert_eq!(odds.average_place, 1.5, "{}", odds.name);
        }
    }

    #[test]
    fn identical_brackets_share_every_win() {
        let results = title_game_left();
        let participants = vec![participant("a", chalk_picks()), participant("b", chalk_picks())];
        let report = run(&results, &participants, &BonusStars::new(), &OddsSettings::default());
        for odds in &report.odds {
            assert_eq!(odds.win_probability, 0.5);
            assert_eq!(odds.average_place, 1.0);
        }
    }

    #[test]
    fn bonus_stars_count_toward_the_win() {
        let results = chalk_picks();
        let participants = vec![participant("blank", seeded_bracket()), participant("chalk", chalk_picks())];
        let stars = BonusStars::from([("blank".to_string(), 2000)]);
        let report = run(&results, &participants, &stars, &OddsSettings::default());
        assert_eq!(report.get("blank").unwrap().win_probability, 1.0);
        assert_eq!(report.get("chalk").unwrap().average_place, 2.0);
    }

    #[test]
    fn too_many_outcomes_are_sampled_reproducibly() {
        let results = seeded_bracket();
        let participants = vec![participant("blank", seeded_bracket()), participant("chalk", chalk_picks())];
        let settings = OddsSettings {
            max_simulations: 200,
            rng_seed: Some(7),
            ..OddsSettings::default()
        };

        let report = run(&results, &participants, &BonusStars::new(), &settings);
        assert!(!report.exhaustive);
        assert_eq!(report.games, 63);
        assert_eq!(report.outcomes, 200);
        let total: f64 = report.odds.iter().map(|o| o.win_probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(report.get("chalk").unwrap().win_probability > report.get("blank").unwrap().win_probability);

        assert_eq!(run(&results, &participants, &BonusStars::new(), &settings), report);
    }

    #[test]
    fn small_budget_still_enumerates_when_it_fits() {
        let results = title_game_left();
        let participants = vec![participant("chalk", chalk_picks())];
        let settings = OddsSettings {
            max_simulations: 2,
            ..OddsSettings::default()
        };
        let report = run(&results, &participants, &BonusStars::new(), &settings);
        assert!(report.exhaustive);
        assert_eq!(report.outcomes, 2);
        assert_eq!(report.odds[0].win_probability, 1.0);
    }

    #[test]
    fn bonus_stars_parse_from_json() {
        let stars = parse_bonus_stars(r#"{"alice": 25, "bob": 0}"#).unwrap();
        assert_eq!(stars.get("alice"), Some(&25));
        assert!(parse_bonus_stars("[1, 2]").is_err());
    }
}
