/// Plain JSON record shapes for brackets and the team feed.
/// These map to the domain types via the conversions below; the domain
/// types themselves never see partial or hand-edited data.
use crate::{Bracket, BracketError, BracketResult, Game, Region, RoundKind, Team};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BracketRecord {
    #[serde(default)]
    pub round1: Vec<Option<GameRecord>>,
    #[serde(default)]
    pub round2: Vec<Option<GameRecord>>,
    #[serde(default)]
    pub round3: Vec<Option<GameRecord>>,
    #[serde(default)]
    pub round4: Vec<Option<GameRecord>>,
    #[serde(default)]
    pub round5: Vec<Option<GameRecord>>,
    #[serde(default)]
    pub round6: Vec<Option<GameRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<TeamRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(default)]
    pub team1: Option<TeamRecord>,
    #[serde(default)]
    pub team2: Option<TeamRecord>,
    #[serde(default)]
    pub winner: Option<TeamRecord>,
}

/// A team as it appears inside a bracket file: a full object, or only the
/// name (some exports write winners as bare strings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TeamRepr")]
pub struct TeamRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TeamRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        seed: Option<u8>,
        #[serde(default)]
        region: Option<String>,
    },
}

impl From<TeamRepr> for TeamRecord {
    fn from(repr: TeamRepr) -> Self {
        match repr {
            TeamRepr::Name(name) => TeamRecord { name, seed: None, region: None },
            TeamRepr::Full { name, seed, region } => TeamRecord { name, seed, region },
        }
    }
}

// ---------------------------------------------------------------------------
// Domain -> record
// ---------------------------------------------------------------------------

impl From<&Team> for TeamRecord {
    fn from(team: &Team) -> Self {
        TeamRecord {
            name: team.name.clone(),
            seed: Some(team.seed),
            region: Some(team.region.label().to_string()),
        }
    }
}

impl From<&Game> for GameRecord {
    fn from(game: &Game) -> Self {
        GameRecord {
            team1: game.team1.as_ref().map(TeamRecord::from),
            team2: game.team2.as_ref().map(TeamRecord::from),
            winner: game.winner.as_ref().map(TeamRecord::from),
        }
    }
}

impl From<&Bracket> for BracketRecord {
    fn from(bracket: &Bracket) -> Self {
        let round = |kind: RoundKind| -> Vec<Option<GameRecord>> {
            bracket.round(kind).iter().map(|g| Some(GameRecord::from(g))).collect()
        };
        BracketRecord {
            round1: round(RoundKind::First),
            round2: round(RoundKind::Second),
            round3: round(RoundKind::Sweet16),
            round4: round(RoundKind::Elite8),
            round5: round(RoundKind::FinalFour),
            round6: round(RoundKind::Championship),
            winner: bracket.winner.as_ref().map(TeamRecord::from),
        }
    }
}

// ---------------------------------------------------------------------------
// Record -> domain
// ---------------------------------------------------------------------------

impl BracketRecord {
    pub fn from_json(json: &str) -> BracketResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> BracketResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn round(&self, round: RoundKind) -> &[Option<GameRecord>] {
        match round {
            RoundKind::First => &self.round1,
            RoundKind::Second => &self.round2,
            RoundKind::Sweet16 => &self.round3,
            RoundKind::Elite8 => &self.round4,
            RoundKind::FinalFour => &self.round5,
            RoundKind::Championship => &self.round6,
        }
    }

    /// Build a domain bracket, resolving partial teams.
    ///
    /// Round-1 teams without a region take the region of their slot; teams in
    /// later rounds resolve by name against round 1. Short rounds are padded
    /// with empty games; oversized rounds are rejected.
    pub fn to_bracket(&self) -> BracketResult<Bracket> {
        let mut bracket = Bracket::empty();
        let mut known: HashMap<String, Team> = HashMap::new();

        for round in RoundKind::ALL {
            let games = self.round(round);
            if games.len() > round.game_count() {
                return Err(BracketError::RoundSize {
                    round,
                    expected: round.game_count(),
                    found: games.len(),
                });
            }

            for (index, record) in games.iter().enumerate() {
                let Some(record) = record else {
                    continue;
                };
                let Some(game) = bracket.game_mut(round, index) else {
                    continue;
                };
                let region = game.region;
                game.team1 = resolve(record.team1.as_ref(), region, &mut known)?;
                game.team2 = resolve(record.team2.as_ref(), region, &mut known)?;
                game.winner = resolve(record.winner.as_ref(), region, &mut known)?;

                if let Some(winner) = game.winner_name()
                    && game.has_both_teams()
                    && game.slot_of(winner).is_none()
                {
                    warn!("{round} game {index}: winner {winner} is not one of its teams");
                }
            }
        }

        bracket.winner = match &self.winner {
            Some(record) => resolve(Some(record), None, &mut known)?,
            None => bracket.round(RoundKind::Championship)[0].winner.clone(),
        };

        Ok(bracket)
    }
}

/// Placeholder names spreadsheets use for a slot that is not decided yet.
fn is_placeholder(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.eq_ignore_ascii_case("tbd")
}

fn resolve(
    record: Option<&TeamRecord>,
    slot_region: Option<Region>,
    known: &mut HashMap<String, Team>,
) -> BracketResult<Option<Team>> {
    let Some(record) = record.filter(|r| !is_placeholder(&r.name)) else {
        return Ok(None);
    };
    if let Some(team) = known.get(&record.name) {
        return Ok(Some(team.clone()));
    }

    // A blank region is as good as a missing one.
    let region = match record.region.as_deref().map(str::trim).filter(|label| !label.is_empty()) {
        Some(label) => label.parse()?,
        None => slot_region.ok_or_else(|| BracketError::UnknownTeam(record.name.clone()))?,
    };
    let team = Team::new(record.name.clone(), record.seed.unwrap_or_default(), region);
    known.insert(team.name.clone(), team.clone());
    Ok(Some(team))
}

/// Parse the team feed: a JSON array of `{name, seed, region}`.
pub fn parse_teams(json: &str) -> BracketResult<Vec<Team>> {
    let teams: Vec<Team> = serde_json::from_str(json)?;
    if teams.is_empty() {
        return Err(BracketError::NoTeams);
    }
    if let Some(bad) = teams.iter().find(|t| !(1..=16).contains(&t.seed)) {
        return Err(BracketError::InvalidSeed {
            team: bad.name.clone(),
            seed: bad.seed,
        });
    }
    Ok(teams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Slot;
    use crate::testutil::{decide, seeded_bracket};

    #[test]
    fn seeded_bracket_round_trips_through_json() {
        let mut bracket = seeded_bracket();
        decide(&mut bracket, RoundKind::First, 0, Slot::Team1);
        decide(&mut bracket, RoundKind::First, 1, Slot::Team2);
        decide(&mut bracket, RoundKind::Second, 0, Slot::Team2);

        let json = BracketRecord::from(&bracket).to_json().unwrap();
        let rebuilt = BracketRecord::from_json(&json).unwrap().to_bracket().unwrap();

        for ((at, before), (_, after)) in bracket.games().zip(rebuilt.games()) {
            assert_eq!(before.team1, after.team1, "{at}");
            assert_eq!(before.team2, after.team2, "{at}");
            assert_eq!(before.winner_name(), after.winner_name(), "{at}");
        }
        assert_eq!(rebuilt, bracket);
    }

    #[test]
    fn blank_region_falls_back_to_slot_region() {
        let json = r#"{
            "round1": [{
                "team1": {"name": "Duke", "seed": 1, "region": ""},
                "team2": {"name": "Stetson", "seed": 16, "region": "  "}
            }]
        }"#;
        let bracket = BracketRecord::from_json(json).unwrap().to_bracket().unwrap();
        let game = bracket.game(RoundKind::First, 0).unwrap();
        assert_eq!(game.team1.as_ref().unwrap(), &Team::new("Duke", 1, Region::East));
        assert_eq!(game.team2.as_ref().unwrap().region, Region::East);
    }

    #[test]
    fn winner_may_be_a_bare_name() {
        let json = r#"{
            "round1": [{
                "team1": {"name": "Duke", "seed": 1},
                "team2": {"name": "Stetson", "seed": 16, "region": "east"},
                "winner": "Duke"
            }],
            "round2": [{"team1": "Duke"}]
        }"#;
        let bracket = BracketRecord::from_json(json).unwrap().to_bracket().unwrap();
        let game = bracket.game(RoundKind::First, 0).unwrap();
        assert_eq!(game.winner.as_ref().unwrap(), &Team::new("Duke", 1, Region::East));
        assert_eq!(game.team2.as_ref().unwrap().region, Region::East);
        assert_eq!(bracket.game(RoundKind::Second, 0).unwrap().team1.as_ref().unwrap().seed, 1);
        // Missing games pad out to the full shape.
        assert_eq!(bracket.round(RoundKind::First).len(), 32);
        assert!(bracket.game(RoundKind::First, 1).unwrap().team1.is_none());
    }

    #[test]
    fn null_games_and_tbd_slots_are_empty() {
        let json = r#"{"round1": [null, {"team1": {"name": "TBD"}, "team2": null, "winner": null}]}"#;
        let bracket = BracketRecord::from_json(json).unwrap().to_bracket().unwrap();
        assert!(bracket.games().all(|(_, g)| g.team1.is_none() && g.team2.is_none()));
    }

    #[test]
    fn unknown_later_round_team_is_an_error() {
        let json = r#"{"round2": [{"team1": "Nobody"}]}"#;
        let err = BracketRecord::from_json(json).unwrap().to_bracket().unwrap_err();
        assert!(matches!(err, BracketError::UnknownTeam(name) if name == "Nobody"));
    }

    #[test]
    fn oversized_round_is_rejected() {
        let record = BracketRecord {
            round6: vec![None, None],
            ..BracketRecord::default()
        };
        let err = record.to_bracket().unwrap_err();
        assert!(matches!(err, BracketError::RoundSize { expected: 1, found: 2, .. }));
    }

    #[test]
    fn top_level_winner_defaults_to_championship_winner() {
        let mut bracket = Bracket::empty();
        let game = bracket.game_mut(RoundKind::Championship, 0).unwrap();
        game.team1 = Some(Team::new("East 1", 1, Region::East));
        game.team2 = Some(Team::new("South 1", 1, Region::South));
        let champ = game.team2.clone().unwrap();
        bracket.select_winner(RoundKind::Championship, 0, &champ).unwrap();

        let mut record = BracketRecord::from(&bracket);
        record.winner = None;
        assert_eq!(record.to_bracket().unwrap().winner, Some(champ));
    }

    #[test]
    fn team_feed_parses_and_validates() {
        let teams = parse_teams(r#"[{"name": "Duke", "seed": 1, "region": "EAST"}]"#).unwrap();
        assert_eq!(teams, vec![Team::new("Duke", 1, Region::East)]);

        let err = parse_teams(r#"[{"name": "Duke", "seed": 17, "region": "East"}]"#).unwrap_err();
        assert!(matches!(err, BracketError::InvalidSeed { seed: 17, .. }));

        assert!(matches!(parse_teams("[]"), Err(BracketError::NoTeams)));
        assert!(matches!(
            parse_teams(r#"[{"name": "Duke", "seed": 1, "region": "North"}]"#),
            Err(BracketError::Json(_))
        ));
    }
}
