use anyhow::{Context, bail};
use bracket_engine::{
    BonusStars, Bracket, BracketRecord, GameRef, GameStake, OddsReport, OddsSettings, Participant, RoundKind,
    ScoringConfig, Standing, Team, TeamSeeds, compute_standings, game_stakes, parse_bonus_stars, parse_teams,
    remaining_games, team_seeds, win_probabilities,
};
use chrono::{DateTime, Local};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub const TEAMS_FILE: &str = "teams.json";
pub const RESULTS_FILE: &str = "results.json";
pub const SCORING_FILE: &str = "scoring.json";
pub const BONUS_FILE: &str = "bonus.json";
pub const PICKS_DIR: &str = "picks";

/// Everything read from one pool directory.
#[derive(Debug, Clone)]
pub struct Pool {
    pub dir: PathBuf,
    pub teams: Vec<Team>,
    pub seeds: TeamSeeds,
    pub results: Bracket,
    pub participants: Vec<Participant>,
    pub config: ScoringConfig,
    /// Extra points per participant, counted only toward win odds.
    pub bonus_stars: BonusStars,
    /// Filled in by the loader after the files are read.
    pub odds: Option<OddsReport>,
    /// Picks files that could not be read, with the reason.
    pub skipped: Vec<String>,
    pub loaded_at: DateTime<Local>,
}

impl Pool {
    pub fn standings(&self, apply_seed_bonus: bool) -> Vec<Standing> {
        compute_standings(
            &self.results,
            &self.participants,
            &self.seeds,
            &self.config,
            apply_seed_bonus,
        )
    }

    pub fn remaining_games(&self) -> Vec<GameRef> {
        remaining_games(&self.results)
    }

    pub fn stakes(&self, at: GameRef) -> Vec<(&str, GameStake)> {
        game_stakes(&self.results, &self.participants, at.round, at.index, &self.config)
    }

    pub fn picks_path(&self, name: &str) -> anyhow::Result<PathBuf> {
        picks_path(&self.dir, name)
    }

    /// Play out the remaining games to estimate who can still win.
    pub fn win_odds(&self, settings: &OddsSettings) -> anyhow::Result<OddsReport> {
        let report = win_probabilities(
            &self.results,
            &self.participants,
            &self.seeds,
            &self.config,
            &self.bonus_stars,
            settings,
        )?;
        debug!(
            "odds from {} outcomes of {} games ({})",
            report.outcomes,
            report.games,
            if report.exhaustive { "exhaustive" } else { "sampled" }
        );
        Ok(report)
    }

    /// A fresh bracket for the pick wizard: round 1 seeded, nothing picked.
    pub fn blank_bracket(&self) -> anyhow::Result<Bracket> {
        Ok(Bracket::from_teams(&self.teams)?)
    }
}

/// Where `name`'s picks live. The name becomes a file name, so anything that
/// could reach outside the picks directory is refused.
pub fn picks_path(dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    check_participant_name(name)?;
    Ok(dir.join(PICKS_DIR).join(format!("{name}.json")))
}

pub fn check_participant_name(name: &str) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        bail!("participant name is empty");
    }
    if name.contains("..") || name.contains(['/', '\\']) {
        bail!("participant name {name:?} cannot be used as a file name");
    }
    Ok(())
}

/// Read a saved picks file, `None` when there is none yet.
pub fn read_saved_picks(path: &Path) -> anyhow::Result<Option<Bracket>> {
    if !path.exists() {
        return Ok(None);
    }
    let record = read_record(path)?;
    let picks = record
        .to_bracket()
        .with_context(|| format!("invalid bracket {}", path.display()))?;
    Ok(Some(picks))
}

/// Read a pool directory: the team feed, the results bracket, every picks
/// file and the optional scoring override.
///
/// `teams.json` may be left out when `results.json` exists; the field is
/// then taken from the results' first round. A malformed picks file is
/// skipped and reported, it does not fail the whole load.
pub fn load_pool(dir: &Path) -> anyhow::Result<Pool> {
    let teams_path = dir.join(TEAMS_FILE);
    let results_path = dir.join(RESULTS_FILE);

    let results_record = if results_path.exists() {
        Some(read_record(&results_path)?)
    } else {
        None
    };

    let teams = if teams_path.exists() {
        let json = read(&teams_path)?;
        parse_teams(&json).with_context(|| format!("invalid team feed {}", teams_path.display()))?
    } else if let Some(record) = &results_record {
        let bracket = record
            .to_bracket()
            .with_context(|| format!("invalid results {}", results_path.display()))?;
        first_round_teams(&bracket)
    } else {
        bail!("{} has neither {TEAMS_FILE} nor {RESULTS_FILE}", dir.display());
    };

    let results = match &results_record {
        Some(record) => record
            .to_bracket()
            .with_context(|| format!("invalid results {}", results_path.display()))?,
        None => Bracket::from_teams(&teams).context("cannot seed a results bracket")?,
    };

    let config = load_config(dir)?;
    let bonus_stars = load_bonus_stars(dir)?;
    let (participants, skipped) = load_participants(&dir.join(PICKS_DIR))?;

    debug!(
        "loaded pool {}: {} teams, {} participants, {} games decided",
        dir.display(),
        teams.len(),
        participants.len(),
        results.decided_count()
    );

    Ok(Pool {
        dir: dir.to_path_buf(),
        seeds: team_seeds(&teams),
        teams,
        results,
        participants,
        config,
        bonus_stars,
        odds: None,
        skipped,
        loaded_at: Local::now(),
    })
}

/// Write one participant's bracket in the record format, creating the
/// picks directory if needed.
pub fn save_picks(path: &Path, record: &BracketRecord) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let json = record.to_json()?;
    fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn read_record(path: &Path) -> anyhow::Result<BracketRecord> {
    let json = read(path)?;
    BracketRecord::from_json(&json).with_context(|| format!("invalid bracket {}", path.display()))
}

fn load_config(dir: &Path) -> anyhow::Result<ScoringConfig> {
    let path = dir.join(SCORING_FILE);
    if !path.exists() {
        return Ok(ScoringConfig::default());
    }
    let json = read(&path)?;
    ScoringConfig::from_json(&json).with_context(|| format!("invalid scoring config {}", path.display()))
}

fn load_bonus_stars(dir: &Path) -> anyhow::Result<BonusStars> {
    let path = dir.join(BONUS_FILE);
    if !path.exists() {
        return Ok(BonusStars::new());
    }
    let json = read(&path)?;
    parse_bonus_stars(&json).with_context(|| format!("invalid bonus stars {}", path.display()))
}

fn load_participants(picks_dir: &Path) -> anyhow::Result<(Vec<Participant>, Vec<String>)> {
    let mut participants = Vec::new();
    let mut skipped = Vec::new();
    if !picks_dir.is_dir() {
        return Ok((participants, skipped));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(picks_dir)
        .with_context(|| format!("cannot list {}", picks_dir.display()))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    for path in paths {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match read_record(&path).and_then(|r| Ok(r.to_bracket()?)) {
            Ok(picks) => participants.push(Participant { name: name.to_string(), picks }),
            Err(e) => {
                warn!("skipping picks {}: {e:#}", path.display());
                skipped.push(format!("{name}: {e:#}"));
            }
        }
    }
    Ok((participants, skipped))
}

fn first_round_teams(bracket: &Bracket) -> Vec<Team> {
    bracket
        .round(RoundKind::First)
        .iter()
        .flat_map(|g| [g.team1.clone(), g.team2.clone()])
        .flatten()
        .collect()
}
