use crate::{BracketResult, Region, RoundKind};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tournament shape constants
// ---------------------------------------------------------------------------

/// Base points for a correct pick, indexed by round number (index 0 unused).
pub const SCORE_FOR_ROUND: [u32; 7] = [0, 10, 20, 30, 50, 80, 130];

/// Upset-bonus multiplier per seed line, indexed by round number.
pub const SEED_FACTOR: [u32; 7] = [0, 1, 2, 3, 4, 5, 6];

/// Round-1 seed pairings within a region, top of the region first.
pub const MATCHUP_PAIRS: [(u8, u8); 8] = [
    (1, 16),
    (8, 9),
    (5, 12),
    (4, 13),
    (6, 11),
    (3, 14),
    (7, 10),
    (2, 15),
];

/// Round-1 games per region. Region `r` owns indices `8r..8r+8`.
pub const GAMES_PER_REGION: usize = MATCHUP_PAIRS.len();

pub const TOTAL_GAMES: usize = 63;

/// Region and seed pairing for a flat round-1 index.
pub fn round1_position(index: usize) -> Option<(Region, (u8, u8))> {
    let region = *Region::ALL.get(index / GAMES_PER_REGION)?;
    Some((region, MATCHUP_PAIRS[index % GAMES_PER_REGION]))
}

/// National semifinal a region's champion plays in: East/West meet in the
/// first, South/Midwest in the second.
pub fn semifinal_for(region: Region) -> usize {
    region.index() / 2
}

// ---------------------------------------------------------------------------
// Scoring configuration, overridable per pool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub points_per_round: [u32; 7],
    pub seed_factor: [u32; 7],
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            points_per_round: SCORE_FOR_ROUND,
            seed_factor: SEED_FACTOR,
        }
    }
}

impl ScoringConfig {
    pub fn from_json(json: &str) -> BracketResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn points(&self, round: RoundKind) -> u32 {
        self.points_per_round[usize::from(round.number())]
    }

    pub fn factor(&self, round: RoundKind) -> u32 {
        self.seed_factor[usize::from(round.number())]
    }

    /// Base points for a perfect bracket, ignoring upset bonus.
    pub fn max_total(&self) -> u32 {
        RoundKind::ALL
            .iter()
            .map(|&round| self.points(round) * round.game_count() as u32)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_bracket_is_worth_1370() {
        assert_eq!(ScoringConfig::default().max_total(), 1370);
    }

    #[test]
    fn round1_positions_follow_region_blocks() {
        assert_eq!(round1_position(0), Some((Region::East, (1, 16))));
        assert_eq!(round1_position(10), Some((Region::West, (5, 12))));
        assert_eq!(round1_position(31), Some((Region::Midwest, (2, 15))));
        assert_eq!(round1_position(32), None);
    }

    #[test]
    fn every_seed_appears_once_per_region() {
        let mut seeds: Vec<u8> = MATCHUP_PAIRS.iter().flat_map(|&(a, b)| [a, b]).collect();
        seeds.sort_unstable();
        assert_eq!(seeds, (1..=16).collect::<Vec<u8>>());
        assert!(MATCHUP_PAIRS.iter().all(|&(a, b)| a + b == 17));
    }

    #[test]
    fn semifinals_pair_regions() {
        assert_eq!(semifinal_for(Region::East), 0);
        assert_eq!(semifinal_for(Region::West), 0);
        assert_eq!(semifinal_for(Region::South), 1);
        assert_eq!(semifinal_for(Region::Midwest), 1);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ScoringConfig::from_json(r#"{"seed_factor": [0, 0, 0, 0, 0, 0, 0]}"#).unwrap();
        assert_eq!(config.points_per_round, SCORE_FOR_ROUND);
        assert_eq!(config.factor(RoundKind::Championship), 0);
    }
}
