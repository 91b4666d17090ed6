use crate::{Bracket, BracketError, BracketResult, GameRef, RoundKind, Slot, Team, same_team};
use log::debug;

/// Regional champions cross into the national semifinals. Elite Eight game
/// `i` is region `i`'s final; East/West meet in semifinal 0, South/Midwest in 1.
const ELITE_EIGHT_FEEDS: [(usize, Slot); 4] = [
    (0, Slot::Team1),
    (0, Slot::Team2),
    (1, Slot::Team1),
    (1, Slot::Team2),
];

const FINAL_FOUR_FEEDS: [(usize, Slot); 2] = [(0, Slot::Team1), (0, Slot::Team2)];

/// Where the winner of a game goes next: the next-round game and the side it
/// takes there. `None` for the championship and for out-of-range indices.
pub fn next_slot(round: RoundKind, index: usize) -> Option<(GameRef, Slot)> {
    if index >= round.game_count() {
        return None;
    }

    let (next_index, slot) = match round {
        RoundKind::First | RoundKind::Second | RoundKind::Sweet16 => {
            let slot = if index % 2 == 0 { Slot::Team1 } else { Slot::Team2 };
            (index / 2, slot)
        }
        RoundKind::Elite8 => ELITE_EIGHT_FEEDS[index],
        RoundKind::FinalFour => FINAL_FOUR_FEEDS[index],
        RoundKind::Championship => return None,
    };

    Some((GameRef::new(round.next()?, next_index), slot))
}

/// The two games whose winners meet in `round`/`index`, team1 side first.
pub(crate) fn feeders(round: RoundKind, index: usize) -> Option<[GameRef; 2]> {
    let prev = round.prev()?;
    let target = GameRef::new(round, index);
    let source = |slot: Slot| {
        (0..prev.game_count())
            .find(|&i| next_slot(prev, i) == Some((target, slot)))
            .map(|i| GameRef::new(prev, i))
    };
    Some([source(Slot::Team1)?, source(Slot::Team2)?])
}

impl Bracket {
    /// Mark `team` as the winner of a game and move it into its next-round slot
    /// (or onto `self.winner` after the championship).
    ///
    /// Later rounds are not touched: if an earlier pick is changed after later
    /// picks were made, those later picks keep the replaced team until
    /// [`Bracket::invalidate_downstream`] is called.
    pub fn select_winner(&mut self, round: RoundKind, index: usize, team: &Team) -> BracketResult<()> {
        let game = self
            .game_mut(round, index)
            .ok_or(BracketError::GameNotFound { round, index })?;

        // The occupant is stored, not the caller's copy: a stale seed or
        // region on `team` must not travel forward.
        let Some(winner) = game.slot_of(&team.name).and_then(|slot| game.team(slot).cloned()) else {
            return Err(BracketError::TeamNotInGame {
                team: team.name.clone(),
                round,
                index,
            });
        };

        game.winner = Some(winner.clone());
        debug!("{} wins {round} game {index}", winner.name);

        match next_slot(round, index) {
            Some((next, slot)) => {
                if let Some(next_game) = self.game_mut(next.round, next.index) {
                    *next_game.team_mut(slot) = Some(winner);
                }
            }
            None => self.winner = Some(winner),
        }
        Ok(())
    }

    /// Owned variant of [`Bracket::select_winner`] for callers that keep
    /// brackets as values.
    pub fn with_winner(mut self, round: RoundKind, index: usize, team: &Team) -> BracketResult<Self> {
        self.select_winner(round, index, team)?;
        Ok(self)
    }

    /// Push a game's current winner forward through the rounds, replacing
    /// whatever was carried before. Any later winner that is no longer one of
    /// its game's teams is cleared and the clearing continues past it.
    ///
    /// Returns the number of slots and winners changed.
    pub fn invalidate_downstream(&mut self, round: RoundKind, index: usize) -> usize {
        let mut changed = 0;
        let mut current = GameRef::new(round, index);

        while let Some(game) = self.get(current) {
            let carried = game.winner.clone();

            let Some((next, slot)) = next_slot(current.round, current.index) else {
                if !same_team(self.winner.as_ref(), carried.as_ref()) {
                    self.winner = carried;
                    changed += 1;
                }
                break;
            };

            let Some(next_game) = self.game_mut(next.round, next.index) else {
                break;
            };
            if !same_team(next_game.team(slot), carried.as_ref()) {
                *next_game.team_mut(slot) = carried;
                changed += 1;
            }

            let stale = next_game
                .winner_name()
                .is_some_and(|name| next_game.slot_of(name).is_none());
            if !stale {
                break;
            }
            next_game.winner = None;
            changed += 1;
            current = next;
        }

        if changed > 0 {
            debug!("invalidated {changed} cells downstream of {round} game {index}");
        }
        changed
    }
}
