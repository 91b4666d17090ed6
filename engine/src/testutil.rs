use crate::{Bracket, Region, RoundKind, Slot, Team};

/// A full 64-team field named "<Region> <seed>".
pub(crate) fn field() -> Vec<Team> {
    Region::ALL
        .iter()
        .flat_map(|&region| (1..=16).map(move |seed| Team::new(format!("{region} {seed}"), seed, region)))
        .collect()
}

pub(crate) fn seeded_bracket() -> Bracket {
    Bracket::from_teams(&field()).unwrap()
}

/// Decide every game for the better seed (team1 on ties), round by round.
pub(crate) fn chalk(bracket: &mut Bracket) {
    for round in RoundKind::ALL {
        for index in 0..round.game_count() {
            let game = bracket.game(round, index).unwrap();
            let favourite = [game.team1.clone(), game.team2.clone()]
                .into_iter()
                .flatten()
                .min_by_key(|t| t.seed)
                .unwrap();
            bracket.select_winner(round, index, &favourite).unwrap();
        }
    }
}

/// Decide one game for whoever occupies `slot`, returning that team.
pub(crate) fn decide(bracket: &mut Bracket, round: RoundKind, index: usize, slot: Slot) -> Team {
    let team = bracket.game(round, index).unwrap().team(slot).unwrap().clone();
    bracket.select_winner(round, index, &team).unwrap();
    team
}
