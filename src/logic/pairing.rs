//! Swiss pairing: fold pairing for round 1, rematch-free backtracking after
//! that, and a sequential fallback when every complete pairing has a rematch.

use crate::models::{PlayerId, Round};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Unordered pair of player ids, stored smallest first.
pub type MatchupKey = (PlayerId, PlayerId);

/// Whether the pairing had to allow rematches.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PairingOutcome {
    Clean,
    Fallback { rematch_count: usize },
}

/// Pairs for one round, in table order, plus how they were found.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PairingPlan {
    pub pairs: Vec<(PlayerId, PlayerId)>,
    pub outcome: PairingOutcome,
}

pub fn matchup_key(a: &str, b: &str) -> MatchupKey {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Every pair that already met in a completed round. Byes are not matchups.
pub fn build_prior_matchups(completed_rounds: &[Round]) -> HashSet<MatchupKey> {
    completed_rounds
        .iter()
        .filter(|r| r.is_complete())
        .flat_map(|r| r.matches.iter())
        .filter(|m| !m.is_bye)
        .filter_map(|m| m.player2.as_deref().map(|p2| matchup_key(&m.player1, p2)))
        .collect()
}

/// Randomly permute `items` in place (Fisher-Yates). Pass a seeded rng for repeatable seatings.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

/// Round-1 pairing: position i plays position i + half.
pub fn fold_pairing(players: &[PlayerId]) -> Vec<(PlayerId, PlayerId)> {
    let half = players.len() / 2;
    (0..half)
        .map(|i| (players[i].clone(), players[i + half].clone()))
        .collect()
}

/// Pair the next round and return only the pairs.
pub fn pair_round(
    ordered_player_ids: &[PlayerId],
    completed_rounds: &[Round],
    bye_player_id: Option<&str>,
) -> Vec<(PlayerId, PlayerId)> {
    pair_round_with_outcome(ordered_player_ids, completed_rounds, bye_player_id).pairs
}

/// Pair the next round.
///
/// `ordered_player_ids` is the seating order for round 1 and the standings
/// order afterwards. The bye player should already be absent from it; it is
/// filtered out again if present. With an odd count the last player is left
/// unpaired.
pub fn pair_round_with_outcome(
    ordered_player_ids: &[PlayerId],
    completed_rounds: &[Round],
    bye_player_id: Option<&str>,
) -> PairingPlan {
    let players: Vec<PlayerId> = ordered_player_ids
        .iter()
        .filter(|id| Some(id.as_str()) != bye_player_id)
        .cloned()
        .collect();

    if !completed_rounds.iter().any(Round::is_complete) {
        return PairingPlan {
            pairs: fold_pairing(&players),
            outcome: PairingOutcome::Clean,
        };
    }

    let prior = build_prior_matchups(completed_rounds);
    let even = players.len() - players.len() % 2;
    let field = &players[..even];

    if let Some(indices) = Backtracker::new(field, &prior).solve() {
        return PairingPlan {
            pairs: indices
                .into_iter()
                .map(|(a, b)| (field[a].clone(), field[b].clone()))
                .collect(),
            outcome: PairingOutcome::Clean,
        };
    }

    let pairs: Vec<(PlayerId, PlayerId)> = field
        .chunks_exact(2)
        .map(|c| (c[0].clone(), c[1].clone()))
        .collect();
    let rematch_count = pairs
        .iter()
        .filter(|(a, b)| prior.contains(&matchup_key(a, b)))
        .count();
    PairingPlan {
        pairs,
        outcome: PairingOutcome::Fallback { rematch_count },
    }
}

/// Depth-first search over player indices.
///
/// The first unpaired player is tried against each later unpaired player it
/// hasn't met, nearest first. `used` is toggled in place; sets of remaining
/// players already proven unpairable are remembered so a dead end is explored
/// once. Remembering dead ends never changes which pairing is found first.
struct Backtracker {
    n: usize,
    /// played[i][j]: i and j already met.
    played: Vec<Vec<bool>>,
    used: Vec<bool>,
    pairs: Vec<(usize, usize)>,
    dead: HashSet<Vec<bool>>,
}

impl Backtracker {
    fn new(field: &[PlayerId], prior: &HashSet<MatchupKey>) -> Self {
        let n = field.len();
        let played = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| i != j && prior.contains(&matchup_key(&field[i], &field[j])))
                    .collect()
            })
            .collect();
        Self {
            n,
            played,
            used: vec![false; n],
            pairs: Vec::with_capacity(n / 2),
            dead: HashSet::new(),
        }
    }

    fn solve(mut self) -> Option<Vec<(usize, usize)>> {
        if self.search() {
            Some(self.pairs)
        } else {
            None
        }
    }

    fn search(&mut self) -> bool {
        let Some(first) = self.used.iter().position(|u| !u) else {
            return true;
        };
        if self.dead.contains(&self.used) {
            return false;
        }
        self.used[first] = true;
        for candidate in first + 1..self.n {
            if self.used[candidate] || self.played[first][candidate] {
                continue;
            }
            self.used[candidate] = true;
            self.pairs.push((first, candidate));
            if self.search() {
                return true;
            }
            self.pairs.pop();
            self.used[candidate] = false;
        }
        self.used[first] = false;
        self.dead.insert(self.used.clone());
        false
    }
}
