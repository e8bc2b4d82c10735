//! Bye selection for odd-sized rounds.

use crate::models::{PlayerId, Round};
use std::collections::HashSet;

/// Everyone who has received a bye in a completed round.
pub fn bye_recipients(completed_rounds: &[Round]) -> HashSet<&str> {
    completed_rounds
        .iter()
        .filter(|r| r.is_complete())
        .flat_map(|r| r.matches.iter())
        .filter(|m| m.is_bye)
        .map(|m| m.player1.as_str())
        .collect()
}

/// Pick the bye from `ordered_player_ids` (best to worst).
///
/// Scans from the bottom for the first player without a previous bye. Once
/// everyone has had one, the worst-ranked player gets it again. Returns None
/// only for an empty list.
pub fn select_bye_player(ordered_player_ids: &[PlayerId], completed_rounds: &[Round]) -> Option<PlayerId> {
    let had_bye = bye_recipients(completed_rounds);
    ordered_player_ids
        .iter()
        .rev()
        .find(|id| !had_bye.contains(id.as_str()))
        .or_else(|| ordered_player_ids.last())
        .cloned()
}
