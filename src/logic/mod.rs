//! Swiss engine: standings and tiebreakers, bye selection, pairing.

mod bye;
mod pairing;
mod standings;

pub use bye::{bye_recipients, select_bye_player};
pub use pairing::{
    build_prior_matchups, fold_pairing, matchup_key, pair_round, pair_round_with_outcome, shuffle,
    MatchupKey, PairingOutcome, PairingPlan,
};
pub use standings::{
    compute_standings, POINTS_PER_DRAW, POINTS_PER_WIN, TIEBREAK_EPSILON, TIEBREAK_FLOOR,
};
