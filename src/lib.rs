//! Swiss tournament organizer: library with models, the pairing/standings
//! engine and the round lifecycle service.

pub mod clock;
pub mod config;
pub mod export;
pub mod logic;
pub mod models;
pub mod persistence;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use logic::{
    build_prior_matchups, compute_standings, pair_round, pair_round_with_outcome,
    select_bye_player, shuffle, PairingOutcome, PairingPlan, TIEBREAK_FLOOR,
};
pub use models::{
    GameScore, Match, MatchId, MatchResult, Player, PlayerId, Roster, Round, RoundStatus, Standing,
    Tournament, TournamentError, TournamentId, TournamentStatus, BYE_GAME_WINS,
};
pub use persistence::{AppData, JsonFileStore};
pub use service::TournamentService;
