//! Data structures for the Swiss tournament: players, matches, rounds, standings.

mod game;
mod player;
mod standing;
mod tournament;

pub use game::{GameScore, Match, MatchId, MatchResult, Round, RoundStatus, BYE_GAME_WINS};
pub use player::{Player, PlayerId, Roster};
pub use standing::Standing;
pub use tournament::{Tournament, TournamentError, TournamentId, TournamentStatus};
