//! Tournament, TournamentStatus and TournamentError.

use crate::models::game::{Match, MatchId, Round, RoundStatus};
use crate::models::player::PlayerId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during tournament operations.
///
/// Every transition that returns one of these has left the state untouched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// There is no current tournament.
    NoTournament,
    /// Tournament is not in a state that allows this action.
    InvalidState,
    /// The action needs an active round.
    NoActiveRound,
    /// A round is already active; only one may be active at a time.
    RoundAlreadyActive,
    /// Not all non-bye matches have a result.
    IncompleteResults,
    /// Results were already entered, so the round can't be discarded.
    ResultsAlreadyEntered,
    MatchNotFound(MatchId),
    PlayerNotFound(PlayerId),
    /// Player isn't in a result-less, non-bye match of the active round.
    NotInPendingMatch(PlayerId),
    /// Both players are already in the same match.
    SameMatch,
    /// The active round has no bye.
    NoByeMatch,
    /// Need at least 2 active players to pair a round.
    NotEnoughPlayers,
    /// Player names can't be empty or blank.
    EmptyPlayerName,
    /// A player with this name already exists (names are unique, case-insensitive).
    DuplicatePlayerName,
    TournamentNotFound(TournamentId),
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::NoTournament => write!(f, "No tournament in progress"),
            TournamentError::InvalidState => write!(f, "Invalid state for this action"),
            TournamentError::NoActiveRound => write!(f, "No active round"),
            TournamentError::RoundAlreadyActive => write!(f, "A round is already active"),
            TournamentError::IncompleteResults => write!(f, "Not all matches have a result"),
            TournamentError::ResultsAlreadyEntered => {
                write!(f, "Results have already been entered for this round")
            }
            TournamentError::MatchNotFound(id) => write!(f, "Match {} not found", id),
            TournamentError::PlayerNotFound(id) => write!(f, "Player {} not found", id),
            TournamentError::NotInPendingMatch(id) => {
                write!(f, "Player {} is not in a pending match", id)
            }
            TournamentError::SameMatch => write!(f, "Players are already in the same match"),
            TournamentError::NoByeMatch => write!(f, "The current round has no bye"),
            TournamentError::NotEnoughPlayers => write!(f, "Need at least 2 players to pair a round"),
            TournamentError::EmptyPlayerName => write!(f, "Player name can't be empty"),
            TournamentError::DuplicatePlayerName => write!(f, "A player with this name already exists"),
            TournamentError::TournamentNotFound(id) => write!(f, "Tournament {} not found", id),
        }
    }
}

impl std::error::Error for TournamentError {}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    #[default]
    Active,
    Complete,
}

/// Full tournament state: who is playing, who dropped, and every round so far.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: TournamentStatus,
    /// Active player ids, in entry order.
    #[serde(default)]
    pub players: Vec<PlayerId>,
    #[serde(default)]
    pub dropped: Vec<PlayerId>,
    #[serde(default)]
    pub rounds: Vec<Round>,
    /// Round-1 seating order; ignored once round 1 exists.
    #[serde(default)]
    pub seating: Option<Vec<PlayerId>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Create an active tournament with no rounds.
    pub fn new(players: Vec<PlayerId>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            status: TournamentStatus::Active,
            players,
            dropped: Vec::new(),
            rounds: Vec::new(),
            seating: None,
            completed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TournamentStatus::Active
    }

    pub fn completed_rounds(&self) -> Vec<Round> {
        self.rounds.iter().filter(|r| r.is_complete()).cloned().collect()
    }

    /// The most recent round, whatever its status.
    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn active_round(&self) -> Option<&Round> {
        self.rounds.iter().find(|r| r.status == RoundStatus::Active)
    }

    pub fn active_round_mut(&mut self) -> Option<&mut Round> {
        self.rounds.iter_mut().find(|r| r.status == RoundStatus::Active)
    }

    pub fn next_round_number(&self) -> u32 {
        u32::try_from(self.rounds.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    /// The round containing a match, and the match itself.
    pub fn find_match(&self, id: MatchId) -> Option<(&Round, &Match)> {
        self.rounds
            .iter()
            .find_map(|r| r.find_match(id).map(|m| (r, m)))
    }

    pub fn find_match_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        self.rounds
            .iter_mut()
            .flat_map(|r| r.matches.iter_mut())
            .find(|m| m.id == id)
    }

    /// True when the active round (if any) has every non-bye result.
    pub fn is_round_complete(&self) -> bool {
        self.active_round().map(Round::all_results_in).unwrap_or(false)
    }

    /// Results may be edited only while their round is still active.
    pub fn can_correct_result(&self, match_id: MatchId) -> bool {
        self.find_match(match_id)
            .map(|(round, m)| !round.is_complete() && !m.is_bye)
            .unwrap_or(false)
    }

    /// Round-1 player order: the seating when set, else entry order.
    pub fn seating_order(&self) -> Vec<PlayerId> {
        match &self.seating {
            Some(seating) => seating
                .iter()
                .filter(|id| self.players.contains(id))
                .cloned()
                .collect(),
            None => self.players.clone(),
        }
    }

    /// Remove a player from future pairings. Past rounds are untouched.
    pub fn drop_player(&mut self, player_id: &str) -> Result<(), TournamentError> {
        let idx = self
            .players
            .iter()
            .position(|p| p == player_id)
            .ok_or_else(|| TournamentError::PlayerNotFound(player_id.to_string()))?;
        let id = self.players.remove(idx);
        if let Some(seating) = self.seating.as_mut() {
            seating.retain(|p| *p != id);
        }
        self.dropped.push(id);
        Ok(())
    }

    /// Put a dropped player back into future pairings.
    pub fn undrop_player(&mut self, player_id: &str) -> Result<(), TournamentError> {
        let idx = self
            .dropped
            .iter()
            .position(|p| p == player_id)
            .ok_or_else(|| TournamentError::PlayerNotFound(player_id.to_string()))?;
        let id = self.dropped.remove(idx);
        if let Some(seating) = self.seating.as_mut() {
            seating.push(id.clone());
        }
        self.players.push(id);
        Ok(())
    }
}
