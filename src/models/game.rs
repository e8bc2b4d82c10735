//! Match and MatchResult for 1v1 games, plus the per-round container.

use crate::models::player::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Games won by a bye recipient.
pub const BYE_GAME_WINS: u32 = 2;

/// Game counts for one match plus when they were entered.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub player1_wins: u32,
    pub player2_wins: u32,
    /// Drawn games (not a drawn match).
    pub draws: u32,
    pub submitted_at: DateTime<Utc>,
    /// None until the result is edited after the first submission.
    pub corrected_at: Option<DateTime<Utc>>,
}

impl MatchResult {
    pub fn new(player1_wins: u32, player2_wins: u32, draws: u32, submitted_at: DateTime<Utc>) -> Self {
        Self {
            player1_wins,
            player2_wins,
            draws,
            submitted_at,
            corrected_at: None,
        }
    }

    /// Synthetic 2-0 result given to a bye.
    pub fn bye(at: DateTime<Utc>) -> Self {
        Self::new(BYE_GAME_WINS, 0, 0, at)
    }

    pub fn games_played(&self) -> u32 {
        self.player1_wins + self.player2_wins + self.draws
    }
}

/// Game counts as entered by a caller, before timestamps are applied.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameScore {
    pub player1_wins: u32,
    pub player2_wins: u32,
    #[serde(default)]
    pub draws: u32,
}

impl GameScore {
    pub fn new(player1_wins: u32, player2_wins: u32, draws: u32) -> Self {
        Self {
            player1_wins,
            player2_wins,
            draws,
        }
    }
}

/// A single match between two players, or a bye (no player 2).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub player1: PlayerId,
    /// None for a bye.
    pub player2: Option<PlayerId>,
    pub is_bye: bool,
    /// None if not yet played.
    pub result: Option<MatchResult>,
}

impl Match {
    pub fn new(player1: PlayerId, player2: PlayerId) -> Self {
        Self {
            id: Uuid::new_v4(),
            player1,
            player2: Some(player2),
            is_bye: false,
            result: None,
        }
    }

    /// A bye is resolved the moment it is created.
    pub fn bye(player: PlayerId, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            player1: player,
            player2: None,
            is_bye: true,
            result: Some(MatchResult::bye(at)),
        }
    }

    pub fn involves(&self, player: &str) -> bool {
        self.player1 == player || self.player2.as_deref() == Some(player)
    }

    /// Non-bye match still waiting for a result.
    pub fn is_pending(&self) -> bool {
        !self.is_bye && self.result.is_none()
    }
}

/// Round lifecycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    #[default]
    Active,
    Complete,
}

/// One Swiss round: 1-based number and its matches.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub status: RoundStatus,
    pub matches: Vec<Match>,
}

impl Round {
    pub fn new(number: u32, matches: Vec<Match>) -> Self {
        Self {
            number,
            status: RoundStatus::Active,
            matches,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == RoundStatus::Complete
    }

    /// Every non-bye match has a result.
    pub fn all_results_in(&self) -> bool {
        self.matches.iter().all(|m| m.is_bye || m.result.is_some())
    }

    /// Any non-bye result has been entered.
    pub fn has_entered_results(&self) -> bool {
        self.matches.iter().any(|m| !m.is_bye && m.result.is_some())
    }

    pub fn bye_match(&self) -> Option<&Match> {
        self.matches.iter().find(|m| m.is_bye)
    }

    pub fn find_match(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }
}
