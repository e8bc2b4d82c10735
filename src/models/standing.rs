//! Derived per-player standings row (never persisted).

use crate::models::player::PlayerId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub player_id: PlayerId,
    pub match_points: u32,
    pub match_wins: u32,
    pub match_losses: u32,
    pub match_draws: u32,
    pub games_won: u32,
    pub games_played: u32,
    pub has_bye: bool,
    pub mw_pct: f64,
    pub gw_pct: f64,
    pub omw_pct: f64,
    pub ogw_pct: f64,
}

impl Standing {
    pub fn matches_played(&self) -> u32 {
        self.match_wins + self.match_losses + self.match_draws
    }

    /// "W-L-D" record for display.
    pub fn record(&self) -> String {
        format!("{}-{}-{}", self.match_wins, self.match_losses, self.match_draws)
    }
}
