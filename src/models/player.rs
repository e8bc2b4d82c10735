//! Player and the global Roster.

use crate::models::tournament::TournamentError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, stable identifier for a player (used in matches and lookups).
pub type PlayerId = String;

/// A player known to the organizer. Tournaments only ever store the id.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    /// Create a new player with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }

    /// Create a player with a caller-chosen id (imports, tests).
    pub fn with_id(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Global player list, independent of any tournament.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Display name for an id; unknown ids render as the raw id.
    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|p| p.name.as_str()).unwrap_or(id)
    }

    /// Add a player. Names must be non-empty and unique (case-insensitive).
    pub fn add(&mut self, name: impl Into<String>) -> Result<PlayerId, TournamentError> {
        let player = Player::new(self.validated_name(&name.into(), None)?);
        let id = player.id.clone();
        self.players.push(player);
        Ok(id)
    }

    /// Insert an already-identified player (e.g. restored from an export).
    pub fn insert(&mut self, player: Player) -> Result<(), TournamentError> {
        if self.contains(&player.id) {
            return Err(TournamentError::DuplicatePlayerName);
        }
        let name = self.validated_name(&player.name, None)?;
        self.players.push(Player { name, ..player });
        Ok(())
    }

    /// Change a display name. Historical data references the id, so nothing else moves.
    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> Result<(), TournamentError> {
        let name = self.validated_name(&name.into(), Some(id))?;
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| TournamentError::PlayerNotFound(id.to_string()))?;
        player.name = name;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<Player, TournamentError> {
        let idx = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| TournamentError::PlayerNotFound(id.to_string()))?;
        Ok(self.players.remove(idx))
    }

    fn validated_name(&self, name: &str, except: Option<&str>) -> Result<String, TournamentError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TournamentError::EmptyPlayerName);
        }
        let is_duplicate = self
            .players
            .iter()
            .filter(|p| Some(p.id.as_str()) != except)
            .any(|p| p.name.eq_ignore_ascii_case(trimmed));
        if is_duplicate {
            return Err(TournamentError::DuplicatePlayerName);
        }
        Ok(trimmed.to_string())
    }
}
