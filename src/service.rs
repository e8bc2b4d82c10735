//! Round and tournament lifecycle.
//!
//! `TournamentService` owns the roster, the current tournament and the archive.
//! Every transition either applies completely or returns an error and leaves
//! the state exactly as it was.

use crate::clock::{Clock, SystemClock};
use crate::logic::{compute_standings, pair_round_with_outcome, select_bye_player, shuffle, PairingOutcome};
use crate::models::{
    GameScore, Match, MatchId, MatchResult, PlayerId, Round, RoundStatus, Roster, Standing,
    Tournament, TournamentError, TournamentId, TournamentStatus,
};
use crate::persistence::AppData;
use chrono::NaiveDate;
use rand::Rng;

#[derive(Debug, Default)]
pub struct TournamentService<C: Clock = SystemClock> {
    data: AppData,
    clock: C,
    last_pairing: Option<PairingOutcome>,
}

impl TournamentService<SystemClock> {
    /// Service over previously saved data, using the wall clock.
    pub fn new(data: AppData) -> Self {
        Self::with_clock(data, SystemClock)
    }
}

impl<C: Clock> TournamentService<C> {
    pub fn with_clock(data: AppData, clock: C) -> Self {
        Self {
            data,
            clock,
            last_pairing: None,
        }
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }

    /// Snapshot for persistence.
    pub fn snapshot(&self) -> AppData {
        self.data.clone()
    }

    pub fn roster(&self) -> &Roster {
        &self.data.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.data.roster
    }

    pub fn tournament(&self) -> Option<&Tournament> {
        self.data.tournament.as_ref()
    }

    pub fn history(&self) -> &[Tournament] {
        &self.data.history
    }

    /// How the most recent round was paired (rematches forced or not).
    pub fn last_pairing_outcome(&self) -> Option<PairingOutcome> {
        self.last_pairing
    }

    fn current(&self) -> Result<&Tournament, TournamentError> {
        self.data.tournament.as_ref().ok_or(TournamentError::NoTournament)
    }

    fn current_mut(&mut self) -> Result<&mut Tournament, TournamentError> {
        self.data.tournament.as_mut().ok_or(TournamentError::NoTournament)
    }

    fn active_mut(&mut self) -> Result<&mut Tournament, TournamentError> {
        let t = self.current_mut()?;
        if !t.is_active() {
            return Err(TournamentError::InvalidState);
        }
        Ok(t)
    }

    fn active_round_mut(&mut self) -> Result<&mut Round, TournamentError> {
        self.active_mut()?
            .active_round_mut()
            .ok_or(TournamentError::NoActiveRound)
    }

    // ---- queries ----

    /// Standings of the current tournament's active players.
    pub fn standings(&self) -> Result<Vec<Standing>, TournamentError> {
        let t = self.current()?;
        Ok(compute_standings(&t.players, &t.rounds))
    }

    pub fn is_round_complete(&self) -> bool {
        self.tournament().map(Tournament::is_round_complete).unwrap_or(false)
    }

    pub fn can_correct_result(&self, match_id: MatchId) -> bool {
        self.tournament()
            .map(|t| t.is_active() && t.can_correct_result(match_id))
            .unwrap_or(false)
    }

    // ---- tournament lifecycle ----

    /// Start a new tournament. A completed current tournament is archived first;
    /// an active one must be finished before another can be created.
    pub fn create_tournament(
        &mut self,
        player_ids: Vec<PlayerId>,
        date: NaiveDate,
    ) -> Result<TournamentId, TournamentError> {
        if self.data.tournament.as_ref().is_some_and(Tournament::is_active) {
            return Err(TournamentError::InvalidState);
        }
        let mut players: Vec<PlayerId> = Vec::with_capacity(player_ids.len());
        for id in player_ids {
            if !players.contains(&id) {
                players.push(id);
            }
        }
        self.archive_tournament();
        let tournament = Tournament::new(players, date);
        let id = tournament.id;
        log::info!(
            "Created tournament {} with {} players",
            id,
            tournament.players.len()
        );
        self.data.tournament = Some(tournament);
        self.last_pairing = None;
        Ok(id)
    }

    /// Move a completed current tournament into the history. No-op otherwise.
    pub fn archive_tournament(&mut self) -> bool {
        match self.data.tournament.take() {
            Some(t) if t.status == TournamentStatus::Complete => {
                log::info!("Archived tournament {}", t.id);
                self.data.history.push(t);
                true
            }
            other => {
                self.data.tournament = other;
                false
            }
        }
    }

    /// Round-1 seating. Must be a permutation of the active players and
    /// can only change before round 1 is paired.
    pub fn set_seating(&mut self, order: Vec<PlayerId>) -> Result<(), TournamentError> {
        let t = self.active_mut()?;
        if !t.rounds.is_empty() {
            return Err(TournamentError::InvalidState);
        }
        if let Some(unknown) = order.iter().find(|id| !t.players.contains(id)) {
            return Err(TournamentError::PlayerNotFound(unknown.clone()));
        }
        if let Some(missing) = t.players.iter().find(|id| !order.contains(id)) {
            return Err(TournamentError::PlayerNotFound(missing.clone()));
        }
        if order.len() != t.players.len() {
            return Err(TournamentError::InvalidState);
        }
        t.seating = Some(order);
        Ok(())
    }

    /// Randomise the round-1 seating.
    pub fn shuffle_seating<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), TournamentError> {
        let t = self.active_mut()?;
        if !t.rounds.is_empty() {
            return Err(TournamentError::InvalidState);
        }
        let mut order = t.players.clone();
        shuffle(&mut order, rng);
        t.seating = Some(order);
        Ok(())
    }

    /// Late entry: joins from the next round with no history.
    pub fn add_player(&mut self, player_id: PlayerId) -> Result<(), TournamentError> {
        let t = self.active_mut()?;
        if t.active_round().is_some() {
            return Err(TournamentError::RoundAlreadyActive);
        }
        if t.players.contains(&player_id) {
            return Err(TournamentError::InvalidState);
        }
        t.dropped.retain(|p| *p != player_id);
        if let Some(seating) = t.seating.as_mut() {
            seating.push(player_id.clone());
        }
        t.players.push(player_id);
        Ok(())
    }

    /// Remove a player from future pairings. Past rounds are untouched.
    pub fn drop_player(&mut self, player_id: &str) -> Result<(), TournamentError> {
        self.active_mut()?.drop_player(player_id)?;
        log::info!("Dropped player {}", player_id);
        Ok(())
    }

    /// Bring a dropped player back. Like late entry, only between rounds.
    pub fn undrop_player(&mut self, player_id: &str) -> Result<(), TournamentError> {
        let t = self.active_mut()?;
        if t.active_round().is_some() {
            return Err(TournamentError::RoundAlreadyActive);
        }
        t.undrop_player(player_id)?;
        log::info!("Player {} rejoined", player_id);
        Ok(())
    }

    /// Active -> Complete. An active round with every result in is completed
    /// along the way; one with missing results blocks finishing.
    pub fn finish_tournament(&mut self) -> Result<(), TournamentError> {
        let now = self.clock.now();
        let t = self.active_mut()?;
        if let Some(round) = t.active_round() {
            if !round.all_results_in() {
                return Err(TournamentError::IncompleteResults);
            }
        }
        if let Some(round) = t.active_round_mut() {
            round.status = RoundStatus::Complete;
        }
        t.status = TournamentStatus::Complete;
        t.completed_at = Some(now);
        log::info!("Finished tournament {} after {} rounds", t.id, t.rounds.len());
        Ok(())
    }

    /// Move a completed tournament back to active.
    ///
    /// `None` reopens the current tournament. `Some(id)` takes it out of the
    /// history; a completed current tournament is archived in its place, while
    /// an active one blocks the reopen.
    pub fn reopen(&mut self, id: Option<TournamentId>) -> Result<(), TournamentError> {
        let target = match id {
            None => self.current()?.id,
            Some(id) => id,
        };
        if let Some(current) = self.data.tournament.as_mut().filter(|t| t.id == target) {
            if current.is_active() {
                return Err(TournamentError::InvalidState);
            }
            current.status = TournamentStatus::Active;
            current.completed_at = None;
            log::info!("Reopened tournament {}", target);
            return Ok(());
        }
        let idx = self
            .data
            .history
            .iter()
            .position(|t| t.id == target)
            .ok_or(TournamentError::TournamentNotFound(target))?;
        if self.data.tournament.as_ref().is_some_and(Tournament::is_active) {
            return Err(TournamentError::InvalidState);
        }
        let mut reopened = self.data.history.remove(idx);
        reopened.status = TournamentStatus::Active;
        reopened.completed_at = None;
        self.archive_tournament();
        self.data.tournament = Some(reopened);
        self.last_pairing = None;
        log::info!("Reopened tournament {} from history", target);
        Ok(())
    }

    pub fn delete_from_history(&mut self, id: TournamentId) -> Result<Tournament, TournamentError> {
        let idx = self
            .data
            .history
            .iter()
            .position(|t| t.id == id)
            .ok_or(TournamentError::TournamentNotFound(id))?;
        Ok(self.data.history.remove(idx))
    }

    // ---- rounds ----

    /// Pair and open the next round.
    ///
    /// Round 1 uses the seating order, later rounds the standings. With an odd
    /// field the bye goes to the lowest-ranked player who hasn't had one and is
    /// recorded as an immediate 2-0 win.
    pub fn pair_next_round(&mut self) -> Result<PairingOutcome, TournamentError> {
        let now = self.clock.now();
        let t = self.active_mut()?;
        if t.active_round().is_some() {
            return Err(TournamentError::RoundAlreadyActive);
        }
        if t.players.len() < 2 {
            return Err(TournamentError::NotEnoughPlayers);
        }

        let completed = t.completed_rounds();
        let mut order: Vec<PlayerId> = if completed.is_empty() {
            t.seating_order()
        } else {
            compute_standings(&t.players, &completed)
                .into_iter()
                .map(|s| s.player_id)
                .collect()
        };

        let bye = if order.len() % 2 == 1 {
            let bye = select_bye_player(&order, &completed);
            order.retain(|id| Some(id) != bye.as_ref());
            bye
        } else {
            None
        };

        let plan = pair_round_with_outcome(&order, &completed, bye.as_deref());
        let mut matches: Vec<Match> = plan
            .pairs
            .into_iter()
            .map(|(p1, p2)| Match::new(p1, p2))
            .collect();
        if let Some(bye) = bye {
            matches.push(Match::bye(bye, now));
        }

        let number = t.next_round_number();
        t.rounds.push(Round::new(number, matches));
        match plan.outcome {
            PairingOutcome::Clean => log::info!("Paired round {} of tournament {}", number, t.id),
            PairingOutcome::Fallback { rematch_count } => log::warn!(
                "Round {} of tournament {} needed {} rematch(es): no rematch-free pairing exists",
                number,
                t.id,
                rematch_count
            ),
        }
        self.last_pairing = Some(plan.outcome);
        Ok(plan.outcome)
    }

    /// Enter or overwrite a match result.
    ///
    /// The first write stamps `submitted_at`, later writes `corrected_at`.
    /// Whether the round may still be edited is the caller's check
    /// (`can_correct_result`). Bye results are fixed.
    pub fn submit_result(&mut self, match_id: MatchId, score: GameScore) -> Result<(), TournamentError> {
        let now = self.clock.now();
        let m = self
            .current_mut()?
            .find_match_mut(match_id)
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        if m.is_bye {
            return Err(TournamentError::InvalidState);
        }
        m.result = Some(match m.result.take() {
            Some(previous) => MatchResult {
                player1_wins: score.player1_wins,
                player2_wins: score.player2_wins,
                draws: score.draws,
                submitted_at: previous.submitted_at,
                corrected_at: Some(now),
            },
            None => MatchResult::new(score.player1_wins, score.player2_wins, score.draws, now),
        });
        log::debug!(
            "Result for match {}: {}-{}-{}",
            match_id,
            score.player1_wins,
            score.player2_wins,
            score.draws
        );
        Ok(())
    }

    /// Close the active round. Fails without changes while any non-bye
    /// match has no result.
    pub fn complete_current_round(&mut self) -> Result<(), TournamentError> {
        let round = self.active_round_mut()?;
        if !round.all_results_in() {
            return Err(TournamentError::IncompleteResults);
        }
        round.status = RoundStatus::Complete;
        log::info!("Completed round {}", round.number);
        Ok(())
    }

    /// Exchange two players between their pending matches in the active round.
    pub fn swap_players(&mut self, a: &str, b: &str) -> Result<(), TournamentError> {
        let round = self.active_round_mut()?;
        let ia = pending_match_index(round, a)?;
        let ib = pending_match_index(round, b)?;
        if ia == ib {
            return Err(TournamentError::SameMatch);
        }
        let slot_a = slot_of(&round.matches[ia], a);
        let slot_b = slot_of(&round.matches[ib], b);
        *slot_mut(&mut round.matches[ia], slot_a) = b.to_string();
        *slot_mut(&mut round.matches[ib], slot_b) = a.to_string();
        Ok(())
    }

    /// Give the bye to `new_id`; the old bye recipient takes `new_id`'s seat
    /// in its pending match.
    pub fn reassign_bye(&mut self, new_id: &str) -> Result<(), TournamentError> {
        let round = self.active_round_mut()?;
        let bye_idx = round
            .matches
            .iter()
            .position(|m| m.is_bye)
            .ok_or(TournamentError::NoByeMatch)?;
        let target_idx = pending_match_index(round, new_id)?;
        let old_bye = round.matches[bye_idx].player1.clone();
        let slot = slot_of(&round.matches[target_idx], new_id);
        *slot_mut(&mut round.matches[target_idx], slot) = old_bye;
        round.matches[bye_idx].player1 = new_id.to_string();
        Ok(())
    }

    /// Throw away the active round and pair it again from the current
    /// standings. Refused once any non-bye result has been entered.
    pub fn repair_active_round(&mut self) -> Result<PairingOutcome, TournamentError> {
        let t = self.active_mut()?;
        let round = t.active_round().ok_or(TournamentError::NoActiveRound)?;
        if round.has_entered_results() {
            return Err(TournamentError::ResultsAlreadyEntered);
        }
        let idx = t
            .rounds
            .iter()
            .position(|r| r.status == RoundStatus::Active)
            .ok_or(TournamentError::NoActiveRound)?;
        let discarded = t.rounds.remove(idx);
        match self.pair_next_round() {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if let Some(t) = self.data.tournament.as_mut() {
                    t.rounds.insert(idx, discarded);
                }
                Err(e)
            }
        }
    }
}

/// Which side of a match a player sits on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Slot {
    One,
    Two,
}

fn pending_match_index(round: &Round, player: &str) -> Result<usize, TournamentError> {
    round
        .matches
        .iter()
        .position(|m| m.is_pending() && m.involves(player))
        .ok_or_else(|| TournamentError::NotInPendingMatch(player.to_string()))
}

fn slot_of(m: &Match, player: &str) -> Slot {
    if m.player1 == player {
        Slot::One
    } else {
        Slot::Two
    }
}

fn slot_mut(m: &mut Match, slot: Slot) -> &mut PlayerId {
    match slot {
        Slot::One => &mut m.player1,
        Slot::Two => m.player2.get_or_insert_with(String::new),
    }
}
