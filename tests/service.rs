//! Integration tests for the round and tournament lifecycle.

mod common;

use common::{day, ids, StepClock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use swiss_tournament::{
    AppData, GameScore, PairingOutcome, Round, TournamentError, TournamentService,
    TournamentStatus, BYE_GAME_WINS, TIEBREAK_FLOOR,
};

fn service_with(names: &[&str]) -> TournamentService<StepClock> {
    let mut s = TournamentService::with_clock(AppData::default(), StepClock::default());
    s.create_tournament(ids(names), day()).unwrap();
    s
}

fn active_round(s: &TournamentService<StepClock>) -> &Round {
    s.tournament().unwrap().active_round().unwrap()
}

/// Enter a 2-0 win for player 1 in every pending match.
fn finish_round(s: &mut TournamentService<StepClock>) {
    let pending: Vec<_> = active_round(s)
        .matches
        .iter()
        .filter(|m| m.is_pending())
        .map(|m| m.id)
        .collect();
    for id in pending {
        s.submit_result(id, GameScore::new(2, 0, 0)).unwrap();
    }
    s.complete_current_round().unwrap();
}

fn player_of(s: &TournamentService<StepClock>, match_index: usize, p2: bool) -> String {
    let m = &active_round(s).matches[match_index];
    if p2 {
        m.player2.clone().unwrap()
    } else {
        m.player1.clone()
    }
}

#[test]
fn five_players_round_one_folds_four_and_byes_the_fifth() {
    let mut s = service_with(&["A", "B", "C", "D", "E"]);
    assert_eq!(s.pair_next_round(), Ok(PairingOutcome::Clean));

    let round = active_round(&s);
    assert_eq!(round.number, 1);
    assert_eq!(round.matches.len(), 3);
    assert_eq!(round.matches[0].player1, "A");
    assert_eq!(round.matches[0].player2.as_deref(), Some("C"));
    assert_eq!(round.matches[1].player1, "B");
    assert_eq!(round.matches[1].player2.as_deref(), Some("D"));

    let bye = round.bye_match().unwrap();
    assert!(bye.is_bye);
    assert_eq!(bye.player1, "E");
    assert_eq!(bye.player2, None);
    let result = bye.result.as_ref().unwrap();
    assert_eq!(
        (result.player1_wins, result.player2_wins, result.draws),
        (BYE_GAME_WINS, 0, 0)
    );
}

#[test]
fn seating_order_drives_round_one() {
    let mut s = service_with(&["A", "B", "C", "D"]);
    s.set_seating(ids(&["D", "C", "B", "A"])).unwrap();
    s.pair_next_round().unwrap();

    let round = active_round(&s);
    assert_eq!(round.matches[0].player1, "D");
    assert_eq!(round.matches[0].player2.as_deref(), Some("B"));
}

#[test]
fn seating_must_be_a_permutation_of_active_players() {
    let mut s = service_with(&["A", "B", "C", "D"]);
    assert_eq!(
        s.set_seating(ids(&["A", "B", "C"])),
        Err(TournamentError::PlayerNotFound("D".to_string()))
    );
    assert_eq!(
        s.set_seating(ids(&["A", "B", "C", "Z"])),
        Err(TournamentError::PlayerNotFound("Z".to_string()))
    );
    s.shuffle_seating(&mut StdRng::seed_from_u64(3)).unwrap();
    let mut seating = s.tournament().unwrap().seating.clone().unwrap();
    seating.sort();
    assert_eq!(seating, ids(&["A", "B", "C", "D"]));
}

#[test]
fn transitions_without_tournament_are_rejected() {
    let mut s = TournamentService::with_clock(AppData::default(), StepClock::default());
    assert_eq!(s.pair_next_round(), Err(TournamentError::NoTournament));
    assert_eq!(s.complete_current_round(), Err(TournamentError::NoTournament));
    assert!(!s.is_round_complete());
    assert_eq!(s.data(), &AppData::default());
}

#[test]
fn only_one_round_may_be_active() {
    let mut s = service_with(&["A", "B", "C", "D"]);
    s.pair_next_round().unwrap();
    assert_eq!(s.pair_next_round(), Err(TournamentError::RoundAlreadyActive));
    assert_eq!(s.tournament().unwrap().rounds.len(), 1);
}

#[test]
fn complete_round_refuses_missing_results_without_changes() {
    let mut s = service_with(&["A", "B", "C", "D"]);
    s.pair_next_round().unwrap();
    let first = active_round(&s).matches[0].id;
    s.submit_result(first, GameScore::new(2, 1, 0)).unwrap();
    let before = s.snapshot();

    assert_eq!(s.complete_current_round(), Err(TournamentError::IncompleteResults));
    assert!(!s.is_round_complete());
    assert_eq!(s.snapshot(), before);
}

#[test]
fn result_timestamps_track_first_submit_and_corrections() {
    let mut s = service_with(&["A", "B"]);
    s.pair_next_round().unwrap();
    let id = active_round(&s).matches[0].id;

    s.submit_result(id, GameScore::new(2, 0, 0)).unwrap();
    let first = active_round(&s).matches[0].result.clone().unwrap();
    assert_eq!(first.corrected_at, None);
    assert!(s.can_correct_result(id));

    s.submit_result(id, GameScore::new(1, 2, 0)).unwrap();
    let second = active_round(&s).matches[0].result.clone().unwrap();
    assert_eq!(second.submitted_at, first.submitted_at);
    assert!(second.corrected_at.unwrap() > first.submitted_at);
    assert_eq!((second.player1_wins, second.player2_wins), (1, 2));

    s.complete_current_round().unwrap();
    assert!(!s.can_correct_result(id));
}

#[test]
fn bye_results_cannot_be_overwritten() {
    let mut s = service_with(&["A", "B", "C"]);
    s.pair_next_round().unwrap();
    let bye_id = active_round(&s).bye_match().unwrap().id;
    assert_eq!(
        s.submit_result(bye_id, GameScore::new(0, 2, 0)),
        Err(TournamentError::InvalidState)
    );
    assert!(!s.can_correct_result(bye_id));
}

#[test]
fn repair_is_refused_once_results_are_entered() {
    let mut s = service_with(&["A", "B", "C", "D", "E"]);
    s.pair_next_round().unwrap();
    let first = active_round(&s).matches[0].id;
    s.submit_result(first, GameScore::new(2, 0, 0)).unwrap();
    let before = s.snapshot();

    assert_eq!(
        s.repair_active_round(),
        Err(TournamentError::ResultsAlreadyEntered)
    );
    assert_eq!(s.snapshot(), before);
}

#[test]
fn repair_regenerates_the_active_round() {
    let mut s = service_with(&["A", "B", "C", "D", "E"]);
    s.pair_next_round().unwrap();
    let old_ids: HashSet<_> = active_round(&s).matches.iter().map(|m| m.id).collect();
    s.drop_player("B").unwrap();

    s.repair_active_round().unwrap();
    let t = s.tournament().unwrap();
    assert_eq!(t.rounds.len(), 1);
    let round = active_round(&s);
    assert_eq!(round.number, 1);
    assert_eq!(round.matches.len(), 2);
    assert!(round.matches.iter().all(|m| !old_ids.contains(&m.id)));
    assert!(round.matches.iter().all(|m| !m.involves("B")));
    assert!(round.bye_match().is_none());
}

#[test]
fn swap_players_between_pending_matches() {
    let mut s = service_with(&["A", "B", "C", "D", "E", "F"]);
    s.pair_next_round().unwrap();
    // Fold: A-D, B-E, C-F.
    s.swap_players("A", "E").unwrap();
    let round = active_round(&s);
    assert_eq!(round.matches[0].player1, "E");
    assert_eq!(round.matches[0].player2.as_deref(), Some("D"));
    assert_eq!(round.matches[1].player1, "B");
    assert_eq!(round.matches[1].player2.as_deref(), Some("A"));

    assert_eq!(s.swap_players("E", "D"), Err(TournamentError::SameMatch));

    let third = active_round(&s).matches[2].id;
    s.submit_result(third, GameScore::new(2, 0, 0)).unwrap();
    assert_eq!(
        s.swap_players("C", "B"),
        Err(TournamentError::NotInPendingMatch("C".to_string()))
    );
}

#[test]
fn reassign_bye_moves_old_recipient_into_the_match() {
    let mut s = service_with(&["A", "B", "C", "D", "E"]);
    s.pair_next_round().unwrap();
    assert_eq!(player_of(&s, 2, false), "E");

    s.reassign_bye("C").unwrap();
    let round = active_round(&s);
    assert_eq!(round.bye_match().unwrap().player1, "C");
    assert_eq!(round.matches[0].player1, "A");
    assert_eq!(round.matches[0].player2.as_deref(), Some("E"));

    assert_eq!(
        s.reassign_bye("C"),
        Err(TournamentError::NotInPendingMatch("C".to_string()))
    );
}

#[test]
fn reassign_bye_needs_a_bye() {
    let mut s = service_with(&["A", "B", "C", "D"]);
    s.pair_next_round().unwrap();
    assert_eq!(s.reassign_bye("A"), Err(TournamentError::NoByeMatch));
}

#[test]
fn dropped_players_leave_future_rounds_only() {
    let mut s = service_with(&["A", "B", "C", "D"]);
    s.pair_next_round().unwrap();
    finish_round(&mut s);
    s.drop_player("D").unwrap();
    s.pair_next_round().unwrap();

    let t = s.tournament().unwrap();
    assert_eq!(t.dropped, ids(&["D"]));
    assert!(t.rounds[0].matches.iter().any(|m| m.involves("D")));
    let round = active_round(&s);
    assert!(round.matches.iter().all(|m| !m.involves("D")));
    assert!(round.bye_match().is_some());
    assert_eq!(s.standings().unwrap().len(), 3);
}

#[test]
fn rematch_fallback_is_reported() {
    let mut s = service_with(&["A", "B"]);
    s.pair_next_round().unwrap();
    finish_round(&mut s);
    assert_eq!(
        s.pair_next_round(),
        Ok(PairingOutcome::Fallback { rematch_count: 1 })
    );
    assert_eq!(
        s.last_pairing_outcome(),
        Some(PairingOutcome::Fallback { rematch_count: 1 })
    );
}

#[test]
fn full_event_keeps_round_invariants() {
    let names = ["A", "B", "C", "D", "E", "F", "G"];
    let mut s = service_with(&names);
    let mut rng = StdRng::seed_from_u64(42);
    let mut bye_recipients = Vec::new();

    for number in 1..=5 {
        s.pair_next_round().unwrap();
        let round = active_round(&s).clone();
        assert_eq!(round.number, number);

        let mut seen: Vec<&str> = round
            .matches
            .iter()
            .flat_map(|m| std::iter::once(m.player1.as_str()).chain(m.player2.as_deref()))
            .collect();
        seen.sort();
        assert_eq!(seen, names.to_vec());

        bye_recipients.push(round.bye_match().unwrap().player1.clone());

        for m in round.matches.iter().filter(|m| m.is_pending()) {
            let p1: u32 = rng.gen_range(0..=2);
            let p2: u32 = if p1 == 2 { rng.gen_range(0..=1) } else { 2 };
            s.submit_result(m.id, GameScore::new(p1, p2, 0)).unwrap();
        }
        s.complete_current_round().unwrap();
    }

    let distinct: HashSet<&String> = bye_recipients.iter().collect();
    assert_eq!(distinct.len(), bye_recipients.len());

    let standings = s.standings().unwrap();
    assert_eq!(standings.len(), names.len());
    for st in &standings {
        for pct in [st.mw_pct, st.gw_pct, st.omw_pct, st.ogw_pct] {
            assert!(pct >= TIEBREAK_FLOOR);
        }
    }
    for pair in standings.windows(2) {
        assert!(pair[0].match_points >= pair[1].match_points);
    }
}

#[test]
fn finish_archive_and_reopen() {
    let mut s = service_with(&["A", "B", "C", "D"]);
    s.pair_next_round().unwrap();
    assert_eq!(s.finish_tournament(), Err(TournamentError::IncompleteResults));
    finish_round(&mut s);
    s.finish_tournament().unwrap();
    let first_id = s.tournament().unwrap().id;
    assert_eq!(s.tournament().unwrap().status, TournamentStatus::Complete);
    assert_eq!(s.pair_next_round(), Err(TournamentError::InvalidState));

    // Creating another archives the finished one.
    let second_id = s.create_tournament(ids(&["A", "B"]), day()).unwrap();
    assert_eq!(s.history().len(), 1);
    assert_eq!(s.history()[0].id, first_id);
    assert_eq!(
        s.create_tournament(ids(&["C", "D"]), day()),
        Err(TournamentError::InvalidState)
    );

    // An active current tournament blocks reopening from history.
    assert_eq!(s.reopen(Some(first_id)), Err(TournamentError::InvalidState));

    s.finish_tournament().unwrap();
    s.reopen(Some(first_id)).unwrap();
    let current = s.tournament().unwrap();
    assert_eq!(current.id, first_id);
    assert_eq!(current.status, TournamentStatus::Active);
    assert_eq!(current.completed_at, None);
    assert_eq!(s.history().len(), 1);
    assert_eq!(s.history()[0].id, second_id);

    // Reopened: play continues where it stopped.
    s.pair_next_round().unwrap();
    assert_eq!(active_round(&s).number, 2);
}

#[test]
fn reopen_current_tournament() {
    let mut s = service_with(&["A", "B"]);
    assert_eq!(s.reopen(None), Err(TournamentError::InvalidState));
    s.finish_tournament().unwrap();
    s.reopen(None).unwrap();
    assert!(s.tournament().unwrap().is_active());
}

#[test]
fn late_entry_joins_between_rounds() {
    let mut s = service_with(&["A", "B", "C"]);
    s.pair_next_round().unwrap();
    assert_eq!(
        s.add_player("D".to_string()),
        Err(TournamentError::RoundAlreadyActive)
    );
    finish_round(&mut s);
    s.add_player("D".to_string()).unwrap();
    s.pair_next_round().unwrap();

    let round = active_round(&s);
    assert_eq!(round.matches.len(), 2);
    assert!(round.bye_match().is_none());
    assert!(round.matches.iter().any(|m| m.involves("D")));
}

#[test]
fn history_entries_can_be_deleted() {
    let mut s = service_with(&["A", "B"]);
    s.finish_tournament().unwrap();
    let archived = s.tournament().unwrap().id;
    assert!(s.archive_tournament());
    assert!(s.tournament().is_none());
    assert!(!s.archive_tournament());

    assert_eq!(s.delete_from_history(archived).unwrap().id, archived);
    assert!(s.history().is_empty());
    assert_eq!(
        s.delete_from_history(archived),
        Err(TournamentError::TournamentNotFound(archived))
    );
}

#[test]
fn undropped_player_rejoins_round_one_seating() {
    let mut s = service_with(&["A", "B", "C", "D"]);
    s.set_seating(ids(&["D", "C", "B", "A"])).unwrap();
    s.drop_player("A").unwrap();
    assert_eq!(s.tournament().unwrap().seating_order(), ids(&["D", "C", "B"]));

    s.undrop_player("A").unwrap();
    let t = s.tournament().unwrap();
    assert!(t.dropped.is_empty());
    assert_eq!(t.seating_order(), ids(&["D", "C", "B", "A"]));

    s.pair_next_round().unwrap();
    let round = active_round(&s);
    assert!(round.bye_match().is_none());
    assert!(round
        .matches
        .iter()
        .any(|m| m.player1 == "C" && m.player2.as_deref() == Some("A")));
}

#[test]
fn undrop_is_refused_while_a_round_is_active() {
    let mut s = service_with(&["A", "B", "C", "D"]);
    s.pair_next_round().unwrap();
    finish_round(&mut s);
    s.drop_player("D").unwrap();
    s.pair_next_round().unwrap();

    let before = s.tournament().unwrap().clone();
    assert_eq!(s.undrop_player("D"), Err(TournamentError::RoundAlreadyActive));
    assert_eq!(s.tournament().unwrap(), &before);

    finish_round(&mut s);
    s.undrop_player("D").unwrap();
    assert_eq!(s.undrop_player("D"), Err(TournamentError::PlayerNotFound("D".to_string())));
    s.pair_next_round().unwrap();

    let round = active_round(&s);
    assert_eq!(round.number, 3);
    assert!(round.bye_match().is_none());
    assert!(round.matches.iter().any(|m| m.involves("D")));
}

#[test]
fn next_round_number_follows_round_count() {
    let mut s = service_with(&["A", "B", "C", "D"]);
    assert_eq!(s.tournament().unwrap().next_round_number(), 1);
    s.pair_next_round().unwrap();
    assert_eq!(s.tournament().unwrap().next_round_number(), 2);
    finish_round(&mut s);
    s.pair_next_round().unwrap();
    assert_eq!(active_round(&s).number, 2);
    assert_eq!(s.tournament().unwrap().next_round_number(), 3);
}
