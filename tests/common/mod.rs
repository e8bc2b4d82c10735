//! Shared builders for integration tests.
#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::cell::Cell;
use swiss_tournament::{Clock, Match, MatchResult, PlayerId, Round, RoundStatus};

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
}

pub fn ids(names: &[&str]) -> Vec<PlayerId> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn played(p1: &str, p2: &str, p1_wins: u32, p2_wins: u32, draws: u32) -> Match {
    let mut m = Match::new(p1.to_string(), p2.to_string());
    m.result = Some(MatchResult::new(p1_wins, p2_wins, draws, at(0)));
    m
}

pub fn bye(p: &str) -> Match {
    Match::bye(p.to_string(), at(0))
}

pub fn complete(number: u32, matches: Vec<Match>) -> Round {
    let mut round = Round::new(number, matches);
    round.status = RoundStatus::Complete;
    round
}

/// Completed round where player 1 of each pair wins 2-0.
pub fn round_of(number: u32, pairs: &[(&str, &str)]) -> Round {
    complete(number, pairs.iter().map(|(a, b)| played(a, b, 2, 0, 0)).collect())
}

/// Advances one second every time it is read.
#[derive(Debug, Default)]
pub struct StepClock(Cell<i64>);

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let t = self.0.get() + 1;
        self.0.set(t);
        at(t)
    }
}
