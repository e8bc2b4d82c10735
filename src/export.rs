//! CSV export of a tournament's final standings and match list.

use crate::logic::compute_standings;
use crate::models::{Roster, Tournament};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct StandingRow<'a> {
    rank: usize,
    player_id: &'a str,
    name: &'a str,
    points: u32,
    record: String,
    games_won: u32,
    games_played: u32,
    bye: bool,
    mw_pct: String,
    gw_pct: String,
    omw_pct: String,
    ogw_pct: String,
}

#[derive(Debug, Serialize)]
struct MatchRow<'a> {
    round: u32,
    table: usize,
    player1: &'a str,
    player2: &'a str,
    player1_wins: Option<u32>,
    player2_wins: Option<u32>,
    draws: Option<u32>,
    bye: bool,
}

fn pct(value: f64) -> String {
    format!("{:.2}", value * 100.0)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, csv::Error> {
    let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| csv::Error::from(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// One row per active player, in standings order.
pub fn standings_csv(tournament: &Tournament, roster: &Roster) -> Result<String, csv::Error> {
    let standings = compute_standings(&tournament.players, &tournament.rounds);
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (i, s) in standings.iter().enumerate() {
        writer.serialize(StandingRow {
            rank: i + 1,
            player_id: &s.player_id,
            name: roster.name_of(&s.player_id),
            points: s.match_points,
            record: s.record(),
            games_won: s.games_won,
            games_played: s.games_played,
            bye: s.has_bye,
            mw_pct: pct(s.mw_pct),
            gw_pct: pct(s.gw_pct),
            omw_pct: pct(s.omw_pct),
            ogw_pct: pct(s.ogw_pct),
        })?;
    }
    finish(writer)
}

/// Every match of every round, byes included. Unplayed matches have empty scores.
pub fn matches_csv(tournament: &Tournament, roster: &Roster) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for round in &tournament.rounds {
        for (table, m) in round.matches.iter().enumerate() {
            let result = m.result.as_ref();
            writer.serialize(MatchRow {
                round: round.number,
                table: table + 1,
                player1: roster.name_of(&m.player1),
                player2: m.player2.as_deref().map(|p| roster.name_of(p)).unwrap_or("BYE"),
                player1_wins: result.map(|r| r.player1_wins),
                player2_wins: result.map(|r| r.player2_wins),
                draws: result.map(|r| r.draws),
                bye: m.is_bye,
            })?;
        }
    }
    finish(writer)
}

/// Write `<date>_<id>_standings.csv` and `<date>_<id>_matches.csv` into `dir`.
pub fn write_tournament(
    dir: &Path,
    tournament: &Tournament,
    roster: &Roster,
) -> Result<Vec<PathBuf>, csv::Error> {
    std::fs::create_dir_all(dir)?;
    let stem = format!("{}_{}", tournament.date, tournament.id.simple());
    let files = [
        (format!("{}_standings.csv", stem), standings_csv(tournament, roster)?),
        (format!("{}_matches.csv", stem), matches_csv(tournament, roster)?),
    ];
    let mut written = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let path = dir.join(name);
        std::fs::write(&path, contents)?;
        log::info!("Exported {}", path.display());
        written.push(path);
    }
    Ok(written)
}
