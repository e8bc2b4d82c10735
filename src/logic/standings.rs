//! Standings: match points and the MW% / GW% / OMW% / OGW% tiebreakers.

use crate::models::{PlayerId, Round, Standing, BYE_GAME_WINS};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Minimum value for every percentage tiebreaker.
pub const TIEBREAK_FLOOR: f64 = 0.33;

/// Float comparisons closer than this are ties.
pub const TIEBREAK_EPSILON: f64 = 1e-9;

pub const POINTS_PER_WIN: u32 = 3;
pub const POINTS_PER_DRAW: u32 = 1;

/// Integer running totals for one player. Percentages are derived at the end.
#[derive(Debug, Default)]
struct Tally<'a> {
    match_points: u32,
    wins: u32,
    losses: u32,
    draws: u32,
    games_won: u32,
    games_played: u32,
    has_bye: bool,
    /// Real opponents only; byes add nothing here.
    opponents: Vec<&'a str>,
}

impl Tally<'_> {
    fn matches_played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    fn record_match(&mut self, own_games: u32, their_games: u32) {
        match own_games.cmp(&their_games) {
            Ordering::Greater => {
                self.wins += 1;
                self.match_points += POINTS_PER_WIN;
            }
            Ordering::Less => self.losses += 1,
            Ordering::Equal => {
                self.draws += 1;
                self.match_points += POINTS_PER_DRAW;
            }
        }
    }

    fn mw_pct(&self) -> f64 {
        floored_ratio(self.match_points, POINTS_PER_WIN * self.matches_played())
    }

    fn gw_pct(&self) -> f64 {
        floored_ratio(self.games_won, self.games_played)
    }
}

/// `num / den` clamped to the floor; a zero denominator is the floor.
fn floored_ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        return TIEBREAK_FLOOR;
    }
    (f64::from(num) / f64::from(den)).max(TIEBREAK_FLOOR)
}

/// Mean of one percentage over a player's opponents; no opponents is the floor.
fn opponent_average(
    opponents: &[&str],
    pcts: &HashMap<&str, (f64, f64)>,
    pick: fn(&(f64, f64)) -> f64,
) -> f64 {
    let (sum, count) = opponents
        .iter()
        .filter_map(|o| pcts.get(o))
        .fold((0.0, 0u32), |(s, c), p| (s + pick(p), c + 1));
    if count == 0 {
        TIEBREAK_FLOOR
    } else {
        sum / f64::from(count)
    }
}

/// Descending order with epsilon ties.
fn desc(a: f64, b: f64) -> Ordering {
    if (a - b).abs() < TIEBREAK_EPSILON {
        Ordering::Equal
    } else if a > b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// Compute one standing per active player from the completed rounds.
///
/// Rounds that are not complete are ignored, as are regular matches without a
/// result. Opponents who have since dropped still count toward OMW%/OGW% with
/// their real record. Sorted by points, then OMW%, GW%, OGW% (all descending);
/// full ties keep the order of `active_player_ids`.
pub fn compute_standings(active_player_ids: &[PlayerId], rounds: &[Round]) -> Vec<Standing> {
    let mut tallies: HashMap<&str, Tally> = active_player_ids
        .iter()
        .map(|id| (id.as_str(), Tally::default()))
        .collect();

    for round in rounds.iter().filter(|r| r.is_complete()) {
        for m in &round.matches {
            if m.is_bye {
                let t = tallies.entry(m.player1.as_str()).or_default();
                t.wins += 1;
                t.match_points += POINTS_PER_WIN;
                t.games_won += BYE_GAME_WINS;
                t.games_played += BYE_GAME_WINS;
                t.has_bye = true;
                continue;
            }
            let (Some(p2), Some(result)) = (m.player2.as_deref(), m.result.as_ref()) else {
                continue;
            };
            let p1 = m.player1.as_str();
            let played = result.games_played();

            let t1 = tallies.entry(p1).or_default();
            t1.games_won += result.player1_wins;
            t1.games_played += played;
            t1.opponents.push(p2);
            t1.record_match(result.player1_wins, result.player2_wins);

            let t2 = tallies.entry(p2).or_default();
            t2.games_won += result.player2_wins;
            t2.games_played += played;
            t2.opponents.push(p1);
            t2.record_match(result.player2_wins, result.player1_wins);
        }
    }

    let pcts: HashMap<&str, (f64, f64)> = tallies
        .iter()
        .map(|(id, t)| (*id, (t.mw_pct(), t.gw_pct())))
        .collect();

    let mut standings: Vec<Standing> = active_player_ids
        .iter()
        .map(|id| {
            let t = &tallies[id.as_str()];
            let (mw_pct, gw_pct) = pcts[id.as_str()];
            Standing {
                player_id: id.clone(),
                match_points: t.match_points,
                match_wins: t.wins,
                match_losses: t.losses,
                match_draws: t.draws,
                games_won: t.games_won,
                games_played: t.games_played,
                has_bye: t.has_bye,
                mw_pct,
                gw_pct,
                omw_pct: opponent_average(&t.opponents, &pcts, |p| p.0),
                ogw_pct: opponent_average(&t.opponents, &pcts, |p| p.1),
            }
        })
        .collect();

    standings.sort_by(|a, b| {
        b.match_points
            .cmp(&a.match_points)
            .then_with(|| desc(a.omw_pct, b.omw_pct))
            .then_with(|| desc(a.gw_pct, b.gw_pct))
            .then_with(|| desc(a.ogw_pct, b.ogw_pct))
    });
    standings
}
