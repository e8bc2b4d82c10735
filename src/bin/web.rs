//! Single binary web server: REST API over the Swiss tournament service.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT,
//! DATA_FILE (saved state, JSON) and EXPORT_DIR (CSV exports).

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use swiss_tournament::{
    export, AppConfig, AppData, GameScore, JsonFileStore, MatchId, PairingOutcome, PlayerId,
    Standing, TournamentError, TournamentId, TournamentService,
};
use tokio::sync::mpsc::UnboundedSender;

type AppState = Data<RwLock<TournamentService>>;

/// Snapshots queued for the background writer. Saving never blocks a request.
type SaveQueue = Data<UnboundedSender<AppData>>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// Everything the UI needs to redraw after any call.
#[derive(Serialize)]
struct StateView<'a> {
    #[serde(flatten)]
    data: &'a AppData,
    standings: Option<Vec<Standing>>,
    last_pairing: Option<PairingOutcome>,
    round_complete: bool,
}

impl<'a> StateView<'a> {
    fn of(service: &'a TournamentService) -> Self {
        Self {
            data: service.data(),
            standings: service.standings().ok(),
            last_pairing: service.last_pairing_outcome(),
            round_complete: service.is_round_complete(),
        }
    }
}

#[derive(Deserialize)]
struct NameBody {
    name: String,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    player_ids: Vec<PlayerId>,
    #[serde(default)]
    date: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct SeatingBody {
    order: Vec<PlayerId>,
}

#[derive(Deserialize)]
struct PlayerBody {
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct SwapBody {
    a: PlayerId,
    b: PlayerId,
}

#[derive(Deserialize)]
struct ReopenBody {
    #[serde(default)]
    id: Option<TournamentId>,
}

#[derive(Deserialize)]
struct PlayerPath {
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct MatchPath {
    match_id: MatchId,
}

#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

fn error_response(e: TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::NoTournament
        | TournamentError::MatchNotFound(_)
        | TournamentError::PlayerNotFound(_)
        | TournamentError::TournamentNotFound(_) => HttpResponse::NotFound().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

/// Run one transition under the write lock; on success queue a save and
/// return the new state.
fn mutate<T>(
    state: &AppState,
    saves: &SaveQueue,
    f: impl FnOnce(&mut TournamentService) -> Result<T, TournamentError>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match f(&mut g) {
        Ok(_) => {
            if saves.send(g.snapshot()).is_err() {
                log::error!("Save queue closed; state is only kept in memory");
            }
            HttpResponse::Ok().json(StateView::of(&g))
        }
        Err(e) => error_response(e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "swiss-tournament",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[get("/api/state")]
async fn api_get_state(state: AppState) -> HttpResponse {
    match state.read() {
        Ok(g) => HttpResponse::Ok().json(StateView::of(&g)),
        Err(_) => HttpResponse::InternalServerError().body("lock error"),
    }
}

/// Add a player to the global roster.
#[post("/api/roster")]
async fn api_add_roster_player(state: AppState, saves: SaveQueue, body: Json<NameBody>) -> HttpResponse {
    mutate(&state, &saves, |s| s.roster_mut().add(body.name.as_str()))
}

#[put("/api/roster/{player_id}")]
async fn api_rename_roster_player(
    state: AppState,
    saves: SaveQueue,
    path: Path<PlayerPath>,
    body: Json<NameBody>,
) -> HttpResponse {
    mutate(&state, &saves, |s| s.roster_mut().rename(&path.player_id, body.name.as_str()))
}

#[delete("/api/roster/{player_id}")]
async fn api_remove_roster_player(state: AppState, saves: SaveQueue, path: Path<PlayerPath>) -> HttpResponse {
    mutate(&state, &saves, |s| s.roster_mut().remove(&path.player_id))
}

/// Create a tournament (archives a completed one first).
#[post("/api/tournament")]
async fn api_create_tournament(
    state: AppState,
    saves: SaveQueue,
    body: Json<CreateTournamentBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let date = body.date.unwrap_or_else(|| Utc::now().date_naive());
    mutate(&state, &saves, |s| s.create_tournament(body.player_ids, date))
}

#[put("/api/tournament/seating")]
async fn api_set_seating(state: AppState, saves: SaveQueue, body: Json<SeatingBody>) -> HttpResponse {
    let order = body.into_inner().order;
    mutate(&state, &saves, |s| s.set_seating(order))
}

#[post("/api/tournament/seating/shuffle")]
async fn api_shuffle_seating(state: AppState, saves: SaveQueue) -> HttpResponse {
    mutate(&state, &saves, |s| s.shuffle_seating(&mut rand::thread_rng()))
}

/// Late entry into the current tournament.
#[post("/api/tournament/players")]
async fn api_add_tournament_player(state: AppState, saves: SaveQueue, body: Json<PlayerBody>) -> HttpResponse {
    let player_id = body.into_inner().player_id;
    mutate(&state, &saves, |s| {
        if !s.roster().contains(&player_id) {
            return Err(TournamentError::PlayerNotFound(player_id));
        }
        s.add_player(player_id)
    })
}

#[post("/api/tournament/players/{player_id}/drop")]
async fn api_drop_player(state: AppState, saves: SaveQueue, path: Path<PlayerPath>) -> HttpResponse {
    mutate(&state, &saves, |s| s.drop_player(&path.player_id))
}

#[post("/api/tournament/players/{player_id}/undrop")]
async fn api_undrop_player(state: AppState, saves: SaveQueue, path: Path<PlayerPath>) -> HttpResponse {
    mutate(&state, &saves, |s| s.undrop_player(&path.player_id))
}

#[post("/api/tournament/rounds/pair")]
async fn api_pair_next_round(state: AppState, saves: SaveQueue) -> HttpResponse {
    mutate(&state, &saves, |s| s.pair_next_round())
}

/// Enter or correct a result. Only allowed while the match's round is active.
#[put("/api/tournament/matches/{match_id}/result")]
async fn api_submit_result(
    state: AppState,
    saves: SaveQueue,
    path: Path<MatchPath>,
    body: Json<GameScore>,
) -> HttpResponse {
    let score = body.into_inner();
    mutate(&state, &saves, |s| {
        if !s.can_correct_result(path.match_id) {
            return Err(TournamentError::InvalidState);
        }
        s.submit_result(path.match_id, score)
    })
}

#[post("/api/tournament/rounds/complete")]
async fn api_complete_round(state: AppState, saves: SaveQueue) -> HttpResponse {
    mutate(&state, &saves, |s| s.complete_current_round())
}

#[post("/api/tournament/rounds/swap")]
async fn api_swap_players(state: AppState, saves: SaveQueue, body: Json<SwapBody>) -> HttpResponse {
    mutate(&state, &saves, |s| s.swap_players(&body.a, &body.b))
}

#[post("/api/tournament/rounds/bye")]
async fn api_reassign_bye(state: AppState, saves: SaveQueue, body: Json<PlayerBody>) -> HttpResponse {
    mutate(&state, &saves, |s| s.reassign_bye(&body.player_id))
}

#[post("/api/tournament/rounds/repair")]
async fn api_repair_round(state: AppState, saves: SaveQueue) -> HttpResponse {
    mutate(&state, &saves, |s| s.repair_active_round())
}

#[post("/api/tournament/finish")]
async fn api_finish_tournament(state: AppState, saves: SaveQueue) -> HttpResponse {
    mutate(&state, &saves, |s| s.finish_tournament())
}

#[post("/api/tournament/archive")]
async fn api_archive_tournament(state: AppState, saves: SaveQueue) -> HttpResponse {
    mutate(&state, &saves, |s| {
        if s.archive_tournament() {
            Ok(())
        } else {
            Err(TournamentError::InvalidState)
        }
    })
}

#[post("/api/tournament/reopen")]
async fn api_reopen(state: AppState, saves: SaveQueue, body: Option<Json<ReopenBody>>) -> HttpResponse {
    let id = body.and_then(|b| b.into_inner().id);
    mutate(&state, &saves, |s| s.reopen(id))
}

#[delete("/api/history/{id}")]
async fn api_delete_history(state: AppState, saves: SaveQueue, path: Path<TournamentPath>) -> HttpResponse {
    mutate(&state, &saves, |s| s.delete_from_history(path.id))
}

/// Current standings as CSV.
#[get("/api/tournament/standings.csv")]
async fn api_standings_csv(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let Some(t) = g.tournament() else {
        return error_response(TournamentError::NoTournament);
    };
    match export::standings_csv(t, g.roster()) {
        Ok(csv) => HttpResponse::Ok().content_type("text/csv; charset=utf-8").body(csv),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Write standings and matches of the current (or an archived) tournament to EXPORT_DIR.
#[post("/api/export/{id}")]
async fn api_export(state: AppState, config: Data<AppConfig>, path: Path<TournamentPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let found = g
        .tournament()
        .filter(|t| t.id == path.id)
        .or_else(|| g.history().iter().find(|t| t.id == path.id));
    let Some(t) = found else {
        return error_response(TournamentError::TournamentNotFound(path.id));
    };
    match export::write_tournament(&config.export_dir, t, g.roster()) {
        Ok(files) => HttpResponse::Ok().json(serde_json::json!({ "files": files })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() })),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();
    let store = JsonFileStore::new(config.data_file.clone());
    let service = TournamentService::new(store.load());
    log::info!("Loaded state from {}", store.path().display());

    // Background writer: saves snapshots in order, one at a time.
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<AppData>();
    actix_web::rt::spawn(async move {
        while let Some(mut data) = rx.recv().await {
            // Only the newest queued snapshot matters.
            while let Ok(newer) = rx.try_recv() {
                data = newer;
            }
            if let Err(e) = store.save_async(data).await {
                log::error!("Failed to save {}: {}", store.path().display(), e);
            }
        }
    });

    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(service));
    let saves = Data::new(tx);
    let config = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(saves.clone())
            .app_data(config.clone())
            .service(api_health)
            .service(favicon)
            .service(api_get_state)
            .service(api_add_roster_player)
            .service(api_rename_roster_player)
            .service(api_remove_roster_player)
            .service(api_create_tournament)
            .service(api_set_seating)
            .service(api_shuffle_seating)
            .service(api_add_tournament_player)
            .service(api_drop_player)
            .service(api_undrop_player)
            .service(api_pair_next_round)
            .service(api_submit_result)
            .service(api_complete_round)
            .service(api_swap_players)
            .service(api_reassign_bye)
            .service(api_repair_round)
            .service(api_finish_tournament)
            .service(api_archive_tournament)
            .service(api_reopen)
            .service(api_delete_history)
            .service(api_standings_csv)
            .service(api_export)
    })
    .bind(bind)?
    .run()
    .await
}
