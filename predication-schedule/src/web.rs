use actix_files::Files;
use actix_session::storage::CookieSessionStore;
use actix_session::{Session, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::config::AppConfig;
use crate::display::{format_captain_name, name_lookup};
use crate::form::{export_fixed_assignments, next_assignment_id, soft_delete, validate_fixed_assignment, FixedAssignmentRequest};
use crate::parser::{eligible_captains, load_fixed_assignments, load_roster, load_roster_from_reader, RosterMember};
use crate::schedule::{
    find_slot, generate_period, parse_date, resolve, slot_display, weekday_name, weekday_of, CaptainId,
    FixedAssignment, PeriodSchedule, ResolveOptions, RotationCursor, RotationScope, Strategy, GLOBAL_KEY,
};

// In-memory state; roster and fixed assignments are mirrored to the CSV files from the config
pub struct AppState {
    pub config: AppConfig,
    pub roster: Mutex<Vec<RosterMember>>,
    pub fixed_assignments: Mutex<Vec<FixedAssignment>>,
    pub schedule: Mutex<Option<PeriodSchedule>>,
    /// Rotation cursor of the latest generation run, reset by every generate and roster upload
    pub cursor: Mutex<RotationCursor>,
}

impl AppState {
    pub fn new(config: AppConfig, roster: Vec<RosterMember>, fixed_assignments: Vec<FixedAssignment>) -> AppState {
        AppState {
            config,
            roster: Mutex::new(roster),
            fixed_assignments: Mutex::new(fixed_assignments),
            schedule: Mutex::new(None),
            cursor: Mutex::new(RotationCursor::new()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| actix_web::error::ErrorInternalServerError("state lock poisoned"))
}

fn failure(message: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({"success": false, "error": message.to_string()})
}

/// Admin check: logged-in session or the `X-Admin-Password` header
fn is_admin(req: &HttpRequest, session: &Session, state: &AppState) -> bool {
    let header_ok = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |p| p == state.config.admin_password);
    header_ok || session.get::<bool>("is_admin").ok().flatten().unwrap_or(false)
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    from: String,
    to: String,
    strategy: Option<Strategy>,
    global_rotation: Option<bool>,
    one_outing_per_day: Option<bool>,
}

#[derive(Deserialize)]
pub struct ResolveRequest {
    date: String,
    time_slot_id: String,
    #[serde(default)]
    exclude: Vec<CaptainId>,
    strategy: Option<Strategy>,
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    congregation: String,
    entries: Vec<ScheduleRow>,
    gaps: usize,
}

#[derive(Serialize)]
pub struct ScheduleRow {
    date: String,
    weekday: String,
    time_slot_id: String,
    time: String,
    captain_id: Option<CaptainId>,
    captain: Option<String>,
    fixed: bool,
    is_empty: bool,
}

#[derive(Serialize)]
pub struct StatsResponse {
    roster_members: usize,
    captains: usize,
    active_fixed_assignments: usize,
    outings: usize,
    gaps: usize,
    outings_per_captain: Vec<CaptainStats>,
}

#[derive(Serialize)]
pub struct CaptainStats {
    captain_id: CaptainId,
    captain: String,
    outings: u32,
}

// Admin login endpoint
async fn admin_login(
    req: web::Json<LoginRequest>,
    session: Session,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if req.password == state.config.admin_password {
        session
            .insert("is_admin", true)
            .map_err(actix_web::error::ErrorInternalServerError)?;
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        Ok(HttpResponse::Unauthorized().json(failure("Invalid password")))
    }
}

// Roster CSV upload endpoint
async fn upload_roster(
    req: HttpRequest,
    session: Session,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&req, &session, &state) {
        return Ok(HttpResponse::Unauthorized().json(failure("Unauthorized")));
    }

    let roster = match load_roster_from_reader(&body[..]) {
        Ok(roster) => roster,
        Err(e) => return Ok(HttpResponse::BadRequest().json(failure(format!("Failed to process CSV: {}", e)))),
    };

    let path = &state.config.roster_path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(actix_web::error::ErrorInternalServerError)?;
    }
    std::fs::write(path, &body)
        .map_err(|e| actix_web::error::ErrorInternalServerError(format!("Failed to save file: {}", e)))?;

    let captains = roster.iter().filter(|m| m.is_captain).count();
    let members = roster.len();
    {
        // Cursor indexes point into the old captain order
        let mut current = lock(&state.roster)?;
        *current = roster;
        *lock(&state.schedule)? = None;
        let mut cursor = lock(&state.cursor)?;
        if !cursor.is_empty() {
            info!("rotation cursor reset after roster upload");
        }
        cursor.clear();
    }
    info!("roster replaced: {} members, {} captains", members, captains);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "members": members,
        "captains": captains,
    })))
}

async fn list_fixed(state: web::Data<AppState>) -> Result<HttpResponse> {
    let fixed = lock(&state.fixed_assignments)?;
    let active: Vec<&FixedAssignment> = fixed.iter().filter(|f| f.active).collect();
    Ok(HttpResponse::Ok().json(active))
}

async fn create_fixed(
    req: HttpRequest,
    session: Session,
    body: web::Json<FixedAssignmentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&req, &session, &state) {
        return Ok(HttpResponse::Unauthorized().json(failure("Unauthorized")));
    }

    let captains = eligible_captains(&lock(&state.roster)?);
    let mut fixed = lock(&state.fixed_assignments)?;
    if let Err(e) = validate_fixed_assignment(&body, &state.config.time_slots, &captains, &fixed) {
        return Ok(HttpResponse::BadRequest().json(failure(e)));
    }

    let id = match next_assignment_id(&fixed) {
        Ok(id) => id,
        Err(e) => return Ok(HttpResponse::BadRequest().json(failure(e))),
    };
    let assignment = body.into_inner().into_assignment(id);
    fixed.push(assignment.clone());
    export_fixed_assignments(&state.config.fixed_path, &fixed)
        .map_err(actix_web::error::ErrorInternalServerError)?;
    info!(
        "fixed assignment {} added: weekday {} slot {} -> {}",
        assignment.id, assignment.weekday, assignment.time_slot_id, assignment.captain_id
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "assignment": assignment})))
}

async fn delete_fixed(
    req: HttpRequest,
    session: Session,
    id: web::Path<u32>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&req, &session, &state) {
        return Ok(HttpResponse::Unauthorized().json(failure("Unauthorized")));
    }

    let id = id.into_inner();
    let mut fixed = lock(&state.fixed_assignments)?;
    if !soft_delete(&mut fixed, id) {
        return Ok(HttpResponse::NotFound().json(failure(format!("No active fixed assignment {}", id))));
    }
    export_fixed_assignments(&state.config.fixed_path, &fixed)
        .map_err(actix_web::error::ErrorInternalServerError)?;
    info!("fixed assignment {} deactivated", id);

    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

// Generates the schedule for a period and keeps it as the current one
async fn generate(
    req: HttpRequest,
    session: Session,
    body: web::Json<GenerateRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&req, &session, &state) {
        return Ok(HttpResponse::Unauthorized().json(failure("Unauthorized")));
    }

    let (from, to) = match (parse_date(&body.from), parse_date(&body.to)) {
        (Ok(from), Ok(to)) => (from, to),
        (Err(e), _) | (_, Err(e)) => return Ok(HttpResponse::BadRequest().json(failure(e))),
    };

    let mut options = state.config.generate_options();
    if let Some(strategy) = body.strategy {
        options.strategy = strategy;
    }
    if let Some(global) = body.global_rotation {
        options.rotation_scope = if global { RotationScope::Global } else { RotationScope::PerSlot };
    }
    if let Some(one_per_day) = body.one_outing_per_day {
        options.one_outing_per_day = one_per_day;
    }

    let captains = eligible_captains(&lock(&state.roster)?);
    let fixed = lock(&state.fixed_assignments)?.clone();
    let mut cursor = RotationCursor::new();
    let result = generate_period(
        from,
        to,
        &state.config.time_slots,
        &fixed,
        &captains,
        options,
        &mut cursor,
        &mut rand::thread_rng(),
    );

    match result {
        Ok(schedule) => {
            let outings = schedule.entries.len();
            let gaps = schedule.gaps.len();
            *lock(&state.schedule)? = Some(schedule);
            *lock(&state.cursor)? = cursor;
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "outings": outings,
                "gaps": gaps,
            })))
        }
        Err(e) => Ok(HttpResponse::BadRequest().json(failure(e))),
    }
}

// Current schedule endpoint
async fn get_schedule(state: web::Data<AppState>) -> Result<HttpResponse> {
    // Lock order: roster, fixed assignments, schedule, cursor
    let roster = lock(&state.roster)?;
    let schedule = lock(&state.schedule)?;
    let Some(ref schedule) = *schedule else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "Schedule not available"})));
    };

    let names = name_lookup(&roster);
    let slots = &state.config.time_slots;

    let entries = schedule
        .entries
        .iter()
        .map(|entry| ScheduleRow {
            date: entry.date.to_string(),
            weekday: weekday_name(weekday_of(entry.date)).to_string(),
            time_slot_id: entry.time_slot_id.clone(),
            time: find_slot(slots, &entry.time_slot_id)
                .map(slot_display)
                .unwrap_or_else(|_| entry.time_slot_id.clone()),
            captain_id: entry.captain_id.clone(),
            captain: entry.captain_id.as_deref().map(|id| format_captain_name(id, &names)),
            fixed: entry.fixed,
            is_empty: entry.captain_id.is_none(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(ScheduleResponse {
        congregation: state.config.congregation.clone(),
        entries,
        gaps: schedule.gaps.len(),
    }))
}

// Resolves the captain for a single cell
async fn resolve_cell(body: web::Json<ResolveRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    if let Err(e) = find_slot(&state.config.time_slots, &body.time_slot_id) {
        return Ok(HttpResponse::BadRequest().json(failure(e)));
    }

    let roster = lock(&state.roster)?;
    let captains = eligible_captains(&roster);
    let fixed = lock(&state.fixed_assignments)?;
    let mut cursor = lock(&state.cursor)?;
    let exclude: HashSet<CaptainId> = body.exclude.iter().cloned().collect();

    let options = ResolveOptions {
        strategy: body.strategy.unwrap_or(state.config.strategy),
        rotation: Some(&mut *cursor),
        exclude: Some(&exclude),
        rotation_key: state.config.global_rotation.then_some(GLOBAL_KEY),
    };

    match resolve(&body.date, &body.time_slot_id, &fixed, &captains, options) {
        Ok(captain_id) => {
            let names = name_lookup(&roster);
            let captain = captain_id.as_deref().map(|id| format_captain_name(id, &names));
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "captain_id": captain_id,
                "captain": captain,
            })))
        }
        Err(e) => Ok(HttpResponse::BadRequest().json(failure(e))),
    }
}

// Stats endpoint
async fn get_stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let roster = lock(&state.roster)?;
    let names = name_lookup(&roster);
    let active_fixed = lock(&state.fixed_assignments)?.iter().filter(|f| f.active).count();
    let schedule = lock(&state.schedule)?;

    let (outings, gaps, outings_per_captain) = match *schedule {
        Some(ref schedule) => (
            schedule.entries.len(),
            schedule.gaps.len(),
            schedule
                .captain_counts()
                .into_iter()
                .map(|(id, outings)| CaptainStats {
                    captain: format_captain_name(&id, &names),
                    captain_id: id,
                    outings,
                })
                .collect::<Vec<_>>(),
        ),
        None => (0, 0, Vec::new()),
    };

    Ok(HttpResponse::Ok().json(StatsResponse {
        roster_members: roster.len(),
        captains: roster.iter().filter(|m| m.is_captain).count(),
        active_fixed_assignments: active_fixed,
        outings,
        gaps,
        outings_per_captain,
    }))
}

// HTML page handlers
async fn index() -> Result<HttpResponse> {
    let html = include_str!("../templates/index.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

async fn admin_page() -> Result<HttpResponse> {
    let html = include_str!("../templates/admin.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

/// Page and API routes, shared by the server and the handler tests
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/admin", web::get().to(admin_page))
        .route("/api/login", web::post().to(admin_login))
        .route("/api/roster", web::post().to(upload_roster))
        .route("/api/fixed-assignments", web::get().to(list_fixed))
        .route("/api/fixed-assignments", web::post().to(create_fixed))
        .service(web::resource("/api/fixed-assignments/{id}").route(web::delete().to(delete_fixed)))
        .route("/api/generate", web::post().to(generate))
        .route("/api/schedule", web::get().to(get_schedule))
        .route("/api/resolve", web::post().to(resolve_cell))
        .route("/api/stats", web::get().to(get_stats));
}

pub async fn start_server(config: AppConfig) -> std::io::Result<()> {
    let roster = if config.roster_path.exists() {
        load_roster(&config.roster_path).unwrap_or_else(|e| {
            warn!("could not load roster {}: {}", config.roster_path.display(), e);
            Vec::new()
        })
    } else {
        Vec::new()
    };
    let fixed = load_fixed_assignments(&config.fixed_path).unwrap_or_else(|e| {
        warn!("could not load fixed assignments {}: {}", config.fixed_path.display(), e);
        Vec::new()
    });

    let port = config.web.port;
    let app_state = web::Data::new(AppState::new(config, roster, fixed));
    let session_key = Key::generate();

    info!("starting web server on port {}", port);
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .service(Files::new("/static", "static"))
            .configure(routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
