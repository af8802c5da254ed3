use std::sync::Arc;

use actix_files::Files;
use actix_session::Session;
use actix_web::body::MessageBody;
use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::{self, Next};
use actix_web::{web, App, Error, HttpResponse, HttpServer, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::{self, AdminAuth};
use crate::calendar::CalendarContext;
use crate::config::ServeArgs;
use crate::notify::{DiscordNotifier, ErrorReport, VISITOR_COOKIE};
use crate::schedule::{
    annotate_timetable, filter_substitutions_for_class, group_for_display, ClassName, GroupMode,
    SubstitutionGroup, SubstitutionRecord, Teacher, Timetable,
};
use crate::school::{AbsenceStats, ClassInfo, SchoolEvent};
use crate::settings::{FileSettings, SettingsService, SettingsUpdate};
use crate::store::JsonStore;
use crate::terminal::{CommandContext, CommandOutput, CommandRegistry};

const NO_TERMINAL_ACCESS: &str = "Brak dostępu do terminala.";

/// Shared by every worker. Request data is loaded from disk per request.
pub struct AppState {
    pub store: JsonStore,
    pub settings: Arc<dyn SettingsService>,
    pub registry: CommandRegistry,
    pub auth: AdminAuth,
    pub notifier: DiscordNotifier,
}

impl AppState {
    pub fn from_args(args: &ServeArgs) -> Self {
        let store = JsonStore::new(&args.data.data_dir);
        let context = CommandContext {
            plans_dir: store.plans_dir(),
            log_file: args.log_file.clone(),
        };

        AppState {
            registry: CommandRegistry::with_defaults(context),
            settings: Arc::new(FileSettings::in_dir(&args.config_dir)),
            auth: AdminAuth::new(args.admin_password.as_deref()),
            notifier: DiscordNotifier::from_webhook(args.discord_webhook.clone()),
            store,
        }
    }
}

#[derive(Deserialize)]
pub struct DayQuery {
    tryb: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    command: String,
}

#[derive(Serialize)]
pub struct HomeResponse {
    #[serde(flatten)]
    stats: AbsenceStats,
    events: Vec<SchoolEvent>,
}

#[derive(Serialize)]
pub struct DayView {
    days: Vec<String>,
    day: String,
    mode: GroupMode,
    substitutions: Vec<SubstitutionRecord>,
    groups: Vec<SubstitutionGroup>,
    free: bool,
    description: Option<String>,
}

#[derive(Serialize)]
pub struct ClassSummary {
    name: String,
    #[serde(flatten)]
    info: ClassInfo,
}

#[derive(Serialize)]
pub struct ClassView {
    name: String,
    plan: Option<Timetable>,
    substitutions: Vec<SubstitutionRecord>,
}

fn html(body: &'static str) -> HttpResponse {
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body)
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

// HTML page handlers
async fn index() -> Result<HttpResponse> {
    Ok(html(include_str!("../templates/index.html")))
}

async fn day_page_html() -> HttpResponse {
    html(include_str!("../templates/zastepstwa.html"))
}

async fn classes_page() -> Result<HttpResponse> {
    Ok(html(include_str!("../templates/klasy.html")))
}

async fn class_page() -> Result<HttpResponse> {
    Ok(html(include_str!("../templates/plan.html")))
}

async fn teachers_page() -> Result<HttpResponse> {
    Ok(html(include_str!("../templates/nauczyciele.html")))
}

async fn settings_page() -> Result<HttpResponse> {
    Ok(html(include_str!("../templates/ustawienia.html")))
}

pub async fn not_found() -> Result<HttpResponse> {
    Ok(HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(include_str!("../templates/404.html")))
}

async fn home(state: web::Data<AppState>) -> Result<HttpResponse> {
    let stats = AbsenceStats::from_teachers(&state.store.teachers());
    Ok(HttpResponse::Ok().json(HomeResponse {
        stats,
        events: state.store.events(),
    }))
}

// Substitution days

/// Newest listed day whose file can actually be read
fn latest_readable_day<'a>(store: &JsonStore, days: &'a [String]) -> Option<&'a String> {
    days.iter().rev().find(|day| store.load_day(day).is_some())
}

async fn latest_day(state: web::Data<AppState>) -> Result<HttpResponse> {
    let days = state.store.list_days();
    match latest_readable_day(&state.store, &days) {
        Some(day) => Ok(redirect(&format!("/zastepstwa/{}", day))),
        None => Ok(day_page_html().await),
    }
}

async fn day_page(
    day: web::Path<String>,
    query: web::Query<DayQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let days = state.store.list_days();
    if days.iter().any(|d| d == day.as_str()) && state.store.load_day(&day).is_some() {
        return Ok(day_page_html().await);
    }

    // unknown or unreadable day
    match latest_readable_day(&state.store, &days) {
        Some(latest) => {
            let mode = GroupMode::from_query(query.tryb.as_deref());
            Ok(redirect(&format!("/zastepstwa/{}?tryb={}", latest, mode.as_str())))
        }
        None => Ok(day_page_html().await),
    }
}

/// Builds the day view; `None` for an unlisted or unreadable day.
/// Free days come from a `wolne` day file or, when the day has no
/// substitutions, from a calendar holiday on that date.
pub fn build_day_view(store: &JsonStore, day: &str, mode: GroupMode) -> Option<DayView> {
    let days = store.list_days();
    if !days.iter().any(|d| d == day) {
        return None;
    }

    let file = store.load_day(day)?;
    let substitutions = file.records().to_vec();
    let mut description = file.free_day().map(str::to_string);

    if description.is_none() && substitutions.is_empty() {
        if let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") {
            description = store.calendar().is_free_day(date).map(str::to_string);
        }
    }

    Some(DayView {
        groups: group_for_display(&substitutions, mode),
        free: description.is_some(),
        day: day.to_string(),
        days,
        mode,
        substitutions,
        description,
    })
}

async fn day_api(
    day: web::Path<String>,
    query: web::Query<DayQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mode = GroupMode::from_query(query.tryb.as_deref());
    match build_day_view(&state.store, &day, mode) {
        Some(view) => Ok(HttpResponse::Ok().json(view)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "Nie znaleziono dnia"}))),
    }
}

// Classes and teachers
async fn classes_api(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut info = state.store.classes();
    let summaries: Vec<ClassSummary> = state
        .store
        .list_timetables()
        .into_iter()
        .map(|name| ClassSummary {
            info: info.shift_remove(&name).unwrap_or_default(),
            name,
        })
        .collect();
    Ok(HttpResponse::Ok().json(summaries))
}

/// Timetable of one class annotated with the substitutions that concern it
pub fn build_class_view(store: &JsonStore, raw_name: &str) -> ClassView {
    let name = ClassName::new(raw_name);
    let substitutions = filter_substitutions_for_class(&name, &store.all_substitutions());
    let plan = store.load_timetable(&name);
    let plan = if plan.is_empty() {
        None
    } else {
        Some(annotate_timetable(plan, &substitutions))
    };

    ClassView {
        name: name.to_string(),
        plan,
        substitutions,
    }
}

async fn class_api(name: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(build_class_view(&state.store, &name)))
}

async fn teachers_api(state: web::Data<AppState>) -> Result<HttpResponse> {
    let teachers: Vec<Teacher> = state.store.teachers();
    Ok(HttpResponse::Ok().json(teachers))
}

// Settings
async fn settings_api(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.settings.load()))
}

async fn save_settings(
    body: web::Either<web::Json<SettingsUpdate>, web::Form<SettingsUpdate>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let update = match body {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    };

    let mut settings = state.settings.load();
    update.apply(&mut settings);

    match state.settings.save(&settings) {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({"success": true}))),
        Err(e) => {
            error!(error = %e, "could not save settings");
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": format!("Nie udało się zapisać ustawień: {}", e)
            })))
        }
    }
}

async fn calendar_api(state: web::Data<AppState>) -> Result<HttpResponse> {
    let today = Local::now().date_naive();
    Ok(HttpResponse::Ok().json(CalendarContext::for_date(today, state.store.calendar())))
}

// Admin terminal
async fn terminal_page(session: Session) -> Result<HttpResponse> {
    if auth::has_terminal_access(&session) {
        return Ok(html(include_str!("../templates/terminal.html")));
    }
    Ok(HttpResponse::Forbidden()
        .content_type("text/html; charset=utf-8")
        .body(include_str!("../templates/login.html")))
}

async fn terminal_login(
    req: web::Json<LoginRequest>,
    session: Session,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !state.auth.is_enabled() {
        return Ok(HttpResponse::Forbidden().json(serde_json::json!({
            "success": false,
            "error": "Terminal jest wyłączony."
        })));
    }

    if !state.auth.verify(&req.password) {
        info!("rejected terminal login");
        return Ok(HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "error": "Nieprawidłowe hasło."
        })));
    }

    auth::grant_terminal_access(&session).map_err(actix_web::error::ErrorInternalServerError)?;
    info!("terminal access granted");
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn terminal_run(
    req: web::Json<CommandRequest>,
    session: Session,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !auth::has_terminal_access(&session) {
        return Ok(HttpResponse::Forbidden().json(CommandOutput::error(NO_TERMINAL_ACCESS)));
    }

    let command = req.into_inner().command;
    let output = web::block(move || state.registry.run(&command)).await?;
    Ok(HttpResponse::Ok().json(output))
}

async fn activate_terminal() -> Result<HttpResponse> {
    Ok(redirect("/terminal"))
}

async fn logout_terminal(session: Session) -> Result<HttpResponse> {
    auth::revoke_terminal_access(&session);
    Ok(redirect("/"))
}

/// Issues the anonymous visitor id cookie to clients that lack one
pub async fn visitor_cookie(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let known = req.cookie(VISITOR_COOKIE).is_some();
    let mut res = next.call(req).await?;

    if !known {
        let cookie = Cookie::build(VISITOR_COOKIE, Uuid::new_v4().to_string())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .max_age(Duration::days(365))
            .finish();
        res.response_mut().add_cookie(&cookie)?;
    }

    Ok(res)
}

/// Forwards every 500 response to the error notifier
pub async fn report_server_errors(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let notifier = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.notifier.clone())
        .filter(DiscordNotifier::is_enabled);

    let mut report = ErrorReport::from_request(req.request());
    let res = next.call(req).await?;

    if ErrorReport::is_reportable(res.status()) {
        error!(route = %report.route, method = %report.method, "request failed with 500");
        if let Some(notifier) = notifier {
            report.message = res.response().error().map(|e| e.to_string());
            actix_web::rt::spawn(async move { notifier.report(report).await });
        }
    }

    Ok(res)
}

/// Routes of the panel, without static files and the 404 fallback
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/api/home", web::get().to(home))
        .route("/zastepstwa", web::get().to(latest_day))
        .route("/zastepstwa/{day}", web::get().to(day_page))
        .route("/api/zastepstwa/{day}", web::get().to(day_api))
        .route("/klasy", web::get().to(classes_page))
        .route("/api/klasy", web::get().to(classes_api))
        .route("/klasy/{name}", web::get().to(class_page))
        .route("/api/klasy/{name}", web::get().to(class_api))
        .route("/nauczyciele", web::get().to(teachers_page))
        .route("/api/nauczyciele", web::get().to(teachers_api))
        .service(
            web::resource("/ustawienia")
                .route(web::get().to(settings_page))
                .route(web::post().to(save_settings)),
        )
        .route("/api/ustawienia", web::get().to(settings_api))
        .route("/api/kalendarz", web::get().to(calendar_api))
        .route("/terminal", web::get().to(terminal_page))
        .route("/api/terminal/login", web::post().to(terminal_login))
        .route("/api/terminal", web::post().to(terminal_run))
        .route("/activate-terminal", web::get().to(activate_terminal))
        .route("/logout-terminal", web::get().to(logout_terminal));
}

pub async fn start_server(args: ServeArgs) -> std::io::Result<()> {
    let key = auth::session_key(args.session_secret.as_deref());
    let app_state = web::Data::new(AppState::from_args(&args));
    let static_dir = args.static_dir.clone();

    info!(host = %args.host, port = args.port, data_dir = %args.data.data_dir.display(), "starting web server");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::from_fn(report_server_errors))
            .wrap(middleware::from_fn(visitor_cookie))
            .wrap(auth::session_middleware(key.clone()))
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", static_dir.clone()))
            .configure(configure)
            .default_service(web::to(not_found))
    })
    .bind((args.host.as_str(), args.port))?
    .run()
    .await
}
