use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::Method;
use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::SolverConfig;
use crate::error::ScheduleError;
use crate::parser::{read_activities, table_from_rows, TableOptions};
use crate::schedule::{plan, SolveOutcome, SolveRequest, Strategy};

/// Shared, read-only server state
pub struct AppState {
    pub config: SolverConfig,
}

/// Body of a solve request: either activities and participants directly, or
/// spreadsheet `rows` read through the table options.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvePayload {
    #[serde(default)]
    pub rows: Option<Vec<Vec<String>>>,
    #[serde(flatten)]
    pub table: TableOptions,
    #[serde(flatten)]
    pub request: SolveRequest,
}

impl SolvePayload {
    pub fn into_outcome(self, config: &SolverConfig) -> crate::error::Result<SolveOutcome> {
        let mut request = self.request;
        if let Some(rows) = self.rows {
            let table = table_from_rows(&rows, &self.table)?;
            request.activities = table.activities;
            request.participants = table.participants;
        }
        plan(&request, config)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    pub start_activity: Option<String>,
    pub end_activity: Option<String>,
    #[serde(default)]
    pub strategy: Strategy,
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
}

fn error_response(err: ScheduleError) -> HttpResponse {
    warn!(error = %err, "rejected scheduling request");
    bad_request(err.to_string())
}

// Malformed JSON gets the same error body as a rejected request
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    warn!(error = %err, "unreadable JSON body");
    let response = bad_request(err.to_string());
    InternalError::from_response(err, response).into()
}

async fn run_blocking<F>(job: F) -> Result<HttpResponse>
where
    F: FnOnce() -> crate::error::Result<SolveOutcome> + Send + 'static,
{
    let outcome = web::block(job)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(match outcome {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(err) => error_response(err),
    })
}

// JSON solve endpoint
async fn solve(
    payload: web::Json<SolvePayload>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    let config = state.config.clone();
    run_blocking(move || payload.into_outcome(&config)).await
}

// Raw CSV upload endpoint
async fn upload(
    query: web::Query<UploadQuery>,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let config = state.config.clone();
    run_blocking(move || {
        let mut request = read_activities(body.as_ref(), &TableOptions::default())?.into_request();
        request.constraints.start_activity = query.start_activity;
        request.constraints.end_activity = query.end_activity;
        request.strategy = query.strategy;
        plan(&request, &config)
    })
    .await
}

async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Permissive CORS headers on every response
pub fn cors_headers() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Headers", "Content-Type, Authorization"))
        .add(("Access-Control-Allow-Methods", "POST"))
}

/// Registers the scheduling routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .route("/", web::post().to(solve))
        .route("/", web::method(Method::OPTIONS).to(preflight))
        .route("/api/solve", web::post().to(solve))
        .route("/api/solve", web::method(Method::OPTIONS).to(preflight))
        .route("/api/upload", web::post().to(upload))
        .route("/api/upload", web::method(Method::OPTIONS).to(preflight));
}

pub async fn start_server(port: u16, config: SolverConfig) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState { config });
    info!(port, "starting web server");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(cors_headers())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
