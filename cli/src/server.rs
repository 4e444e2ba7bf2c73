use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use nutritrack_core::aggregate::DaySummary;
use nutritrack_core::models::{
    BodyEntry, CycleDay, ExerciseDraft, ExerciseEntry, FoodDraft, FoodEntry, MealSlot,
    NewBodyEntry, TargetMode, WaterEntry, validate_body_entry, validate_exercise_draft, validate_food_draft,
    validate_water_amount,
};
use nutritrack_core::period::{CalendarMonth, ExportDocument, parse_month};
use nutritrack_core::profile::Profile;
use nutritrack_core::service::{FoodQuery, NutritionEstimator, Tracker};

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    tracker: Arc<Mutex<Tracker>>,
    api_key: Option<String>,
    estimator: Option<Arc<dyn NutritionEstimator>>,
}

impl AppState {
    fn tracker(&self) -> MutexGuard<'_, Tracker> {
        self.tracker
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct CreateFoodRequest {
    date: String,
    #[serde(flatten)]
    draft: FoodDraft,
}

#[derive(Deserialize)]
struct CreateExerciseRequest {
    date: String,
    #[serde(flatten)]
    draft: ExerciseDraft,
}

#[derive(Deserialize)]
struct EstimateFoodRequest {
    date: String,
    meal: String,
    description: String,
}

#[derive(Deserialize)]
struct EstimateExerciseRequest {
    date: String,
    description: String,
    duration_minutes: f64,
}

#[derive(Deserialize)]
struct CreateWaterRequest {
    date: String,
    amount_ml: f64,
}

#[derive(Deserialize)]
struct CreateBodyRequest {
    date: String,
    weight_kg: f64,
    body_fat_pct: Option<f64>,
    muscle_mass_kg: Option<f64>,
    waist_cm: Option<f64>,
}

#[derive(Deserialize)]
struct SetCycleDayRequest {
    cycle_day: String,
}

#[derive(Deserialize)]
struct SetModeRequest {
    mode: String,
}

#[derive(Serialize)]
struct ProfileResponse {
    #[serde(flatten)]
    profile: Profile,
    bmi_category: &'static str,
}

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            bmi_category: profile.bmi_category().as_str(),
            profile: profile.clone(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// No estimator is wired into this server.
    Unavailable(String),
    /// The estimator failed or returned something unusable.
    Upstream(anyhow::Error),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            Self::Upstream(err) => {
                tracing::warn!("estimate failed: {err:#}");
                (StatusCode::BAD_GATEWAY, "Estimate failed".to_string())
            }
            Self::Internal(err) => {
                tracing::error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn bad_request(err: &anyhow::Error) -> ApiError {
    ApiError::BadRequest(format!("{err}"))
}

fn require_text(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

fn parse_date(date_str: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date '{date_str}'. Use YYYY-MM-DD")))
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Profile handlers ---

async fn get_profile(State(state): State<AppState>) -> Json<ProfileResponse> {
    let tracker = state.tracker();
    Json(ProfileResponse::from(tracker.profile()))
}

async fn set_cycle_day(
    State(state): State<AppState>,
    Json(req): Json<SetCycleDayRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let day: CycleDay = req.cycle_day.parse().map_err(|e| bad_request(&e))?;
    let mut tracker = state.tracker();
    let profile = tracker
        .set_cycle_day(day)
        .context("failed to save profile")?;
    Ok(Json(ProfileResponse::from(profile)))
}

async fn set_target_mode(
    State(state): State<AppState>,
    Json(req): Json<SetModeRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let mode: TargetMode = req.mode.parse().map_err(|e| bad_request(&e))?;
    let mut tracker = state.tracker();
    let profile = tracker
        .set_target_mode(mode)
        .context("failed to save profile")?;
    Ok(Json(ProfileResponse::from(profile)))
}

// --- Summary handlers ---

async fn get_daily_summary(
    State(state): State<AppState>,
    Path(date_str): Path<String>,
) -> Result<Json<DaySummary>, ApiError> {
    let date = parse_date(&date_str)?;
    let tracker = state.tracker();
    Ok(Json(tracker.day_summary(date)))
}

async fn get_calendar(
    State(state): State<AppState>,
    Path(month_str): Path<String>,
) -> Result<Json<CalendarMonth>, ApiError> {
    let (year, month) = parse_month(&month_str).map_err(|e| bad_request(&e))?;
    let tracker = state.tracker();
    let calendar = tracker
        .calendar_month(year, month)
        .map_err(|e| bad_request(&e))?;
    Ok(Json(calendar))
}

// --- Log handlers ---

async fn create_food(
    State(state): State<AppState>,
    Json(req): Json<CreateFoodRequest>,
) -> Result<(StatusCode, Json<FoodEntry>), ApiError> {
    let date = parse_date(&req.date)?;
    validate_food_draft(&req.draft).map_err(|e| bad_request(&e))?;
    let mut tracker = state.tracker();
    let entry = tracker
        .add_food(date, req.draft)
        .context("failed to save food entry")?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<FoodDraft>,
) -> Result<Json<FoodEntry>, ApiError> {
    validate_food_draft(&draft).map_err(|e| bad_request(&e))?;
    let mut tracker = state.tracker();
    if !tracker.logs().food.iter().any(|e| e.id == id) {
        return Err(ApiError::NotFound(format!("Food entry {id} not found")));
    }
    let entry = tracker
        .update_food(&id, draft)
        .context("failed to update food entry")?;
    Ok(Json(entry))
}

async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut tracker = state.tracker();
    if tracker.delete_food(&id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Food entry {id} not found")))
    }
}

async fn create_exercise(
    State(state): State<AppState>,
    Json(req): Json<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<ExerciseEntry>), ApiError> {
    let date = parse_date(&req.date)?;
    validate_exercise_draft(&req.draft).map_err(|e| bad_request(&e))?;
    let mut tracker = state.tracker();
    let entry = tracker
        .add_exercise(date, req.draft)
        .context("failed to save exercise entry")?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_exercise(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<ExerciseDraft>,
) -> Result<Json<ExerciseEntry>, ApiError> {
    validate_exercise_draft(&draft).map_err(|e| bad_request(&e))?;
    let mut tracker = state.tracker();
    if !tracker.logs().exercise.iter().any(|e| e.id == id) {
        return Err(ApiError::NotFound(format!("Exercise entry {id} not found")));
    }
    let entry = tracker
        .update_exercise(&id, draft)
        .context("failed to update exercise entry")?;
    Ok(Json(entry))
}

async fn delete_exercise(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut tracker = state.tracker();
    if tracker.delete_exercise(&id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Exercise entry {id} not found")))
    }
}

async fn create_water(
    State(state): State<AppState>,
    Json(req): Json<CreateWaterRequest>,
) -> Result<(StatusCode, Json<WaterEntry>), ApiError> {
    let date = parse_date(&req.date)?;
    validate_water_amount(req.amount_ml).map_err(|e| bad_request(&e))?;
    let mut tracker = state.tracker();
    let entry = tracker
        .add_water(date, req.amount_ml)
        .context("failed to save water entry")?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_water(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut tracker = state.tracker();
    if tracker.delete_water(&id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Water entry {id} not found")))
    }
}

async fn create_body(
    State(state): State<AppState>,
    Json(req): Json<CreateBodyRequest>,
) -> Result<(StatusCode, Json<BodyEntry>), ApiError> {
    let entry = NewBodyEntry {
        date: parse_date(&req.date)?,
        weight_kg: req.weight_kg,
        body_fat_pct: req.body_fat_pct,
        muscle_mass_kg: req.muscle_mass_kg,
        waist_cm: req.waist_cm,
    };
    validate_body_entry(&entry).map_err(|e| bad_request(&e))?;
    let mut tracker = state.tracker();
    let result = tracker
        .log_body(entry)
        .context("failed to save body entry")?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn delete_body(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut tracker = state.tracker();
    if tracker.delete_body(&id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Body entry {id} not found")))
    }
}

// --- Estimate handlers ---

fn estimator(state: &AppState) -> Result<Arc<dyn NutritionEstimator>, ApiError> {
    state
        .estimator
        .clone()
        .ok_or_else(|| ApiError::Unavailable("No nutrition estimator configured".to_string()))
}

async fn estimate_food(
    State(state): State<AppState>,
    Json(req): Json<EstimateFoodRequest>,
) -> Result<(StatusCode, Json<FoodEntry>), ApiError> {
    let date = parse_date(&req.date)?;
    let meal: MealSlot = req.meal.parse().map_err(|e| bad_request(&e))?;
    require_text(&req.description, "description")?;
    let estimator = estimator(&state)?;

    // Estimators may block on network calls.
    let entry = tokio::task::spawn_blocking(move || {
        let query = FoodQuery::Text(req.description);
        let mut tracker = state.tracker();
        tracker.estimate_and_log_food(estimator.as_ref(), &query, meal, date)
    })
    .await
    .context("estimate task failed")?
    .map_err(ApiError::Upstream)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn estimate_exercise(
    State(state): State<AppState>,
    Json(req): Json<EstimateExerciseRequest>,
) -> Result<(StatusCode, Json<ExerciseEntry>), ApiError> {
    let date = parse_date(&req.date)?;
    require_text(&req.description, "description")?;
    if !req.duration_minutes.is_finite() || req.duration_minutes <= 0.0 {
        return Err(ApiError::BadRequest(
            "duration_minutes must be greater than 0".to_string(),
        ));
    }
    let estimator = estimator(&state)?;

    let entry = tokio::task::spawn_blocking(move || {
        let mut tracker = state.tracker();
        tracker.estimate_and_log_exercise(
            estimator.as_ref(),
            &req.description,
            req.duration_minutes,
            date,
        )
    })
    .await
    .context("estimate task failed")?
    .map_err(ApiError::Upstream)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// --- Export ---

async fn export_data(State(state): State<AppState>) -> Json<ExportDocument> {
    let tracker = state.tracker();
    Json(tracker.export_document())
}

// --- Router builder ---

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/profile", get(get_profile))
        .route("/api/profile/cycle", put(set_cycle_day))
        .route("/api/profile/mode", put(set_target_mode))
        .route("/api/summary/{date}", get(get_daily_summary))
        .route("/api/calendar/{month}", get(get_calendar))
        .route("/api/foods", post(create_food))
        .route("/api/foods/estimate", post(estimate_food))
        .route("/api/foods/{id}", put(update_food).delete(delete_food))
        .route("/api/exercises", post(create_exercise))
        .route("/api/exercises/estimate", post(estimate_exercise))
        .route(
            "/api/exercises/{id}",
            put(update_exercise).delete(delete_exercise),
        )
        .route("/api/water", post(create_water))
        .route("/api/water/{id}", delete(delete_water))
        .route("/api/body", post(create_body))
        .route("/api/body/{id}", delete(delete_body))
        .route("/api/export", get(export_data))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

/// First and last four characters of the key, or `None` when it is too short
/// to show any of it.
fn key_preview(key: &str) -> Option<String> {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 8 {
        return None;
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    Some(format!("{head}...{tail}"))
}

pub async fn start_server(
    tracker: Tracker,
    estimator: Option<Arc<dyn NutritionEstimator>>,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    if estimator.is_none() {
        tracing::info!("no nutrition estimator configured; estimate routes return 503");
    }
    let state = AppState {
        tracker: Arc::new(Mutex::new(tracker)),
        api_key: api_key.clone(),
        estimator,
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        let preview = key_preview(key).unwrap_or_else(|| "(hidden)".to_string());
        eprintln!("API key: {preview} (see api_key file in data directory)");
    } else {
        eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone.");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    eprintln!("Listening on http://{bind}:{port}");
    tracing::info!(%bind, port, "server started");
    axum::serve(listener, app).await?;

    Ok(())
}
