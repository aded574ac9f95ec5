//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};

use super::dto::{
    DateQuery, DayResponse, EmailResponse, GpsFixRequest, GpsFixResponse, HealthResponse,
    LocationListResponse, LocationResponse, ReportQuery, ReportResponse, SettingsResponse,
    UpdateSettingsRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::services::{convert_to_html, EMAIL_SUBJECT};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Locations
// =============================================================================

/// GET /v1/locations
pub async fn list_locations(State(state): State<AppState>) -> HandlerResult<LocationListResponse> {
    let locations = state.settings.locations().all_locations().await?;
    let total = locations.len();
    Ok(Json(LocationListResponse { locations, total }))
}

/// GET /v1/locations/{city}
pub async fn get_location(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> HandlerResult<LocationResponse> {
    let record = state
        .settings
        .locations()
        .city(&city)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Unknown city '{}'", city)))?;
    Ok(Json(record.into()))
}

// =============================================================================
// Settings
// =============================================================================

async fn settings_response(state: &AppState) -> Result<SettingsResponse, AppError> {
    let settings = &state.settings;
    let location = settings.location().await?;
    Ok(SettingsResponse {
        city: settings.city()?,
        gps: settings.gps()?,
        location: location.display_name(),
        longitude: location.longitude.value(),
        latitude: location.latitude.value(),
        timezone: settings.timezone().await?.name().to_string(),
        updating_location: settings.is_updating_location(),
    })
}

/// GET /v1/settings
pub async fn get_settings(State(state): State<AppState>) -> HandlerResult<SettingsResponse> {
    Ok(Json(settings_response(&state).await?))
}

/// PUT /v1/settings
///
/// Unknown cities are rejected before anything is stored.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> HandlerResult<SettingsResponse> {
    if let Some(city) = request.city.as_deref() {
        let record = state
            .settings
            .locations()
            .city(city)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown city '{}'", city)))?;
        state.settings.set_city_name(&record.city)?;
    }
    if let Some(gps) = request.gps {
        state.settings.set_gps(gps)?;
    }
    Ok(Json(settings_response(&state).await?))
}

/// POST /v1/settings/gps-fix
pub async fn post_gps_fix(
    State(state): State<AppState>,
    Json(request): Json<GpsFixRequest>,
) -> HandlerResult<GpsFixResponse> {
    if request.fixes.is_empty() {
        return Err(AppError::BadRequest("No location fixes given".to_string()));
    }
    let accepted = state.settings.on_location_update(&request.fixes).await?;
    let location = state.settings.location().await?;
    Ok(Json(GpsFixResponse {
        accepted,
        location: location.display_name(),
    }))
}

// =============================================================================
// Calendar and reports
// =============================================================================

/// The requested date, or today in the user's zone.
async fn date_or_today(state: &AppState, date: Option<NaiveDate>) -> Result<NaiveDate, AppError> {
    match date {
        Some(date) => Ok(date),
        None => {
            let tz = state.settings.timezone().await?;
            Ok(Utc::now().with_timezone(&tz).date_naive())
        }
    }
}

/// GET /v1/calendar/day?date=YYYY-MM-DD
pub async fn get_day(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> HandlerResult<DayResponse> {
    let date = date_or_today(&state, query.date).await?;
    let (location, day) = state.reports.day(date).await?;
    Ok(Json(DayResponse::new(&location, day)))
}

/// GET /v1/report?date=YYYY-MM-DD&range=week|month
pub async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> HandlerResult<ReportResponse> {
    let from = date_or_today(&state, query.date).await?;
    let report = state
        .reports
        .build(from, query.range.unwrap_or_default())
        .await?;
    Ok(Json(report.into()))
}

/// GET /v1/report/email?date=YYYY-MM-DD&range=week|month
pub async fn get_report_email(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> HandlerResult<EmailResponse> {
    let from = date_or_today(&state, query.date).await?;
    let report = state
        .reports
        .build(from, query.range.unwrap_or_default())
        .await?;
    Ok(Json(EmailResponse {
        subject: EMAIL_SUBJECT.to_string(),
        html: convert_to_html(&report.days),
    }))
}
