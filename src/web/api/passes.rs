use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::predict::{
    detect_passes, FrameConverter, Observer, Pass, PredictError, Propagator, Sgp4Propagator,
    WindowEdgePolicy, Wgs84Converter,
};
use crate::tle::{ElementSet, TleFetcher};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

pub const PREDICTION_WINDOW: Duration = Duration::hours(24);
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A request field given either as a string or a bare JSON number
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RequestValue {
    Text(String),
    Number(f64),
}

impl RequestValue {
    /// Blank strings count as absent
    fn as_text(&self) -> Option<String> {
        match self {
            RequestValue::Text(s) if s.trim().is_empty() => None,
            RequestValue::Text(s) => Some(s.trim().to_string()),
            RequestValue::Number(n) => Some(n.to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassesRequest {
    /// NORAD catalog number
    #[serde(default)]
    pub satellite_id: Option<RequestValue>,
    /// Latitude in decimal degrees
    #[serde(default)]
    pub lat: Option<RequestValue>,
    /// Longitude in decimal degrees
    #[serde(default)]
    pub lng: Option<RequestValue>,
}

/// Validated request
#[derive(Debug, Clone)]
pub struct PassQuery {
    pub satellite_id: String,
    pub observer: Observer,
}

impl PassesRequest {
    pub fn validate(&self, observer_height_m: f64) -> ApiResult<PassQuery> {
        let present = |v: &Option<RequestValue>| v.as_ref().and_then(RequestValue::as_text);

        let (Some(satellite_id), Some(lat), Some(lng)) =
            (present(&self.satellite_id), present(&self.lat), present(&self.lng))
        else {
            return Err(ApiError::MissingParameter);
        };

        let lat: f64 = lat.parse().map_err(|_| ApiError::InvalidCoordinates)?;
        let lng: f64 = lng.parse().map_err(|_| ApiError::InvalidCoordinates)?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(ApiError::InvalidCoordinates);
        }

        Ok(PassQuery {
            satellite_id,
            observer: Observer::from_degrees(lat, lng, observer_height_m),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassRecord {
    /// UTC, `yyyy-MM-dd HH:mm:ss`
    pub start_time: String,
    pub end_time: String,
    pub max_elevation: i64,
    pub azimuth_start: i64,
    pub azimuth_end: i64,
    /// Minutes
    pub duration: i64,
}

impl From<&Pass> for PassRecord {
    fn from(pass: &Pass) -> Self {
        PassRecord {
            start_time: pass.start_time.format(TIMESTAMP_FORMAT).to_string(),
            end_time: pass.end_time.format(TIMESTAMP_FORMAT).to_string(),
            max_elevation: pass.max_elevation_deg.round() as i64,
            azimuth_start: round_azimuth(pass.start_azimuth_deg),
            azimuth_end: round_azimuth(pass.end_azimuth_deg),
            duration: (pass.duration_seconds as f64 / 60.0).round() as i64,
        }
    }
}

// 359.5 and above rounds to 360, which is north again
fn round_azimuth(azimuth_deg: f64) -> i64 {
    (azimuth_deg.round() as i64).rem_euclid(360)
}

/// Fetch, propagate with SGP4 and format passes for the 24 hours following `now`
pub async fn compute_passes(
    fetcher: &TleFetcher,
    query: &PassQuery,
    policy: WindowEdgePolicy,
    now: DateTime<Utc>,
) -> ApiResult<Vec<PassRecord>> {
    compute_passes_with(
        fetcher,
        query,
        policy,
        now,
        Sgp4Propagator::from_element_set,
        &Wgs84Converter,
    )
    .await
}

async fn compute_passes_with<P, C, F>(
    fetcher: &TleFetcher,
    query: &PassQuery,
    policy: WindowEdgePolicy,
    now: DateTime<Utc>,
    compile: F,
    converter: &C,
) -> ApiResult<Vec<PassRecord>>
where
    P: Propagator,
    C: FrameConverter + ?Sized,
    F: Fn(&ElementSet) -> Result<P, PredictError>,
{
    let element_set = fetcher.fetch(&query.satellite_id).await.map_err(|e| {
        log::warn!("Failed to fetch element set for {}: {}", query.satellite_id, e);
        ApiError::from(e)
    })?;

    let propagator = compile(&element_set).map_err(|e| {
        log::warn!("Failed to parse element set for {}: {}", query.satellite_id, e);
        ApiError::from(e)
    })?;

    let passes = detect_passes(
        &propagator,
        converter,
        &query.observer,
        now,
        now + PREDICTION_WINDOW,
        policy,
    );
    log::info!(
        "Found {} passes of {} over the next {} hours",
        passes.len(),
        query.satellite_id,
        PREDICTION_WINDOW.num_hours()
    );

    Ok(passes.iter().map(PassRecord::from).collect())
}

#[utoipa::path(
    post,
    path = "/api/passes",
    tag = "passes",
    request_body = PassesRequest,
    responses(
        (status = 200, description = "Passes over the next 24 hours", body = Vec<PassRecord>),
        (status = 400, description = "Missing or invalid parameters, or unparsable TLE", body = ErrorResponse),
        (status = 500, description = "Element set retrieval or propagation failed", body = ErrorResponse)
    )
)]
pub async fn calculate_passes(
    State(state): State<AppState>,
    request: Result<Json<PassesRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<PassRecord>>> {
    // A body that is absent or not JSON carries none of the required fields
    let Json(request) = request.map_err(|rejection| {
        log::debug!("Rejected request body: {}", rejection);
        ApiError::MissingParameter
    })?;
    let predict = &state.config.predict;
    let query = request.validate(predict.observer_height_m)?;
    let records = compute_passes(&state.fetcher, &query, predict.window_edge, Utc::now()).await?;
    Ok(Json(records))
}
