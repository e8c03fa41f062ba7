//! Roster endpoints.
//!
//! Request/response bodies use the camelCase roster shape:
//! `{"id":1,"date":"2024-05-01","shiftStatus":"Morning",
//!   "startTime":"09:00:00","endTime":"13:00:00","doctor":{"id":7}}`
//!
//! Errors: `{"error": "...", "code": "INVALID_ARGUMENT"}` with
//! 400 / 404 / 501 / 500 status codes.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use clinic_roster::{Roster, RosterEntry, RosterError, RosterSubmission};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: &'static str,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn reject(e: RosterError) -> (StatusCode, Json<ApiError>) {
    let status = match &e {
        RosterError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        RosterError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        RosterError::Database(_) => {
            warn!(error = %e, "roster storage failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ApiError {
            error: e.to_string(),
            code: e.code(),
        }),
    )
}

/// Optional inclusive date window for the list endpoint.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

/// POST /rosters — save one roster, keyed by its doctor and date.
pub async fn save_roster(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RosterSubmission>,
) -> ApiResult<Roster> {
    state.rosters.save_roster(&req).map(Json).map_err(reject)
}

/// POST /doctors/{doctor_id}/roster — save many days for one doctor at once.
pub async fn save_rosters(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<i64>,
    Json(entries): Json<Vec<RosterEntry>>,
) -> ApiResult<Vec<Roster>> {
    state
        .rosters
        .save_rosters(doctor_id, &entries)
        .map(Json)
        .map_err(reject)
}

/// GET /doctors/{doctor_id}/roster[?from=YYYY-MM-DD&to=YYYY-MM-DD]
///
/// Without bounds every roster of the doctor is returned. A missing bound
/// leaves that side of the window open.
pub async fn list_rosters(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<i64>,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Vec<Roster>> {
    let result = match (range.from, range.to) {
        (None, None) => state.rosters.get_roster_by_doctor(doctor_id),
        (from, to) => state.rosters.get_roster_between(
            doctor_id,
            from.unwrap_or(NaiveDate::MIN),
            to.unwrap_or(NaiveDate::MAX),
        ),
    };
    result.map(Json).map_err(reject)
}

/// GET /doctors/{doctor_id}/roster/{date}
pub async fn roster_for_date(
    State(state): State<Arc<AppState>>,
    Path((doctor_id, date)): Path<(i64, NaiveDate)>,
) -> ApiResult<Roster> {
    match state.rosters.get_roster_for_date(doctor_id, date) {
        Ok(Some(roster)) => Ok(Json(roster)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: format!("no roster for doctor {doctor_id} on {date}"),
                code: "NOT_FOUND",
            }),
        )),
        Err(e) => Err(reject(e)),
    }
}

/// GET /doctors/{doctor_id}/slots?date=YYYY-MM-DD
pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<i64>,
    Query(q): Query<SlotsQuery>,
) -> ApiResult<Vec<NaiveTime>> {
    state
        .rosters
        .get_available_slots(doctor_id, q.date)
        .map(Json)
        .map_err(reject)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request},
        Router,
    };
    use clinic_roster::{RosterService, SqliteRosterStore};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::app::build_router;

    fn router() -> Router {
        let store = SqliteRosterStore::new(rusqlite::Connection::open_in_memory().unwrap()).unwrap();
        build_router(Arc::new(AppState::new(RosterService::new(store))))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn save_then_resave_keeps_id() {
        let app = router();
        let (status, first) = call(
            &app,
            Method::POST,
            "/rosters",
            Some(json!({"date": "2024-05-01", "shiftStatus": "Morning", "doctor": {"id": 7}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["startTime"], "09:00:00");
        assert_eq!(first["endTime"], "13:00:00");

        let (_, second) = call(
            &app,
            Method::POST,
            "/rosters",
            Some(json!({"date": "2024-05-01", "shiftStatus": "Evening", "doctor": {"id": 7}})),
        )
        .await;
        assert_eq!(second["id"], first["id"]);
        assert_eq!(second["startTime"], "13:00:00");

        let (status, list) = call(&app, Method::GET, "/doctors/7/roster", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_shift_is_bad_request() {
        let app = router();
        let (status, body) = call(
            &app,
            Method::POST,
            "/rosters",
            Some(json!({"date": "2024-05-01", "shiftStatus": "Night", "doctor": {"id": 7}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn off_day_serialises_null_times() {
        let app = router();
        let (_, body) = call(
            &app,
            Method::POST,
            "/rosters",
            Some(json!({"date": "2024-05-01", "shiftStatus": "Off", "doctor": {"id": 7}})),
        )
        .await;
        assert_eq!(body["startTime"], Value::Null);
        assert_eq!(body["endTime"], Value::Null);
    }

    #[tokio::test]
    async fn batch_and_range_lookup() {
        let app = router();
        let entries = json!([
            {"date": "2024-05-01", "shiftStatus": "Full Duty"},
            {"date": "2024-05-02", "shiftStatus": "Morning"},
            {"date": "2024-05-03", "shiftStatus": "Off"}
        ]);
        let (status, saved) = call(&app, Method::POST, "/doctors/7/roster", Some(entries)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved.as_array().unwrap().len(), 3);

        let (_, window) = call(
            &app,
            Method::GET,
            "/doctors/7/roster?from=2024-05-02&to=2024-05-03",
            None,
        )
        .await;
        let dates: Vec<_> = window
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["date"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(dates, vec!["2024-05-02", "2024-05-03"]);

        let (_, open_ended) = call(&app, Method::GET, "/doctors/7/roster?from=2024-05-03", None).await;
        assert_eq!(open_ended.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn open_range_reaches_far_years() {
        let app = router();
        let entries = json!([
            {"date": "+10000-01-01", "shiftStatus": "Morning"},
            {"date": "-0001-05-01", "shiftStatus": "Morning"},
            {"date": "0000-01-01", "shiftStatus": "Morning"},
            {"date": "2024-05-01", "shiftStatus": "Morning"},
        ]);
        let (status, _) = call(&app, Method::POST, "/doctors/7/roster", Some(entries)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, up_to) = call(&app, Method::GET, "/doctors/7/roster?to=2024-01-01", None).await;
        assert_eq!(up_to.as_array().unwrap().len(), 2);
        assert_eq!(up_to[1]["date"], "0000-01-01");

        let (_, from) = call(&app, Method::GET, "/doctors/7/roster?from=2024-01-01", None).await;
        assert_eq!(from.as_array().unwrap().len(), 2);
        assert_eq!(from[0]["date"], "2024-05-01");
    }

    #[tokio::test]
    async fn storage_failure_is_internal_error() {
        // A foreign table squatting on the name survives IF NOT EXISTS, so
        // every roster query fails at prepare time.
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE rosters (id INTEGER PRIMARY KEY);").unwrap();
        let store = SqliteRosterStore::new(conn).unwrap();
        let app = build_router(Arc::new(AppState::new(RosterService::new(store))));

        let (status, body) = call(&app, Method::GET, "/doctors/7/roster", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DATABASE_ERROR");

        let (status, body) = call(
            &app,
            Method::POST,
            "/rosters",
            Some(json!({"date": "2024-05-01", "shiftStatus": "Morning", "doctor": {"id": 7}})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn single_day_lookup() {
        let app = router();
        let (status, body) = call(&app, Method::GET, "/doctors/7/roster/2024-05-01", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        call(
            &app,
            Method::POST,
            "/rosters",
            Some(json!({"date": "2024-05-01", "shiftStatus": "Evening", "doctor": {"id": 7}})),
        )
        .await;
        let (status, body) = call(&app, Method::GET, "/doctors/7/roster/2024-05-01", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shiftStatus"], "Evening");
    }

    #[tokio::test]
    async fn slots_report_not_implemented() {
        let app = router();
        let (status, body) = call(&app, Method::GET, "/doctors/7/slots?date=2024-05-01", None).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body["code"], "NOT_IMPLEMENTED");
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = router();
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
