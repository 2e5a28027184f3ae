//! REST API endpoint handlers for the Observer server.
//!
//! All handlers read from the latest published [`RosterView`] via the
//! shared [`AppState`]. They never touch the live store.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/snapshot` | Tick, simulated time and aggregate |
//! | `GET` | `/api/activity` | Recent activity, newest first |
//! | `GET` | `/api/minions` | List minions (optionally by status) |
//! | `GET` | `/api/minions/{id}` | Single minion |
//! | `GET` | `/api/top` | Top performers by lifetime earnings |
//! | `GET` | `/api/health` | Last successful save and last error |
//!
//! [`RosterView`]: roster_types::RosterView

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use roster_agents::top_performers;
use roster_core::narrative::{court_safe, describe_status};
use roster_types::{MinionId, Status};

use crate::error::ObserverError;
use crate::state::AppState;

/// Records returned by `/api/activity` when no limit is given.
const DEFAULT_ACTIVITY_LIMIT: usize = 20;

/// Minions returned by `/api/top` when no limit is given.
const DEFAULT_TOP_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/activity` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct ActivityQuery {
    /// Maximum number of records to return (default 20).
    pub limit: Option<usize>,
    /// Rewrite messages with hedged phrasing.
    #[serde(default)]
    pub hedged: bool,
}

/// Query parameters for the `GET /api/minions` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct MinionsQuery {
    /// Filter by status: `Idle`, `Working`, `OnBreak` or `Learning`.
    pub status: Option<String>,
}

/// Query parameters for the `GET /api/top` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct TopQuery {
    /// Number of minions to return (default 10).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the headline numbers and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (tick, sim_time, population, working, credits) = state.view().map_or_else(
        |_| (0, "-".to_owned(), 0, 0, 0),
        |view| {
            (
                view.tick,
                view.sim_time.format("%Y-%m-%d %H:%M").to_string(),
                view.aggregate.population,
                view.aggregate.count(Status::Working),
                view.aggregate.total_credits,
            )
        },
    );
    let run_state = match state.operator_state.as_ref() {
        Some(op) if op.end_reason().is_some() => "ENDED",
        Some(op) if op.is_paused() => "PAUSED",
        _ => "RUNNING",
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Roster Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #f0b429; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #f0b429; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
        .status {{ color: #3fb950; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Roster Observer</h1>
    <p class="subtitle">Minion workforce simulation</p>

    <p>Status: <span class="status">{run_state}</span></p>

    <div>
        <div class="metric"><div class="label">Tick</div><div class="value">{tick}</div></div>
        <div class="metric"><div class="label">Sim time</div><div class="value">{sim_time}</div></div>
        <div class="metric"><div class="label">Minions</div><div class="value">{population}</div></div>
        <div class="metric"><div class="label">Working</div><div class="value">{working}</div></div>
        <div class="metric"><div class="label">Credits</div><div class="value">{credits}</div></div>
    </div>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/snapshot">/api/snapshot</a> -- Aggregate statistics</li>
        <li><a href="/api/activity">/api/activity</a> -- Recent activity (?limit=N&amp;hedged=true)</li>
        <li><a href="/api/minions">/api/minions</a> -- All minions (?status=Working)</li>
        <li><a href="/api/top">/api/top</a> -- Top performers (?limit=N)</li>
        <li><a href="/api/health">/api/health</a> -- Persistence health</li>
        <li><a href="/api/operator/status">/api/operator/status</a> -- Run status</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li style="list-style:none;"><code>ws://host:port/ws/ticks</code> -- Live tick summary stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/snapshot
// ---------------------------------------------------------------------------

/// Return the tick, simulated time and aggregate of the latest view.
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let view = state.view()?;
    Ok(Json(serde_json::json!({
        "tick": view.tick,
        "simTime": view.sim_time,
        "aggregate": serde_json::to_value(&view.aggregate)?,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/activity
// ---------------------------------------------------------------------------

/// Return up to `limit` activity records, most recent first.
///
/// With `hedged=true` each message is passed through [`court_safe`].
pub async fn list_activity(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActivityQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let view = state.view()?;
    let limit = params.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);

    let records: Vec<_> = view
        .activity
        .iter()
        .rev()
        .take(limit)
        .map(|record| {
            let mut record = record.clone();
            if params.hedged {
                record.message = court_safe(&record.message);
            }
            record
        })
        .collect();

    Ok(Json(serde_json::json!({
        "count": records.len(),
        "activity": records,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/minions
// ---------------------------------------------------------------------------

/// List all minions, optionally filtered by status.
pub async fn list_minions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MinionsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let filter = params.status.as_deref().map(parse_status).transpose()?;
    let view = state.view()?;

    let minions: Vec<serde_json::Value> = view
        .minions
        .iter()
        .filter(|m| filter.is_none_or(|status| m.status == status))
        .map(|m| {
            serde_json::json!({
                "id": m.id,
                "name": m.name,
                "tier": m.tier,
                "role": m.role,
                "specialty": m.specialty,
                "shift": m.shift,
                "status": m.status,
                "activity": describe_status(m.status),
                "credits": m.credits,
                "energy": m.energy,
                "consciousnessLevel": m.consciousness_level,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "count": minions.len(),
        "minions": minions,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/minions/{id}
// ---------------------------------------------------------------------------

/// Return the full record of a single minion.
pub async fn get_minion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let id = MinionId::from(id);
    if !id.is_well_formed() {
        return Err(ObserverError::InvalidQuery(format!(
            "malformed minion id {id}"
        )));
    }
    let view = state.view()?;
    let minion = view
        .minions
        .iter()
        .find(|m| m.id == id)
        .ok_or_else(|| ObserverError::NotFound(format!("minion {id}")))?;
    Ok(Json(serde_json::to_value(minion)?))
}

// ---------------------------------------------------------------------------
// GET /api/top
// ---------------------------------------------------------------------------

/// Return the highest lifetime earners, ties broken by id.
pub async fn list_top(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let view = state.view()?;
    let top: Vec<serde_json::Value> =
        top_performers(&view.minions, params.limit.unwrap_or(DEFAULT_TOP_LIMIT))
            .into_iter()
            .map(|m| {
                serde_json::json!({
                    "id": m.id,
                    "name": m.name,
                    "tier": m.tier,
                    "totalEarned": m.total_earned,
                    "tasksCompleted": m.tasks_completed,
                })
            })
            .collect();
    Ok(Json(serde_json::json!({ "count": top.len(), "top": top })))
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

/// Return the persistence health: last successful save and last error.
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let operator = state.operator()?;
    Ok(Json(serde_json::json!({
        "tick": operator.current_tick(),
        "persistence": serde_json::to_value(operator.persistence_health())?,
    })))
}

fn parse_status(raw: &str) -> Result<Status, ObserverError> {
    Status::ALL
        .into_iter()
        .find(|status| format!("{status:?}").eq_ignore_ascii_case(raw))
        .ok_or_else(|| ObserverError::InvalidQuery(format!("unknown status {raw}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_names_parse_case_insensitively() {
        assert_eq!(parse_status("working").unwrap(), Status::Working);
        assert_eq!(parse_status("OnBreak").unwrap(), Status::OnBreak);
        assert!(parse_status("asleep").is_err());
    }
}
