//! Dashboard statistics and agent leaderboard

use axum::extract::{Query, State};
use axum::Json;
use tracing::debug;

use crate::auth::AuthUser;
use crate::db::queries;
use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;
use crate::services::stats::{compute_stats, leaderboard as rank_agents};
use crate::types::{DashboardStats, LeaderboardEntry, RangeQuery};

fn check_range(range: &RangeQuery) -> ApiResult<()> {
    if range.is_inverted() {
        return Err(ApiError::validation("'from' must not be after 'to'"));
    }
    Ok(())
}

pub async fn dashboard(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Json<DashboardStats>> {
    check_range(&range)?;
    let pool = &state.pool;
    let (leads, calls, appointments, ad_spend) = tokio::try_join!(
        queries::lead::list_leads(pool, &range),
        queries::call::list_calls(pool, &range),
        queries::appointment::list_appointments(pool, &range),
        queries::ad_spend::list_ad_spend(pool, &range),
    )?;
    debug!(
        leads = leads.len(),
        calls = calls.len(),
        appointments = appointments.len(),
        "Dashboard rows loaded"
    );

    Ok(Json(compute_stats(&leads, &calls, &appointments, &ad_spend)))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    check_range(&range)?;
    let pool = &state.pool;
    let (agents, calls, appointments) = tokio::try_join!(
        queries::agent::list_agents(pool),
        queries::call::list_calls(pool, &range),
        queries::appointment::list_appointments(pool, &range),
    )?;

    Ok(Json(rank_agents(&agents, &calls, &appointments)))
}
