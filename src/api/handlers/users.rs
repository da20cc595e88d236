use axum::extract::{Path, State};
use axum::{Extension, Json};
use std::sync::Arc;

use super::run_blocking;
use crate::api::response::{ApiError, AppJson, AppQuery, JSend};
use crate::auth::Identity;
use crate::registry::{
    users, Credentials, ProfilePatch, Registration, TokenView, UserLookup, UserView,
};
use crate::AppState;

// ============================================================================
// Handlers
// ============================================================================

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<Registration>,
) -> Result<Json<JSend<TokenView>>, ApiError> {
    let token = run_blocking(move || users::register(&state.db, &state.tokens, req)).await?;
    Ok(JSend::success(token))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<Credentials>,
) -> Result<Json<JSend<TokenView>>, ApiError> {
    let token = run_blocking(move || users::login(&state.db, &state.tokens, req)).await?;
    Ok(JSend::success(token))
}

pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<JSend<UserView>>, ApiError> {
    let user = run_blocking(move || users::current(&state.db, &identity)).await?;
    Ok(JSend::success(user))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    AppJson(patch): AppJson<ProfilePatch>,
) -> Result<Json<JSend<UserView>>, ApiError> {
    let user = run_blocking(move || users::update_current(&state.db, &identity, patch)).await?;
    Ok(JSend::success(user))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    AppQuery(lookup): AppQuery<UserLookup>,
) -> Result<Json<JSend<UserView>>, ApiError> {
    let user = run_blocking(move || users::get_user(&state.db, lookup)).await?;
    Ok(JSend::success(user))
}

pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<JSend<UserView>>, ApiError> {
    let lookup = UserLookup {
        id: Some(user_id),
        ..Default::default()
    };
    let user = run_blocking(move || users::get_user(&state.db, lookup)).await?;
    Ok(JSend::success(user))
}
