use axum::{
    Json, Router,
    extract::{Extension, State},
    routing::post,
};
use tracing::info;

use crate::{
    errors::{Error, Result},
    middleware::CurrentActor,
    models::account::Role,
    models::seed::{default_categories, default_colors},
    state::AppState,
    store::StoreError,
};

/// Nested under the admin router, which already resolves the actor.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/colors", post(seed_colors))
        .route("/categories", post(seed_categories))
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SeedResult {
    pub success: bool,
    pub message: String,
}

pub async fn seed_colors(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
) -> Result<Json<SeedResult>> {
    if actor.role != Role::Superadmin {
        return Err(Error::AccessDenied);
    }

    match state.seeds.seed_colors(&default_colors()).await {
        Ok(count) => {
            info!("{} seeded {count} colors", actor.id);
            Ok(Json(SeedResult {
                success: true,
                message: format!("{count} colors have been seeded successfully."),
            }))
        }
        Err(StoreError::NotEmpty(_)) => Ok(Json(SeedResult {
            success: false,
            message: "Colors collection is not empty. Seeding aborted to prevent duplicates."
                .to_string(),
        })),
        Err(other) => Err(Error::Store(other)),
    }
}

pub async fn seed_categories(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
) -> Result<Json<SeedResult>> {
    if actor.role != Role::Superadmin {
        return Err(Error::AccessDenied);
    }

    match state.seeds.seed_categories(&default_categories()).await {
        Ok(count) => {
            info!("{} seeded {count} categories", actor.id);
            Ok(Json(SeedResult {
                success: true,
                message: format!("{count} categories have been seeded successfully."),
            }))
        }
        Err(StoreError::NotEmpty(_)) => Ok(Json(SeedResult {
            success: false,
            message: "Categories collection is not empty. Seeding aborted to prevent duplicates."
                .to_string(),
        })),
        Err(other) => Err(Error::Store(other)),
    }
}
