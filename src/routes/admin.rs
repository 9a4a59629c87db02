use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
};
use tracing::info;
use validator::Validate;

use crate::{
    errors::{Error, Result},
    hierarchy::{assignable_roles, can_manage, list_managed_accounts},
    middleware::{CurrentActor, require_actor},
    models::{
        account::{AccountPatch, ManagedAccount, Role},
        invitation::Invitation,
    },
    state::AppState,
    utils::{time::time_now, validated_form::ValidatedJson},
};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/invite", post(invite_user))
        .route("/users/{user_id}", get(get_user))
        .route("/users/{user_id}/role", patch(update_role))
        .nest("/seed", super::seed::router())
        .layer(middleware::from_fn_with_state(state.clone(), require_actor))
        .with_state(state)
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
) -> Result<Json<Vec<ManagedAccount>>> {
    let managed = list_managed_accounts(state.accounts.as_ref(), &actor).await;
    Ok(Json(managed))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Path(user_id): Path<String>,
) -> Result<Json<ManagedAccount>> {
    let target = state
        .accounts
        .get(&user_id)
        .await?
        .ok_or(Error::NotFound)?;

    if actor.id != target.id && !can_manage(state.accounts.as_ref(), &actor, &target).await {
        return Err(Error::AccessDenied);
    }

    let parent_display_name = match &target.parent_id {
        Some(parent_id) => match state.accounts.get(parent_id).await? {
            Some(parent) => parent.display_name,
            None => "Unknown".to_string(),
        },
        None => "None".to_string(),
    };

    Ok(Json(ManagedAccount {
        account: target,
        parent_display_name,
    }))
}

#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UpdateRoleResponse {
    pub msg: String,
}

/// The assignable-roles table and the ownership walk are both checked here,
/// so a direct call bypassing any client gets the same answer as the UI.
pub async fn update_role(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Path(user_id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateRoleRequest>,
) -> Result<Json<UpdateRoleResponse>> {
    if !assignable_roles(actor.role).contains(&input.role) {
        return Err(Error::AccessDenied);
    }

    let target = state
        .accounts
        .get(&user_id)
        .await?
        .ok_or(Error::NotFound)?;

    if !can_manage(state.accounts.as_ref(), &actor, &target).await {
        return Err(Error::AccessDenied);
    }

    state
        .accounts
        .patch(
            &target.id,
            AccountPatch {
                role: Some(input.role),
                ..Default::default()
            },
        )
        .await?;

    info!("{} set role of {} to {:?}", actor.id, target.id, input.role);

    Ok(Json(UpdateRoleResponse {
        msg: format!("Role updated to {:?}", input.role),
    }))
}

#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(length(min = 3, message = "Display name must be at least 3 characters."))]
    pub display_name: String,
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct InviteResponse {
    pub msg: String,
}

pub async fn invite_user(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    ValidatedJson(input): ValidatedJson<InviteRequest>,
) -> Result<(StatusCode, Json<InviteResponse>)> {
    // Covers both "may this actor invite at all" (user rank has an empty
    // table) and "may it grant this particular role".
    if !assignable_roles(actor.role).contains(&input.role) {
        return Err(Error::AccessDenied);
    }

    if state
        .invitations
        .find_by_email(&input.email)
        .await?
        .is_some()
    {
        return Err(Error::InvitationExists);
    }
    if state.accounts.find_by_email(&input.email).await?.is_some() {
        return Err(Error::EmailExists);
    }

    let invitation = Invitation {
        email: input.email.clone(),
        display_name: input.display_name.clone(),
        role: input.role,
        parent_id: actor.id.clone(),
        created_at: time_now(),
    };
    state.invitations.create(invitation).await?;

    Ok((
        StatusCode::CREATED,
        Json(InviteResponse {
            msg: format!(
                "Invitation for {} ({}) has been created. They can now complete their registration.",
                input.display_name, input.email
            ),
        }),
    ))
}
