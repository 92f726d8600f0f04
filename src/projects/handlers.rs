use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{extractors::CurrentUser, repo::User},
    authz::{authorize, role, visible_projects, Action, Identity, ListingScope, Role},
    error::ApiError,
    projects::{
        dto::{
            AddMemberRequest, CreateProjectRequest, FinishedWorkRequest, ProjectDetails,
            ProjectSummary, UpdateProjectRequest,
        },
        membership::{self, MembershipChange},
        repo::{self, NewProject, Project, ProjectPatch},
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/mine", get(list_my_projects))
        .route("/projects/member", get(list_member_projects))
        .route("/projects/archived", get(list_archived_projects))
        .route("/projects/:id", get(get_project))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", post(create_project))
        .route("/projects/:id", put(update_project))
        .route("/projects/:id/finished-work", put(update_finished_work))
        .route("/projects/:id", delete(delete_project))
        .route("/projects/:id/members", post(add_member))
        .route("/projects/:id/members/:member_id", delete(remove_member))
}

async fn list_scope(
    state: &AppState,
    identity: &Identity,
    scope: ListingScope,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    let filter = visible_projects(identity, scope)?;
    let rows = repo::list(&state.db, filter).await?;
    Ok(Json(rows.into_iter().map(ProjectSummary::from).collect()))
}

/// All non-archived projects. Open to anonymous callers.
#[instrument(skip(state, identity))]
pub async fn list_projects(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    list_scope(&state, &identity, ListingScope::AllActive).await
}

#[instrument(skip(state, identity))]
pub async fn list_my_projects(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    list_scope(&state, &identity, ListingScope::MineAsLeader).await
}

#[instrument(skip(state, identity))]
pub async fn list_member_projects(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    list_scope(&state, &identity, ListingScope::MineAsMember).await
}

#[instrument(skip(state, identity))]
pub async fn list_archived_projects(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    list_scope(&state, &identity, ListingScope::ArchivedMine).await
}

/// Project detail for any identity, with the viewer's leader flag.
#[instrument(skip(state, identity))]
pub async fn get_project(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectDetails>, ApiError> {
    let detail = repo::load_detail(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    authorize(&identity, &detail.project, Action::ViewDetail)?;
    let is_leader = role(&identity, &detail.project) == Role::Leader;
    Ok(Json(ProjectDetails::from_detail(detail, is_leader)))
}

/// Creates a project; the authenticated caller becomes its leader.
#[instrument(skip(state, user, payload))]
pub async fn create_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Project name is required".into()));
    }

    let team_members = membership::initial_members(user.user_id, &payload.team_members)?;

    let project = repo::insert(
        &state.db,
        NewProject {
            name: payload.name,
            description: payload.description,
            price: payload.price,
            finished_work: payload.finished_work,
            start_date: payload.start_date,
            end_date: payload.end_date,
            team_members,
            leader: Some(user.user_id),
        },
    )
    .await?;

    info!(project_id = %project.id, leader = %user.user_id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// Full edit, leader only. The archived flag rides along with the rest.
#[instrument(skip(state, identity, payload))]
pub async fn update_project(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    authorize(&identity, &existing, Action::FullEdit)?;

    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("Project name is required".into()));
        }
    }

    // Read-check-write without a transaction; last writer wins.
    let project = repo::update_by_id(
        &state.db,
        id,
        ProjectPatch {
            name: payload.name,
            description: payload.description,
            price: payload.price,
            finished_work: payload.finished_work,
            start_date: payload.start_date,
            end_date: payload.end_date,
            archived: payload.archived,
        },
    )
    .await?
    .ok_or(ApiError::NotFound("Project"))?;

    Ok(Json(project))
}

/// Team member's edit: only the finished-work note changes.
#[instrument(skip(state, identity, payload))]
pub async fn update_finished_work(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<FinishedWorkRequest>,
) -> Result<Json<Project>, ApiError> {
    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    authorize(&identity, &existing, Action::MemberEdit)?;

    let project = repo::update_finished_work(&state.db, id, &payload.finished_work)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;

    Ok(Json(project))
}

/// Leader-initiated delete, the only destruction path.
#[instrument(skip(state, identity))]
pub async fn delete_project(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    authorize(&identity, &existing, Action::Delete)?;

    repo::delete_by_id(&state.db, id).await?;
    info!(project_id = %id, "project deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Adds a team member. Duplicates are a no-op; the leader is rejected;
/// the referenced user must exist.
#[instrument(skip(state, identity, payload))]
pub async fn add_member(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddMemberRequest>,
) -> Result<Json<Project>, ApiError> {
    let project = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    authorize(&identity, &project, Action::AddMember)?;

    if User::find_by_id(&state.db, payload.user_id).await?.is_none() {
        return Err(ApiError::NotFound("User"));
    }

    match membership::add_member(project.leader, &project.team_members, payload.user_id)? {
        MembershipChange::Unchanged => Ok(Json(project)),
        MembershipChange::Updated(members) => {
            let project = repo::update_members(&state.db, id, &members)
                .await?
                .ok_or(ApiError::NotFound("Project"))?;
            info!(project_id = %id, member = %payload.user_id, "team member added");
            Ok(Json(project))
        }
    }
}

/// Removes a team member. Removing an absent member is not an error.
#[instrument(skip(state, identity))]
pub async fn remove_member(
    State(state): State<AppState>,
    identity: Identity,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Project>, ApiError> {
    let project = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    authorize(&identity, &project, Action::RemoveMember)?;

    match membership::remove_member(&project.team_members, member_id) {
        MembershipChange::Unchanged => Ok(Json(project)),
        MembershipChange::Updated(members) => {
            let project = repo::update_members(&state.db, id, &members)
                .await?
                .ok_or(ApiError::NotFound("Project"))?;
            info!(project_id = %id, member = %member_id, "team member removed");
            Ok(Json(project))
        }
    }
}
