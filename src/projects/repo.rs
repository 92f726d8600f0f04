use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::auth::repo::{User, UserRef};
use crate::authz::ProjectFilter;

/// Persisted project shape.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub finished_work: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub team_members: Vec<Uuid>,
    pub leader: Option<Uuid>,
    pub archived: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub finished_work: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub team_members: Vec<Uuid>,
    pub leader: Option<Uuid>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub finished_work: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub archived: Option<bool>,
}

/// Listing row enriched with the leader's projected fields. Read-side view,
/// distinct from the persisted [`Project`].
#[derive(Debug, FromRow)]
pub struct ProjectWithLeader {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub finished_work: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub team_members: Vec<Uuid>,
    pub leader: Option<Uuid>,
    pub archived: bool,
    pub created_at: OffsetDateTime,
    pub leader_email: Option<String>,
    pub leader_name: Option<String>,
}

impl ProjectWithLeader {
    pub fn leader_ref(&self) -> Option<UserRef> {
        let id = self.leader?;
        Some(UserRef {
            id,
            email: self.leader_email.clone().unwrap_or_default(),
            name: self.leader_name.clone().unwrap_or_default(),
        })
    }
}

/// Detail projection: the project plus resolved leader and member refs.
#[derive(Debug)]
pub struct ProjectDetail {
    pub project: Project,
    pub leader: Option<UserRef>,
    pub team_members: Vec<UserRef>,
}

const PROJECT_COLUMNS: &str =
    "id, name, description, price, finished_work, start_date, end_date, \
     team_members, leader, archived, created_at";

const LIST_SELECT: &str = "SELECT p.id, p.name, p.description, p.price, p.finished_work, \
     p.start_date, p.end_date, p.team_members, p.leader, p.archived, p.created_at, \
     u.email AS leader_email, u.name AS leader_name \
     FROM projects p LEFT JOIN users u ON u.id = p.leader";

/// Runs one of the four listing queries, leader projection included.
pub async fn list(db: &PgPool, filter: ProjectFilter) -> anyhow::Result<Vec<ProjectWithLeader>> {
    let rows = match filter {
        ProjectFilter::Active => {
            let sql = format!("{LIST_SELECT} WHERE p.archived = FALSE ORDER BY p.created_at DESC");
            sqlx::query_as::<_, ProjectWithLeader>(&sql)
                .fetch_all(db)
                .await?
        }
        ProjectFilter::LedBy(user_id) => {
            let sql = format!(
                "{LIST_SELECT} WHERE p.leader = $1 AND p.archived = FALSE \
                 ORDER BY p.created_at DESC"
            );
            sqlx::query_as::<_, ProjectWithLeader>(&sql)
                .bind(user_id)
                .fetch_all(db)
                .await?
        }
        ProjectFilter::MemberOf(user_id) => {
            // IS DISTINCT FROM keeps leaderless projects in this view.
            let sql = format!(
                "{LIST_SELECT} WHERE $1 = ANY(p.team_members) \
                 AND p.leader IS DISTINCT FROM $1 AND p.archived = FALSE \
                 ORDER BY p.created_at DESC"
            );
            sqlx::query_as::<_, ProjectWithLeader>(&sql)
                .bind(user_id)
                .fetch_all(db)
                .await?
        }
        ProjectFilter::ArchivedInvolving(user_id) => {
            let sql = format!(
                "{LIST_SELECT} WHERE p.archived = TRUE \
                 AND (p.leader = $1 OR $1 = ANY(p.team_members)) \
                 ORDER BY p.created_at DESC"
            );
            sqlx::query_as::<_, ProjectWithLeader>(&sql)
                .bind(user_id)
                .fetch_all(db)
                .await?
        }
    };
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Project>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
    let project = sqlx::query_as::<_, Project>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(project)
}

/// Detail projection for the show/edit views.
pub async fn load_detail(db: &PgPool, id: Uuid) -> anyhow::Result<Option<ProjectDetail>> {
    let Some(project) = find_by_id(db, id).await? else {
        return Ok(None);
    };
    let leader = match project.leader {
        Some(leader_id) => User::find_refs(db, &[leader_id]).await?.into_iter().next(),
        None => None,
    };
    let team_members = User::find_refs(db, &project.team_members).await?;
    Ok(Some(ProjectDetail {
        project,
        leader,
        team_members,
    }))
}

pub async fn insert(db: &PgPool, new: NewProject) -> anyhow::Result<Project> {
    let sql = format!(
        "INSERT INTO projects \
         (name, description, price, finished_work, start_date, end_date, team_members, leader) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {PROJECT_COLUMNS}"
    );
    let project = sqlx::query_as::<_, Project>(&sql)
        .bind(new.name)
        .bind(new.description)
        .bind(new.price)
        .bind(new.finished_work)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.team_members)
        .bind(new.leader)
        .fetch_one(db)
        .await?;
    Ok(project)
}

/// Leader-gated partial update. Absent patch fields are left untouched.
pub async fn update_by_id(
    db: &PgPool,
    id: Uuid,
    patch: ProjectPatch,
) -> anyhow::Result<Option<Project>> {
    let sql = format!(
        "UPDATE projects SET \
         name = COALESCE($2, name), \
         description = COALESCE($3, description), \
         price = COALESCE($4, price), \
         finished_work = COALESCE($5, finished_work), \
         start_date = COALESCE($6, start_date), \
         end_date = COALESCE($7, end_date), \
         archived = COALESCE($8, archived) \
         WHERE id = $1 \
         RETURNING {PROJECT_COLUMNS}"
    );
    let project = sqlx::query_as::<_, Project>(&sql)
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.price)
        .bind(patch.finished_work)
        .bind(patch.start_date)
        .bind(patch.end_date)
        .bind(patch.archived)
        .fetch_optional(db)
        .await?;
    Ok(project)
}

/// Member-gated update: touches only the finished-work note.
pub async fn update_finished_work(
    db: &PgPool,
    id: Uuid,
    finished_work: &str,
) -> anyhow::Result<Option<Project>> {
    let sql = format!(
        "UPDATE projects SET finished_work = $2 WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
    );
    let project = sqlx::query_as::<_, Project>(&sql)
        .bind(id)
        .bind(finished_work)
        .fetch_optional(db)
        .await?;
    Ok(project)
}

pub async fn update_members(
    db: &PgPool,
    id: Uuid,
    members: &[Uuid],
) -> anyhow::Result<Option<Project>> {
    let sql =
        format!("UPDATE projects SET team_members = $2 WHERE id = $1 RETURNING {PROJECT_COLUMNS}");
    let project = sqlx::query_as::<_, Project>(&sql)
        .bind(id)
        .bind(members)
        .fetch_optional(db)
        .await?;
    Ok(project)
}

pub async fn delete_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
