use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::auth::repo::UserRef;
use crate::projects::repo::{ProjectDetail, ProjectWithLeader};

/// Request body for project creation. The caller becomes leader.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub finished_work: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    #[serde(default)]
    pub team_members: Vec<Uuid>,
}

/// Leader's partial update, archived flag included.
#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub finished_work: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub archived: Option<bool>,
}

/// Team member's edit: the finished-work note and nothing else.
#[derive(Debug, Deserialize)]
pub struct FinishedWorkRequest {
    pub finished_work: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

/// Listing item with the leader projected in.
#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub finished_work: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub archived: bool,
    pub created_at: OffsetDateTime,
    pub leader: Option<UserRef>,
}

impl From<ProjectWithLeader> for ProjectSummary {
    fn from(row: ProjectWithLeader) -> Self {
        let leader = row.leader_ref();
        ProjectSummary {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            finished_work: row.finished_work,
            start_date: row.start_date,
            end_date: row.end_date,
            archived: row.archived,
            created_at: row.created_at,
            leader,
        }
    }
}

/// Full detail view with resolved leader/member refs and the viewer's
/// leader flag.
#[derive(Debug, Serialize)]
pub struct ProjectDetails {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub finished_work: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub archived: bool,
    pub created_at: OffsetDateTime,
    pub leader: Option<UserRef>,
    pub team_members: Vec<UserRef>,
    pub is_leader: bool,
}

impl ProjectDetails {
    pub fn from_detail(detail: ProjectDetail, is_leader: bool) -> Self {
        let ProjectDetail {
            project,
            leader,
            team_members,
        } = detail;
        ProjectDetails {
            id: project.id,
            name: project.name,
            description: project.description,
            price: project.price,
            finished_work: project.finished_work,
            start_date: project.start_date,
            end_date: project.end_date,
            archived: project.archived,
            created_at: project.created_at,
            leader,
            team_members,
            is_leader,
        }
    }
}
