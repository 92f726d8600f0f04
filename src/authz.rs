use uuid::Uuid;

use crate::projects::repo::Project;

/// Resolved caller identity, passed explicitly into every authorization and
/// store call. Anonymous callers are a first-class value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Authenticated(AuthenticatedUser),
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

impl Identity {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Identity::Authenticated(u) => Some(u.user_id),
            Identity::Anonymous => None,
        }
    }

    fn require(&self) -> Result<&AuthenticatedUser, DenyReason> {
        match self {
            Identity::Authenticated(u) => Ok(u),
            Identity::Anonymous => Err(DenyReason::NotAuthenticated),
        }
    }
}

/// Why an operation was refused. Logged verbatim; callers get a generic body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAuthenticated,
    NotLeader,
    NotMember,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NotAuthenticated => "not_authenticated",
            DenyReason::NotLeader => "not_leader",
            DenyReason::NotMember => "not_member",
        }
    }
}

/// Capability of an identity on a concrete project. Leader and member are
/// positional (leader column, team_members array); everything else is Viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Leader,
    Member,
    Viewer,
}

pub fn role(identity: &Identity, project: &Project) -> Role {
    let Some(user_id) = identity.user_id() else {
        return Role::Viewer;
    };
    if project.leader == Some(user_id) {
        Role::Leader
    } else if project.team_members.contains(&user_id) {
        Role::Member
    } else {
        Role::Viewer
    }
}

/// Per-project operations subject to authorization. Archiving travels
/// through `FullEdit`: the archived flag is one more leader-editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewDetail,
    FullEdit,
    Delete,
    AddMember,
    RemoveMember,
    MemberEdit,
}

/// Pure decision function. The project must already be resolved; a missing
/// project is NotFound and is checked by the caller before this runs.
pub fn authorize(identity: &Identity, project: &Project, action: Action) -> Result<(), DenyReason> {
    match action {
        Action::ViewDetail => Ok(()),
        Action::FullEdit | Action::Delete | Action::AddMember | Action::RemoveMember => {
            let user = identity.require()?;
            // A leaderless project has nobody who passes this gate.
            if project.leader == Some(user.user_id) {
                Ok(())
            } else {
                Err(DenyReason::NotLeader)
            }
        }
        Action::MemberEdit => {
            let user = identity.require()?;
            if project.team_members.contains(&user.user_id) {
                Ok(())
            } else {
                Err(DenyReason::NotMember)
            }
        }
    }
}

/// The four listing views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScope {
    AllActive,
    MineAsLeader,
    MineAsMember,
    ArchivedMine,
}

/// Store-level filter the listing queries run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFilter {
    /// Every non-archived project.
    Active,
    /// Non-archived projects led by the user.
    LedBy(Uuid),
    /// Non-archived projects where the user is a team member and not the leader.
    MemberOf(Uuid),
    /// Archived projects where the user is leader or team member.
    ArchivedInvolving(Uuid),
}

impl ProjectFilter {
    /// Reference semantics of the filter; the store's listing queries must
    /// agree with this predicate.
    pub fn matches(&self, project: &Project) -> bool {
        match *self {
            ProjectFilter::Active => !project.archived,
            ProjectFilter::LedBy(u) => !project.archived && project.leader == Some(u),
            ProjectFilter::MemberOf(u) => {
                !project.archived
                    && project.team_members.contains(&u)
                    && project.leader != Some(u)
            }
            ProjectFilter::ArchivedInvolving(u) => {
                project.archived
                    && (project.leader == Some(u) || project.team_members.contains(&u))
            }
        }
    }
}

/// Computes which projects an identity may see in a listing view.
pub fn visible_projects(
    identity: &Identity,
    scope: ListingScope,
) -> Result<ProjectFilter, DenyReason> {
    match scope {
        ListingScope::AllActive => Ok(ProjectFilter::Active),
        ListingScope::MineAsLeader => Ok(ProjectFilter::LedBy(identity.require()?.user_id)),
        ListingScope::MineAsMember => Ok(ProjectFilter::MemberOf(identity.require()?.user_id)),
        ListingScope::ArchivedMine => {
            Ok(ProjectFilter::ArchivedInvolving(identity.require()?.user_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projects::repo::Project;
    use time::OffsetDateTime;

    fn project(leader: Option<Uuid>, team_members: Vec<Uuid>, archived: bool) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "test".into(),
            description: None,
            price: None,
            finished_work: None,
            start_date: None,
            end_date: None,
            team_members,
            leader,
            archived,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn authed(user_id: Uuid) -> Identity {
        Identity::Authenticated(AuthenticatedUser {
            user_id,
            email: "a@x.com".into(),
            name: "A".into(),
        })
    }

    #[test]
    fn anonymous_may_view_detail() {
        let p = project(Some(Uuid::new_v4()), vec![], false);
        assert_eq!(authorize(&Identity::Anonymous, &p, Action::ViewDetail), Ok(()));
    }

    #[test]
    fn anonymous_denied_everything_gated() {
        let p = project(Some(Uuid::new_v4()), vec![], false);
        for action in [
            Action::FullEdit,
            Action::Delete,
            Action::AddMember,
            Action::RemoveMember,
            Action::MemberEdit,
        ] {
            assert_eq!(
                authorize(&Identity::Anonymous, &p, action),
                Err(DenyReason::NotAuthenticated)
            );
        }
    }

    #[test]
    fn leader_passes_leader_gated_actions() {
        let leader = Uuid::new_v4();
        let p = project(Some(leader), vec![], false);
        for action in [
            Action::FullEdit,
            Action::Delete,
            Action::AddMember,
            Action::RemoveMember,
        ] {
            assert_eq!(authorize(&authed(leader), &p, action), Ok(()));
        }
    }

    #[test]
    fn stranger_full_edit_is_not_leader() {
        let p = project(Some(Uuid::new_v4()), vec![], false);
        assert_eq!(
            authorize(&authed(Uuid::new_v4()), &p, Action::FullEdit),
            Err(DenyReason::NotLeader)
        );
    }

    #[test]
    fn member_full_edit_is_not_leader() {
        let member = Uuid::new_v4();
        let p = project(Some(Uuid::new_v4()), vec![member], false);
        assert_eq!(
            authorize(&authed(member), &p, Action::FullEdit),
            Err(DenyReason::NotLeader)
        );
    }

    #[test]
    fn leaderless_project_denies_all_leader_gated_actions() {
        let p = project(None, vec![Uuid::new_v4()], false);
        for action in [
            Action::FullEdit,
            Action::Delete,
            Action::AddMember,
            Action::RemoveMember,
        ] {
            assert_eq!(
                authorize(&authed(Uuid::new_v4()), &p, action),
                Err(DenyReason::NotLeader)
            );
        }
    }

    #[test]
    fn member_may_edit_finished_work() {
        let member = Uuid::new_v4();
        let p = project(Some(Uuid::new_v4()), vec![member], false);
        assert_eq!(authorize(&authed(member), &p, Action::MemberEdit), Ok(()));
    }

    #[test]
    fn non_member_member_edit_is_not_member() {
        let p = project(Some(Uuid::new_v4()), vec![], false);
        assert_eq!(
            authorize(&authed(Uuid::new_v4()), &p, Action::MemberEdit),
            Err(DenyReason::NotMember)
        );
    }

    #[test]
    fn leader_is_not_a_member_for_member_edit() {
        let leader = Uuid::new_v4();
        let p = project(Some(leader), vec![Uuid::new_v4()], false);
        assert_eq!(
            authorize(&authed(leader), &p, Action::MemberEdit),
            Err(DenyReason::NotMember)
        );
    }

    #[test]
    fn role_is_positional() {
        let leader = Uuid::new_v4();
        let member = Uuid::new_v4();
        let p = project(Some(leader), vec![member], false);
        assert_eq!(role(&authed(leader), &p), Role::Leader);
        assert_eq!(role(&authed(member), &p), Role::Member);
        assert_eq!(role(&authed(Uuid::new_v4()), &p), Role::Viewer);
        assert_eq!(role(&Identity::Anonymous, &p), Role::Viewer);
    }

    #[test]
    fn all_active_listing_is_open_to_anonymous() {
        assert_eq!(
            visible_projects(&Identity::Anonymous, ListingScope::AllActive),
            Ok(ProjectFilter::Active)
        );
    }

    #[test]
    fn personal_listings_require_authentication() {
        for scope in [
            ListingScope::MineAsLeader,
            ListingScope::MineAsMember,
            ListingScope::ArchivedMine,
        ] {
            assert_eq!(
                visible_projects(&Identity::Anonymous, scope),
                Err(DenyReason::NotAuthenticated)
            );
        }
    }

    #[test]
    fn archiving_moves_a_project_between_listing_buckets() {
        let leader = Uuid::new_v4();
        let mut p = project(Some(leader), vec![], false);

        let mine = ProjectFilter::LedBy(leader);
        let archived = ProjectFilter::ArchivedInvolving(leader);
        assert!(mine.matches(&p));
        assert!(!archived.matches(&p));

        p.archived = true;
        assert!(!mine.matches(&p));
        assert!(archived.matches(&p));
    }

    #[test]
    fn member_listing_excludes_the_leader_and_strangers() {
        let leader = Uuid::new_v4();
        let member = Uuid::new_v4();
        let p = project(Some(leader), vec![member], false);

        assert!(ProjectFilter::MemberOf(member).matches(&p));
        assert!(!ProjectFilter::MemberOf(leader).matches(&p));
        assert!(!ProjectFilter::MemberOf(Uuid::new_v4()).matches(&p));
    }

    #[test]
    fn archived_listing_covers_leader_and_members_only() {
        let leader = Uuid::new_v4();
        let member = Uuid::new_v4();
        let p = project(Some(leader), vec![member], true);

        assert!(ProjectFilter::ArchivedInvolving(leader).matches(&p));
        assert!(ProjectFilter::ArchivedInvolving(member).matches(&p));
        assert!(!ProjectFilter::ArchivedInvolving(Uuid::new_v4()).matches(&p));
        assert!(!ProjectFilter::Active.matches(&p));
    }

    #[test]
    fn personal_listings_scope_to_the_caller() {
        let user_id = Uuid::new_v4();
        let id = authed(user_id);
        assert_eq!(
            visible_projects(&id, ListingScope::MineAsLeader),
            Ok(ProjectFilter::LedBy(user_id))
        );
        assert_eq!(
            visible_projects(&id, ListingScope::MineAsMember),
            Ok(ProjectFilter::MemberOf(user_id))
        );
        assert_eq!(
            visible_projects(&id, ListingScope::ArchivedMine),
            Ok(ProjectFilter::ArchivedInvolving(user_id))
        );
    }
}
