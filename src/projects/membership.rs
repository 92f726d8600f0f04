//! Team composition rules. All functions are pure; callers persist the
//! resulting member set themselves.

use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MembershipError {
    #[error("Leader cannot be added as a team member")]
    LeaderCannotBeMember,
}

/// Outcome of a membership operation. `Unchanged` means no write is needed.
#[derive(Debug, PartialEq, Eq)]
pub enum MembershipChange {
    Unchanged,
    Updated(Vec<Uuid>),
}

/// Appends a member. Already-present candidates are a no-op; the leader may
/// never appear in the member set.
pub fn add_member(
    leader: Option<Uuid>,
    members: &[Uuid],
    candidate: Uuid,
) -> Result<MembershipChange, MembershipError> {
    if members.contains(&candidate) {
        return Ok(MembershipChange::Unchanged);
    }
    if leader == Some(candidate) {
        return Err(MembershipError::LeaderCannotBeMember);
    }
    let mut next = members.to_vec();
    next.push(candidate);
    Ok(MembershipChange::Updated(next))
}

/// Removes all occurrences of a member (defensive against accidental
/// duplicates). Removing an absent member is not an error.
pub fn remove_member(members: &[Uuid], member: Uuid) -> MembershipChange {
    if !members.contains(&member) {
        return MembershipChange::Unchanged;
    }
    let next = members.iter().copied().filter(|m| *m != member).collect();
    MembershipChange::Updated(next)
}

/// Member set for a freshly created project: deduplicated, leader excluded.
pub fn initial_members(leader: Uuid, requested: &[Uuid]) -> Result<Vec<Uuid>, MembershipError> {
    let mut members = Vec::with_capacity(requested.len());
    for &id in requested {
        if id == leader {
            return Err(MembershipError::LeaderCannotBeMember);
        }
        if !members.contains(&id) {
            members.push(id);
        }
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_appends_a_new_member() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let change = add_member(Some(Uuid::new_v4()), &[a], b).unwrap();
        assert_eq!(change, MembershipChange::Updated(vec![a, b]));
    }

    #[test]
    fn add_twice_is_a_no_op_after_the_first() {
        let leader = Uuid::new_v4();
        let m = Uuid::new_v4();
        let MembershipChange::Updated(members) = add_member(Some(leader), &[], m).unwrap() else {
            panic!("first add must update");
        };
        assert_eq!(members, vec![m]);
        assert_eq!(
            add_member(Some(leader), &members, m).unwrap(),
            MembershipChange::Unchanged
        );
    }

    #[test]
    fn adding_the_leader_is_rejected() {
        let leader = Uuid::new_v4();
        assert_eq!(
            add_member(Some(leader), &[], leader),
            Err(MembershipError::LeaderCannotBeMember)
        );
    }

    #[test]
    fn leaderless_project_accepts_any_candidate() {
        let m = Uuid::new_v4();
        assert_eq!(
            add_member(None, &[], m).unwrap(),
            MembershipChange::Updated(vec![m])
        );
    }

    #[test]
    fn remove_is_idempotent() {
        let m = Uuid::new_v4();
        let MembershipChange::Updated(members) = remove_member(&[m], m) else {
            panic!("present member must be removed");
        };
        assert!(members.is_empty());
        assert_eq!(remove_member(&members, m), MembershipChange::Unchanged);
    }

    #[test]
    fn remove_drops_every_occurrence() {
        let m = Uuid::new_v4();
        let other = Uuid::new_v4();
        let change = remove_member(&[m, other, m], m);
        assert_eq!(change, MembershipChange::Updated(vec![other]));
    }

    #[test]
    fn initial_members_dedupes() {
        let leader = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let members = initial_members(leader, &[a, b, a]).unwrap();
        assert_eq!(members, vec![a, b]);
    }

    #[test]
    fn initial_members_rejects_the_leader() {
        let leader = Uuid::new_v4();
        assert_eq!(
            initial_members(leader, &[Uuid::new_v4(), leader]),
            Err(MembershipError::LeaderCannotBeMember)
        );
    }
}
