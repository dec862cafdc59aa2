//! Whitelist and membership request transitions.
//!
//! A user is never in both the whitelist and the pending set. Authorization
//! is checked by the caller before any operator transition runs.

use crate::{
    models::Snapshot,
    utils::error::{AppError, AppResult},
};

pub fn verify_operator(configured: &str, supplied: Option<&str>) -> AppResult<()> {
    match supplied {
        Some(secret) if !secret.is_empty() && secret == configured => Ok(()),
        _ => Err(AppError::Unauthorized(
            "Operator secret missing or invalid".to_string(),
        )),
    }
}

fn require_user(user: &str) -> AppResult<()> {
    if user.is_empty() {
        return Err(AppError::ValidationError("User is required".to_string()));
    }
    Ok(())
}

pub fn list_whitelist(snapshot: &Snapshot) -> Vec<String> {
    snapshot.whitelist.clone()
}

pub fn list_pending_requests(snapshot: &Snapshot) -> Vec<String> {
    snapshot.pending_requests.clone()
}

pub fn request_membership(snapshot: &mut Snapshot, user: &str) -> AppResult<()> {
    require_user(user)?;
    if snapshot.is_whitelisted(user) {
        return Err(AppError::Conflict("User is already whitelisted".to_string()));
    }
    if snapshot.is_pending(user) {
        return Err(AppError::Conflict("Request already exists".to_string()));
    }

    snapshot.pending_requests.push(user.to_string());
    Ok(())
}

fn take_pending(snapshot: &mut Snapshot, user: &str) -> AppResult<()> {
    require_user(user)?;
    let idx = snapshot
        .pending_requests
        .iter()
        .position(|u| u == user)
        .ok_or_else(|| AppError::NotFound("Request not found".to_string()))?;
    snapshot.pending_requests.remove(idx);
    Ok(())
}

pub fn approve_request(snapshot: &mut Snapshot, user: &str) -> AppResult<Vec<String>> {
    take_pending(snapshot, user)?;
    if !snapshot.is_whitelisted(user) {
        snapshot.whitelist.push(user.to_string());
    }
    Ok(snapshot.whitelist.clone())
}

pub fn reject_request(snapshot: &mut Snapshot, user: &str) -> AppResult<()> {
    take_pending(snapshot, user)
}

pub fn add_to_whitelist(snapshot: &mut Snapshot, user: &str) -> AppResult<Vec<String>> {
    require_user(user)?;
    if snapshot.is_whitelisted(user) {
        return Err(AppError::Conflict("User is already whitelisted".to_string()));
    }

    // A direct add supersedes any open request from the same user.
    snapshot.pending_requests.retain(|u| u != user);
    snapshot.whitelist.push(user.to_string());
    Ok(snapshot.whitelist.clone())
}

pub fn remove_from_whitelist(snapshot: &mut Snapshot, user: &str) -> AppResult<Vec<String>> {
    require_user(user)?;
    let idx = snapshot
        .whitelist
        .iter()
        .position(|u| u == user)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    snapshot.whitelist.remove(idx);
    Ok(snapshot.whitelist.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disjoint(snapshot: &Snapshot) -> bool {
        snapshot
            .pending_requests
            .iter()
            .all(|u| !snapshot.whitelist.contains(u))
    }

    #[test]
    fn operator_secret_must_match_exactly() {
        assert!(verify_operator("s3cret", Some("s3cret")).is_ok());
        assert!(matches!(
            verify_operator("s3cret", Some("S3cret")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            verify_operator("s3cret", None),
            Err(AppError::Unauthorized(_))
        ));
        assert!(verify_operator("", Some("")).is_err());
    }

    #[test]
    fn request_then_approve_moves_user() {
        let mut snapshot = Snapshot::default();
        request_membership(&mut snapshot, "newuser").unwrap();
        assert_eq!(list_pending_requests(&snapshot), vec!["newuser"]);
        assert!(!snapshot.is_whitelisted("newuser"));

        let whitelist = approve_request(&mut snapshot, "newuser").unwrap();
        assert_eq!(whitelist, vec!["newuser"]);
        assert!(list_pending_requests(&snapshot).is_empty());

        assert!(matches!(
            approve_request(&mut snapshot, "newuser"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn reject_drops_request_without_whitelisting() {
        let mut snapshot = Snapshot::default();
        request_membership(&mut snapshot, "u").unwrap();
        reject_request(&mut snapshot, "u").unwrap();
        assert!(snapshot.pending_requests.is_empty());
        assert!(snapshot.whitelist.is_empty());
        assert!(matches!(
            reject_request(&mut snapshot, "u"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_requests_and_members_conflict() {
        let mut snapshot = Snapshot::with_whitelist(vec!["member".into()]);
        assert!(matches!(
            request_membership(&mut snapshot, "member"),
            Err(AppError::Conflict(_))
        ));
        request_membership(&mut snapshot, "u").unwrap();
        assert!(matches!(
            request_membership(&mut snapshot, "u"),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            request_membership(&mut snapshot, ""),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            add_to_whitelist(&mut snapshot, "member"),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn remove_requires_existing_member() {
        let mut snapshot = Snapshot::with_whitelist(vec!["a".into(), "b".into()]);
        assert_eq!(remove_from_whitelist(&mut snapshot, "a").unwrap(), vec!["b"]);
        assert!(matches!(
            remove_from_whitelist(&mut snapshot, "a"),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            remove_from_whitelist(&mut snapshot, ""),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn sets_stay_disjoint_across_mixed_operations() {
        let mut snapshot = Snapshot::default();
        let users = ["a", "b", "c", "d"];

        for round in 0..4 {
            for (i, user) in users.iter().enumerate() {
                let _ = match (round + i) % 5 {
                    0 => request_membership(&mut snapshot, user),
                    1 => approve_request(&mut snapshot, user).map(|_| ()),
                    2 => add_to_whitelist(&mut snapshot, user).map(|_| ()),
                    3 => reject_request(&mut snapshot, user),
                    _ => remove_from_whitelist(&mut snapshot, user).map(|_| ()),
                };
                assert!(disjoint(&snapshot));
                let mut whitelist = snapshot.whitelist.clone();
                whitelist.dedup();
                assert_eq!(whitelist.len(), snapshot.whitelist.len());
            }
        }
    }
}
