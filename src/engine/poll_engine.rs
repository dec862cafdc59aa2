//! Poll state transitions.
//!
//! Every function validates before it touches the snapshot, so a returned
//! error always leaves the snapshot unchanged.

use crate::{
    models::{Ballot, Comment, Poll, Snapshot},
    utils::error::{AppError, AppResult},
};

pub fn list_polls(snapshot: &Snapshot) -> Vec<Poll> {
    snapshot.polls.clone()
}

pub fn create_poll(snapshot: &mut Snapshot, question: &str) -> AppResult<Poll> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::ValidationError("Question is required".to_string()));
    }

    // The counter may lag behind when state was edited by hand.
    let id = snapshot.poll_id_counter.max(snapshot.next_poll_id());
    snapshot.poll_id_counter = id + 1;

    let poll = Poll::new(id, question.to_string());
    snapshot.polls.push(poll.clone());

    Ok(poll)
}

pub fn vote(snapshot: &mut Snapshot, poll_id: u64, user: &str, ballot: &str) -> AppResult<Poll> {
    let poll = snapshot
        .poll_mut(poll_id)
        .ok_or_else(|| AppError::NotFound("Poll not found".to_string()))?;

    if user.is_empty() || ballot.is_empty() {
        return Err(AppError::ValidationError(
            "User and vote are required".to_string(),
        ));
    }
    let ballot: Ballot = ballot.parse()?;

    let previous = poll.voters.get(user).copied();
    if previous == Some(ballot) {
        return Ok(poll.clone());
    }

    match previous {
        Some(Ballot::Yes) => poll.yes = poll.yes.saturating_sub(1),
        Some(Ballot::No) => poll.no = poll.no.saturating_sub(1),
        None => {}
    }
    match ballot {
        Ballot::Yes => poll.yes += 1,
        Ballot::No => poll.no += 1,
    }
    poll.voters.insert(user.to_string(), ballot);

    Ok(poll.clone())
}

pub fn comment(snapshot: &mut Snapshot, poll_id: u64, user: &str, text: &str) -> AppResult<Poll> {
    let poll = snapshot
        .poll_mut(poll_id)
        .ok_or_else(|| AppError::NotFound("Poll not found".to_string()))?;

    if user.is_empty() || text.is_empty() {
        return Err(AppError::ValidationError(
            "User and text are required".to_string(),
        ));
    }

    poll.comments.push(Comment {
        user: user.to_string(),
        text: text.to_string(),
    });

    Ok(poll.clone())
}

pub fn delete_poll(snapshot: &mut Snapshot, poll_id: u64) -> AppResult<Vec<Poll>> {
    let idx = snapshot
        .polls
        .iter()
        .position(|p| p.id == poll_id)
        .ok_or_else(|| AppError::NotFound("Poll not found".to_string()))?;

    snapshot.polls.remove(idx);

    Ok(snapshot.polls.clone())
}
