use std::collections::BTreeMap;

use crate::{
    models::{Ballot, Comment, Poll},
    utils::error::{AppError, AppResult},
};

pub(crate) const COUNTER_KEY: &str = "poll_id_counter";

/// A `polls` table row. Comments and voters are stored as JSON text so both
/// SQL dialects share one layout.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PollRow {
    pub id: i64,
    pub question: String,
    pub yes_count: i64,
    pub no_count: i64,
    pub comments: String,
    pub voters: String,
}

impl PollRow {
    pub fn from_poll(poll: &Poll) -> AppResult<Self> {
        let encode = |e: serde_json::Error| {
            AppError::StorageWriteFailed(format!("poll {}: {e}", poll.id))
        };

        Ok(Self {
            id: poll.id as i64,
            question: poll.question.clone(),
            yes_count: poll.yes as i64,
            no_count: poll.no as i64,
            comments: serde_json::to_string(&poll.comments).map_err(encode)?,
            voters: serde_json::to_string(&poll.voters).map_err(encode)?,
        })
    }

    pub fn into_poll(self) -> AppResult<Poll> {
        let id = self.id;
        let decode = |e: serde_json::Error| {
            AppError::StorageUnavailable(format!("poll {id} has a corrupt column: {e}"))
        };

        let comments: Vec<Comment> = serde_json::from_str(&self.comments).map_err(decode)?;
        let voters: BTreeMap<String, Ballot> =
            serde_json::from_str(&self.voters).map_err(decode)?;

        Ok(Poll {
            id: self.id.max(0) as u64,
            question: self.question,
            yes: self.yes_count.max(0) as u64,
            no: self.no_count.max(0) as u64,
            comments,
            voters,
        })
    }
}

pub(crate) fn unavailable(e: sqlx::Error) -> AppError {
    AppError::StorageUnavailable(e.to_string())
}

pub(crate) fn write_failed(e: sqlx::Error) -> AppError {
    AppError::StorageWriteFailed(e.to_string())
}
