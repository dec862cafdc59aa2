use serde::{Deserialize, Serialize};

use crate::{
    models::Poll,
    utils::error::{AppError, AppResult},
};

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CreatePollRequest {
    pub question: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CastVoteRequest {
    pub user: String,
    pub vote: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CommentRequest {
    pub user: String,
    pub text: String,
}

#[derive(Serialize, Debug)]
pub struct DeletePollResponse {
    pub success: bool,
    pub polls: Vec<Poll>,
}

/// An id that is not a number can never name a poll.
pub fn parse_poll_id(raw: &str) -> AppResult<u64> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Poll not found".to_string()))
}
