pub mod poll_models;
pub mod snapshot_models;

pub use poll_models::{Ballot, Comment, Poll};
pub use snapshot_models::Snapshot;
