pub mod approve_request;
pub mod get_whitelist;
pub mod manage_whitelist;
pub mod models;
pub mod pending_requests;
pub mod reject_request;
pub mod request_membership;
