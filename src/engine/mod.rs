pub mod access_engine;
pub mod poll_engine;
