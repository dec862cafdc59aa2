pub mod poll_controllers;
pub mod whitelist_controllers;
