pub mod commands;
pub mod config;
pub mod responder;
pub mod serial;
