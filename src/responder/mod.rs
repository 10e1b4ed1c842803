//! AT command responder imitating HC-06 style Bluetooth serial modules.
pub mod dispatch;
pub mod profile;
pub mod runner;
pub mod tables;

pub use dispatch::{dispatch, respond, Reply};
pub use profile::{BaudHandling, ModuleProfile, ParityHandling, Variant};
pub use runner::Responder;
