pub mod blocklist;
pub mod clock;
pub mod config;
pub mod document;
pub mod error;
pub mod record;
pub mod session;
pub mod store;
pub mod timefmt;
pub mod types;
pub mod view;
pub mod workflow;

pub use error::{DeskError, Result};
