pub mod blocklist;
pub mod dashboard;
pub mod events;
pub mod records;
pub mod settings;
