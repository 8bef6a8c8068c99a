pub mod analytics;
pub mod audit_log;
pub mod comment;
pub mod moderation;
pub mod play_history;
pub mod target;
pub mod user;

pub mod database_helpers;
pub mod pagination;
