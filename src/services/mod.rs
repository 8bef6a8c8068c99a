pub mod analytics_service;
pub mod audit_service;
pub mod comment_service;
pub mod moderation_service;
pub mod play_history_service;
