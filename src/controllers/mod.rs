pub mod admin_controller;
pub mod comment_controller;
pub mod favorite_controller;
pub mod play_controller;
