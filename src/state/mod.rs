pub mod app_settings;
pub mod app_state;
pub mod loader;
pub mod messages;
pub mod pool;
pub mod refresher;
