pub mod api_client;
pub mod attendance;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod history;
pub mod session;
pub mod settings;
pub mod sync;
pub mod timer;
