pub mod api;
pub mod domain;
pub mod timestamp;
pub mod utils;
