pub mod bridge;
pub mod config;
pub mod forum_log;
pub mod refresh;
pub mod search;
pub mod sync;
