pub mod core;
pub mod services;
pub mod utils;

pub use crate::core::grouping::*;
pub use crate::core::style::*;
pub use crate::core::template_set::*;

pub use crate::utils::db_utils::*;
pub use crate::utils::error::*;
pub use crate::utils::logger::*;
pub use crate::utils::structs::*;

pub use crate::services::config::*;
pub use crate::services::forum_log::*;
pub use crate::services::refresh::*;
pub use crate::services::sync::*;
