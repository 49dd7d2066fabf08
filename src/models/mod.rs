//! Data models for ERP entities

mod discussion;
mod notification;
mod project;
mod staff;

pub use discussion::*;
pub use notification::*;
pub use project::*;
pub use staff::*;
