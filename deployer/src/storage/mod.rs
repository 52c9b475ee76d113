//! Deployment tree storage

pub mod layout;
pub mod lock;
