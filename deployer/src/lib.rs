//! nmsdeploy library
//!
//! Configuration resolution, template rendering and lifecycle orchestration
//! for the NMS observability stack.

pub mod app;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod render;
pub mod runtime;
pub mod storage;
pub mod utils;
