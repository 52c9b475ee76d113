//! Container runtime collaborators

pub mod lifecycle;
pub mod probe;
pub mod process;

pub use lifecycle::{Lifecycle, ScriptLifecycle};
pub use probe::{DockerProbe, RuntimeProbe};
