//! Deployment configuration

pub mod resolver;
pub mod spec;

pub use resolver::{resolve, resolve_file};
pub use spec::{ComponentInfo, ComponentKind, ComponentSpec, Connection, DeploymentSpec, ServiceTarget};
