//! Application services for agent registration and discovery.

mod registry;

pub use registry::{AcceptancePolicy, RegistryError, RegistryResult, RegistryService};
