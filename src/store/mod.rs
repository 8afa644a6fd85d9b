//! Data access: repository traits and the in-memory mock backend.

pub mod error;
pub mod memory;
pub mod repository;
pub mod seed;

pub use error::BackendError;
pub use memory::MockBackend;
pub use repository::{
    AuthService, Backend, BackendResult, DeviceRepository, DirectoryRepository,
    ModuleRepository, OrganizationRepository, PlanRepository, SubscriptionRepository,
};
pub use seed::MockData;
