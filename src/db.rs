pub mod organization_repo;
pub use organization_repo::OrganizationRepository;
pub mod versioned_repo;
pub use versioned_repo::{EntityKey, EntityKind, VersionedRepository};
