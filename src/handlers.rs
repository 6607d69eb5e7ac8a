pub mod proposals;
pub mod sections;
pub mod tenancy;
