pub mod access_gate;
pub mod composition;
pub mod entity_store;
pub mod proposal_service;
