//! Application layer: business logic orchestration over the domain.

pub mod services;
