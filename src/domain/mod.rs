//! Domain layer: entities, repository contracts, and the click pipeline.

pub mod click_event;
pub mod click_queue;
pub mod click_worker;
pub mod entities;
pub mod repositories;
