//! Business logic services

pub mod campaign_store;
pub mod composer;
pub mod contacts;
pub mod numbering;
pub mod progress;
pub mod recipients;
pub mod segmentation;
pub mod sender;
