//! Database queries

pub mod ad_spend;
pub mod agent;
pub mod appointment;
pub mod call;
pub mod import;
pub mod lead;
pub mod project;
pub mod role;
pub mod tag;
