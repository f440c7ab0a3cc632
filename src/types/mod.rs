//! Type definitions

pub mod ad_spend;
pub mod agent;
pub mod appointment;
pub mod call;
pub mod import;
pub mod lead;
pub mod messages;
pub mod project;
pub mod role;
pub mod stats;
pub mod tag;

pub use ad_spend::*;
pub use agent::*;
pub use appointment::*;
pub use call::*;
pub use import::*;
pub use lead::*;
pub use messages::*;
pub use project::*;
pub use role::*;
pub use stats::*;
pub use tag::*;
