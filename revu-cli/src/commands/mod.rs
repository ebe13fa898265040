//! CLI command implementations

pub mod pr;
pub mod stats;
pub mod team;
pub mod user;

pub use pr::PrArgs;
pub use stats::StatsArgs;
pub use team::TeamArgs;
pub use user::UserArgs;
