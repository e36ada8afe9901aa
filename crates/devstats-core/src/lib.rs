//! DevStats core: domain types, the platform and catalog seams, and the
//! resolve-then-write pipeline behind each command.

pub mod commands;
pub mod config;
pub mod contributions;
pub mod error;
pub mod join_dates;
pub mod outcome;
pub mod properties;
pub mod rate_limit;
pub mod traits;
pub mod types;
pub mod writer;

pub use commands::*;
pub use self::config::{CatalogSettings, GitHubSettings, Requirement, Settings};
pub use contributions::{earliest, resolve_developer_stats};
pub use error::*;
pub use join_dates::{earliest_join_by_user, resolve_join_dates};
pub use outcome::{ItemOutcome, Outcomes};
pub use properties::*;
pub use rate_limit::check_rate_limit;
pub use traits::*;
pub use types::*;
pub use writer::{CatalogWriter, WriteReport};
