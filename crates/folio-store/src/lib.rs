//! Folio Store - split-file YAML persistence
//!
//! Projects live in one YAML file per status, with optional per-project
//! detail folders, and are grouped into quarterly seasons:
//! - [`ProjectStore`]: status partitions, ordering, moves, renames
//! - [`DetailStore`]: tasks, links, focus outcomes and notes
//! - [`SeasonStore`]: seasons, initiatives, weekly picks, current pointer
//! - [`Portfolio`]: the actions a front end calls, composed from the stores
//!
//! Every operation re-reads the files it touches and rewrites them whole.
//! There is no locking: concurrent writers to the same file race and the
//! last write wins.
//!
//! # Example
//!
//! ```rust,no_run
//! use folio_store::{NewProject, Portfolio, StoreConfig};
//!
//! # async fn example() -> folio_store::StoreResult<()> {
//! let folio = Portfolio::open(&StoreConfig::from_env());
//! let id = folio.create_project(NewProject::titled("Garden planner")).await?;
//! folio.update_status(&id, "active").await?;
//! folio.add_task(&id, "Sketch beds", Some(2)).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod commit;
pub mod config;
pub mod details;
pub mod error;
pub mod model;
pub mod paths;
pub mod portfolio;
pub mod projects;
pub mod seasons;
pub mod slug;

mod io;

// Re-exports for convenience
pub use commit::{CommitHook, GitCommitHook, NoopCommitHook};
pub use config::StoreConfig;
pub use details::{DetailRecord, DetailStore};
pub use error::{Entity, StoreError, StoreResult};
pub use model::{
    resolve_current_season, DetailUpdate, Focus, Initiative, Jevm, Link, LinkType, PivotCost,
    Project, ProjectDetail, Role, Season, StatusColor, StatusMeta, Task, TaskPatch, TaskState,
    WeeklyLog,
};
pub use paths::PathResolver;
pub use portfolio::{NewProject, NewSeason, Portfolio, Promotion, StatusColumn};
pub use projects::{ProjectPatch, ProjectStore, RawProject};
pub use seasons::SeasonStore;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with folio stores
    pub use crate::{
        LinkType, NewProject, NewSeason, Portfolio, Project, ProjectPatch, Role, StoreConfig,
        StoreError, StoreResult, TaskPatch, TaskState,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
