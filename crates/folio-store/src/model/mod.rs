//! Typed records stored in the YAML documents

pub mod detail;
pub mod project;
pub mod season;

pub use detail::{DetailUpdate, Focus, Link, LinkType, ProjectDetail, Task, TaskPatch, TaskState};
pub use project::{
    default_status_order, Jevm, PivotCost, Project, StatusColor, StatusMeta, DEFAULT_CATEGORY,
    DEFAULT_STATUS, UNKNOWN_STATUS_ORDER,
};
pub use season::{
    resolve_current_season, Initiative, Role, Season, WeeklyLog, MAX_OUTCOMES, MAX_PICKS,
};
