pub mod aggregator;
pub mod allocation;
pub mod calculations;
pub mod calendar;
pub mod config;
pub mod grid;
pub mod loader;
pub mod report;
pub mod validation;
pub mod weeks;

pub use aggregator::{CapacityAggregator, detect_conflicts, weekly_allocation};
pub use allocation::{Allocation, AllocationSet, ResourceId, ResourceRef};
pub use calculations::{ConflictRecord, WeeklyConflict, WeeklyLoad};
pub use calendar::{WorkCalendar, WorkCalendarConfig};
pub use config::{CapacityConfig, ConfigError, DEFAULT_MAX_WEEKLY_DAYS};
pub use grid::{GridExportError, WeeklyGrid};
pub use loader::LoadError;
pub use report::{CapacityReport, ConflictSummary};
pub use validation::{AllocationIssue, check_allocations};
pub use weeks::{WeekEnumerator, enumerate_weeks};
