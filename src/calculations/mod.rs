pub mod conflicts;
pub mod weekly_load;

pub use conflicts::{ConflictPass, ConflictRecord, WeeklyConflict, conflicts_from_loads};
pub use weekly_load::{WeekLoads, WeeklyLoad, WeeklyLoadPass};
