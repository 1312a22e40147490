pub mod executor;
pub mod scheduler;

pub use executor::{DispatchExecutor, InFlightCourses, InFlightGuard, TickSummary};
pub use scheduler::DispatchCron;
