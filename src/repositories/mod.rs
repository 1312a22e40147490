//! Repository layer for data access operations.
//!
//! Store traits live in [`traits`]; each has a diesel implementation over the
//! async pool and an in-memory implementation in [`memory`].

mod checkpoint_repo;
mod course_repo;
mod dispatch_log_repo;
pub mod memory;
pub mod traits;
mod window_repo;

pub use checkpoint_repo::CheckpointRepository;
pub use course_repo::CourseRepository;
pub use dispatch_log_repo::DispatchLogRepository;
pub use traits::{
    CheckpointStore, CourseCatalog, DispatchLogStore, UserDirectory, WindowFilter, WindowOrder,
    WindowStore,
};
pub use window_repo::WindowRepository;

use crate::db::AsyncDbPool;

/// Aggregates all diesel repositories.
///
/// Since `AsyncDbPool` uses `Arc` internally, cloning is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub windows: WindowRepository,
    pub checkpoints: CheckpointRepository,
    pub dispatch_logs: DispatchLogRepository,
    pub courses: CourseRepository,
}

impl Repositories {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            windows: WindowRepository::new(pool.clone()),
            checkpoints: CheckpointRepository::new(pool.clone()),
            dispatch_logs: DispatchLogRepository::new(pool.clone()),
            courses: CourseRepository::new(pool),
        }
    }
}
