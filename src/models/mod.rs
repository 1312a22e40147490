mod checkpoint;
mod course;
mod dispatch_log;
pub mod time_of_day;
mod window;

pub use checkpoint::{Checkpoint, CheckpointRow, NewCheckpointRow};
pub use course::{Branding, Course};
pub use dispatch_log::{DispatchLogEntry, DispatchLogRow, DispatchOutcome, NewDispatchLogEntry};
pub use window::{CreateWindowsRequest, NewWindow, NewWindowRow, Window, WindowKey, WindowRow};
