//! Service layer: the merge engine on the write side and the checkpointed
//! dispatch pipeline on the read side.

pub mod auditor;
pub mod availability_matcher;
pub mod dispatch_scheduler;
pub mod notifications;
pub mod window_merge;

pub use auditor::NotificationAuditor;
pub use availability_matcher::{AvailabilityMatcher, MatchedWindow, MatcherSettings};
pub use dispatch_scheduler::{BatchReport, DispatchScheduler, course_today};
pub use window_merge::{MergePlan, WindowService, plan_merge};
