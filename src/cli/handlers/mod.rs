//! Command handlers, one per subcommand

pub mod migrate;
pub mod run_batch;
pub mod serve;

pub use migrate::MigrateCommandHandler;
pub use run_batch::RunBatchCommandHandler;
pub use serve::ServeCommandHandler;
