pub mod bodies;
pub mod config;
pub mod control;
pub mod driver;
pub mod error;
pub mod facade;
pub mod host;
pub mod permission;
pub mod registry;
pub mod signal;
pub mod state;
pub mod status;
pub mod task;

pub use control::ControlService;
pub use driver::RunDriver;
pub use error::{EngineError, EngineResult};
pub use facade::{SchedulerFacade, ENGINE_TAG};
pub use host::{HostScheduler, JobInfo, JobRequest, JobRunner, JobState, KvMap};
pub use registry::TaskRegistry;
pub use state::RunState;
pub use task::{TaskResult, TaskType};
