mod messages;
mod worker;

pub use messages::{JobKind, JobRequest, JobResponse, JobResult, JobType};
pub use worker::{execute, Dispatcher};
