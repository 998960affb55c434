mod scheduler;

pub use scheduler::{CheckScheduler, CycleStats, SchedulerConfig};
