pub mod schedule_engine;
pub mod schedule_queries;
pub mod schedule_utils;
pub mod scoring;
pub mod slot_finder;
pub mod task_chunker;
