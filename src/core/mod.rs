pub mod aggregate;
pub mod calculator;
pub mod finance;
pub mod jobs;
pub mod kpi_store;
pub mod log;
pub mod rollup;
pub mod touch_queue;
pub mod worker;
