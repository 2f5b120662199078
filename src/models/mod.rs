pub mod event;
pub mod event_type;
pub mod job;
pub mod kpi;
pub mod owner;
pub mod rollup;
pub mod touch;
