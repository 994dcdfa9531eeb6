pub mod logging;
pub mod trace_context;
