pub mod config;
pub mod dashboard;
pub mod event;
pub mod funnel;
pub mod metrics;
pub mod session;
pub mod store;
pub mod tracker;
