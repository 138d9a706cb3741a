pub mod config;
pub mod db;
pub mod demand;
pub mod interval;
pub mod plot;
pub mod report;
pub mod timeseries;
