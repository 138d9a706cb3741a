pub mod historical_demand_archive;
pub mod lib_aemo;
pub mod price_and_demand_archive;
