pub mod aemo;
pub mod prod_db;
