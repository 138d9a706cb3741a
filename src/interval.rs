pub mod month;
pub mod slot;
