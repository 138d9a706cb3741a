pub mod comparison;
pub mod projection;
pub mod reshape;
