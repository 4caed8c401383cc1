pub mod calculation_store;
pub mod solar_algorithm;
pub mod solar_calculator;
