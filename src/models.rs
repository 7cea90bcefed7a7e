pub mod customers;
pub mod sales;
pub mod settings;
