pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod sales_repo;
pub use sales_repo::SalesRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
