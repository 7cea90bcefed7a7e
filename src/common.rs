pub mod csv;
pub mod error;
pub mod extract;
pub mod hooks;
pub mod pagination;
