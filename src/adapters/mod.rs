//! Concrete adapter implementations for ports.

pub mod csv_store;
pub mod file_config_adapter;
pub mod random_search_adapter;
pub mod text_report_adapter;
