pub mod account_service;
pub mod pricing_service;
