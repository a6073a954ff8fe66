//! Route modules for the API server
//!
//! - payslips: Year selector, payslip list, document download
//!
//! Each module follows a consistent structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API endpoints and HTMX partials
//! - page.rs: HTMX page rendering

pub mod payslips;
