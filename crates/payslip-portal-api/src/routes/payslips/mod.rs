//! Payslip routes - Finalized payslips of the current employee
//!
//! Features:
//! - Working year selector, first year preselected
//! - Payslip list refreshed per year, stale answers dropped by the view
//! - Printable document per payslip, streamed inline
//!
//! Structure:
//! - api.rs: JSON API and HTMX endpoints
//! - page.rs: Full page rendering

pub mod api;
pub mod page;

pub use api::{api_reload, api_set_year, api_state, htmx_payslips_list, print_payslip, YearForm};
pub use page::{page_payslips, render_error_page, render_payslip_panel, render_year_select};
