//! Invoicing domain module.
//!
//! This crate contains the invoice data model and the computation engine:
//! pure, deterministic functions over plain data (no IO, no storage, no
//! rendering surface).

pub mod compute;
pub mod invoice;

pub use compute::{
    Category, DashboardSummary, DerivedStatus, NET_TERM_DAYS, aggregate, derived_status,
    filter_by_category, format_currency, invoice_total, line_amount, net_due_date,
    next_invoice_number, sort_for_category,
};
pub use invoice::{Invoice, InvoiceDraft, InvoiceStatus, LineItem};
