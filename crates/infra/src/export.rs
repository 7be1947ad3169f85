//! Tabular export of a filtered, sorted invoice sequence.

use std::io::Write;

use chrono::NaiveDate;
use thiserror::Error;

use invoicer_invoicing::{Category, Invoice, derived_status};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export row: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush export: {0}")]
    Io(#[from] std::io::Error),
}

/// Write the export table: one row per invoice, derived status computed at
/// export time against `reference`.
///
/// The caller decides which invoices appear and in what order; the
/// engine's filter/sort output is the intended input.
pub fn write_csv<W: Write>(
    writer: W,
    invoices: &[Invoice],
    reference: NaiveDate,
) -> Result<(), ExportError> {
    let mut table = csv::Writer::from_writer(writer);
    table.write_record([
        "Invoice #",
        "Client Name",
        "Client Email",
        "Invoice Date",
        "Due Date",
        "Status",
        "Total Amount",
        "Items Count",
    ])?;

    for invoice in invoices {
        let date = invoice.date.to_string();
        let due_date = invoice.due_date.to_string();
        let status = derived_status(invoice, reference).to_string();
        let total = format!("{:.2}", invoice.total);
        let item_count = invoice.items.len().to_string();

        table.write_record([
            invoice.number.as_str(),
            invoice.client_name.as_str(),
            invoice.client_email.as_deref().unwrap_or(""),
            date.as_str(),
            due_date.as_str(),
            status.as_str(),
            total.as_str(),
            item_count.as_str(),
        ])?;
    }

    table.flush()?;
    Ok(())
}

/// Category-scoped export name with the export day appended:
/// `All_Invoices_2024-06-01.csv`, `Overdue_Invoices_2024-06-01.csv`, ...
pub fn export_file_name(category: Option<Category>, date: NaiveDate) -> String {
    let stem = match category {
        None => "All_Invoices",
        Some(Category::Paid) => "Paid_Invoices",
        Some(Category::Pending) => "Pending_Invoices",
        Some(Category::Overdue) => "Overdue_Invoices",
    };
    format!("{stem}_{date}.csv")
}
