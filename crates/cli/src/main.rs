//! The `invoicer` binary: a thin command-line front end over the local
//! strategy.
//!
//! This binary is presentation glue only: it wires a repository to the
//! computation engine and prints the results. All invoice semantics live in
//! the library crates.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use invoicer_core::{InvoiceId, OwnerId};
use invoicer_infra::export;
use invoicer_infra::{InvoiceRepository, JsonFileStore, LocalRepository};
use invoicer_invoicing::{
    Category, Invoice, InvoiceDraft, InvoiceStatus, LineItem, NET_TERM_DAYS, aggregate,
    derived_status, filter_by_category, format_currency, net_due_date, next_invoice_number,
    sort_for_category,
};

#[derive(Debug, Parser)]
#[command(name = "invoicer", about = "Single-user invoicing from the terminal", version)]
struct Cli {
    /// Invoice data file (defaults to the OS data directory).
    #[arg(long, env = "INVOICER_DATA_FILE", global = true)]
    data_file: Option<PathBuf>,

    /// Owner recorded on newly created invoices.
    #[arg(long, env = "INVOICER_OWNER", default_value = "local", global = true)]
    owner: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List invoices, optionally scoped to paid/pending/overdue.
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Headline numbers (count and revenue) for a category.
    Summary {
        #[arg(long)]
        category: Option<String>,
    },
    /// Write the filtered, sorted invoice table as CSV.
    Export {
        #[arg(long)]
        category: Option<String>,
        /// Output file; defaults to a category-derived name in the current
        /// directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Create an invoice.
    Add {
        /// Display number; defaults to the next advisory number.
        #[arg(long)]
        number: Option<String>,
        #[arg(long)]
        client_name: String,
        #[arg(long)]
        client_email: Option<String>,
        #[arg(long)]
        client_address: Option<String>,
        /// Issue date (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<String>,
        /// Due date (YYYY-MM-DD); defaults to net-30 from the issue date.
        #[arg(long)]
        due_date: Option<String>,
        /// Line item as `description:quantity:unit-price`; repeatable.
        #[arg(long = "item")]
        items: Vec<String>,
    },
    /// Mark an invoice paid.
    MarkPaid { id: String },
    /// Mark an invoice pending again.
    MarkPending { id: String },
    /// Delete an invoice.
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    invoicer_observability::init();
    let cli = Cli::parse();

    let path = match &cli.data_file {
        Some(path) => path.clone(),
        None => JsonFileStore::default_path().context("failed to resolve data file location")?,
    };
    tracing::debug!(path = %path.display(), "using invoice data file");

    let repository =
        LocalRepository::new(JsonFileStore::new(path), OwnerId::from(cli.owner.as_str()));
    let reference = Local::now().date_naive();

    match cli.command {
        Command::List { category } => {
            let category = parse_category(category.as_deref())?;
            let invoices = dashboard(&repository, category, reference).await?;
            if invoices.is_empty() {
                println!("No invoices found in this category.");
                return Ok(());
            }
            for invoice in &invoices {
                println!(
                    "{}  {:<12} {:<24} due {}  {:>12}  {}",
                    invoice.id,
                    invoice.number,
                    invoice.client_name,
                    invoice.due_date,
                    format_currency(invoice.total),
                    derived_status(invoice, reference),
                );
            }
        }
        Command::Summary { category } => {
            let category = parse_category(category.as_deref())?;
            let invoices = dashboard(&repository, category, reference).await?;
            let summary = aggregate(&invoices);
            println!(
                "{} invoices, {} revenue",
                summary.count,
                format_currency(summary.revenue)
            );
        }
        Command::Export { category, out } => {
            let category = parse_category(category.as_deref())?;
            let invoices = dashboard(&repository, category, reference).await?;
            let out =
                out.unwrap_or_else(|| PathBuf::from(export::export_file_name(category, reference)));
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            export::write_csv(file, &invoices, reference)?;
            println!("Wrote {} rows to {}", invoices.len(), out.display());
        }
        Command::Add {
            number,
            client_name,
            client_email,
            client_address,
            date,
            due_date,
            items,
        } => {
            let existing = repository.list().await?;
            let issue = match date.as_deref() {
                Some(raw) => parse_date(raw)?,
                None => reference,
            };
            let due = match due_date.as_deref() {
                Some(raw) => parse_date(raw)?,
                None => net_due_date(issue, NET_TERM_DAYS),
            };

            let draft = InvoiceDraft {
                number: number.unwrap_or_else(|| next_invoice_number(existing.len())),
                date: issue,
                due_date: due,
                client_name,
                client_email,
                client_address,
                items: items.iter().map(|spec| parse_item(spec)).collect(),
                status: None,
            };

            let created = repository.create(draft).await?;
            println!(
                "Created {} ({}) for {}",
                created.number,
                created.id,
                format_currency(created.total)
            );
        }
        Command::MarkPaid { id } => {
            let id: InvoiceId = id.parse()?;
            repository.set_status(&id, InvoiceStatus::Paid).await?;
            println!("Marked {id} paid");
        }
        Command::MarkPending { id } => {
            let id: InvoiceId = id.parse()?;
            repository.set_status(&id, InvoiceStatus::Pending).await?;
            println!("Marked {id} pending");
        }
        Command::Delete { id } => {
            let id: InvoiceId = id.parse()?;
            repository.delete(&id).await?;
            println!("Deleted {id}");
        }
    }

    Ok(())
}

/// One dashboard pass: list, filter, sort, all with the same reference date.
async fn dashboard<R: InvoiceRepository>(
    repository: &R,
    category: Option<Category>,
    reference: NaiveDate,
) -> anyhow::Result<Vec<Invoice>> {
    let invoices = repository.list().await?;
    Ok(sort_for_category(
        filter_by_category(&invoices, category, reference),
        category,
    ))
}

fn parse_category(raw: Option<&str>) -> anyhow::Result<Option<Category>> {
    raw.map(|value| value.parse::<Category>())
        .transpose()
        .map_err(Into::into)
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date {raw:?} (expected YYYY-MM-DD)"))
}

/// `description:quantity:unit-price`; trailing pieces may be omitted and
/// malformed numbers degrade to the model defaults, matching the editor's
/// forgiving-input policy.
fn parse_item(spec: &str) -> LineItem {
    let parts: Vec<&str> = spec.rsplitn(3, ':').collect();
    match parts.as_slice() {
        [price, quantity, description] => {
            LineItem::new(*description, lenient(quantity), lenient(price))
        }
        [quantity, description] => LineItem::new(*description, lenient(quantity), 0.0),
        _ => LineItem::new(spec, 1.0, 0.0),
    }
}

fn lenient(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_specs_parse_with_defaults() {
        let item = parse_item("Design work:2:50");
        assert_eq!(item.description, "Design work");
        assert_eq!(item.quantity, 2.0);
        assert_eq!(item.unit_price, 50.0);

        let item = parse_item("Hosting:3");
        assert_eq!(item.quantity, 3.0);
        assert_eq!(item.unit_price, 0.0);

        let item = parse_item("Consulting");
        assert_eq!(item.quantity, 1.0);
        assert_eq!(item.unit_price, 0.0);
    }

    #[test]
    fn item_descriptions_may_contain_colons() {
        let item = parse_item("Phase 1: discovery:4:120");
        assert_eq!(item.description, "Phase 1: discovery");
        assert_eq!(item.quantity, 4.0);
        assert_eq!(item.unit_price, 120.0);
    }

    #[test]
    fn malformed_numbers_degrade_to_zero() {
        let item = parse_item("Design work:lots:cheap");
        assert_eq!(item.quantity, 0.0);
        assert_eq!(item.unit_price, 0.0);
    }
}
