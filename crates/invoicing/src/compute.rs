//! Pure invoice computations.
//!
//! All functions here are synchronous, deterministic, and total over their
//! documented input domain: malformed data degrades (see the lenient model
//! deserializers) rather than erroring. Date classification works at
//! calendar-day granularity; callers obtain one reference date per pass and
//! reuse it so a midnight rollover cannot split a single rendering pass.

use core::str::FromStr;

use chrono::NaiveDate;

use invoicer_core::DomainError;

use crate::invoice::{Invoice, InvoiceStatus, LineItem};

/// Default payment terms applied when pre-populating a due date.
pub const NET_TERM_DAYS: i64 = 30;

/// Display-time invoice classification. Never persisted: the stored status
/// is restricted to `Pending`/`Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedStatus {
    Paid,
    Pending,
    Overdue,
}

impl core::fmt::Display for DerivedStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            DerivedStatus::Paid => "Paid",
            DerivedStatus::Pending => "Pending",
            DerivedStatus::Overdue => "Overdue",
        })
    }
}

/// Dashboard filter category. `Option<Category>` is the filter argument;
/// `None` passes every record unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Paid,
    Pending,
    Overdue,
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "paid" => Ok(Category::Paid),
            "pending" => Ok(Category::Pending),
            "overdue" => Ok(Category::Overdue),
            _ => Err(DomainError::validation(
                "category must be one of: paid, pending, overdue",
            )),
        }
    }
}

/// Amount for one line: `quantity * unit_price`.
pub fn line_amount(item: &LineItem) -> f64 {
    item.quantity * item.unit_price
}

/// Sum of line amounts; 0 for an empty sequence.
pub fn invoice_total(items: &[LineItem]) -> f64 {
    items.iter().map(line_amount).sum()
}

/// Classify an invoice relative to `reference` (a calendar day).
///
/// A stored `Paid` wins regardless of dates. Otherwise the invoice is
/// `Overdue` exactly when its due date is strictly before the reference
/// day; an invoice due today is still `Pending`.
pub fn derived_status(invoice: &Invoice, reference: NaiveDate) -> DerivedStatus {
    if invoice.status == InvoiceStatus::Paid {
        return DerivedStatus::Paid;
    }
    if invoice.due_date < reference {
        DerivedStatus::Overdue
    } else {
        DerivedStatus::Pending
    }
}

fn matches_category(invoice: &Invoice, category: Option<Category>, reference: NaiveDate) -> bool {
    match category {
        None => true,
        Some(Category::Paid) => invoice.status == InvoiceStatus::Paid,
        Some(Category::Pending) => derived_status(invoice, reference) == DerivedStatus::Pending,
        Some(Category::Overdue) => derived_status(invoice, reference) == DerivedStatus::Overdue,
    }
}

/// Keep the invoices belonging to `category` as of `reference`.
///
/// The three named categories partition the input: every record lands in
/// exactly one of paid/pending/overdue for a given reference date.
pub fn filter_by_category(
    invoices: &[Invoice],
    category: Option<Category>,
    reference: NaiveDate,
) -> Vec<Invoice> {
    invoices
        .iter()
        .filter(|invoice| matches_category(invoice, category, reference))
        .cloned()
        .collect()
}

/// Order a sequence for display (stable sort, new sequence).
///
/// Overdue views list the oldest due date first (most urgent first); every
/// other view lists the newest issue date first. Equal keys preserve the
/// input's relative order.
pub fn sort_for_category(mut invoices: Vec<Invoice>, category: Option<Category>) -> Vec<Invoice> {
    match category {
        Some(Category::Overdue) => invoices.sort_by(|a, b| a.due_date.cmp(&b.due_date)),
        _ => invoices.sort_by(|a, b| b.date.cmp(&a.date)),
    }
    invoices
}

/// Headline numbers for a (possibly filtered) invoice set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardSummary {
    pub count: usize,
    /// Sum of stored totals (the save-time snapshots), not a recomputation.
    pub revenue: f64,
}

pub fn aggregate(invoices: &[Invoice]) -> DashboardSummary {
    DashboardSummary {
        count: invoices.len(),
        revenue: invoices.iter().map(|invoice| invoice.total).sum(),
    }
}

/// Advisory display number for the next invoice: `INV-` + zero-padded
/// count + 1, width 3. Not unique-enforced; the user may overwrite it.
pub fn next_invoice_number(existing_count: usize) -> String {
    format!("INV-{:03}", existing_count + 1)
}

/// Due date `term_days` calendar days after the issue date.
pub fn net_due_date(issue: NaiveDate, term_days: i64) -> NaiveDate {
    issue + chrono::Duration::days(term_days)
}

/// en-US currency rendering: `$1,234.50`.
pub fn format_currency(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{sign}${grouped}.{:02}", cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use invoicer_core::{InvoiceId, OwnerId};
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_invoice(number: &str, status: InvoiceStatus, issued: NaiveDate, due: NaiveDate) -> Invoice {
        Invoice {
            id: InvoiceId::from(number),
            number: number.to_string(),
            date: issued,
            due_date: due,
            client_name: "Acme Corp".to_string(),
            client_email: None,
            client_address: None,
            items: Vec::new(),
            total: 100.0,
            status,
            created_at: Utc::now(),
            owner_id: OwnerId::from("owner-1"),
        }
    }

    #[test]
    fn invoice_total_sums_line_amounts() {
        let items = vec![
            LineItem::new("Design work", 2.0, 50.0),
            LineItem::new("Hosting", 1.0, 25.0),
        ];
        assert_eq!(invoice_total(&items), 125.0);
        assert_eq!(format_currency(invoice_total(&items)), "$125.00");
        assert_eq!(invoice_total(&[]), 0.0);
    }

    #[test]
    fn paid_wins_over_any_due_date() {
        let invoice = test_invoice(
            "INV-001",
            InvoiceStatus::Paid,
            date(2020, 1, 1),
            date(2020, 1, 2),
        );
        assert_eq!(derived_status(&invoice, date(2030, 1, 1)), DerivedStatus::Paid);
        assert_eq!(derived_status(&invoice, date(2010, 1, 1)), DerivedStatus::Paid);
    }

    #[test]
    fn pending_past_due_is_overdue() {
        let invoice = test_invoice(
            "INV-001",
            InvoiceStatus::Pending,
            date(2023, 12, 1),
            date(2024, 1, 1),
        );
        assert_eq!(
            derived_status(&invoice, date(2024, 6, 1)),
            DerivedStatus::Overdue
        );
    }

    #[test]
    fn due_today_is_never_overdue() {
        let invoice = test_invoice(
            "INV-001",
            InvoiceStatus::Pending,
            date(2024, 1, 1),
            date(2024, 6, 1),
        );
        assert_eq!(
            derived_status(&invoice, date(2024, 6, 1)),
            DerivedStatus::Pending
        );
        assert_eq!(
            derived_status(&invoice, date(2024, 5, 31)),
            DerivedStatus::Pending
        );
    }

    #[test]
    fn no_category_passes_everything_unchanged() {
        let invoices = vec![
            test_invoice("a", InvoiceStatus::Paid, date(2024, 1, 1), date(2024, 1, 31)),
            test_invoice("b", InvoiceStatus::Pending, date(2024, 2, 1), date(2024, 2, 28)),
        ];
        let all = filter_by_category(&invoices, None, date(2024, 6, 1));
        assert_eq!(all, invoices);
    }

    #[test]
    fn category_filters_use_derived_status() {
        let reference = date(2024, 6, 1);
        let invoices = vec![
            test_invoice("paid", InvoiceStatus::Paid, date(2024, 1, 1), date(2024, 1, 31)),
            test_invoice("late", InvoiceStatus::Pending, date(2024, 1, 1), date(2024, 1, 31)),
            test_invoice("open", InvoiceStatus::Pending, date(2024, 5, 20), date(2024, 6, 19)),
        ];

        let pick = |category| -> Vec<String> {
            filter_by_category(&invoices, Some(category), reference)
                .into_iter()
                .map(|invoice| invoice.number)
                .collect()
        };

        assert_eq!(pick(Category::Paid), vec!["paid"]);
        assert_eq!(pick(Category::Overdue), vec!["late"]);
        assert_eq!(pick(Category::Pending), vec!["open"]);
    }

    #[test]
    fn overdue_sorts_oldest_due_first() {
        let invoices = vec![
            test_invoice("b", InvoiceStatus::Pending, date(2024, 1, 5), date(2024, 2, 5)),
            test_invoice("a", InvoiceStatus::Pending, date(2024, 1, 1), date(2024, 1, 15)),
            test_invoice("c", InvoiceStatus::Pending, date(2024, 1, 9), date(2024, 3, 1)),
        ];
        let sorted = sort_for_category(invoices, Some(Category::Overdue));
        let numbers: Vec<_> = sorted.iter().map(|i| i.number.as_str()).collect();
        assert_eq!(numbers, ["a", "b", "c"]);
        assert!(sorted.windows(2).all(|w| w[0].due_date <= w[1].due_date));
    }

    #[test]
    fn default_sort_is_newest_issued_first() {
        let invoices = vec![
            test_invoice("old", InvoiceStatus::Pending, date(2024, 1, 1), date(2024, 1, 31)),
            test_invoice("new", InvoiceStatus::Pending, date(2024, 3, 1), date(2024, 3, 31)),
            test_invoice("mid", InvoiceStatus::Pending, date(2024, 2, 1), date(2024, 2, 29)),
        ];
        let sorted = sort_for_category(invoices, None);
        let numbers: Vec<_> = sorted.iter().map(|i| i.number.as_str()).collect();
        assert_eq!(numbers, ["new", "mid", "old"]);
    }

    #[test]
    fn equal_sort_keys_preserve_input_order() {
        let same_day = date(2024, 1, 1);
        let invoices = vec![
            test_invoice("first", InvoiceStatus::Pending, same_day, date(2024, 1, 31)),
            test_invoice("second", InvoiceStatus::Pending, same_day, date(2024, 1, 31)),
        ];
        let sorted = sort_for_category(invoices, None);
        let numbers: Vec<_> = sorted.iter().map(|i| i.number.as_str()).collect();
        assert_eq!(numbers, ["first", "second"]);
    }

    #[test]
    fn aggregate_trusts_stored_totals() {
        let mut invoice = test_invoice(
            "INV-001",
            InvoiceStatus::Pending,
            date(2024, 1, 1),
            date(2024, 1, 31),
        );
        // Stale snapshot on purpose: the dashboard must not recompute.
        invoice.items = vec![LineItem::new("Design work", 10.0, 10.0)];
        invoice.total = 42.0;

        let summary = aggregate(&[invoice]);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.revenue, 42.0);
        assert_eq!(aggregate(&[]).count, 0);
        assert_eq!(aggregate(&[]).revenue, 0.0);
    }

    #[test]
    fn next_invoice_number_zero_pads_to_three() {
        assert_eq!(next_invoice_number(0), "INV-001");
        assert_eq!(next_invoice_number(9), "INV-010");
        assert_eq!(next_invoice_number(99), "INV-100");
        assert_eq!(next_invoice_number(1000), "INV-1001");
    }

    #[test]
    fn net_due_date_adds_calendar_days() {
        assert_eq!(
            net_due_date(date(2024, 1, 1), NET_TERM_DAYS),
            date(2024, 1, 31)
        );
        // Crosses a month boundary and a leap day.
        assert_eq!(net_due_date(date(2024, 2, 15), 30), date(2024, 3, 16));
    }

    #[test]
    fn currency_formatting_groups_thousands() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(125.0), "$125.00");
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_currency(-42.25), "-$42.25");
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("paid".parse::<Category>().unwrap(), Category::Paid);
        assert_eq!("Overdue".parse::<Category>().unwrap(), Category::Overdue);
        assert!("archived".parse::<Category>().is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any invoice set and reference date, the three
        /// categories are pairwise disjoint and together cover the set.
        #[test]
        fn categories_partition_the_invoice_set(
            specs in prop::collection::vec((any::<bool>(), -400i64..400i64), 0..40)
        ) {
            let reference = date(2024, 6, 1);
            let invoices: Vec<Invoice> = specs
                .iter()
                .enumerate()
                .map(|(i, (paid, offset))| {
                    let status = if *paid { InvoiceStatus::Paid } else { InvoiceStatus::Pending };
                    let due = reference + chrono::Duration::days(*offset);
                    test_invoice(&format!("INV-{i:03}"), status, due - chrono::Duration::days(30), due)
                })
                .collect();

            let paid = filter_by_category(&invoices, Some(Category::Paid), reference);
            let pending = filter_by_category(&invoices, Some(Category::Pending), reference);
            let overdue = filter_by_category(&invoices, Some(Category::Overdue), reference);

            prop_assert_eq!(paid.len() + pending.len() + overdue.len(), invoices.len());

            let mut numbers: Vec<String> = paid
                .iter()
                .chain(pending.iter())
                .chain(overdue.iter())
                .map(|invoice| invoice.number.clone())
                .collect();
            numbers.sort();
            numbers.dedup();
            prop_assert_eq!(numbers.len(), invoices.len());
        }
    }
}
