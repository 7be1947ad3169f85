use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use invoicer_core::{DomainError, DomainResult, InvoiceId, OwnerId};

use crate::compute;

/// Stored invoice status.
///
/// Only these two values are ever persisted; "Overdue" is a display-time
/// classification computed by [`compute::derived_status`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
}

/// One billable unit within an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub description: String,
    /// Non-negative count. Absent defaults to 1; malformed input degrades
    /// to 0 rather than failing (forgiving-input policy).
    #[serde(default = "quantity_default", deserialize_with = "lenient_f64")]
    pub quantity: f64,
    /// Non-negative price per unit. Absent or malformed degrades to 0.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub unit_price: f64,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }
}

fn quantity_default() -> f64 {
    1.0
}

/// Accept numbers or numeric strings; anything unparseable becomes 0.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// A billing record for one client covering zero or more line items.
///
/// `total` is the snapshot computed at save time; readers trust it rather
/// than re-deriving from `items` (see DESIGN.md). Field names follow the
/// persisted document format (camelCase, ISO dates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    /// Display identifier. User-supplied, not unique-enforced.
    pub number: String,
    /// Issue date (calendar day).
    pub date: NaiveDate,
    /// Calendar day the payment is due. Should be >= `date` for sane data,
    /// but that is not enforced.
    pub due_date: NaiveDate,
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    /// Free text; may contain line breaks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_address: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub status: InvoiceStatus,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
    /// Set at creation, immutable.
    pub owner_id: OwnerId,
}

impl Invoice {
    /// Build the stored record for a validated draft.
    ///
    /// New invoices always start `Pending`; an explicit `draft.status` only
    /// matters on update.
    pub fn from_draft(
        id: InvoiceId,
        owner_id: OwnerId,
        created_at: DateTime<Utc>,
        draft: InvoiceDraft,
    ) -> Self {
        let items = draft.retained_items();
        let total = compute::invoice_total(&items);
        Self {
            id,
            number: draft.number,
            date: draft.date,
            due_date: draft.due_date,
            client_name: draft.client_name,
            client_email: draft.client_email,
            client_address: draft.client_address,
            items,
            total,
            status: InvoiceStatus::Pending,
            created_at,
            owner_id,
        }
    }

    /// Full-record replace-on-save.
    ///
    /// Everything except `id`, `owner_id` and `created_at` comes from the
    /// draft; `total` is recomputed; the stored status survives unless the
    /// draft explicitly changes it.
    pub fn apply_draft(&mut self, draft: InvoiceDraft) {
        let items = draft.retained_items();
        self.total = compute::invoice_total(&items);
        self.number = draft.number;
        self.date = draft.date;
        self.due_date = draft.due_date;
        self.client_name = draft.client_name;
        self.client_email = draft.client_email;
        self.client_address = draft.client_address;
        self.items = items;
        if let Some(status) = draft.status {
            self.status = status;
        }
    }
}

/// The user-editable subset of an invoice, as submitted by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub number: String,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    pub client_name: String,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub client_address: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Explicit status change. `None` preserves the stored status on update
    /// and is ignored on create.
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
}

impl InvoiceDraft {
    /// The only required-field validation in the system: `number` and
    /// `client_name` must be present. Runs before any persistence attempt.
    pub fn validate(&self) -> DomainResult<()> {
        if self.number.trim().is_empty() {
            return Err(DomainError::validation("invoice number is required"));
        }
        if self.client_name.trim().is_empty() {
            return Err(DomainError::validation("client name is required"));
        }
        Ok(())
    }

    /// Line items that survive normalization. Rows without a description
    /// are editor placeholders and are dropped before totaling.
    pub fn retained_items(&self) -> Vec<LineItem> {
        self.items
            .iter()
            .filter(|item| !item.description.trim().is_empty())
            .cloned()
            .collect()
    }
}
