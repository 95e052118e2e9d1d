//! Invoices and spreadsheet export.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::payment::{BookingAmounts, PaymentBreakdown};
use super::pricing::SlotLine;
use super::types::{BookingStatus, ExtraCharge, PaymentKind, PaymentMethod};
use super::BookingError;

/// `INV-YYYYMMDD-XXXXXXXX` from the booking's creation date and id.
pub fn invoice_number(booking_id: Uuid, created_at: DateTime<Utc>) -> String {
    let simple = booking_id.simple().to_string();
    format!(
        "INV-{}-{}",
        created_at.format("%Y%m%d"),
        simple[..8].to_uppercase()
    )
}

/// `1234567` → `"1,234,567"`
pub fn group_thousands(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if amount < 0 {
        out.insert(0, '-');
    }
    out
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PaymentEntry {
    pub kind: PaymentKind,
    pub amount: i64,
    pub method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
}

pub struct InvoiceInput<'a> {
    pub booking_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub booking_date: NaiveDate,
    pub customer_name: &'a str,
    pub customer_phone: &'a str,
    pub customer_email: Option<&'a str>,
    pub ground_name: &'a str,
    pub amounts: BookingAmounts,
    pub slots: Vec<SlotLine>,
    pub extras: Vec<ExtraCharge>,
    pub payments: Vec<PaymentEntry>,
    pub currency: &'a str,
}

#[derive(Debug, Serialize, Clone)]
pub struct Invoice {
    pub number: String,
    pub issued_at: DateTime<Utc>,
    pub booking_id: Uuid,
    pub booking_date: NaiveDate,
    pub status: BookingStatus,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub ground_name: String,
    pub currency: String,
    pub slots: Vec<SlotLine>,
    pub extras: Vec<ExtraCharge>,
    pub payments: Vec<PaymentEntry>,
    pub slot_total: i64,
    pub extras_total: i64,
    pub discount: i64,
    pub net_payable: i64,
    pub paid: i64,
    pub balance_due: i64,
    pub fully_paid: bool,
}

impl Invoice {
    pub fn build(input: InvoiceInput<'_>, issued_at: DateTime<Utc>) -> Result<Self, BookingError> {
        if input.amounts.status == BookingStatus::Cancelled {
            return Err(BookingError::NoInvoiceForCancelled);
        }
        let breakdown = PaymentBreakdown::compute(input.amounts);

        Ok(Invoice {
            number: invoice_number(input.booking_id, input.created_at),
            issued_at,
            booking_id: input.booking_id,
            booking_date: input.booking_date,
            status: input.amounts.status,
            customer_name: input.customer_name.to_string(),
            customer_phone: input.customer_phone.to_string(),
            customer_email: input.customer_email.map(str::to_string),
            ground_name: input.ground_name.to_string(),
            currency: input.currency.to_string(),
            slots: input.slots,
            extras: input.extras,
            payments: input.payments,
            slot_total: input.amounts.total,
            extras_total: input.amounts.extras_total,
            discount: input.amounts.discount,
            net_payable: breakdown.net_payable,
            paid: breakdown.paid,
            balance_due: breakdown.balance_due,
            fully_paid: input.amounts.status == BookingStatus::Completed
                && breakdown.balance_due == 0,
        })
    }

    /// Fixed-width plain-text rendition, 48 columns.
    pub fn render_text(&self) -> String {
        const WIDTH: usize = 48;
        let rule = "-".repeat(WIDTH);
        let money = |amount: i64| format!("{} {}", self.currency, group_thousands(amount));
        let row = |left: &str, right: String| {
            let pad = WIDTH.saturating_sub(left.chars().count() + right.chars().count());
            format!("{left}{}{right}\n", " ".repeat(pad.max(1)))
        };

        let mut out = String::new();
        out.push_str(&format!("INVOICE {}\n", self.number));
        out.push_str(&format!("Issued: {}\n", self.issued_at.format("%Y-%m-%d %H:%M UTC")));
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!("Ground:   {}\n", self.ground_name));
        out.push_str(&format!("Date:     {}\n", self.booking_date.format("%Y-%m-%d")));
        out.push_str(&format!("Customer: {}\n", self.customer_name));
        out.push_str(&format!("Phone:    {}\n", self.customer_phone));
        if let Some(email) = &self.customer_email {
            out.push_str(&format!("Email:    {email}\n"));
        }
        out.push_str(&rule);
        out.push('\n');

        for slot in &self.slots {
            out.push_str(&row(
                &format!("{} ({})", slot.label, slot.kind.as_str()),
                money(slot.rate),
            ));
        }
        for extra in &self.extras {
            out.push_str(&row(&format!("+ {}", extra.label), money(extra.amount)));
        }
        if self.discount != 0 {
            out.push_str(&row("Discount", money(-self.discount)));
        }
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&row("Total payable", money(self.net_payable)));
        for p in &self.payments {
            out.push_str(&row(
                &format!("Paid {} ({})", p.kind.as_str(), p.method.as_str()),
                money(p.amount),
            ));
        }
        out.push_str(&row("Balance due", money(self.balance_due)));
        if self.fully_paid {
            out.push_str("\n*** PAID ***\n");
        }
        out
    }
}

/// One spreadsheet row of the admin booking export.
#[derive(Debug, Serialize, Clone)]
pub struct ExportRow {
    #[serde(rename = "Booking ID")]
    pub booking_id: Uuid,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Slots")]
    pub slots: String,
    #[serde(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Status")]
    pub status: BookingStatus,
    #[serde(rename = "Total")]
    pub total: i64,
    #[serde(rename = "Advance")]
    pub advance: i64,
    #[serde(rename = "Remaining")]
    pub remaining: i64,
    #[serde(rename = "Extras")]
    pub extras: i64,
    #[serde(rename = "Discount")]
    pub discount: i64,
    #[serde(rename = "Balance")]
    pub balance: i64,
}

pub fn bookings_csv(rows: &[ExportRow]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row).context("writing csv row")?;
    }
    if rows.is_empty() {
        wtr.write_record([
            "Booking ID", "Date", "Slots", "Customer", "Phone", "Status", "Total", "Advance",
            "Remaining", "Extras", "Discount", "Balance",
        ])
        .context("writing csv header")?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing csv: {}", e.error()))?;
    String::from_utf8(bytes).context("csv is not utf-8")
}
