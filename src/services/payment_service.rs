// src/services/payment_service.rs

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::{
    common::{error::Result, lenient},
    models::payment::{Payment, PaymentOrigin, PaymentRecord, SalePayments, SettlementStatus},
    models::sale::Sale,
};

/// One normalized representation of a sale's payments. `offered` counts the
/// raw rows the representation carried, before incomplete rows were dropped;
/// tier selection looks at that count, not at what survived.
#[derive(Debug, Clone, PartialEq)]
pub struct TierCandidate {
    pub origin: PaymentOrigin,
    pub offered: usize,
    pub payments: Vec<Payment>,
}

impl TierCandidate {
    fn new(origin: PaymentOrigin, offered: usize, payments: Vec<Payment>) -> Self {
        Self { origin, offered, payments: dedupe_by_id(keep_identifiable(payments)) }
    }
}

pub struct PaymentReconciler;

impl PaymentReconciler {
    /// Normalizes every representation of the sale's payments, in priority
    /// order: detailed rows, embedded summary details, standalone rows.
    pub fn candidates(sale: &Sale, sale_id: &str, standalone: &[PaymentRecord]) -> [TierCandidate; 3] {
        let rows: Vec<Payment> = sale
            .payments
            .iter()
            .map(|record| {
                let mut payment = Payment::from_record(record, PaymentOrigin::SaleRows);
                payment.sale_id.get_or_insert_with(|| sale_id.to_string());
                payment
            })
            .collect();

        let (details_offered, details): (usize, Vec<Payment>) = match sale.payment.as_ref() {
            Some(parent) => (
                parent.payment_details.len(),
                parent
                    .payment_details
                    .iter()
                    .map(|detail| Payment::from_detail(detail, parent, sale_id))
                    .collect(),
            ),
            None => (0, Vec::new()),
        };

        let own_standalone: Vec<&PaymentRecord> = standalone
            .iter()
            .filter(|record| record.sale_id.as_deref() == Some(sale_id))
            .collect();
        let standalone_offered = own_standalone.len();
        let standalone_payments: Vec<Payment> = own_standalone
            .into_iter()
            .map(|record| Payment::from_record(record, PaymentOrigin::Standalone))
            .collect();

        [
            TierCandidate::new(PaymentOrigin::SaleRows, sale.payments.len(), rows),
            TierCandidate::new(PaymentOrigin::EmbeddedDetails, details_offered, details),
            TierCandidate::new(PaymentOrigin::Standalone, standalone_offered, standalone_payments),
        ]
    }

    /// First representation that offered anything wins. Tiers are never
    /// merged: they are views of the same underlying rows.
    pub fn select(candidates: [TierCandidate; 3]) -> Option<TierCandidate> {
        candidates.into_iter().find(|candidate| candidate.offered > 0)
    }

    pub fn reconcile_sale(sale: &Sale, standalone: &[PaymentRecord]) -> Option<SalePayments> {
        let Some(sale_id) = sale.id.as_deref() else {
            tracing::debug!(sale_code = ?sale.sale_code, "sale without id skipped");
            return None;
        };

        let chosen = Self::select(Self::candidates(sale, sale_id, standalone));
        let (tier, payments) = match chosen {
            Some(candidate) => {
                tracing::debug!(
                    sale_id,
                    tier = ?candidate.origin,
                    count = candidate.payments.len(),
                    "payment tier selected"
                );
                (Some(candidate.origin), candidate.payments)
            }
            None => (None, Vec::new()),
        };

        let total_paid: Decimal = payments.iter().map(|p| p.amount).sum();
        let remaining_amount = sale.final_amount - total_paid;
        if remaining_amount < Decimal::ZERO {
            tracing::warn!(sale_id, %total_paid, sale_amount = %sale.final_amount, "sale is overpaid");
        }

        Some(SalePayments {
            sale_id: sale_id.to_string(),
            tier,
            settlement: settlement(&payments, total_paid, sale.final_amount),
            payments,
            total_paid,
            sale_amount: sale.final_amount,
            remaining_amount,
        })
    }

    pub fn reconcile(sales: &[Sale], standalone: &[PaymentRecord]) -> Vec<SalePayments> {
        sales
            .iter()
            .filter_map(|sale| Self::reconcile_sale(sale, standalone))
            .collect()
    }

    /// Entry point for raw REST payloads: `/api/sales?details=true` (bare
    /// array or `{ "sales": [...] }`) and `/api/payments/all?source=SALE`.
    pub fn reconcile_json(sales_json: &str, payments_json: &str) -> Result<Vec<SalePayments>> {
        let sales = parse_sales(sales_json)?;
        let standalone: Vec<PaymentRecord> =
            lenient::records_from_value(serde_json::from_str(payments_json)?, "payments");
        Ok(Self::reconcile(&sales, &standalone))
    }

    /// Cross-sale payment list. Standalone rows come first because they are
    /// the complete ones. A sale's embedded summary is only added when its id
    /// was not seen yet and it carries a payment code.
    pub fn ledger(standalone: &[PaymentRecord], sales: &[Sale]) -> Vec<Payment> {
        let mut seen = HashSet::new();
        let mut ledger = Vec::new();

        for record in standalone {
            let payment = Payment::from_record(record, PaymentOrigin::Standalone);
            if !payment.is_identifiable() {
                tracing::debug!("incomplete standalone payment skipped");
                continue;
            }
            if push_unseen(&mut seen, &payment) {
                ledger.push(payment);
            }
        }

        for sale in sales {
            let (Some(sale_id), Some(summary)) = (sale.id.as_deref(), sale.payment.as_ref()) else {
                continue;
            };
            if summary.id.is_none() || summary.payment_code.is_none() {
                continue;
            }
            let payment = Payment::from_summary(summary, sale_id);
            if push_unseen(&mut seen, &payment) {
                ledger.push(payment);
            }
        }

        ledger
    }
}

/// Accepts a bare array or a `{ "sales": [...] }` envelope. Malformed sales
/// are skipped one by one.
fn parse_sales(json: &str) -> Result<Vec<Sale>> {
    let raw = match serde_json::from_str::<Value>(json)? {
        Value::Object(mut envelope) => envelope.remove("sales").unwrap_or(Value::Null),
        other => other,
    };
    Ok(lenient::records_from_value(raw, "sales"))
}

fn settlement(payments: &[Payment], total_paid: Decimal, sale_amount: Decimal) -> SettlementStatus {
    if payments.is_empty() {
        SettlementStatus::Pending
    } else if total_paid >= sale_amount {
        SettlementStatus::Paid
    } else if total_paid > Decimal::ZERO {
        SettlementStatus::Partial
    } else {
        SettlementStatus::Pending
    }
}

fn keep_identifiable(payments: Vec<Payment>) -> Vec<Payment> {
    payments
        .into_iter()
        .filter(|payment| {
            let keep = payment.is_identifiable();
            if !keep {
                tracing::debug!(origin = ?payment.origin, "payment without id or code skipped");
            }
            keep
        })
        .collect()
}

/// Rows without an id cannot collide and are always kept.
fn push_unseen(seen: &mut HashSet<String>, payment: &Payment) -> bool {
    match payment.id.as_ref() {
        Some(id) => seen.insert(id.clone()),
        None => true,
    }
}

/// First occurrence of an id wins.
pub fn dedupe_by_id(payments: Vec<Payment>) -> Vec<Payment> {
    let mut seen = HashSet::new();
    payments
        .into_iter()
        .filter(|payment| push_unseen(&mut seen, payment))
        .collect()
}
