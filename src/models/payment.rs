// src/models/payment.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::lenient::{self, FromCode};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Cheque,
    Virement,
    Cnam,
    Traite,
    Mandat,
    Mixed,
    #[default]
    Unknown,
}

impl PaymentMethod {
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Espèces",
            PaymentMethod::Cheque => "Chèque",
            PaymentMethod::Virement => "Virement",
            PaymentMethod::Cnam => "CNAM",
            PaymentMethod::Traite => "Traite",
            PaymentMethod::Mandat => "Mandat",
            PaymentMethod::Mixed => "Mixte",
            PaymentMethod::Unknown => "Autre",
        }
    }
}

impl FromCode for PaymentMethod {
    fn from_code(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "CASH" | "ESPECES" => PaymentMethod::Cash,
            "CHEQUE" => PaymentMethod::Cheque,
            "VIREMENT" | "BANK_TRANSFER" => PaymentMethod::Virement,
            "CNAM" => PaymentMethod::Cnam,
            "TRAITE" => PaymentMethod::Traite,
            "MANDAT" | "MONDAT" => PaymentMethod::Mandat,
            "MIXED" => PaymentMethod::Mixed,
            _ => PaymentMethod::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Partial,
    Cancelled,
    Guarantee,
    #[default]
    Unknown,
}

impl PaymentStatus {
    pub fn label(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Payé",
            PaymentStatus::Pending => "En attente",
            PaymentStatus::Partial => "Partiel",
            PaymentStatus::Cancelled => "Annulé",
            PaymentStatus::Guarantee => "Garantie",
            PaymentStatus::Unknown => "Inconnu",
        }
    }
}

impl FromCode for PaymentStatus {
    fn from_code(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "PAID" => PaymentStatus::Paid,
            "PENDING" => PaymentStatus::Pending,
            "PARTIAL" => PaymentStatus::Partial,
            "CANCELLED" => PaymentStatus::Cancelled,
            "GUARANTEE" => PaymentStatus::Guarantee,
            _ => PaymentStatus::Unknown,
        }
    }
}

/// Which upstream representation a canonical payment was normalized from.
/// The order of the variants is the reconciliation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOrigin {
    /// `sale.payments[]`, the detailed rows returned with `details=true`.
    SaleRows,
    /// `sale.payment.paymentDetails[]`, the aggregated summary.
    EmbeddedDetails,
    /// `/payments/all?source=SALE`, fetched on its own.
    Standalone,
    /// `sale.payment` itself, only used by the cross-sale ledger.
    EmbeddedSummary,
}

/// Settlement derived from the reconciled total against the sale amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    Paid,
    Partial,
    Pending,
}

// --- Raw upstream shapes ---

/// A payment row as returned by `sale.payments[]` or the standalone endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub payment_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "lenient::code")]
    pub method: PaymentMethod,
    #[serde(default, deserialize_with = "lenient::code")]
    pub status: PaymentStatus,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub payment_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub reference_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub cheque_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub bank_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub cnam_card_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub cnam_bon_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub sale_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub notes: Option<String>,
}

/// One entry of `sale.payment.paymentDetails[]`. Method and code are often
/// absent here and inherited from the parent summary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailRecord {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub payment_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "lenient::opt_code")]
    pub method: Option<PaymentMethod>,
    #[serde(default, deserialize_with = "lenient::opt_code")]
    pub status: Option<PaymentStatus>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub payment_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_string", alias = "reference")]
    pub reference_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub cheque_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub bank_name: Option<String>,
}

/// `sale.payment`: the aggregated payment summary embedded in a sale.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedPayment {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub payment_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "lenient::code")]
    pub method: PaymentMethod,
    #[serde(default, deserialize_with = "lenient::code")]
    pub status: PaymentStatus,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub payment_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::records")]
    pub payment_details: Vec<PaymentDetailRecord>,
}

// --- Canonical shape ---

/// The single payment shape every representation is normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Option<String>,
    #[schema(example = "PAY-2024-0001")]
    pub payment_code: Option<String>,
    #[schema(example = "1475.00")]
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub reference_number: Option<String>,
    pub cheque_number: Option<String>,
    pub bank_name: Option<String>,
    pub cnam_dossier_id: Option<String>,
    pub sale_id: Option<String>,
    pub origin: PaymentOrigin,
}

impl Payment {
    /// Rows without an id and without a code were never persisted.
    pub fn is_identifiable(&self) -> bool {
        self.id.is_some() || self.payment_code.is_some()
    }

    /// Due dates only carry meaning for bills of exchange.
    pub fn effective_due_date(&self) -> Option<NaiveDate> {
        match self.method {
            PaymentMethod::Traite => self.due_date,
            _ => None,
        }
    }

    pub fn from_record(record: &PaymentRecord, origin: PaymentOrigin) -> Self {
        Self {
            id: record.id.clone(),
            payment_code: record.payment_code.clone(),
            amount: record.amount,
            method: record.method,
            status: record.status,
            payment_date: record.payment_date,
            due_date: record.due_date,
            reference_number: record.reference_number.clone(),
            cheque_number: record.cheque_number.clone(),
            bank_name: record.bank_name.clone(),
            cnam_dossier_id: record.cnam_bon_id.clone(),
            sale_id: record.sale_id.clone(),
            origin,
        }
    }

    pub fn from_detail(detail: &PaymentDetailRecord, parent: &EmbeddedPayment, sale_id: &str) -> Self {
        Self {
            id: detail.id.clone(),
            payment_code: detail
                .payment_code
                .clone()
                .or_else(|| parent.payment_code.clone()),
            amount: detail.amount,
            method: detail.method.unwrap_or(parent.method),
            status: detail.status.unwrap_or(parent.status),
            payment_date: detail.payment_date.or(parent.payment_date),
            due_date: None,
            reference_number: detail.reference_number.clone(),
            cheque_number: detail.cheque_number.clone(),
            bank_name: detail.bank_name.clone(),
            cnam_dossier_id: None,
            sale_id: Some(sale_id.to_string()),
            origin: PaymentOrigin::EmbeddedDetails,
        }
    }

    pub fn from_summary(summary: &EmbeddedPayment, sale_id: &str) -> Self {
        Self {
            id: summary.id.clone(),
            payment_code: summary.payment_code.clone(),
            amount: summary.amount,
            method: summary.method,
            status: summary.status,
            payment_date: summary.payment_date,
            due_date: None,
            reference_number: None,
            cheque_number: None,
            bank_name: None,
            cnam_dossier_id: None,
            sale_id: Some(sale_id.to_string()),
            origin: PaymentOrigin::EmbeddedSummary,
        }
    }
}

/// Reconciled payment view of one sale.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalePayments {
    pub sale_id: String,
    /// `None` when no representation offered any row.
    pub tier: Option<PaymentOrigin>,
    pub payments: Vec<Payment>,
    #[schema(example = "1675.00")]
    pub total_paid: Decimal,
    #[schema(example = "1675.00")]
    pub sale_amount: Decimal,
    /// Negative on overpayment, never clamped.
    #[schema(example = "0.00")]
    pub remaining_amount: Decimal,
    pub settlement: SettlementStatus,
}

impl SalePayments {
    pub fn is_overpaid(&self) -> bool {
        self.remaining_amount < Decimal::ZERO
    }

    pub fn uses_method(&self, method: PaymentMethod) -> bool {
        self.payments.iter().any(|p| p.method == method)
    }
}
