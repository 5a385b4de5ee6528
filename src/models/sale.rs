// src/models/sale.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::lenient::{self, FromCode};
use crate::models::dossier::CnamBonRecord;
use crate::models::payment::{EmbeddedPayment, PaymentRecord};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Pending,
    Completed,
    Cancelled,
    #[default]
    Unknown,
}

impl FromCode for SaleStatus {
    fn from_code(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "PENDING" => SaleStatus::Pending,
            "COMPLETED" => SaleStatus::Completed,
            "CANCELLED" => SaleStatus::Cancelled,
            _ => SaleStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientKind {
    Patient,
    Company,
}

/// A sale has exactly one client, tagged by whichever foreign key is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRef<'a> {
    Patient(&'a str),
    Company(&'a str),
}

// --- Embedded relations ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub patient_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub telephone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub company_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub telephone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub unit_price: Decimal,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub discount: Decimal,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub item_total: Decimal,
}

// --- Sale ---

/// A sale as returned by `/api/sales?details=true`, with every nested
/// representation the backend may attach.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub sale_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub sale_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub total_amount: Decimal,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub discount: Decimal,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub final_amount: Decimal,
    #[serde(default, deserialize_with = "lenient::code")]
    pub status: SaleStatus,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub notes: Option<String>,

    // Client (exactly one of the two ids is expected)
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub company_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_record")]
    pub patient: Option<PatientSummary>,
    #[serde(default, deserialize_with = "lenient::opt_record")]
    pub company: Option<CompanySummary>,

    #[serde(default, deserialize_with = "lenient::records")]
    pub items: Vec<SaleItem>,

    // Payments, in up to two embedded representations
    #[serde(default, deserialize_with = "lenient::records")]
    pub payments: Vec<PaymentRecord>,
    #[serde(default, deserialize_with = "lenient::opt_record")]
    pub payment: Option<EmbeddedPayment>,

    // CNAM dossiers, in both the dossier and the bon shape
    #[serde(default, deserialize_with = "lenient::records")]
    pub cnam_dossiers: Vec<CnamBonRecord>,
    #[serde(default, deserialize_with = "lenient::records")]
    pub cnam_bons: Vec<CnamBonRecord>,
}

/// Display-ready client information for a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub kind: ClientKind,
    pub id: String,
    #[schema(example = "Amine Ben Salah")]
    pub name: String,
    pub code: Option<String>,
    pub phone: Option<String>,
}

pub const UNKNOWN_CLIENT_NAME: &str = "Client inconnu";

impl Sale {
    /// Patient wins when both foreign keys are populated.
    pub fn client(&self) -> Option<ClientRef<'_>> {
        if let Some(id) = self.patient_id.as_deref() {
            return Some(ClientRef::Patient(id));
        }
        self.company_id.as_deref().map(ClientRef::Company)
    }

    pub fn client_summary(&self) -> Option<ClientSummary> {
        let summary = match self.client()? {
            ClientRef::Patient(id) => {
                let patient = self.patient.as_ref();
                let name = patient
                    .map(|p| {
                        [p.first_name.as_deref(), p.last_name.as_deref()]
                            .into_iter()
                            .flatten()
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| UNKNOWN_CLIENT_NAME.to_string());

                ClientSummary {
                    kind: ClientKind::Patient,
                    id: id.to_string(),
                    name,
                    code: patient.and_then(|p| p.patient_code.clone()),
                    phone: patient.and_then(|p| p.telephone.clone()),
                }
            }
            ClientRef::Company(id) => {
                let company = self.company.as_ref();
                ClientSummary {
                    kind: ClientKind::Company,
                    id: id.to_string(),
                    name: company
                        .and_then(|c| c.company_name.clone())
                        .unwrap_or_else(|| UNKNOWN_CLIENT_NAME.to_string()),
                    code: company.and_then(|c| c.company_code.clone()),
                    phone: company.and_then(|c| c.telephone.clone()),
                }
            }
        };
        Some(summary)
    }

    /// Sum of the line totals, which is what a CNAM bond covers on a purchase.
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(|item| item.item_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patient_takes_precedence_over_company() {
        let sale: Sale = serde_json::from_value(json!({
            "id": "s1",
            "patientId": "p1",
            "companyId": "c1",
            "patient": { "firstName": "Amine", "lastName": "Ben Salah", "patientCode": "PAT-001" }
        }))
        .unwrap();

        assert_eq!(sale.client(), Some(ClientRef::Patient("p1")));
        let summary = sale.client_summary().unwrap();
        assert_eq!(summary.kind, ClientKind::Patient);
        assert_eq!(summary.name, "Amine Ben Salah");
        assert_eq!(summary.code.as_deref(), Some("PAT-001"));
    }

    #[test]
    fn company_client_and_missing_relation() {
        let sale: Sale = serde_json::from_value(json!({ "id": "s2", "companyId": "c9" })).unwrap();
        let summary = sale.client_summary().unwrap();
        assert_eq!(summary.kind, ClientKind::Company);
        assert_eq!(summary.name, UNKNOWN_CLIENT_NAME);

        let orphan: Sale = serde_json::from_value(json!({ "id": "s3" })).unwrap();
        assert!(orphan.client().is_none());
    }

    #[test]
    fn items_total_sums_line_totals() {
        let sale: Sale = serde_json::from_value(json!({
            "id": "s4",
            "items": [ { "itemTotal": "1475.00" }, { "itemTotal": 200 } ]
        }))
        .unwrap();
        assert_eq!(sale.items_total(), Decimal::new(167500, 2));
    }
}
