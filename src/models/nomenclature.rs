// src/models/nomenclature.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::lenient::{self, FromCode};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BondType {
    Cpap,
    Masque,
    Vni,
    ConcentrateurOxygene,
    Autre,
    #[default]
    Unknown,
}

impl BondType {
    pub const ALL: [BondType; 5] = [
        BondType::Cpap,
        BondType::Masque,
        BondType::Vni,
        BondType::ConcentrateurOxygene,
        BondType::Autre,
    ];

    pub fn code(self) -> &'static str {
        match self {
            BondType::Cpap => "CPAP",
            BondType::Masque => "MASQUE",
            BondType::Vni => "VNI",
            BondType::ConcentrateurOxygene => "CONCENTRATEUR_OXYGENE",
            BondType::Autre => "AUTRE",
            BondType::Unknown => "UNKNOWN",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BondType::Cpap => "CPAP",
            BondType::Masque => "Masque",
            BondType::Vni => "VNI",
            BondType::ConcentrateurOxygene => "Concentrateur O2",
            // Unknown types display like AUTRE
            BondType::Autre | BondType::Unknown => "Autre",
        }
    }

    pub fn is_known(self) -> bool {
        self != BondType::Unknown
    }
}

impl FromCode for BondType {
    fn from_code(code: &str) -> Self {
        let code = code.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .unwrap_or_default()
    }
}

/// ACHAT = purchase program, LOCATION = rental program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BondCategory {
    Achat,
    Location,
    #[default]
    Unknown,
}

impl FromCode for BondCategory {
    fn from_code(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "ACHAT" => BondCategory::Achat,
            "LOCATION" => BondCategory::Location,
            _ => BondCategory::Unknown,
        }
    }
}

// --- Structs ---

/// One row of the CNAM nomenclature table as served by the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NomenclatureRecord {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::code", alias = "bondType")]
    pub bon_type: BondType,
    #[serde(default, deserialize_with = "lenient::code")]
    pub category: BondCategory,
    #[serde(default, deserialize_with = "lenient::opt_amount")]
    pub amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_amount")]
    pub monthly_rate: Option<Decimal>,
}

/// Reference data: fixed CNAM amount for a (bond type, category) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NomenclatureRate {
    pub bond_type: BondType,
    pub category: BondCategory,
    #[schema(example = "1475.00")]
    pub amount: Decimal,
}

impl NomenclatureRate {
    pub fn new(bond_type: BondType, category: BondCategory, amount: Decimal) -> Self {
        Self { bond_type, category, amount }
    }
}

impl From<NomenclatureRecord> for NomenclatureRate {
    fn from(record: NomenclatureRecord) -> Self {
        // A zero `amount` falls through to `monthlyRate`, as the table editor did.
        let amount = record
            .amount
            .filter(|a| !a.is_zero())
            .or(record.monthly_rate)
            .unwrap_or(Decimal::ZERO);

        Self {
            bond_type: record.bon_type,
            category: record.category,
            amount,
        }
    }
}
