// src/models/dossier.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::common::lenient::{self, FromCode};
use crate::config::TOTAL_STEPS;
use crate::models::nomenclature::{BondCategory, BondType};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DossierStatus {
    EnAttenteApprobation,
    Approuve,
    EnCours,
    Termine,
    Refuse,
    #[default]
    Unknown,
}

impl DossierStatus {
    pub const ALL: [DossierStatus; 5] = [
        DossierStatus::EnAttenteApprobation,
        DossierStatus::Approuve,
        DossierStatus::EnCours,
        DossierStatus::Termine,
        DossierStatus::Refuse,
    ];

    pub fn code(self) -> &'static str {
        match self {
            DossierStatus::EnAttenteApprobation => "EN_ATTENTE_APPROBATION",
            DossierStatus::Approuve => "APPROUVE",
            DossierStatus::EnCours => "EN_COURS",
            DossierStatus::Termine => "TERMINE",
            DossierStatus::Refuse => "REFUSE",
            DossierStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DossierStatus::Termine | DossierStatus::Refuse)
    }
}

impl FromCode for DossierStatus {
    fn from_code(code: &str) -> Self {
        let code = code.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|s| s.code() == code)
            .unwrap_or_default()
    }
}

/// Where a canonical dossier was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DossierSource {
    CnamDossier,
    CnamBonSale,
    Draft,
}

// --- Raw upstream shape ---

/// Covers both `sale.cnamDossiers[]` and the `cnam-bons` rows, which name
/// the same fields differently (`bonNumber`/`dossierNumber`,
/// `bonAmount`/`bondAmount`, `category`/`bondCategory`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CnamBonRecord {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub bon_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub dossier_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::code", alias = "bondType")]
    pub bon_type: BondType,
    #[serde(default, deserialize_with = "lenient::opt_code")]
    pub category: Option<BondCategory>,
    #[serde(default, deserialize_with = "lenient::opt_code")]
    pub bond_category: Option<BondCategory>,
    #[serde(default, deserialize_with = "lenient::opt_amount")]
    pub bon_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_amount")]
    pub bond_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub device_price: Decimal,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub complement_amount: Decimal,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub current_step: Option<i32>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub status: DossierStatus,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub sale_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CnamBonRecord {
    pub fn effective_category(&self) -> Option<BondCategory> {
        self.category.or(self.bond_category)
    }
}

// --- Canonical shape ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CnamDossier {
    pub id: Option<String>,
    #[schema(example = "BON-2024-0042")]
    pub dossier_number: String,
    pub bond_type: BondType,
    pub category: BondCategory,
    /// CNAM-covered portion.
    #[schema(example = "1475.00")]
    pub bond_amount: Decimal,
    #[schema(example = "1675.00")]
    pub device_price: Decimal,
    /// Patient-paid portion.
    #[schema(example = "200.00")]
    pub complement_amount: Decimal,
    #[schema(example = 3)]
    pub current_step: i32,
    pub total_steps: i32,
    pub status: DossierStatus,
    pub notes: Option<String>,
    pub sale_id: Option<String>,
    pub patient_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub source: DossierSource,
}

// --- Derived display values ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepInfo {
    pub step: i32,
    pub total_steps: i32,
    #[schema(example = "Livraison Bon à Admin")]
    pub name: String,
    /// `round(100 * step / total)`, not clamped for out-of-range steps.
    #[schema(example = 57)]
    pub percentage: i32,
    /// False for steps outside `1..=total`, which only get a generic name.
    pub known: bool,
}

impl StepInfo {
    pub fn label(&self) -> String {
        format!("Étape {}/{} - {}", self.step, self.total_steps, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BucketTone {
    Pending,
    Approved,
    InProgress,
    Done,
    Refused,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusBucket {
    pub status: DossierStatus,
    #[schema(example = "En attente")]
    pub label: String,
    pub tone: BucketTone,
    pub terminal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind")]
pub enum Inconsistency {
    StepOutOfRange { step: i32 },
    StepOutsideStatusRange { status: DossierStatus, step: i32, min: i32, max: i32 },
}

impl std::fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Inconsistency::StepOutOfRange { step } => {
                write!(f, "step {step} is outside 1..={TOTAL_STEPS}")
            }
            Inconsistency::StepOutsideStatusRange { status, step, min, max } => {
                write!(f, "step {step} is outside {min}..={max} allowed for {}", status.code())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DossierProgress {
    pub dossier_number: String,
    pub step: StepInfo,
    pub bucket: StatusBucket,
    pub inconsistencies: Vec<Inconsistency>,
}

// --- Status <-> step correspondence ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StepRange {
    pub min: i32,
    pub max: i32,
}

impl StepRange {
    pub const FULL: StepRange = StepRange { min: 1, max: TOTAL_STEPS };

    pub fn contains(&self, step: i32) -> bool {
        (self.min..=self.max).contains(&step)
    }
}

/// Allowed step range per status. Every status starts with the full range;
/// deployments narrow it through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepRangeTable {
    overrides: HashMap<DossierStatus, StepRange>,
}

impl StepRangeTable {
    pub fn with_range(mut self, status: DossierStatus, range: StepRange) -> Self {
        self.overrides.insert(status, range);
        self
    }

    pub fn range_for(&self, status: DossierStatus) -> StepRange {
        self.overrides.get(&status).copied().unwrap_or(StepRange::FULL)
    }
}

// --- Mutation payload ---

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}

/// Administrative edit of a dossier. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DossierUpdate {
    pub status: Option<DossierStatus>,

    #[validate(range(min = 1, max = TOTAL_STEPS, message = "step must be between 1 and 7"))]
    #[schema(example = 4)]
    pub current_step: Option<i32>,

    #[validate(length(min = 1, max = 64, message = "dossier number must be 1 to 64 characters"))]
    #[schema(example = "BON-2024-0042")]
    pub dossier_number: Option<String>,

    pub bond_type: Option<BondType>,

    #[serde(default, deserialize_with = "lenient::opt_amount")]
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = Option<String>, example = "1475.00")]
    pub bond_amount: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::opt_amount")]
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = Option<String>, example = "1675.00")]
    pub device_price: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::opt_amount")]
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = Option<String>, example = "200.00")]
    pub complement_amount: Option<Decimal>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}
