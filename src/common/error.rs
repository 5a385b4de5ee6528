// src/common/error.rs

use thiserror::Error;

use crate::models::dossier::DossierStatus;
use crate::models::nomenclature::{BondCategory, BondType};

// Errors only surface from the mutation boundary, strict lookups and raw JSON
// entry points. Display derivations never fail.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("date out of range: {0}")]
    DateOutOfRange(String),

    #[error("no nomenclature rate configured for {bond_type:?}/{category:?}")]
    RateNotConfigured {
        bond_type: BondType,
        category: BondCategory,
    },

    #[error("inconsistent dossier: status {status:?} at step {step} ({reason})")]
    InconsistentDossier {
        status: DossierStatus,
        step: i32,
        reason: String,
    },

    #[error("step regression from {from} to {to} is not allowed")]
    StepRegression { from: i32, to: i32 },

    #[error("validation error")]
    Validation(#[from] validator::ValidationErrors),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
