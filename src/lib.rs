//! Reimbursement core of the CNAM back-office.
//!
//! Pure derivations over data fetched by the host service:
//! nomenclature rate lookup, per-sale payment reconciliation, dossier
//! progress display and renewal recalls. Nothing here performs I/O.

pub mod common;
pub mod config;
pub mod docs;
pub mod models;
pub mod services;

pub use common::{CoreError, Result};
pub use config::{CoreConfig, StepPolicy, init_tracing};
pub use services::{
    DossierDraft, DossierGuard, DossierProgressTracker, NomenclatureRateResolver, PaymentReconciler,
    RecallScheduler,
};
