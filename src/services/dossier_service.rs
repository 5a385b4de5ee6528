// src/services/dossier_service.rs

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use validator::Validate;

use crate::{
    common::error::{CoreError, Result},
    config::{CoreConfig, DEFAULT_DOSSIER_NUMBER, StepPolicy, TOTAL_STEPS},
    models::dossier::{
        BucketTone, CnamBonRecord, CnamDossier, DossierProgress, DossierSource, DossierStatus,
        DossierUpdate, Inconsistency, StatusBucket, StepInfo, StepRangeTable,
    },
    models::nomenclature::{BondCategory, BondType},
    models::sale::Sale,
    services::nomenclature_service::NomenclatureRateResolver,
};

const STEP_NAMES: [&str; TOTAL_STEPS as usize] = [
    "En attente approbation CNAM",
    "Accord avec patient",
    "Tech récupère Bon CNAM",
    "Livraison Bon à Admin",
    "Livraison au Technicien",
    "Signature Médecin",
    "Livraison finale Admin",
];

pub struct DossierProgressTracker;

impl DossierProgressTracker {
    /// Never rejects a step: steps are edited by hand elsewhere, and display
    /// must keep working for whatever value is stored.
    pub fn step_info(step: i32) -> StepInfo {
        let named = step
            .checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| STEP_NAMES.get(index));

        StepInfo {
            step,
            total_steps: TOTAL_STEPS,
            name: named
                .map(|name| name.to_string())
                .unwrap_or_else(|| format!("Étape {step}")),
            percentage: percentage(step),
            known: named.is_some(),
        }
    }

    pub fn status_bucket(status: DossierStatus) -> StatusBucket {
        let (label, tone) = match status {
            DossierStatus::EnAttenteApprobation => ("En attente", BucketTone::Pending),
            DossierStatus::Approuve => ("Approuvé", BucketTone::Approved),
            DossierStatus::EnCours => ("En cours", BucketTone::InProgress),
            DossierStatus::Termine => ("Terminé", BucketTone::Done),
            DossierStatus::Refuse => ("Refusé", BucketTone::Refused),
            DossierStatus::Unknown => ("Statut inconnu", BucketTone::Neutral),
        };

        StatusBucket {
            status,
            label: label.to_string(),
            tone,
            terminal: status.is_terminal(),
        }
    }

    /// Reports what does not fit; never corrects anything.
    pub fn check_consistency(status: DossierStatus, step: i32, table: &StepRangeTable) -> Vec<Inconsistency> {
        let mut found = Vec::new();

        if !(1..=TOTAL_STEPS).contains(&step) {
            found.push(Inconsistency::StepOutOfRange { step });
        }

        if status != DossierStatus::Unknown {
            let range = table.range_for(status);
            if !range.contains(step) {
                found.push(Inconsistency::StepOutsideStatusRange {
                    status,
                    step,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        found
    }

    pub fn progress(dossier: &CnamDossier, table: &StepRangeTable) -> DossierProgress {
        DossierProgress {
            dossier_number: dossier.dossier_number.clone(),
            step: Self::step_info(dossier.current_step),
            bucket: Self::status_bucket(dossier.status),
            inconsistencies: Self::check_consistency(dossier.status, dossier.current_step, table),
        }
    }
}

/// `round(100 * step / TOTAL_STEPS)` in integers, rounding halves up like the
/// back-office did.
fn percentage(step: i32) -> i32 {
    let scaled = i64::from(step) * 200 + i64::from(TOTAL_STEPS);
    let value = scaled.div_euclid(2 * i64::from(TOTAL_STEPS));
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

// =============================================================================
//  NORMALIZATION (dossier rows + bon rows -> CnamDossier)
// =============================================================================

/// Step assumed for bons saved before the step was tracked.
fn fallback_step(status: DossierStatus) -> i32 {
    match status {
        DossierStatus::Termine => 7,
        DossierStatus::Approuve => 5,
        _ => 3,
    }
}

pub fn normalize_record(record: &CnamBonRecord, source: DossierSource, sale_id: Option<&str>) -> CnamDossier {
    let current_step = match record.current_step {
        Some(step) if step != 0 => step,
        _ => fallback_step(record.status),
    };

    CnamDossier {
        id: record.id.clone(),
        dossier_number: record
            .bon_number
            .clone()
            .or_else(|| record.dossier_number.clone())
            .unwrap_or_else(|| DEFAULT_DOSSIER_NUMBER.to_string()),
        bond_type: record.bon_type,
        category: record.effective_category().unwrap_or(BondCategory::Achat),
        bond_amount: record
            .bon_amount
            .or(record.bond_amount)
            .unwrap_or(Decimal::ZERO),
        device_price: record.device_price,
        complement_amount: record.complement_amount,
        current_step,
        total_steps: TOTAL_STEPS,
        status: record.status,
        notes: record.notes.clone(),
        sale_id: record.sale_id.clone().or_else(|| sale_id.map(str::to_string)),
        patient_id: record.patient_id.clone(),
        created_at: record.created_at,
        updated_at: record.updated_at,
        source,
    }
}

/// Every ACHAT dossier reachable from the sales listing and the standalone
/// `cnam-bons?category=ACHAT` rows. First occurrence of an id wins.
pub fn collect_sale_dossiers(sales: &[Sale], standalone_bons: &[CnamBonRecord]) -> Vec<CnamDossier> {
    let mut seen = HashSet::new();
    let mut dossiers = Vec::new();

    let mut push = |dossier: CnamDossier| {
        if let Some(id) = dossier.id.as_ref() {
            if !seen.insert(id.clone()) {
                return;
            }
        }
        dossiers.push(dossier);
    };

    for sale in sales {
        let sale_id = sale.id.as_deref();
        let embedded = sale
            .cnam_dossiers
            .iter()
            .map(|r| (r, DossierSource::CnamDossier))
            .chain(sale.cnam_bons.iter().map(|r| (r, DossierSource::CnamBonSale)));

        for (record, source) in embedded {
            if record.effective_category() == Some(BondCategory::Location) {
                tracing::debug!(id = ?record.id, "rental bon attached to a sale ignored");
                continue;
            }
            push(normalize_record(record, source, sale_id));
        }
    }

    for record in standalone_bons {
        if record.effective_category() != Some(BondCategory::Achat) {
            continue;
        }
        push(normalize_record(record, DossierSource::CnamBonSale, None));
    }

    dossiers
}

// =============================================================================
//  CREATION
// =============================================================================

/// Amounts of a new ACHAT dossier before it is sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DossierDraft {
    pub sale_id: Option<String>,
    pub patient_id: Option<String>,
    pub bond_type: BondType,
    pub bond_amount: Decimal,
    pub device_price: Decimal,
    pub complement_amount: Decimal,
}

impl DossierDraft {
    /// The device price is the sum of the sale lines (the sale's final amount
    /// when it has none), the bond amount comes from the nomenclature, and the
    /// complement is whatever is left to the patient.
    pub fn for_sale(sale: &Sale, bond_type: BondType, resolver: &NomenclatureRateResolver) -> Self {
        let device_price = if sale.items.is_empty() {
            sale.final_amount
        } else {
            sale.items_total()
        };
        let bond_amount = resolver.resolve(bond_type, BondCategory::Achat);

        Self {
            sale_id: sale.id.clone(),
            patient_id: sale.patient_id.clone(),
            bond_type,
            bond_amount,
            device_price,
            complement_amount: device_price - bond_amount,
        }
    }

    pub fn into_dossier(self, dossier_number: Option<String>) -> CnamDossier {
        CnamDossier {
            id: None,
            dossier_number: dossier_number.unwrap_or_else(|| DEFAULT_DOSSIER_NUMBER.to_string()),
            bond_type: self.bond_type,
            category: BondCategory::Achat,
            bond_amount: self.bond_amount,
            device_price: self.device_price,
            complement_amount: self.complement_amount,
            current_step: 1,
            total_steps: TOTAL_STEPS,
            status: DossierStatus::EnAttenteApprobation,
            notes: None,
            sale_id: self.sale_id,
            patient_id: self.patient_id,
            created_at: None,
            updated_at: None,
            source: DossierSource::Draft,
        }
    }
}

// =============================================================================
//  MUTATION BOUNDARY
// =============================================================================

/// Applies administrative edits under the configured step policy. The guard
/// never advances a dossier on its own and never recomputes amounts.
#[derive(Debug, Clone, Default)]
pub struct DossierGuard {
    config: CoreConfig,
}

impl DossierGuard {
    pub fn new(config: CoreConfig) -> Self {
        Self { config }
    }

    pub fn apply(&self, dossier: &CnamDossier, update: &DossierUpdate, now: DateTime<Utc>) -> Result<CnamDossier> {
        update.validate()?;

        let mut next = dossier.clone();
        if let Some(status) = update.status {
            next.status = status;
        }
        if let Some(step) = update.current_step {
            if step < dossier.current_step && !self.config.allow_step_regression {
                return Err(CoreError::StepRegression { from: dossier.current_step, to: step });
            }
            next.current_step = step;
        }
        if let Some(number) = update.dossier_number.as_ref() {
            next.dossier_number = number.clone();
        }
        if let Some(bond_type) = update.bond_type {
            next.bond_type = bond_type;
        }
        if let Some(amount) = update.bond_amount {
            next.bond_amount = amount;
        }
        if let Some(price) = update.device_price {
            next.device_price = price;
        }
        if let Some(complement) = update.complement_amount {
            next.complement_amount = complement;
        }
        if let Some(notes) = update.notes.as_ref() {
            next.notes = Some(notes.clone());
        }

        let issues =
            DossierProgressTracker::check_consistency(next.status, next.current_step, &self.config.step_ranges);

        if let Some(first) = issues.first() {
            match self.config.step_policy {
                StepPolicy::Off => {}
                StepPolicy::Warn => {
                    tracing::warn!(
                        dossier = %next.dossier_number,
                        status = next.status.code(),
                        step = next.current_step,
                        "dossier saved with inconsistent status/step: {first}"
                    );
                }
                StepPolicy::Reject => {
                    return Err(CoreError::InconsistentDossier {
                        status: next.status,
                        step: next.current_step,
                        reason: first.to_string(),
                    });
                }
            }
        }

        next.updated_at = Some(now);
        Ok(next)
    }
}
