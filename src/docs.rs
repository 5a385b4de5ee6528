// src/docs.rs

use utoipa::OpenApi;
use crate::models;

/// OpenAPI components for the shapes this crate hands back to the host
/// service. The host merges them into its own document.
#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            // --- Nomenclature ---
            models::nomenclature::BondType,
            models::nomenclature::BondCategory,
            models::nomenclature::NomenclatureRate,

            // --- Sales ---
            models::sale::SaleStatus,
            models::sale::ClientKind,
            models::sale::ClientSummary,

            // --- Payments ---
            models::payment::PaymentMethod,
            models::payment::PaymentStatus,
            models::payment::PaymentOrigin,
            models::payment::SettlementStatus,
            models::payment::Payment,
            models::payment::SalePayments,

            // --- Dossiers ---
            models::dossier::DossierStatus,
            models::dossier::DossierSource,
            models::dossier::CnamDossier,
            models::dossier::StepInfo,
            models::dossier::BucketTone,
            models::dossier::StatusBucket,
            models::dossier::Inconsistency,
            models::dossier::DossierProgress,
            models::dossier::StepRange,
            models::dossier::DossierUpdate,

            // --- Recalls ---
            models::recall::RecallKind,
            models::recall::RecallStatus,
            models::recall::RecallInfo,
            models::recall::RecallWindow,
            models::recall::RecallBonRef,
            models::recall::SaleRecall,
            models::recall::BonPresence,
            models::recall::RecallQuery,
            models::recall::RecallFilter,
            models::recall::RecallStats,
        )
    ),
    tags(
        (name = "Payments", description = "Rapprochement des paiements par vente"),
        (name = "CNAM", description = "Dossiers, nomenclature et rappels CNAM")
    )
)]
pub struct CnamCoreDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_core_schemas() {
        let doc = CnamCoreDoc::openapi();
        let schemas = doc.components.expect("components").schemas;
        for name in ["SalePayments", "CnamDossier", "DossierUpdate", "RecallWindow", "BondType"] {
            assert!(schemas.contains_key(name), "missing schema {name}");
        }
    }
}
