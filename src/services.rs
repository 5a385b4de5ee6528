pub mod dossier_service;
pub mod nomenclature_service;
pub mod payment_service;
pub mod recall_service;

pub use dossier_service::{DossierDraft, DossierGuard, DossierProgressTracker};
pub use nomenclature_service::NomenclatureRateResolver;
pub use payment_service::PaymentReconciler;
pub use recall_service::RecallScheduler;
