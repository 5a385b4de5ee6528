pub mod dossier;
pub mod nomenclature;
pub mod payment;
pub mod recall;
pub mod sale;
