// src/services/nomenclature_service.rs

use rust_decimal::Decimal;

use crate::{
    common::error::{CoreError, Result},
    models::nomenclature::{BondCategory, BondType, NomenclatureRate, NomenclatureRecord},
};

/// First exact match on (bond type, category), or zero when nothing is
/// configured. Zero means "no fixed rate", and the caller lets the user type
/// an amount by hand.
pub fn resolve(rates: &[NomenclatureRate], bond_type: BondType, category: BondCategory) -> Decimal {
    find(rates, bond_type, category)
        .map(|rate| rate.amount)
        .unwrap_or(Decimal::ZERO)
}

fn find(rates: &[NomenclatureRate], bond_type: BondType, category: BondCategory) -> Option<&NomenclatureRate> {
    // Unknown codes never match, even against an equally unknown row.
    if !bond_type.is_known() || category == BondCategory::Unknown {
        return None;
    }
    rates
        .iter()
        .find(|rate| rate.bond_type == bond_type && rate.category == category)
}

/// Holds the nomenclature table the host fetched once and cached.
#[derive(Debug, Clone, Default)]
pub struct NomenclatureRateResolver {
    rates: Vec<NomenclatureRate>,
}

impl NomenclatureRateResolver {
    pub fn new(rates: Vec<NomenclatureRate>) -> Self {
        Self { rates }
    }

    pub fn from_records(records: Vec<NomenclatureRecord>) -> Self {
        Self::new(records.into_iter().map(NomenclatureRate::from).collect())
    }

    /// Accepts the raw `/api/cnam-nomenclature` payload.
    pub fn from_json(payload: &str) -> Result<Self> {
        let records: Vec<NomenclatureRecord> = serde_json::from_str(payload)?;
        Ok(Self::from_records(records))
    }

    pub fn rates(&self) -> &[NomenclatureRate] {
        &self.rates
    }

    pub fn resolve(&self, bond_type: BondType, category: BondCategory) -> Decimal {
        resolve(&self.rates, bond_type, category)
    }

    /// For contexts where a manual amount is not an option.
    pub fn resolve_strict(&self, bond_type: BondType, category: BondCategory) -> Result<Decimal> {
        match find(&self.rates, bond_type, category) {
            Some(rate) if rate.amount > Decimal::ZERO => Ok(rate.amount),
            _ => Err(CoreError::RateNotConfigured { bond_type, category }),
        }
    }

    /// A positive manual amount wins over the table.
    pub fn resolve_with_override(
        &self,
        bond_type: BondType,
        category: BondCategory,
        manual: Option<Decimal>,
    ) -> Decimal {
        match manual {
            Some(amount) if amount > Decimal::ZERO => amount,
            _ => self.resolve(bond_type, category),
        }
    }
}
