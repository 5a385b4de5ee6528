// src/models/recall.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{ACCESSORY_RENEWAL_YEARS, DEVICE_RENEWAL_YEARS};
use crate::models::dossier::CnamBonRecord;
use crate::models::nomenclature::BondType;
use crate::models::sale::{ClientKind, ClientSummary};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecallKind {
    /// Accessory renewal (masks, tubing...).
    Accessory,
    /// Full device renewal.
    Device,
}

impl RecallKind {
    pub fn years(self) -> i32 {
        match self {
            RecallKind::Accessory => ACCESSORY_RENEWAL_YEARS,
            RecallKind::Device => DEVICE_RENEWAL_YEARS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecallKind::Accessory => "Accessoires",
            RecallKind::Device => "Appareil",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecallStatus {
    Passed,
    Upcoming,
    Distant,
}

// --- Structs ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecallInfo {
    pub kind: RecallKind,
    #[schema(value_type = String, format = Date, example = "2022-03-15")]
    pub due_date: NaiveDate,
    /// Negative once the due date is behind us.
    pub days_until: i64,
    pub status: RecallStatus,
}

impl RecallInfo {
    /// Short badge text shown next to a recall date.
    pub fn badge_label(&self) -> String {
        match self.status {
            RecallStatus::Passed => format!("Dépassé ({}j)", self.days_until.abs()),
            RecallStatus::Upcoming => format!("Dans {}j", self.days_until),
            RecallStatus::Distant => {
                let years = self.days_until / 365;
                let months = (self.days_until % 365) / 30;
                format!("{years}a {months}m")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecallWindow {
    #[schema(value_type = String, format = Date, example = "2020-03-15")]
    pub sale_date: NaiveDate,
    pub accessory: RecallInfo,
    pub device: RecallInfo,
}

impl RecallWindow {
    pub fn get(&self, kind: RecallKind) -> &RecallInfo {
        match kind {
            RecallKind::Accessory => &self.accessory,
            RecallKind::Device => &self.device,
        }
    }
}

/// The CNAM bon shown next to a recall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecallBonRef {
    #[schema(example = "BON-2024-0042")]
    pub number: Option<String>,
    pub bond_type: BondType,
    #[schema(example = "1475.00")]
    pub amount: Option<Decimal>,
}

impl From<&CnamBonRecord> for RecallBonRef {
    fn from(record: &CnamBonRecord) -> Self {
        Self {
            number: record.bon_number.clone().or_else(|| record.dossier_number.clone()),
            bond_type: record.bon_type,
            amount: record.bon_amount.or(record.bond_amount),
        }
    }
}

/// One row of the recall listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecall {
    pub sale_id: Option<String>,
    pub sale_code: Option<String>,
    pub client: Option<ClientSummary>,
    pub bon: Option<RecallBonRef>,
    pub window: RecallWindow,
}

impl SaleRecall {
    /// A bon only counts once it has a number.
    pub fn has_bon(&self) -> bool {
        self.bon.as_ref().is_some_and(|bon| bon.number.is_some())
    }

    pub fn client_kind(&self) -> Option<ClientKind> {
        self.client.as_ref().map(|client| client.kind)
    }
}

/// Filters offered on the recall listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RecallFilter {
    #[default]
    All,
    #[serde(rename = "2years-upcoming")]
    AccessoryUpcoming,
    #[serde(rename = "2years-passed")]
    AccessoryPassed,
    #[serde(rename = "7years-upcoming")]
    DeviceUpcoming,
    #[serde(rename = "7years-passed")]
    DevicePassed,
    AnyUpcoming,
}

impl RecallFilter {
    pub fn matches(self, window: &RecallWindow) -> bool {
        let accessory = window.accessory.status;
        let device = window.device.status;
        match self {
            RecallFilter::All => true,
            RecallFilter::AccessoryUpcoming => accessory == RecallStatus::Upcoming,
            RecallFilter::AccessoryPassed => accessory == RecallStatus::Passed,
            RecallFilter::DeviceUpcoming => device == RecallStatus::Upcoming,
            RecallFilter::DevicePassed => device == RecallStatus::Passed,
            RecallFilter::AnyUpcoming => {
                accessory == RecallStatus::Upcoming || device == RecallStatus::Upcoming
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BonPresence {
    #[default]
    All,
    WithBon,
    WithoutBon,
}

/// Every filter of the recall listing combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RecallQuery {
    pub recall: RecallFilter,
    /// `None` keeps both patients and companies.
    pub client_kind: Option<ClientKind>,
    pub bon: BonPresence,
}

impl RecallQuery {
    pub fn matches(&self, row: &SaleRecall) -> bool {
        let bon = match self.bon {
            BonPresence::All => true,
            BonPresence::WithBon => row.has_bon(),
            BonPresence::WithoutBon => !row.has_bon(),
        };
        let client = self
            .client_kind
            .is_none_or(|kind| row.client_kind() == Some(kind));

        bon && client && self.recall.matches(&row.window)
    }
}

impl From<RecallFilter> for RecallQuery {
    fn from(recall: RecallFilter) -> Self {
        Self { recall, ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecallStats {
    pub upcoming_accessory: usize,
    pub upcoming_device: usize,
    pub passed_accessory: usize,
    pub passed_device: usize,
}

impl RecallStats {
    pub fn tally<'a, I>(windows: I) -> Self
    where
        I: IntoIterator<Item = &'a RecallWindow>,
    {
        windows.into_iter().fold(Self::default(), |mut stats, w| {
            match w.accessory.status {
                RecallStatus::Upcoming => stats.upcoming_accessory += 1,
                RecallStatus::Passed => stats.passed_accessory += 1,
                RecallStatus::Distant => {}
            }
            match w.device.status {
                RecallStatus::Upcoming => stats.upcoming_device += 1,
                RecallStatus::Passed => stats.passed_device += 1,
                RecallStatus::Distant => {}
            }
            stats
        })
    }
}
