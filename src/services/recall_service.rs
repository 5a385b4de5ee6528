// src/services/recall_service.rs

use chrono::{Datelike, NaiveDate};

use crate::{
    common::error::{CoreError, Result},
    config::UPCOMING_WINDOW_DAYS,
    models::dossier::CnamBonRecord,
    models::recall::{RecallBonRef, RecallInfo, RecallKind, RecallQuery, RecallStatus, RecallWindow, SaleRecall},
    models::sale::Sale,
};

/// Same month and day, `years` later. Feb 29 lands on Mar 1 when the target
/// year is not a leap year.
pub fn add_calendar_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let year = date.year().checked_add(years)?;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}

pub fn classify(days_until: i64) -> RecallStatus {
    if days_until < 0 {
        RecallStatus::Passed
    } else if days_until <= UPCOMING_WINDOW_DAYS {
        RecallStatus::Upcoming
    } else {
        RecallStatus::Distant
    }
}

pub struct RecallScheduler;

impl RecallScheduler {
    pub fn recall(kind: RecallKind, sale_date: NaiveDate, today: NaiveDate) -> Result<RecallInfo> {
        let due_date = add_calendar_years(sale_date, kind.years())
            .ok_or_else(|| CoreError::DateOutOfRange(format!("{sale_date} + {} years", kind.years())))?;
        let days_until = (due_date - today).num_days();

        Ok(RecallInfo {
            kind,
            due_date,
            days_until,
            status: classify(days_until),
        })
    }

    /// `today` comes from the caller so repeated evaluations agree.
    pub fn compute_recalls(sale_date: NaiveDate, today: NaiveDate) -> Result<RecallWindow> {
        Ok(RecallWindow {
            sale_date,
            accessory: Self::recall(RecallKind::Accessory, sale_date, today)?,
            device: Self::recall(RecallKind::Device, sale_date, today)?,
        })
    }

    /// `None` for sales without a date. The bon shown is the first standalone
    /// bon pointing at the sale, else the first one the sale embeds.
    pub fn for_sale(sale: &Sale, bons: &[CnamBonRecord], today: NaiveDate) -> Option<Result<SaleRecall>> {
        let sale_date = sale.sale_date?;
        let bon = sale
            .id
            .as_deref()
            .and_then(|id| bons.iter().find(|bon| bon.sale_id.as_deref() == Some(id)))
            .or_else(|| sale.cnam_dossiers.first())
            .or_else(|| sale.cnam_bons.first())
            .map(RecallBonRef::from);

        Some(Self::compute_recalls(sale_date, today).map(|window| SaleRecall {
            sale_id: sale.id.clone(),
            sale_code: sale.sale_code.clone(),
            client: sale.client_summary(),
            bon,
            window,
        }))
    }

    /// Recall listing, in sale order. Undated sales are skipped.
    pub fn listing(
        sales: &[Sale],
        bons: &[CnamBonRecord],
        today: NaiveDate,
        query: &RecallQuery,
    ) -> Result<Vec<SaleRecall>> {
        let mut rows = Vec::new();
        for sale in sales {
            match Self::for_sale(sale, bons, today) {
                Some(row) => {
                    let row = row?;
                    if query.matches(&row) {
                        rows.push(row);
                    }
                }
                None => tracing::debug!(sale = ?sale.id, "sale without date left out of recalls"),
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn due_dates_keep_month_and_day() {
        let window = RecallScheduler::compute_recalls(date(2020, 3, 15), date(2021, 1, 1)).unwrap();
        assert_eq!(window.accessory.due_date, date(2022, 3, 15));
        assert_eq!(window.device.due_date, date(2027, 3, 15));
    }

    #[test]
    fn leap_day_rolls_to_march_first() {
        assert_eq!(add_calendar_years(date(2020, 2, 29), 2), Some(date(2022, 3, 1)));
        assert_eq!(add_calendar_years(date(2020, 2, 29), 4), Some(date(2024, 2, 29)));
        assert_eq!(add_calendar_years(date(2016, 2, 29), 7), Some(date(2023, 3, 1)));
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(classify(-1), RecallStatus::Passed);
        assert_eq!(classify(0), RecallStatus::Upcoming);
        assert_eq!(classify(90), RecallStatus::Upcoming);
        assert_eq!(classify(91), RecallStatus::Distant);
    }

    #[test]
    fn days_until_counts_calendar_days() {
        let sale = date(2020, 3, 15);
        let due = RecallScheduler::recall(RecallKind::Accessory, sale, date(2022, 3, 15)).unwrap();
        assert_eq!(due.days_until, 0);
        assert_eq!(due.status, RecallStatus::Upcoming);

        let late = RecallScheduler::recall(RecallKind::Accessory, sale, date(2022, 3, 16)).unwrap();
        assert_eq!(late.days_until, -1);
        assert_eq!(late.badge_label(), "Dépassé (1j)");
    }

    #[test]
    fn overflow_is_an_error() {
        let err = RecallScheduler::compute_recalls(NaiveDate::MAX, NaiveDate::MAX).unwrap_err();
        assert!(matches!(err, CoreError::DateOutOfRange(_)));
    }

    #[test]
    fn undated_sale_has_no_recall() {
        let sale = Sale::default();
        assert!(RecallScheduler::for_sale(&sale, &[], date(2024, 1, 1)).is_none());
    }

    #[test]
    fn standalone_bon_wins_over_embedded_one() {
        let sale: Sale = serde_json::from_value(serde_json::json!({
            "id": "s1",
            "saleDate": "2023-01-10",
            "cnamBons": [ { "bonNumber": "EMB-1", "bonType": "MASQUE" } ]
        }))
        .unwrap();
        let bons: Vec<CnamBonRecord> = serde_json::from_value(serde_json::json!([
            { "dossierNumber": "STD-1", "bonType": "CPAP", "bondAmount": 1475, "saleId": "s1" }
        ]))
        .unwrap();

        let row = RecallScheduler::for_sale(&sale, &bons, date(2024, 1, 1)).unwrap().unwrap();
        let bon = row.bon.unwrap();
        assert_eq!(bon.number.as_deref(), Some("STD-1"));
        assert_eq!(bon.amount, Some(rust_decimal::Decimal::new(1475, 0)));

        let row = RecallScheduler::for_sale(&sale, &[], date(2024, 1, 1)).unwrap().unwrap();
        assert_eq!(row.bon.unwrap().number.as_deref(), Some("EMB-1"));
    }
}
