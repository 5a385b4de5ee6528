//! Renewal recalls for accessories (2 years) and devices (7 years).

use chrono::{Duration, NaiveDate};
use cnam_core::RecallScheduler;
use cnam_core::models::dossier::CnamBonRecord;
use cnam_core::models::recall::{BonPresence, RecallFilter, RecallQuery, RecallStats, RecallStatus};
use cnam_core::models::sale::ClientKind;
use cnam_core::models::sale::Sale;
use serde_json::json;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn boundary_days_around_the_upcoming_window() {
    let sale_date = date(2020, 3, 15);
    let due = date(2022, 3, 15);

    let cases = [
        (due + Duration::days(1), -1, RecallStatus::Passed),
        (due, 0, RecallStatus::Upcoming),
        (due - Duration::days(90), 90, RecallStatus::Upcoming),
        (due - Duration::days(91), 91, RecallStatus::Distant),
    ];

    for (today, days, status) in cases {
        let window = RecallScheduler::compute_recalls(sale_date, today).unwrap();
        assert_eq!(window.accessory.days_until, days);
        assert_eq!(window.accessory.status, status);
    }
}

#[test]
fn badges_follow_the_status() {
    let window = RecallScheduler::compute_recalls(date(2020, 3, 15), date(2022, 1, 14)).unwrap();
    assert_eq!(window.accessory.badge_label(), "Dans 60j");
    // 2020-03-15 + 7 years is 1886 days after 2022-01-14
    assert_eq!(window.device.days_until, 1886);
    assert_eq!(window.device.badge_label(), "5a 2m");
}

#[test]
fn listing_filters_and_tallies() {
    let sales: Vec<Sale> = serde_json::from_value(json!([
        { "id": "s1", "saleCode": "V-1", "saleDate": "2022-02-01", "patientId": "p1",
          "patient": { "firstName": "Amine", "lastName": "Ben Salah" } },
        { "id": "s2", "saleDate": "2017-06-01T10:30:00.000Z", "companyId": "c1" },
        { "id": "s3" }
    ]))
    .unwrap();
    let today = date(2024, 1, 1);

    let all = RecallScheduler::listing(&sales, &[], today, &RecallQuery::default()).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].client.as_ref().unwrap().name, "Amine Ben Salah");

    let upcoming = RecallScheduler::listing(&sales, &[], today, &RecallQuery::from(RecallFilter::AccessoryUpcoming)).unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].sale_code.as_deref(), Some("V-1"));

    let stats = RecallStats::tally(all.iter().map(|row| &row.window));
    assert_eq!(stats.upcoming_accessory, 1);
    assert_eq!(stats.passed_accessory, 1);
    assert_eq!(stats.upcoming_device, 0);
    assert_eq!(stats.passed_device, 0);
}

#[test]
fn listing_filters_on_client_kind_and_bon() {
    let sales: Vec<Sale> = serde_json::from_value(json!([
        { "id": "s1", "saleDate": "2023-05-01", "patientId": "p1" },
        { "id": "s2", "saleDate": "2023-05-01", "companyId": "c1",
          "cnamDossiers": [ { "dossierNumber": "BON-2", "bonType": "CPAP", "bonAmount": 1475 } ] },
        { "id": "s3", "saleDate": "2023-05-01", "patientId": "p3" }
    ]))
    .unwrap();
    let bons: Vec<CnamBonRecord> =
        serde_json::from_value(json!([ { "bonNumber": "BON-3", "saleId": "s3", "bonType": "VNI" } ])).unwrap();
    let today = date(2024, 1, 1);

    let ids = |query: RecallQuery| -> Vec<String> {
        RecallScheduler::listing(&sales, &bons, today, &query)
            .unwrap()
            .into_iter()
            .map(|row| row.sale_id.unwrap())
            .collect()
    };

    let patients = RecallQuery { client_kind: Some(ClientKind::Patient), ..Default::default() };
    assert_eq!(ids(patients), ["s1", "s3"]);

    let with_bon = RecallQuery { bon: BonPresence::WithBon, ..Default::default() };
    assert_eq!(ids(with_bon), ["s2", "s3"]);

    let patients_without_bon = RecallQuery {
        client_kind: Some(ClientKind::Patient),
        bon: BonPresence::WithoutBon,
        ..Default::default()
    };
    assert_eq!(ids(patients_without_bon), ["s1"]);

    let query: RecallQuery =
        serde_json::from_value(json!({ "recall": "2years-upcoming", "clientKind": "COMPANY", "bon": "with-bon" }))
            .unwrap();
    assert_eq!(query.client_kind, Some(ClientKind::Company));
    assert_eq!(query.bon, BonPresence::WithBon);
}

#[test]
fn filters_deserialize_from_query_values() {
    let filter: RecallFilter = serde_json::from_value(json!("7years-passed")).unwrap();
    assert_eq!(filter, RecallFilter::DevicePassed);
    let filter: RecallFilter = serde_json::from_value(json!("any-upcoming")).unwrap();
    assert_eq!(filter, RecallFilter::AnyUpcoming);
}

#[test]
fn repeated_evaluation_is_identical() {
    let run = || {
        serde_json::to_string(&RecallScheduler::compute_recalls(date(2020, 2, 29), date(2021, 12, 1)).unwrap())
            .unwrap()
    };
    assert_eq!(run(), run());
}
