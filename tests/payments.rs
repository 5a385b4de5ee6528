//! Payment reconciliation over payloads shaped like `/api/sales?details=true`
//! and `/api/payments/all?source=SALE`.

use cnam_core::PaymentReconciler;
use cnam_core::models::payment::{PaymentMethod, PaymentOrigin, PaymentRecord, SettlementStatus};
use cnam_core::models::sale::Sale;
use rust_decimal::Decimal;
use serde_json::{Value, json};

fn sales(value: Value) -> Vec<Sale> {
    serde_json::from_value(value).unwrap()
}

fn standalone(value: Value) -> Vec<PaymentRecord> {
    serde_json::from_value(value).unwrap()
}

fn d(raw: &str) -> Decimal {
    raw.parse().unwrap()
}

fn sale_with_both_representations() -> Value {
    json!([{
        "id": "sale-1",
        "saleCode": "V-2024-001",
        "finalAmount": "1675.00",
        "patientId": "pat-1",
        "payments": [
            { "id": "p1", "paymentCode": "PAY-1", "amount": "1475.00", "method": "CNAM", "status": "PAID" },
            { "id": "p2", "paymentCode": "PAY-2", "amount": 200, "method": "CASH", "status": "PAID" }
        ],
        "payment": {
            "id": "agg-1",
            "paymentCode": "PAY-AGG",
            "amount": "1675.00",
            "method": "MIXED",
            "paymentDetails": [
                { "id": "p1", "amount": "1475.00", "method": "CNAM" },
                { "id": "p2", "amount": "200.00", "method": "CASH" }
            ]
        }
    }])
}

#[test]
fn detailed_rows_win_over_embedded_details() {
    let result = PaymentReconciler::reconcile(&sales(sale_with_both_representations()), &[]);

    assert_eq!(result.len(), 1);
    let view = &result[0];
    assert_eq!(view.tier, Some(PaymentOrigin::SaleRows));
    assert_eq!(view.payments.len(), 2);
    assert_eq!(view.total_paid, d("1675.00"));
    assert_eq!(view.remaining_amount, Decimal::ZERO);
    assert_eq!(view.settlement, SettlementStatus::Paid);
    assert!(view.uses_method(PaymentMethod::Cnam));
}

#[test]
fn overpayment_is_reported_unclamped() {
    let data = sales(json!([{
        "id": "sale-2",
        "finalAmount": 1675,
        "payments": [
            { "id": "p1", "amount": "1700.00", "method": "CHEQUE" }
        ]
    }]));

    let view = &PaymentReconciler::reconcile(&data, &[])[0];
    assert_eq!(view.remaining_amount, d("-25.00"));
    assert!(view.is_overpaid());
    assert_eq!(view.settlement, SettlementStatus::Paid);
}

#[test]
fn standalone_rows_used_only_when_sale_embeds_nothing() {
    let data = sales(json!([
        { "id": "sale-3", "finalAmount": "500" },
        { "id": "sale-4", "finalAmount": "300", "payments": [ { "id": "x1", "amount": 100 } ] }
    ]));
    let rows = standalone(json!([
        { "id": "s1", "paymentCode": "PAY-S1", "amount": "200", "saleId": "sale-3" },
        { "id": "s2", "paymentCode": "PAY-S2", "amount": "300", "saleId": "sale-4" },
        { "id": "s3", "paymentCode": "PAY-S3", "amount": "999", "saleId": "other" }
    ]));

    let result = PaymentReconciler::reconcile(&data, &rows);

    assert_eq!(result[0].tier, Some(PaymentOrigin::Standalone));
    assert_eq!(result[0].total_paid, d("200"));
    assert_eq!(result[0].settlement, SettlementStatus::Partial);

    assert_eq!(result[1].tier, Some(PaymentOrigin::SaleRows));
    assert_eq!(result[1].total_paid, d("100"));
}

#[test]
fn sale_without_any_payment_is_pending() {
    let data = sales(json!([{ "id": "sale-5", "finalAmount": "80.5" }]));
    let view = &PaymentReconciler::reconcile(&data, &[])[0];

    assert_eq!(view.tier, None);
    assert!(view.payments.is_empty());
    assert_eq!(view.remaining_amount, d("80.5"));
    assert_eq!(view.settlement, SettlementStatus::Pending);
}

#[test]
fn raw_payloads_accept_both_envelopes() {
    let bare = sale_with_both_representations().to_string();
    let wrapped = json!({ "sales": sale_with_both_representations() }).to_string();

    let from_bare = PaymentReconciler::reconcile_json(&bare, "[]").unwrap();
    let from_wrapped = PaymentReconciler::reconcile_json(&wrapped, "[]").unwrap();
    assert_eq!(from_bare, from_wrapped);

    assert!(PaymentReconciler::reconcile_json("not json", "[]").is_err());
}

#[test]
fn ledger_prefers_standalone_rows_and_skips_seen_summaries() {
    let data = sales(json!([
        { "id": "sale-1", "payment": { "id": "s1", "paymentCode": "PAY-S1", "amount": 10 } },
        { "id": "sale-2", "payment": { "id": "agg-2", "paymentCode": "PAY-A2", "amount": 40 } },
        { "id": "sale-3", "payment": { "id": "agg-3", "amount": 70 } }
    ]));
    let rows = standalone(json!([
        { "id": "s1", "paymentCode": "PAY-S1", "amount": 10, "saleId": "sale-1" },
        { "amount": 5 }
    ]));

    let ledger = PaymentReconciler::ledger(&rows, &data);
    let ids: Vec<_> = ledger.iter().map(|p| p.id.as_deref().unwrap()).collect();
    assert_eq!(ids, ["s1", "agg-2"]);
    assert_eq!(ledger[0].origin, PaymentOrigin::Standalone);
    assert_eq!(ledger[1].origin, PaymentOrigin::EmbeddedSummary);
    assert_eq!(ledger[1].sale_id.as_deref(), Some("sale-2"));
}

#[test]
fn reconciliation_is_idempotent() {
    let data = sales(sale_with_both_representations());
    let first = serde_json::to_string(&PaymentReconciler::reconcile(&data, &[])).unwrap();
    let second = serde_json::to_string(&PaymentReconciler::reconcile(&data, &[])).unwrap();
    assert_eq!(first, second);
}
