use serde_json::{json, Value};

use super::*;
use crate::testing::FakeShop;

fn items(n: usize) -> Vec<Value> {
    (0..n).map(|i| json!({"n": i})).collect()
}

#[tokio::test]
async fn clean_batch_is_one_call() {
    let shop = FakeShop::new();
    let outcome = upsert_isolating(&shop, "product", &items(10)).await;
    assert_eq!(outcome.uploaded, 10);
    assert!(outcome.rejected.is_empty());
    assert_eq!(shop.calls().len(), 1);
}

#[tokio::test]
async fn single_rejection_is_isolated_at_any_position() {
    for size in 1..=9 {
        for bad in 0..size {
            let shop = FakeShop::new().rejecting(move |item| item["n"] == bad);
            let outcome = upsert_isolating(&shop, "product", &items(size)).await;

            assert_eq!(outcome.uploaded, size - 1, "size {size}, bad {bad}");
            assert_eq!(
                outcome.rejected.iter().map(|r| r.index).collect::<Vec<_>>(),
                vec![bad],
                "size {size}, bad {bad}"
            );
        }
    }
}

#[tokio::test]
async fn bisection_processes_left_half_first() {
    let shop = FakeShop::new().rejecting(|item| item["n"] == 3);
    upsert_isolating(&shop, "product", &items(4)).await;

    let sent: Vec<Vec<u64>> = shop
        .calls()
        .into_iter()
        .map(|(_, payload)| payload.iter().map(|v| v["n"].as_u64().unwrap()).collect())
        .collect();
    assert_eq!(
        sent,
        vec![vec![0, 1, 2, 3], vec![0, 1], vec![2, 3], vec![2], vec![3]]
    );
}

#[tokio::test]
async fn rejection_reason_comes_from_the_shop() {
    let shop = FakeShop::new().rejecting(|item| item["n"] == 0);
    let outcome = upsert_isolating(&shop, "product", &items(1)).await;
    assert!(outcome.rejected[0].reason.contains("FAKE_REJECTED"));
}

#[tokio::test]
async fn every_item_failing_rejects_all() {
    let shop = FakeShop::new().rejecting(|_| true);
    let outcome = upsert_isolating(&shop, "product", &items(5)).await;
    assert_eq!(outcome.uploaded, 0);
    assert_eq!(
        outcome.rejected.iter().map(|r| r.index).collect::<Vec<_>>(),
        vec![0, 1, 2, 3, 4]
    );
}

#[tokio::test]
async fn empty_input_makes_no_calls() {
    let shop = FakeShop::new();
    let outcome = upsert_isolating::<_, Value>(&shop, "product", &[]).await;
    assert_eq!(outcome, BatchOutcome::default());
    assert!(shop.calls().is_empty());
}

#[tokio::test]
async fn uploader_signals_full_batch_and_returns_rejected_items() {
    let shop = FakeShop::new().rejecting(|item| item["n"] == 1);
    let mut uploader = BatchUploader::new("product", 3);

    assert!(!uploader.push(json!({"n": 0})));
    assert!(!uploader.push(json!({"n": 1})));
    assert!(uploader.push(json!({"n": 2})));

    let report = uploader.flush(&shop).await;
    assert_eq!(report.uploaded, 2);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].0, json!({"n": 1}));
    assert!(uploader.is_empty());
}

#[test]
fn zero_batch_size_is_clamped() {
    let mut uploader: BatchUploader<Value> = BatchUploader::new("product", 0);
    assert!(uploader.push(json!({})));
}
