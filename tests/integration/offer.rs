//! Offer browsing scenarios.

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use betshop::engine::DEFAULT_TAKE_N;
use betshop::offer::OfferBrowser;

use crate::harness::seed_store;

#[tokio::test]
async fn browsing_shows_only_bettable_content() {
    let now = Utc::now();
    let store = seed_store(now);
    let browser = OfferBrowser::new(store);
    let cancel = CancellationToken::new();

    let events = browser
        .browse(now, None, 0, DEFAULT_TAKE_N, &cancel)
        .await
        .unwrap();

    // Event 10's fixture window has expired; everything else is listed.
    assert!(events.iter().all(|e| e.id != 10));
    assert_eq!(events.len(), 9);

    // Every offered outcome is inside its window and carries odds.
    for event in &events {
        for fixture in &event.fixtures {
            assert!(fixture.is_available(now));
            for market in &fixture.markets {
                for outcome in &market.outcomes {
                    assert!(outcome.is_bettable(now));
                }
            }
        }
    }

    // Event 1's unpriced outcome 13 is pruned.
    let event_1 = events.iter().find(|e| e.id == 1).unwrap();
    let outcome_ids: Vec<i32> = event_1.fixtures[0].markets[0]
        .outcomes
        .iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(outcome_ids, vec![11, 12]);
}

#[tokio::test]
async fn promoted_filter_splits_the_offer() {
    let now = Utc::now();
    let store = seed_store(now);
    let browser = OfferBrowser::new(store);
    let cancel = CancellationToken::new();

    let promoted = browser
        .browse(now, Some(true), 0, DEFAULT_TAKE_N, &cancel)
        .await
        .unwrap();
    assert_eq!(promoted.len(), 1);
    assert_eq!(promoted[0].id, 3);

    let regular = browser
        .browse(now, Some(false), 0, DEFAULT_TAKE_N, &cancel)
        .await
        .unwrap();
    assert!(regular.iter().all(|e| e.id != 3));
    assert_eq!(regular.len(), 8);
}

#[tokio::test]
async fn paging_respects_sort_order() {
    let now = Utc::now();
    let store = seed_store(now);
    let browser = OfferBrowser::new(store);
    let cancel = CancellationToken::new();

    let all = browser
        .browse(now, None, 0, DEFAULT_TAKE_N, &cancel)
        .await
        .unwrap();
    let first_page = browser.browse(now, None, 0, 3, &cancel).await.unwrap();
    let second_page = browser.browse(now, None, 3, 3, &cancel).await.unwrap();

    let all_ids: Vec<i32> = all.iter().map(|e| e.id).collect();
    let paged_ids: Vec<i32> = first_page
        .iter()
        .chain(second_page.iter())
        .map(|e| e.id)
        .collect();

    assert_eq!(&all_ids[..6], &paged_ids[..]);
}
