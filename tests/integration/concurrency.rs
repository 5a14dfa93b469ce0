//! Racing writers.
//!
//! All writers on one key are serialized, so out of N clients holding the
//! same ETag exactly one commits. Writers on different keys never wait on
//! each other.

use crate::common::fixtures::{PLAN_ID, valid_plan, valid_plan_with_id};
use crate::common::{context, in_memory_provider};
use futures::future::join_all;
use plan_server::error::PlanError;
use plan_server::resource::Precondition;
use serde_json::json;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exactly_one_concurrent_replace_wins() {
    let provider = Arc::new(in_memory_provider());
    let created = provider
        .create(valid_plan(), None, &context("setup"))
        .await
        .unwrap()
        .into_created()
        .unwrap();
    let shared = Precondition::exact(created.version().clone());

    let writers = (0..10).map(|i| {
        let provider = Arc::clone(&provider);
        let shared = shared.clone();
        tokio::spawn(async move {
            let mut body = valid_plan();
            body["planCostShares"]["copay"] = json!(100 + i);
            provider
                .replace(
                    PLAN_ID,
                    body,
                    Some(&shared),
                    &context(&format!("writer-{}", i)),
                )
                .await
        })
    });

    let results: Vec<_> = join_all(writers)
        .await
        .into_iter()
        .map(|joined| joined.expect("writer task panicked"))
        .collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);

    let losers = results
        .iter()
        .filter(|r| matches!(r, Err(PlanError::PreconditionFailed(_))))
        .count();
    assert_eq!(losers, 9);

    // Every loser was told the winner's version.
    for result in &results {
        if let Err(PlanError::PreconditionFailed(conflict)) = result {
            assert_eq!(&conflict.current, winners[0].version());
        }
    }

    let stored = provider
        .read(PLAN_ID, None, &context("verify"))
        .await
        .unwrap()
        .into_found()
        .unwrap();
    assert_eq!(stored.version(), winners[0].version());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exactly_one_concurrent_create_wins() {
    let provider = Arc::new(in_memory_provider());

    let creators = (0..8).map(|i| {
        let provider = Arc::clone(&provider);
        tokio::spawn(async move {
            provider
                .create(valid_plan(), None, &context(&format!("creator-{}", i)))
                .await
        })
    });

    let results: Vec<_> = join_all(creators)
        .await
        .into_iter()
        .map(|joined| joined.expect("creator task panicked"))
        .collect();

    let created = results
        .iter()
        .filter(|r| matches!(r, Ok(outcome) if outcome.is_created()))
        .count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(PlanError::Conflict { .. })))
        .count();
    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_writers_on_different_plans_all_succeed() {
    let provider = Arc::new(in_memory_provider());
    let ids: Vec<String> = (0..16).map(|i| format!("plan-{:02}", i)).collect();

    let creators = ids.iter().cloned().map(|id| {
        let provider = Arc::clone(&provider);
        tokio::spawn(async move {
            provider
                .create(valid_plan_with_id(&id), None, &context(&id))
                .await
        })
    });
    for joined in join_all(creators).await {
        assert!(joined.unwrap().unwrap().is_created());
    }

    let patchers = ids.iter().cloned().map(|id| {
        let provider = Arc::clone(&provider);
        tokio::spawn(async move {
            provider
                .patch(
                    &id,
                    json!({"planType": "outOfNetwork"}),
                    Some(&Precondition::Any),
                    &context(&id),
                )
                .await
        })
    });
    for joined in join_all(patchers).await {
        joined.unwrap().unwrap();
    }

    let plans = provider.list(&context("list")).await.unwrap();
    assert_eq!(plans.len(), ids.len());
    assert!(plans.iter().all(|plan| plan["planType"] == "outOfNetwork"));
}
