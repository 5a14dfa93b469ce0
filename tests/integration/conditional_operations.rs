//! Conditional operations against the engine.
//!
//! The core guarantee: a writer holding a stale ETag can never overwrite a
//! newer plan, and a writer with no ETag at all is turned away.

use crate::common::fixtures::{PLAN_ID, out_of_network_plan, valid_plan, well_baby_service};
use crate::common::storage::FailingStorage;
use crate::common::{context, in_memory_provider, provider_with};
use plan_server::error::PlanError;
use plan_server::resource::{CreateOutcome, Precondition, RawVersion, ReadOutcome};
use plan_server::storage::StorageKey;
use plan_server::storage::StorageProvider;
use serde_json::{Value, json};

/// Two clients read the same version; only the first writer wins.
#[tokio::test]
async fn test_stale_writer_cannot_overwrite() {
    let provider = in_memory_provider();
    let ctx = context("stale-writer");

    let created = provider
        .create(valid_plan(), None, &ctx)
        .await
        .expect("create")
        .into_created()
        .expect("created");
    let seen_by_both = Precondition::exact(created.version().clone());

    let first = provider
        .replace(PLAN_ID, out_of_network_plan(), Some(&seen_by_both), &ctx)
        .await
        .expect("first writer succeeds");
    assert_ne!(first.version(), created.version());

    let mut second_body = valid_plan();
    second_body["linkedPlanServices"]
        .as_array_mut()
        .unwrap()
        .push(well_baby_service());

    match provider
        .replace(PLAN_ID, second_body, Some(&seen_by_both), &ctx)
        .await
    {
        Err(PlanError::PreconditionFailed(conflict)) => {
            assert_eq!(&conflict.current, first.version());
        }
        other => panic!("expected precondition failure, got {:?}", other),
    }

    // The first writer's plan survives untouched.
    let stored = provider
        .read(PLAN_ID, None, &ctx)
        .await
        .unwrap()
        .into_found()
        .unwrap();
    assert_eq!(stored.version(), first.version());
    assert_eq!(stored.to_json().unwrap()["planType"], "outOfNetwork");
}

#[tokio::test]
async fn test_replace_and_patch_require_if_match() {
    let provider = in_memory_provider();
    let ctx = context("missing-if-match");
    provider.create(valid_plan(), None, &ctx).await.unwrap();

    let replaced = provider.replace(PLAN_ID, out_of_network_plan(), None, &ctx).await;
    assert!(matches!(
        replaced,
        Err(PlanError::PreconditionMissing { ref object_id }) if object_id == PLAN_ID
    ));

    let patched = provider
        .patch(PLAN_ID, json!({"planType": "outOfNetwork"}), None, &ctx)
        .await;
    assert!(matches!(patched, Err(PlanError::PreconditionMissing { .. })));
}

#[tokio::test]
async fn test_missing_plan_wins_over_missing_precondition() {
    let provider = in_memory_provider();
    let ctx = context("missing-plan");

    let result = provider.replace("absent", valid_plan(), None, &ctx).await;
    assert!(matches!(result, Err(PlanError::NotFound { .. })));

    let result = provider
        .patch("absent", json!({}), Some(&Precondition::Any), &ctx)
        .await;
    assert!(matches!(result, Err(PlanError::NotFound { .. })));
}

#[tokio::test]
async fn test_wildcard_and_tag_lists() {
    let provider = in_memory_provider();
    let ctx = context("tag-lists");
    let created = provider
        .create(valid_plan(), None, &ctx)
        .await
        .unwrap()
        .into_created()
        .unwrap();

    // "*" matches whatever is stored.
    let after_wildcard = provider
        .replace(PLAN_ID, out_of_network_plan(), Some(&Precondition::Any), &ctx)
        .await
        .unwrap();

    // A list matches if any member matches.
    let list: Precondition = format!("\"stale\", {}", after_wildcard.etag())
        .parse()
        .unwrap();
    let after_list = provider
        .replace(PLAN_ID, valid_plan(), Some(&list), &ctx)
        .await
        .unwrap();

    // Back to the original body means back to the original ETag.
    assert_eq!(after_list.version(), created.version());

    // If-Match compares strongly: a weak copy of the current tag is refused.
    let weak = Precondition::parse_if_match(&format!("W/{}", after_list.etag())).unwrap();
    match provider
        .patch(PLAN_ID, json!({"planType": "outOfNetwork"}), Some(&weak), &ctx)
        .await
    {
        Err(PlanError::PreconditionFailed(conflict)) => {
            assert_eq!(&conflict.current, after_list.version());
        }
        other => panic!("expected precondition failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_patch_merges_and_revalidates() {
    let provider = in_memory_provider();
    let ctx = context("patch");
    let created = provider
        .create(valid_plan(), None, &ctx)
        .await
        .unwrap()
        .into_created()
        .unwrap();
    let current = Precondition::exact(created.version().clone());

    // Nested members merge; arrays are replaced wholesale; null removes.
    let patch = json!({
        "planCostShares": {"copay": 40},
        "linkedPlanServices": [well_baby_service()],
        "creationDate": null
    });
    let result = provider.patch(PLAN_ID, patch, Some(&current), &ctx).await;
    // creationDate is required, so removing it fails the gate as a whole.
    match result {
        Err(PlanError::Validation(errors)) => assert!(errors.has_path("creationDate")),
        other => panic!("expected validation failure, got {:?}", other),
    }

    let patch = json!({
        "planCostShares": {"copay": 40},
        "linkedPlanServices": [well_baby_service()],
        "notes": "merged"
    });
    let patched = provider
        .patch(PLAN_ID, patch, Some(&current), &ctx)
        .await
        .unwrap();
    let document: Value = patched.to_json().unwrap();

    assert_eq!(document["planCostShares"]["copay"], 40);
    assert_eq!(document["planCostShares"]["deductible"], 2000);
    assert_eq!(document["linkedPlanServices"].as_array().unwrap().len(), 1);
    assert_eq!(
        document["linkedPlanServices"][0]["linkedService"]["name"],
        "well baby"
    );
    assert_eq!(document["notes"], "merged");
    assert_eq!(document["creationDate"], "12-12-2017");
    assert_ne!(patched.version(), created.version());
}

#[tokio::test]
async fn test_failed_validation_leaves_store_untouched() {
    let provider = in_memory_provider();
    let ctx = context("untouched");
    let created = provider
        .create(valid_plan(), None, &ctx)
        .await
        .unwrap()
        .into_created()
        .unwrap();

    let mut invalid = valid_plan();
    invalid["planCostShares"]["copay"] = json!("twenty");
    let result = provider
        .replace(
            PLAN_ID,
            invalid,
            Some(&Precondition::exact(created.version().clone())),
            &ctx,
        )
        .await;
    match result {
        Err(PlanError::Validation(errors)) => {
            assert!(errors.has_path("planCostShares.copay"));
        }
        other => panic!("expected validation failure, got {:?}", other),
    }

    let stored = provider
        .storage()
        .get(&StorageKey::new("plan", PLAN_ID))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&RawVersion::from_content(&stored), created.version());
}

#[tokio::test]
async fn test_create_is_not_an_upsert() {
    let provider = in_memory_provider();
    let ctx = context("no-upsert");
    provider.create(valid_plan(), None, &ctx).await.unwrap();

    let result = provider.create(out_of_network_plan(), None, &ctx).await;
    assert!(matches!(result, Err(PlanError::Conflict { .. })));

    let stored = provider
        .read(PLAN_ID, None, &ctx)
        .await
        .unwrap()
        .into_found()
        .unwrap();
    assert_eq!(stored.to_json().unwrap()["planType"], "inNetwork");
}

#[tokio::test]
async fn test_create_with_matching_if_none_match() {
    let provider = in_memory_provider();
    let ctx = context("create-inm");
    let created = provider
        .create(valid_plan(), None, &ctx)
        .await
        .unwrap()
        .into_created()
        .unwrap();

    let outcome = provider
        .create(
            valid_plan(),
            Some(&Precondition::exact(created.version().clone())),
            &ctx,
        )
        .await
        .unwrap();
    assert!(matches!(outcome, CreateOutcome::NotModified));
}

#[tokio::test]
async fn test_conditional_read() {
    let provider = in_memory_provider();
    let ctx = context("conditional-read");
    let created = provider
        .create(valid_plan(), None, &ctx)
        .await
        .unwrap()
        .into_created()
        .unwrap();

    let fresh = Precondition::exact(created.version().clone());
    match provider.read(PLAN_ID, Some(&fresh), &ctx).await.unwrap() {
        ReadOutcome::NotModified(version) => assert_eq!(&version, created.version()),
        other => panic!("expected not modified, got {:?}", other),
    }

    let stale: Precondition = "\"something-else\"".parse().unwrap();
    let outcome = provider.read(PLAN_ID, Some(&stale), &ctx).await.unwrap();
    assert!(matches!(outcome, ReadOutcome::Found(_)));
}

#[tokio::test]
async fn test_delete_then_read_and_recreate() {
    let provider = in_memory_provider();
    let ctx = context("delete");
    let created = provider
        .create(valid_plan(), None, &ctx)
        .await
        .unwrap()
        .into_created()
        .unwrap();
    let held = Precondition::exact(created.version().clone());

    provider.delete(PLAN_ID, None, &ctx).await.unwrap();
    assert!(matches!(
        provider.read(PLAN_ID, None, &ctx).await,
        Err(PlanError::NotFound { .. })
    ));
    assert!(matches!(
        provider.delete(PLAN_ID, None, &ctx).await,
        Err(PlanError::NotFound { .. })
    ));

    // The last known ETag does not resurrect the plan.
    assert!(matches!(
        provider.replace(PLAN_ID, valid_plan(), Some(&held), &ctx).await,
        Err(PlanError::NotFound { .. })
    ));
    assert!(matches!(
        provider
            .patch(PLAN_ID, json!({"planType": "outOfNetwork"}), Some(&held), &ctx)
            .await,
        Err(PlanError::NotFound { .. })
    ));
    assert!(matches!(
        provider.delete(PLAN_ID, Some(&held), &ctx).await,
        Err(PlanError::NotFound { .. })
    ));
    let key = StorageKey::new("plan", PLAN_ID);
    assert!(!provider.storage().exists(&key).await.unwrap());

    // A deleted id is free again.
    let outcome = provider.create(valid_plan(), None, &ctx).await.unwrap();
    assert!(outcome.is_created());
}

#[tokio::test]
async fn test_list_returns_every_plan() {
    let provider = in_memory_provider();
    let ctx = context("list");

    assert!(matches!(
        provider.list(&ctx).await,
        Err(PlanError::NoPlans)
    ));

    for id in ["plan-a", "plan-b", "plan-c"] {
        provider
            .create(
                crate::common::fixtures::valid_plan_with_id(id),
                None,
                &ctx,
            )
            .await
            .unwrap();
    }

    let plans = provider.list(&ctx).await.unwrap();
    let ids: Vec<&str> = plans
        .iter()
        .map(|plan| plan["objectId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["plan-a", "plan-b", "plan-c"]);
}

#[tokio::test]
async fn test_store_failure_is_reported_not_hidden() {
    let provider = provider_with(FailingStorage);
    let ctx = context("failing-store");

    let create = provider.create(valid_plan(), None, &ctx).await;
    assert!(matches!(create, Err(PlanError::Store(ref e)) if e.is_unavailable()));

    let read = provider.read(PLAN_ID, None, &ctx).await;
    assert!(matches!(read, Err(PlanError::Store(_))));

    let list = provider.list(&ctx).await;
    assert!(matches!(list, Err(PlanError::Store(_))));
}

#[tokio::test]
async fn test_invalid_body_is_rejected_before_the_store() {
    // Validation runs first, so a broken store is never consulted.
    let provider = provider_with(FailingStorage);
    let ctx = context("gate-first");

    let result = provider.create(json!({"objectId": "x"}), None, &ctx).await;
    match result {
        Err(PlanError::Validation(errors)) => {
            assert!(errors.has_path("planCostShares"));
            assert!(errors.has_path("linkedPlanServices"));
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
}
