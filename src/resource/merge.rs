//! JSON merge semantics for partial plan updates.
//!
//! A partial update body is merged onto the stored document:
//!
//! - objects merge member by member, recursively
//! - arrays and scalars replace the stored value
//! - `null` removes the member
//!
//! The merged document, not the partial body, is what goes through the schema
//! gate and into storage.

use serde_json::Value;

/// Merge `patch` into `target` in place.
///
/// A non-object patch replaces the target wholesale.
///
/// ```rust
/// use plan_server::resource::merge::merge_patch;
/// use serde_json::json;
///
/// let mut stored = json!({"planType": "inNetwork", "planCostShares": {"copay": 23, "deductible": 2000}});
/// merge_patch(&mut stored, &json!({"planCostShares": {"copay": 30}}));
/// assert_eq!(stored, json!({"planType": "inNetwork", "planCostShares": {"copay": 30, "deductible": 2000}}));
/// ```
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_members) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Default::default());
    }
    let Value::Object(target_members) = target else {
        return;
    };

    for (name, value) in patch_members {
        if value.is_null() {
            target_members.remove(name);
            continue;
        }
        let mut merged = target_members.remove(name).unwrap_or(Value::Null);
        merge_patch(&mut merged, value);
        target_members.insert(name.clone(), merged);
    }
}
