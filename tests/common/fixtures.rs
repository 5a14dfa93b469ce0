//! Plan documents used across the suite.

use serde_json::{Value, json};

pub const PLAN_ID: &str = "12xvxc345ssdsds-508";

/// A complete, schema-valid plan with one linked service.
pub fn valid_plan() -> Value {
    valid_plan_with_id(PLAN_ID)
}

pub fn valid_plan_with_id(object_id: &str) -> Value {
    json!({
        "planCostShares": {
            "deductible": 2000,
            "_org": "example.com",
            "copay": 23,
            "objectId": "1234vxc2324sdf-501",
            "objectType": "membercostshare"
        },
        "linkedPlanServices": [
            {
                "linkedService": {
                    "_org": "example.com",
                    "objectId": "1234520xvc30asdf-502",
                    "objectType": "service",
                    "name": "Yearly physical"
                },
                "planserviceCostShares": {
                    "deductible": 10,
                    "_org": "example.com",
                    "copay": 0,
                    "objectId": "1234512xvc1314asdfs-503",
                    "objectType": "membercostshare"
                },
                "_org": "example.com",
                "objectId": "27283xvx9asdff-504",
                "objectType": "planservice"
            }
        ],
        "_org": "example.com",
        "objectId": object_id,
        "objectType": "plan",
        "planType": "inNetwork",
        "creationDate": "12-12-2017"
    })
}

/// Second linked service, for replace and patch scenarios.
pub fn well_baby_service() -> Value {
    json!({
        "linkedService": {
            "_org": "example.com",
            "objectId": "1234520xvc30sfs-505",
            "objectType": "service",
            "name": "well baby"
        },
        "planserviceCostShares": {
            "deductible": 10,
            "_org": "example.com",
            "copay": 175,
            "objectId": "1234512xvc1314sdfsd-506",
            "objectType": "membercostshare"
        },
        "_org": "example.com",
        "objectId": "27283xvx9sdf-507",
        "objectType": "planservice"
    })
}

/// The valid plan with a different plan type.
pub fn out_of_network_plan() -> Value {
    let mut plan = valid_plan();
    plan["planType"] = json!("outOfNetwork");
    plan
}
