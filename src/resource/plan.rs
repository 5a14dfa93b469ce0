//! Typed plan documents.
//!
//! These types mirror the plan schema one-to-one. They are produced only after
//! a document has passed the schema gate, so deserialization here never has to
//! report field-level problems to clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cost-share record attached to a plan or to a linked service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostShares {
    pub deductible: i64,
    pub copay: i64,
    #[serde(rename = "_org")]
    pub org: String,
    #[serde(rename = "objectId")]
    pub object_id: String,
    #[serde(rename = "objectType")]
    pub object_type: String,
}

/// The service referenced by a linked plan service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedService {
    #[serde(rename = "_org")]
    pub org: String,
    #[serde(rename = "objectId")]
    pub object_id: String,
    #[serde(rename = "objectType")]
    pub object_type: String,
    pub name: String,
}

/// One entry of `linkedPlanServices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedPlanService {
    pub linked_service: LinkedService,
    pub planservice_cost_shares: CostShares,
    #[serde(rename = "_org")]
    pub org: String,
    pub object_id: String,
    pub object_type: String,
}

/// A plan resource.
///
/// Unknown top-level members are kept in `extra` so that a validated document
/// loses nothing on its way to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub plan_cost_shares: CostShares,
    pub linked_plan_services: Vec<LinkedPlanService>,
    #[serde(rename = "_org")]
    pub org: String,
    pub object_id: String,
    pub object_type: String,
    pub plan_type: String,
    pub creation_date: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Plan {
    pub fn object_id(&self) -> &str {
        &self.object_id
    }
}
