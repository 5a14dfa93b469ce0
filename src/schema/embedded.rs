//! The plan schema, embedded as a static string so the server needs no
//! schema files at runtime.

/// Returns the plan schema as a JSON string.
///
/// Every object level carries `_org`, `objectId` and `objectType`. Members not
/// listed here are permitted and preserved.
pub fn plan_schema() -> &'static str {
    r#"{
  "id": "urn:plan-server:schemas:Plan",
  "name": "Plan",
  "description": "Health plan with its cost shares and linked services",
  "attributes": [
    {
      "name": "planCostShares",
      "type": "complex",
      "multiValued": false,
      "required": true,
      "subAttributes": [
        { "name": "deductible", "type": "integer", "required": true },
        { "name": "_org", "type": "string", "required": true },
        { "name": "copay", "type": "integer", "required": true },
        { "name": "objectId", "type": "string", "required": true },
        { "name": "objectType", "type": "string", "required": true }
      ]
    },
    {
      "name": "linkedPlanServices",
      "type": "complex",
      "multiValued": true,
      "required": true,
      "subAttributes": [
        {
          "name": "linkedService",
          "type": "complex",
          "required": true,
          "subAttributes": [
            { "name": "_org", "type": "string", "required": true },
            { "name": "objectId", "type": "string", "required": true },
            { "name": "objectType", "type": "string", "required": true },
            { "name": "name", "type": "string", "required": true }
          ]
        },
        {
          "name": "planserviceCostShares",
          "type": "complex",
          "required": true,
          "subAttributes": [
            { "name": "deductible", "type": "integer", "required": true },
            { "name": "_org", "type": "string", "required": true },
            { "name": "copay", "type": "integer", "required": true },
            { "name": "objectId", "type": "string", "required": true },
            { "name": "objectType", "type": "string", "required": true }
          ]
        },
        { "name": "_org", "type": "string", "required": true },
        { "name": "objectId", "type": "string", "required": true },
        { "name": "objectType", "type": "string", "required": true }
      ]
    },
    { "name": "_org", "type": "string", "multiValued": false, "required": true },
    { "name": "objectId", "type": "string", "multiValued": false, "required": true },
    { "name": "objectType", "type": "string", "multiValued": false, "required": true },
    { "name": "planType", "type": "string", "multiValued": false, "required": true },
    { "name": "creationDate", "type": "string", "multiValued": false, "required": true }
  ]
}"#
}
