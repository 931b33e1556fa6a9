//! Shared test fixtures for the integration suites.
//!
//! Provides a realistic environment manifest (a service with APIs, nested
//! operations, products, backends, and an embedded policy body) plus the
//! grouping key the suites decompose it with.

use armature::manifest;
use serde_json::{json, Value};

/// An environment manifest resembling what a resource-fetching collaborator
/// plus the initial builder would hand to this core.
pub fn environment_manifest() -> Value {
    json!({
        "$schema": manifest::DEFAULT_SCHEMA,
        "contentVersion": "1.0.0.0",
        "parameters": {
            "serviceName": {"type": "string", "defaultValue": "contoso"},
            "backendUrl": {"type": "string", "defaultValue": "https://backend.example"},
            "publisherEmail": {"type": "string"}
        },
        "variables": {},
        "resources": [
            {
                "type": "Service",
                "name": "[parameters('serviceName')]",
                "properties": {"publisherEmail": "[parameters('publisherEmail')]"}
            },
            {
                "type": "Service/backends",
                "name": "[concat(parameters('serviceName'), '/', 'orders-backend')]",
                "properties": {"url": "[parameters('backendUrl')]"}
            },
            {
                "type": "Service/apis",
                "name": "[concat(parameters('serviceName'), '/', 'orders-api')]",
                "dependsOn": [
                    "[resourceId('Service/backends', parameters('serviceName'), 'orders-backend')]"
                ],
                "properties": {"path": "orders"},
                "resources": [
                    {
                        "type": "Service/apis/operations",
                        "name": "[concat(parameters('serviceName'), '/', 'orders-api', '/', 'list')]",
                        "properties": {
                            "method": "GET",
                            "responses": [
                                {"statusCode": 200, "representations": [
                                    {"contentType": "application/json"}
                                ]}
                            ]
                        }
                    }
                ]
            },
            {
                "type": "Service/apis/policies",
                "name": "[concat(parameters('serviceName'), '/', 'orders-api', '/', 'policy')]",
                "dependsOn": [
                    "[resourceId('Service/apis', parameters('serviceName'), 'orders-api')]"
                ],
                "properties": {"format": "xml", "value": "<policies><inbound/></policies>"}
            },
            {
                "type": "Service/products",
                "name": "[concat(parameters('serviceName'), '/', 'starter')]",
                "dependsOn": [
                    "[resourceId('Service/apis', parameters('serviceName'), 'orders-api')]"
                ],
                "properties": {"state": "published"}
            }
        ],
        "outputs": {}
    })
}

/// Grouping key used by the suites: the resource-type path itself, which
/// yields one unit per resource kind.
pub fn group_by_type(resource: &Value) -> String {
    manifest::resource_type(resource).to_string()
}
