//! Integration tests for the decomposition engine.
//!
//! ## Test Scenarios
//!
//! 1. End-to-end decomposition of a realistic environment manifest
//! 2. Round-trip dependency integrity: every externalized reference appears
//!    on the owning artifact and resurfaces as a master-link dependency
//! 3. Per-unit parameter subsets stay minimal
//! 4. Payload extraction to a sibling document
//! 5. The minimal two-resource `svc` / `svc/child` scenario

mod common;

use armature::decompose::{decompose, ArtifactContent, DecomposeOptions, ExtractRule};
use armature::expression;
use armature::manifest;
use common::{environment_manifest, group_by_type};
use serde_json::{json, Value};

#[test]
fn test_end_to_end_unit_partitioning() {
    let source = environment_manifest();
    let result = decompose(&source, group_by_type, &DecomposeOptions::default()).unwrap();

    assert!(result.warnings.is_empty());
    let dirs: Vec<&str> = result
        .units
        .iter()
        .map(|u| u.directory_path.as_str())
        .collect();
    assert_eq!(
        dirs,
        vec![
            "Service",
            "Service-backends",
            "Service-apis",
            "Service-apis-policies",
            "Service-products"
        ]
    );

    // Nested operations traveled with their API.
    let apis = result.units[2].manifest().unwrap();
    let nested = apis["resources"][0]["resources"].as_array().unwrap();
    assert_eq!(nested[0]["type"], "Service/apis/operations");
}

#[test]
fn test_round_trip_dependency_integrity() {
    let source = environment_manifest();
    let options = DecomposeOptions::default();
    let result = decompose(&source, group_by_type, &options).unwrap();

    // The API depended on the backend, which landed in another unit: the
    // reference moved from the resource onto the artifact.
    let apis = &result.units[2];
    assert_eq!(apis.external_dependencies.len(), 1);
    assert!(apis.external_dependencies[0].contains("orders-backend"));
    assert!(apis.manifest().unwrap()["resources"][0]
        .get("dependsOn")
        .is_none());

    // And resurfaced as a dependency between deployment links.
    let links = result.master["resources"].as_array().unwrap();
    let apis_link = links.iter().find(|l| l["name"] == "Service-apis").unwrap();
    let depends = apis_link["dependsOn"].as_array().unwrap();
    assert_eq!(
        depends[0],
        format!(
            "[resourceId('{}', 'Service-backends')]",
            options.link_resource_type
        )
    );

    // Policy and product both depend on the API's unit.
    for link_name in ["Service-apis-policies", "Service-products"] {
        let link = links.iter().find(|l| l["name"] == link_name).unwrap();
        let depends = link["dependsOn"].as_array().unwrap();
        assert_eq!(
            depends[0],
            format!("[resourceId('{}', 'Service-apis')]", options.link_resource_type)
        );
    }
}

#[test]
fn test_parameter_subsets_are_minimal() {
    let source = environment_manifest();
    let result = decompose(&source, group_by_type, &DecomposeOptions::default()).unwrap();

    let service_params = manifest::parameters(result.units[0].manifest().unwrap()).unwrap();
    assert!(service_params.contains_key("serviceName"));
    assert!(service_params.contains_key("publisherEmail"));
    assert!(!service_params.contains_key("backendUrl"));

    let backends_params = manifest::parameters(result.units[1].manifest().unwrap()).unwrap();
    assert!(backends_params.contains_key("backendUrl"));
    assert!(!backends_params.contains_key("publisherEmail"));
}

#[test]
fn test_invariant_parameters_reach_every_unit() {
    let source = environment_manifest();
    let options = DecomposeOptions {
        invariant_parameters: vec![(
            "location".to_string(),
            json!({"type": "string", "defaultValue": "westeurope"}),
        )],
        ..DecomposeOptions::default()
    };
    let result = decompose(&source, group_by_type, &options).unwrap();

    for unit in result.units.iter().filter(|u| u.is_manifest()) {
        let params = manifest::parameters(unit.manifest().unwrap()).unwrap();
        assert!(params.contains_key("location"), "{} misses it", unit.name);
    }
}

#[test]
fn test_policy_body_extraction() {
    let source = environment_manifest();
    let options = DecomposeOptions {
        extract_rules: vec![ExtractRule {
            resource_type: "Service/apis/policies".to_string(),
            payload_pointer: "/properties/value".to_string(),
            extension: "xml".to_string(),
        }],
        ..DecomposeOptions::default()
    };
    let result = decompose(&source, group_by_type, &options).unwrap();

    let document = result
        .units
        .iter()
        .find(|u| !u.is_manifest())
        .expect("extracted document");
    assert_eq!(document.name, "policy.xml");
    assert_eq!(document.directory_path, "Service-apis-policies");
    assert_eq!(
        document.content,
        ArtifactContent::Document("<policies><inbound/></policies>".to_string())
    );

    // The owning unit now references the document by computed path and
    // carries the path parameters.
    let policies = result
        .units
        .iter()
        .find(|u| u.directory_path == "Service-apis-policies" && u.is_manifest())
        .unwrap();
    let rewritten = policies.manifest().unwrap()["resources"][0]["properties"]["value"]
        .as_str()
        .unwrap();
    assert!(rewritten.contains("parameters('templateBaseUrl')"));
    assert!(rewritten.contains("/Service-apis-policies/policy.xml"));
    let params = manifest::parameters(policies.manifest().unwrap()).unwrap();
    assert!(params.contains_key("templateBaseUrl"));
    assert!(params.contains_key("templateSasToken"));
}

#[test]
fn test_minimal_two_resource_scenario() {
    let source = json!({
        "resources": [
            {"type": "svc", "name": "S"},
            {"type": "svc/child", "name": "S/C", "dependsOn": ["S"]}
        ]
    });
    let result = decompose(
        &source,
        |r: &Value| manifest::resource_type(r).to_string(),
        &DecomposeOptions::default(),
    )
    .unwrap();

    assert_eq!(result.units.len(), 2);
    assert_eq!(result.units[1].external_dependencies, vec!["S".to_string()]);

    let links = result.master["resources"].as_array().unwrap();
    assert_eq!(links.len(), 2);
    let child_depends = links[1]["dependsOn"].as_array().unwrap();
    assert_eq!(
        child_depends[0],
        "[resourceId('Microsoft.Resources/deployments', 'svc')]"
    );
}

#[test]
fn test_decomposition_is_idempotent_across_runs() {
    let source = environment_manifest();
    let first = decompose(&source, group_by_type, &DecomposeOptions::default()).unwrap();
    let second = decompose(&source, group_by_type, &DecomposeOptions::default()).unwrap();

    assert_eq!(first.units, second.units);
    assert_eq!(first.master, second.master);

    // Composed names kept their exact token sequence through the pipeline.
    let api_name = manifest::resource_name(
        &first.units[2].manifest().unwrap()["resources"][0],
    )
    .to_string();
    assert!(expression::names_equivalent(
        &api_name,
        "[concat(parameters('serviceName'), '/', 'orders-api')]"
    ));
}
