// SPDX-License-Identifier: Apache-2.0

use gatekeeper_taskgen_model::{
    is_cluster_scoped_kind, Classification, ManifestRole, RepairResult, RepairStatus, Resource,
    SuiteAssertion, SuiteDefinition,
};
use proptest::prelude::*;
use serde_yaml::Value;

const SUITE: &str = r#"
kind: Suite
apiVersion: test.gatekeeper.sh/v1alpha1
metadata:
  name: requiredprobes
tests:
- name: required-probes
  template: template.yaml
  constraint: samples/constraint.yaml
  cases:
  - name: example-allowed
    object: samples/example_allowed.yaml
    assertions:
    - violations: no
  - name: example-disallowed
    object: samples/example_disallowed.yaml
    inventory:
    - samples/inventory.yaml
    assertions:
    - violations: 2
"#;

fn assertion(yaml: &str) -> SuiteAssertion {
    serde_yaml::from_str(yaml).expect("assertion")
}

#[test]
fn suite_definition_decodes_library_layout() {
    let suite: SuiteDefinition = serde_yaml::from_str(SUITE).expect("suite");
    assert_eq!(suite.metadata.name, "requiredprobes");
    assert_eq!(suite.tests.len(), 1);
    let test = &suite.tests[0];
    assert_eq!(test.constraint, "samples/constraint.yaml");
    assert_eq!(test.cases[1].inventory, vec!["samples/inventory.yaml"]);
    assert_eq!(
        Classification::of_assertions(&test.cases[0].assertions),
        Some(Classification::Compliant)
    );
    assert_eq!(
        Classification::of_assertions(&test.cases[1].assertions),
        Some(Classification::Violating)
    );
}

#[test]
fn violation_signals_cover_bool_string_and_count() {
    assert!(assertion("violations: yes").signals_violation());
    assert!(assertion("violations: \"yes\"").signals_violation());
    assert!(assertion("violations: true").signals_violation());
    assert!(assertion("violations: 1").signals_violation());
    assert!(assertion("violations: 0.5").signals_violation());
    assert!(!assertion("violations: false").signals_violation());
    assert!(!assertion("violations: 0").signals_violation());
    assert!(!assertion("violations: \"no\"").signals_violation());
    assert!(!assertion("{}").signals_violation());
}

#[test]
fn case_without_assertions_is_unclassifiable() {
    assert_eq!(Classification::of_assertions(&[]), None);
    let mixed = [assertion("violations: no"), assertion("violations: yes")];
    assert_eq!(
        Classification::of_assertions(&mixed),
        Some(Classification::Violating)
    );
}

#[test]
fn expecting_round_trips_through_signal() {
    assert!(SuiteAssertion::expecting(Classification::Violating).signals_violation());
    assert!(!SuiteAssertion::expecting(Classification::Compliant).signals_violation());
    assert_eq!(
        SuiteAssertion::expecting(Classification::Compliant).violations,
        Value::String("no".to_string())
    );
}

#[test]
fn roles_map_to_artifact_prefixes() {
    assert_eq!(ManifestRole::from(Classification::Compliant).as_str(), "alpha");
    assert_eq!(ManifestRole::from(Classification::Violating).as_str(), "beta");
    assert_eq!(ManifestRole::Inventory.classification(), None);
    assert_eq!(Classification::Violating.artifact_prefix(), "beta");
}

#[test]
fn resource_accessors_follow_metadata() {
    let mut res = Resource::from_yaml_str(
        "apiVersion: v1\nkind: Pod\nmetadata:\n  name: web\n  namespace: default\n  labels:\n    app: web\nspec:\n  containers: []\n",
    )
    .expect("pod");
    assert_eq!(res.kind(), Some("Pod"));
    assert_eq!(res.name(), Some("web"));
    assert_eq!(res.namespace(), Some("default"));
    assert_eq!(res.label("app"), Some("web"));
    assert!(res.spec().is_some());
    assert!(!res.is_cluster_scoped());

    res.set_label("team", "a");
    assert!(res.remove_label("app"));
    res.clear_namespace();
    assert_eq!(res.namespace(), None);
    assert_eq!(res.label("team"), Some("a"));
    assert!(res.pod_spec_mut().is_some());
}

#[test]
fn encoding_keeps_field_order() {
    let text = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cfg\ndata:\n  z: '1'\n  a: '2'\n";
    let res = Resource::from_yaml_str(text).expect("configmap");
    assert_eq!(res.to_yaml_string().expect("encode"), text);
}

#[test]
fn cluster_scoped_table_covers_rbac_and_storage() {
    for kind in ["ClusterRole", "Namespace", "StorageClass", "PersistentVolume"] {
        assert!(is_cluster_scoped_kind(kind), "{kind}");
    }
    for kind in ["Pod", "Role", "PersistentVolumeClaim", ""] {
        assert!(!is_cluster_scoped_kind(kind), "{kind}");
    }
}

#[test]
fn non_mapping_documents_are_not_resources() {
    assert!(Resource::from_value(Value::Null).is_none());
    assert!(Resource::from_value(Value::String("x".into())).is_none());
}

#[test]
fn repair_results_carry_status_strings() {
    let err = RepairResult::error("t", None, "boom");
    assert_eq!(err.status, RepairStatus::Error);
    assert_eq!(err.status.as_str(), "error");
    assert_eq!(err.error.as_deref(), Some("boom"));
    assert_eq!(RepairStatus::NoChanges.as_str(), "no_changes");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn positive_counts_always_violate(count in 1u32..10_000) {
        let a = assertion(&format!("violations: {count}"));
        prop_assert!(a.signals_violation());
    }

    #[test]
    fn set_name_is_observable(name in "[a-z][a-z0-9-]{0,30}") {
        let mut res = Resource::from_yaml_str("kind: Service\n").expect("svc");
        res.set_name(&name);
        prop_assert_eq!(res.name(), Some(name.as_str()));
    }
}
