// SPDX-License-Identifier: Apache-2.0

use gatekeeper_taskgen_core::TASK_LABEL;
use gatekeeper_taskgen_model::{ManifestRole, Resource, CLUSTER_SCOPED_KINDS};
use gatekeeper_taskgen_synth::{
    rewrite_manifest, NormalizationGate, RewriteContext, IMAGE_SUBSTITUTIONS,
    INIT_CONTAINER_EXITS,
};
use proptest::prelude::*;

fn table_images() -> Vec<String> {
    IMAGE_SUBSTITUTIONS
        .iter()
        .flat_map(|sub| [sub.from, sub.to])
        .chain(INIT_CONTAINER_EXITS.iter().map(|rule| rule.image_fragment))
        .chain(["openpolicyagent/opa:0.9"])
        .map(str::to_string)
        .collect()
}

fn image() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::sample::select(table_images()),
        "[a-z][a-z0-9:./-]{0,15}",
    ]
}

fn pod_with(containers: &[(bool, String)]) -> String {
    let mut main = String::new();
    let mut init = String::new();
    for (idx, (is_init, image)) in containers.iter().enumerate() {
        let entry = format!("  - name: c{idx}\n    image: '{image}'\n    args: [serve]\n");
        if *is_init {
            init.push_str(&entry);
        } else {
            main.push_str(&entry);
        }
    }
    let mut text = String::from("apiVersion: v1\nkind: Pod\nmetadata:\n  name: p\nspec:\n");
    if !init.is_empty() {
        text.push_str("  initContainers:\n");
        text.push_str(&init);
    }
    if !main.is_empty() {
        text.push_str("  containers:\n");
        text.push_str(&main);
    }
    text
}

fn context<'a>(name: &'a str, namespace: &'a str) -> RewriteContext<'a> {
    RewriteContext {
        name,
        namespace,
        task_id: "task-a",
        role: ManifestRole::Compliant,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn cluster_scoped_kinds_never_keep_a_namespace(
        kind in proptest::sample::select(CLUSTER_SCOPED_KINDS.to_vec()),
        original in proptest::option::of("[a-z]{1,10}"),
        namespace in "[a-z-]{0,12}",
    ) {
        let mut text = format!("apiVersion: v1\nkind: {kind}\nmetadata:\n  name: orig\n");
        if let Some(ns) = original {
            text.push_str(&format!("  namespace: {ns}\n"));
        }
        let mut res = Resource::from_yaml_str(&text).expect("resource");
        rewrite_manifest(&mut res, &context("resource-001", &namespace), NormalizationGate::ALL);
        prop_assert!(res.get(&["metadata", "namespace"]).is_none());
        prop_assert_eq!(res.name(), Some("resource-001"));
        prop_assert_eq!(res.label(TASK_LABEL), Some("task-a"));
    }

    #[test]
    fn namespaced_kinds_take_the_task_namespace(
        kind in prop_oneof![Just("Pod"), Just("Service"), Just("Role"), Just("Deployment")],
        namespace in "gk-[a-z]{1,10}",
    ) {
        let text = format!("apiVersion: v1\nkind: {kind}\nmetadata:\n  name: orig\n  namespace: default\n");
        let mut res = Resource::from_yaml_str(&text).expect("resource");
        rewrite_manifest(&mut res, &context("n", &namespace), NormalizationGate::ALL);
        prop_assert_eq!(res.namespace(), Some(namespace.as_str()));
    }

    #[test]
    fn rewriting_pods_is_idempotent_for_any_image_mix(
        containers in proptest::collection::vec((any::<bool>(), image()), 1..5),
    ) {
        let ctx = context("resource-003", "gk-t");
        let mut once = Resource::from_yaml_str(&pod_with(&containers)).expect("pod");
        rewrite_manifest(&mut once, &ctx, NormalizationGate::ALL);
        let mut twice = once.clone();
        rewrite_manifest(&mut twice, &ctx, NormalizationGate::ALL);
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn rewriting_twice_matches_rewriting_once() {
    let text = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: p\n  labels:\n    app: web\nspec:\n  initContainers:\n  - name: init\n    image: nginx:1.7.9\n    args: [serve]\n  containers:\n  - name: web\n    image: tomcat\n    resources:\n      requests:\n        cpu: 250m\n";
    let ctx = context("resource-007", "gk-t");
    let mut once = Resource::from_yaml_str(text).expect("pod");
    rewrite_manifest(&mut once, &ctx, NormalizationGate::ALL);
    let mut twice = once.clone();
    rewrite_manifest(&mut twice, &ctx, NormalizationGate::ALL);
    assert_eq!(once, twice);
    assert_eq!(once.label("app"), Some("web"));
}

#[test]
fn substituted_init_image_gets_its_exit_command_in_one_pass() {
    let text = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: p\nspec:\n  initContainers:\n  - name: init\n    image: tomcat\n  containers:\n  - name: web\n    image: nginx\n";
    let ctx = context("resource-008", "gk-t");
    let mut once = Resource::from_yaml_str(text).expect("pod");
    rewrite_manifest(&mut once, &ctx, NormalizationGate::ALL);
    let init = &once.get(&["spec", "initContainers"]).expect("init")[0];
    assert_eq!(init["image"].as_str(), Some("nginx"));
    let command: Vec<_> = init["command"]
        .as_sequence()
        .expect("command")
        .iter()
        .filter_map(|part| part.as_str())
        .collect();
    assert_eq!(command, ["sh", "-c", "exit 0"]);
    let mut twice = once.clone();
    rewrite_manifest(&mut twice, &ctx, NormalizationGate::ALL);
    assert_eq!(once, twice);
}

#[test]
fn resources_untouched_when_gate_is_closed() {
    let text = "kind: Pod\nspec:\n  containers:\n  - name: web\n    resources:\n      limits:\n        cpu: '2'\n";
    let mut res = Resource::from_yaml_str(text).expect("pod");
    let gate = NormalizationGate {
        resources: false,
        replicas: true,
    };
    rewrite_manifest(&mut res, &context("n", "gk-t"), gate);
    assert!(res.to_yaml_string().expect("yaml").contains("cpu: '2'"));
}
