// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use gatekeeper_taskgen_core::task_namespace;
use gatekeeper_taskgen_model::{
    is_cluster_scoped_kind, Classification, ManifestRole, PromptContext, Resource, TaskArtifacts,
    TaskCase, TaskManifest, TaskMetadata,
};

use crate::constraint::{constraint_for_prompt, scope_constraint, ScopedConstraint};
use crate::error::SynthError;
use crate::logging::{SynthEvent, SynthLog, SynthStage};
use crate::normalize::{normalize_resource, NormalizationGate};
use crate::registry::NameRegistry;
use crate::rewrite::{is_admission_review, is_deployable, rewrite_manifest, RewriteContext};
use crate::yaml_docs::read_documents;

pub const ARTIFACTS_DIR: &str = "artifacts";
const TITLE_ANNOTATION: &str = "metadata.gatekeeper.sh/title";
const DESCRIPTION_ANNOTATION: &str = "description";

/// Everything one assembly produced, before descriptors are written.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub artifacts: TaskArtifacts,
    pub prompt: PromptContext,
    /// Template text, copied verbatim into the bundle.
    pub template_text: String,
    /// Constraint scoped to the task namespace.
    pub constraint: ScopedConstraint,
    pub events: Vec<SynthEvent>,
}

struct Assembler<'a> {
    task: &'a TaskMetadata,
    out_dir: &'a Path,
    namespace: String,
    gate: NormalizationGate,
    registry: NameRegistry,
    log: SynthLog,
    artifacts: TaskArtifacts,
    namespaces: BTreeSet<String>,
    next_resource: usize,
    next_alpha: usize,
    next_beta: usize,
    alpha_examples: Vec<String>,
    beta_examples: Vec<String>,
}

/// Materializes one task's manifests under `out_dir/artifacts`.
///
/// Only the leading document of each case object is under test. Inventory
/// documents keep their own names and are not registered.
pub fn assemble_task(task: &TaskMetadata, out_dir: &Path) -> Result<Assembly, SynthError> {
    let namespace = task_namespace(&task.task_id);
    let mut log = SynthLog::default();
    log.note(
        SynthStage::Prepare,
        "assemble.start",
        &[("task_id", task.task_id.as_str()), ("namespace", namespace.as_str())],
    );

    let artifacts_dir = out_dir.join(ARTIFACTS_DIR);
    fs::create_dir_all(&artifacts_dir).map_err(|e| SynthError::io(&artifacts_dir, e))?;

    let template_text = fs::read_to_string(&task.template_path)
        .map_err(|e| SynthError::io(&task.template_path, e))?;
    let (title, description) = template_annotations(&template_text);

    let constraint_raw = fs::read_to_string(&task.constraint_path)
        .map_err(|e| SynthError::io(&task.constraint_path, e))?;
    let constraint = scope_constraint(&constraint_raw, &namespace)
        .map_err(|e| SynthError::yaml(&task.constraint_path, e))?;
    log.note(
        SynthStage::Prepare,
        "constraint.scoped",
        &[
            ("kind", constraint.kind().unwrap_or_default()),
            ("note", constraint.note.as_str()),
        ],
    );

    let mut assembler = Assembler {
        task,
        out_dir,
        gate: constraint.gate(),
        namespaces: BTreeSet::from([namespace.clone()]),
        namespace,
        registry: NameRegistry::new(),
        log,
        artifacts: TaskArtifacts::default(),
        next_resource: 1,
        next_alpha: 1,
        next_beta: 1,
        alpha_examples: Vec::new(),
        beta_examples: Vec::new(),
    };
    for case in &task.cases {
        assembler.materialize_case(case)?;
    }

    let compliant = assembler.artifacts.count(ManifestRole::Compliant);
    let violating = assembler.artifacts.count(ManifestRole::Violating);
    if compliant == 0 || violating == 0 {
        return Err(SynthError::MissingManifests {
            compliant,
            violating,
        });
    }

    let mut prompt = PromptContext {
        task_id: task.task_id.clone(),
        title,
        description,
        template_yaml: template_text.clone(),
        constraint_yaml: constraint_for_prompt(&constraint_raw, &constraint),
        namespace: assembler.namespace.clone(),
        ..PromptContext::default()
    };
    assembler.finish(&mut prompt);
    let Assembler {
        artifacts, log, ..
    } = assembler;

    Ok(Assembly {
        artifacts,
        prompt,
        template_text,
        constraint,
        events: log.into_events(),
    })
}

fn template_annotations(text: &str) -> (String, String) {
    let Ok(docs) = crate::yaml_docs::parse_documents(text) else {
        return (String::new(), String::new());
    };
    let Some(template) = docs.first() else {
        return (String::new(), String::new());
    };
    (
        template
            .annotation(TITLE_ANNOTATION)
            .unwrap_or_default()
            .to_string(),
        template
            .annotation(DESCRIPTION_ANNOTATION)
            .unwrap_or_default()
            .trim()
            .to_string(),
    )
}

impl Assembler<'_> {
    fn materialize_case(&mut self, case: &TaskCase) -> Result<(), SynthError> {
        let docs = read_documents(&case.object_path)?;
        let Some(mut res) = docs.into_iter().next() else {
            self.log
                .note(SynthStage::Decode, "case.empty", &[("case", case.name.as_str())]);
            return Ok(());
        };
        if is_admission_review(&res) || !is_deployable(&res) {
            self.log.note(
                SynthStage::Decode,
                "case.dropped",
                &[("case", case.name.as_str()), ("kind", res.kind().unwrap_or_default())],
            );
            return Ok(());
        }

        let base = format!("resource-{:03}", self.next_resource);
        self.next_resource += 1;
        let kind = res.kind().unwrap_or_default().to_string();
        let (name, renamed) = self.registry.allocate(&kind, &self.namespace, &base)?;
        if renamed {
            self.log.note(
                SynthStage::Rewrite,
                "name.suffixed",
                &[("base", base.as_str()), ("name", name.as_str())],
            );
        }

        let role = ManifestRole::from(case.classification);
        self.rewrite(&mut res, &name, role);
        let file_name = match case.classification {
            Classification::Compliant => {
                self.next_alpha += 1;
                format!("alpha-{:02}.yaml", self.next_alpha - 1)
            }
            Classification::Violating => {
                self.next_beta += 1;
                format!("beta-{:02}.yaml", self.next_beta - 1)
            }
        };
        let text = self.persist(&res, &file_name, &case.name, role, &name)?;
        let examples = match case.classification {
            Classification::Compliant => &mut self.alpha_examples,
            Classification::Violating => &mut self.beta_examples,
        };
        if examples.len() < crate::prompt::MAX_PROMPT_EXAMPLES {
            examples.push(text);
        }
        self.artifacts
            .case_files
            .entry(case.name.clone())
            .or_default()
            .push(format!("{ARTIFACTS_DIR}/{file_name}"));

        for (i, inventory_path) in case.inventory.iter().enumerate() {
            for (j, mut doc) in read_documents(inventory_path)?.into_iter().enumerate() {
                let name = match doc.name() {
                    Some(name) if !name.is_empty() => name.to_string(),
                    _ => format!("inventory-{}-{i}-{j}", case.name),
                };
                self.rewrite(&mut doc, &name, ManifestRole::Inventory);
                let file_name = format!("inventory-{}-{i}-{j}.yaml", case.name);
                self.persist(&doc, &file_name, &case.name, ManifestRole::Inventory, &name)?;
                self.artifacts
                    .inventory_files
                    .entry(case.name.clone())
                    .or_default()
                    .push(format!("{ARTIFACTS_DIR}/{file_name}"));
            }
        }
        Ok(())
    }

    fn rewrite(&mut self, res: &mut Resource, name: &str, role: ManifestRole) {
        let ctx = RewriteContext {
            name,
            namespace: &self.namespace,
            task_id: &self.task.task_id,
            role,
        };
        rewrite_manifest(res, &ctx, self.gate);
        normalize_resource(res, self.gate);
        if let Some(ns) = res.namespace() {
            self.namespaces.insert(ns.to_string());
        }
    }

    fn persist(
        &mut self,
        res: &Resource,
        file_name: &str,
        case_name: &str,
        role: ManifestRole,
        name: &str,
    ) -> Result<String, SynthError> {
        let rel_path = format!("{ARTIFACTS_DIR}/{file_name}");
        let path = self.out_dir.join(&rel_path);
        let text = res
            .to_yaml_string()
            .map_err(|e| SynthError::encode(&rel_path, e))?;
        fs::write(&path, &text).map_err(|e| SynthError::io(&path, e))?;
        self.log.note(
            SynthStage::Persist,
            "manifest.written",
            &[("file", rel_path.as_str()), ("role", role.as_str())],
        );
        self.artifacts.manifests.push(TaskManifest {
            path,
            rel_path,
            case_name: case_name.to_string(),
            role,
            kind: res.kind().unwrap_or_default().to_string(),
            name: name.to_string(),
            namespace: res.namespace().map(str::to_string),
        });
        Ok(text)
    }

    fn finish(&mut self, prompt: &mut PromptContext) {
        self.artifacts.namespaces = self.namespaces.iter().cloned().collect();
        let mut namespaced = BTreeSet::new();
        let mut cluster = BTreeSet::new();
        for manifest in &self.artifacts.manifests {
            if manifest.kind.is_empty() {
                continue;
            }
            if is_cluster_scoped_kind(&manifest.kind) {
                cluster.insert(manifest.kind.clone());
            } else {
                namespaced.insert(manifest.kind.clone());
            }
        }
        prompt.namespaced_kinds = namespaced.into_iter().collect();
        prompt.cluster_kinds = cluster.into_iter().collect();
        prompt.alpha_examples = std::mem::take(&mut self.alpha_examples);
        prompt.beta_examples = std::mem::take(&mut self.beta_examples);
        self.log.note(
            SynthStage::Finalize,
            "assemble.complete",
            &[
                ("manifests", self.artifacts.manifests.len().to_string().as_str()),
                ("namespaces", self.artifacts.namespaces.join(",").as_str()),
            ],
        );
    }
}
