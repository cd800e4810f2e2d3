// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write as _;

use gatekeeper_taskgen_core::text::truncate;
use gatekeeper_taskgen_core::{GenerationError, GenerationRequest, TextGenerator};
use gatekeeper_taskgen_model::PromptContext;

pub const DEFAULT_PROMPT_MODEL: &str = "gemini-2.0-flash";
pub const CONSTRAINT_PROMPT_LIMIT: usize = 2000;
pub const EXAMPLE_PROMPT_LIMIT: usize = 1500;
pub const MAX_PROMPT_EXAMPLES: usize = 2;

const PREAMBLE: &str = "You are helping generate a task prompt for a Kubernetes policy compliance benchmark.

The benchmark tests whether an AI can identify policy-violating Kubernetes resources by inspecting a live cluster.
The AI being tested will use kubectl to examine deployed resources and determine which ones violate the policy.

Generate a clear, concise task prompt that:
1. Sounds like a real human request (first-person or direct ask), not a role-play instruction
2. Explains what policy is being enforced in natural language, keep it concise
3. Asks the AI to identify the violating resource names
4. Mentions which resource kinds to check (keep it brief and natural)

IMPORTANT: Do NOT mention resource naming conventions, alpha/beta patterns, or any hints about which resources are violating.
The AI must determine violations by examining the actual resource configurations, not by name patterns.

Required Output Format:
For each violating resource, the AI must print exactly one line:
VIOLATING: <resource name>

If there are namespaced resource kinds, the prompt MUST specify that the resources to be checked are in the provided Namespace.
If there are cluster-scoped kinds, the prompt MUST say to check those cluster-wide and must not imply everything is inside the namespace.
Do NOT use 'default' namespace unless the provided Namespace is 'default'.
Replace 'default' in the description with the provided Namespace if necessary.

Policy Information:
";

const CLOSING: &str = "
Generate only the task prompt text, nothing else. Do not include markdown formatting.
Do not mention anything about resource naming patterns or conventions.
The prompt should end with strict instructions to use the \"VIOLATING: <resource name>\" format for every violation found.";

/// Renders the meta-prompt asking a model to write one task's prompt.
#[must_use]
pub fn render_task_prompt(ctx: &PromptContext) -> String {
    let mut out = String::from(PREAMBLE);
    let mut field = |label: &str, value: &str| {
        if !value.is_empty() {
            let _ = writeln!(out, "{label}: {value}");
        }
    };
    field("Title", &ctx.title);
    field("Description", &ctx.description);
    field("Namespace", &ctx.namespace);
    field("NamespacedKinds", &ctx.namespaced_kinds.join(", "));
    field("ClusterKinds", &ctx.cluster_kinds.join(", "));

    if !ctx.constraint_yaml.is_empty() {
        let _ = write!(
            out,
            "\nConstraint Definition:\n```yaml\n{}\n```\n",
            truncate(&ctx.constraint_yaml, CONSTRAINT_PROMPT_LIMIT)
        );
    }
    for example in ctx.alpha_examples.iter().take(MAX_PROMPT_EXAMPLES) {
        let _ = write!(
            out,
            "\nExample COMPLIANT resource:\n```yaml\n{}\n```\n",
            truncate(example, EXAMPLE_PROMPT_LIMIT)
        );
    }
    for example in ctx.beta_examples.iter().take(MAX_PROMPT_EXAMPLES) {
        let _ = write!(
            out,
            "\nExample VIOLATING resource:\n```yaml\n{}\n```\n",
            truncate(example, EXAMPLE_PROMPT_LIMIT)
        );
    }
    out.push_str(CLOSING);
    out
}

/// Asks `generator` for the task prompt; blank output is an error.
pub fn generate_task_prompt(
    generator: &dyn TextGenerator,
    model: &str,
    ctx: &PromptContext,
) -> Result<String, GenerationError> {
    let meta_prompt = render_task_prompt(ctx);
    let text = generator.generate(GenerationRequest {
        model,
        prompt: &meta_prompt,
    })?;
    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(text.to_string())
}
