// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

pub const SUITE_API_VERSION: &str = "test.gatekeeper.sh/v1alpha1";
pub const SUITE_KIND: &str = "Suite";
pub const SUITE_FILE_NAME: &str = "suite.yaml";

/// A gator test suite, as read from a policy library and as written into a
/// task bundle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuiteDefinition {
    #[serde(rename = "kind", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "apiVersion", default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub metadata: SuiteMetadata,
    #[serde(default)]
    pub tests: Vec<SuiteTest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuiteMetadata {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuiteTest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub constraint: String,
    #[serde(default)]
    pub cases: Vec<SuiteCase>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuiteCase {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub object: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub assertions: Vec<SuiteAssertion>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuiteAssertion {
    #[serde(default)]
    pub violations: Value,
}

impl SuiteAssertion {
    #[must_use]
    pub fn expecting(classification: Classification) -> Self {
        let marker = match classification {
            Classification::Compliant => "no",
            Classification::Violating => "yes",
        };
        Self {
            violations: Value::String(marker.to_string()),
        }
    }

    /// `true`, `"yes"` and any positive count all mean "violations present".
    #[must_use]
    pub fn signals_violation(&self) -> bool {
        match &self.violations {
            Value::Bool(flag) => *flag,
            Value::String(text) => text == "yes",
            Value::Number(count) => count.as_f64().is_some_and(|n| n > 0.0),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Compliant,
    Violating,
}

impl Classification {
    /// Reduces a case's assertions to one classification; `None` when the case
    /// carries no assertions at all.
    #[must_use]
    pub fn of_assertions(assertions: &[SuiteAssertion]) -> Option<Self> {
        if assertions.iter().any(SuiteAssertion::signals_violation) {
            Some(Self::Violating)
        } else if assertions.is_empty() {
            None
        } else {
            Some(Self::Compliant)
        }
    }

    /// Artifact file prefix: `alpha` for compliant, `beta` for violating.
    #[must_use]
    pub const fn artifact_prefix(self) -> &'static str {
        match self {
            Self::Compliant => "alpha",
            Self::Violating => "beta",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compliant => "compliant",
            Self::Violating => "violating",
        }
    }
}
