// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthStage {
    Prepare,
    Decode,
    Rewrite,
    Persist,
    Finalize,
}

impl SynthStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Decode => "decode",
            Self::Rewrite => "rewrite",
            Self::Persist => "persist",
            Self::Finalize => "finalize",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynthEvent {
    pub stage: SynthStage,
    pub name: String,
    pub fields: BTreeMap<String, String>,
}

/// Stage event log for one bundle assembly. Every event is also forwarded to
/// `tracing` at debug level.
#[derive(Debug, Default, Clone)]
pub struct SynthLog {
    events: Vec<SynthEvent>,
}

impl SynthLog {
    pub fn emit(
        &mut self,
        stage: SynthStage,
        name: impl Into<String>,
        fields: BTreeMap<String, String>,
    ) {
        let name = name.into();
        tracing::debug!(stage = stage.as_str(), event = %name, fields = ?fields, "synth");
        self.events.push(SynthEvent {
            stage,
            name,
            fields,
        });
    }

    pub fn note(&mut self, stage: SynthStage, name: &str, pairs: &[(&str, &str)]) {
        let fields = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self.emit(stage, name, fields);
    }

    #[must_use]
    pub fn into_events(self) -> Vec<SynthEvent> {
        self.events
    }
}
