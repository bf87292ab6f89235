use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::quantum::circuit::TemplateEntry;
use crate::quantum::gate::{QuantumGate, StandardGate};
use crate::synthesis::{SynthesisConfig, Synthesizer};
use super::{CompileError, Result};

/// Hand-supplied CNOT: H on the target on both sides of a CZ
pub fn cnot_decomposition() -> Vec<TemplateEntry> {
    vec![
        TemplateEntry::rz(1.57),
        TemplateEntry::rx(1.57),
        TemplateEntry::rz(1.57),
        TemplateEntry::Cz,
        TemplateEntry::rz(1.57),
        TemplateEntry::rx(1.57),
        TemplateEntry::rz(1.57),
    ]
}

/// Gate name → unbound decomposition, computed once per name and reused for every occurrence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecompositionTable {
    entries: BTreeMap<String, Vec<TemplateEntry>>,
}

impl DecompositionTable {
    pub fn new() -> Self {
        DecompositionTable::default()
    }

    /// Table holding only the hand-supplied CNOT decomposition
    pub fn with_defaults() -> Self {
        let mut table = DecompositionTable::new();
        table.insert(StandardGate::CNOT.name(), cnot_decomposition());
        table
    }

    pub fn get(&self, name: &str) -> Option<&[TemplateEntry]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn insert(&mut self, name: impl Into<String>, decomposition: Vec<TemplateEntry>) {
        self.entries.insert(name.into(), decomposition);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TemplateEntry])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Synthesize every gate in `gates` that has no entry yet.
    ///
    /// Each gate gets its own seed (`config.seed + position`), so the jobs run in
    /// parallel and the table is the same regardless of scheduling.
    pub fn populate(&mut self, gates: &[StandardGate], config: &SynthesisConfig) -> Result<()> {
        let missing: Vec<(usize, StandardGate)> = gates
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, gate)| !self.contains(&gate.name()))
            .collect();

        let synthesized: Vec<(String, Vec<TemplateEntry>)> = missing
            .par_iter()
            .map(|&(position, gate)| {
                let mut synthesizer = Synthesizer::new(config.with_seed(config.seed.wrapping_add(position as u64)));
                let wrap = |source| CompileError::Synthesis { gate: gate.name(), source };
                let synthesis = synthesizer.synthesize(&gate.matrix()).map_err(wrap)?;
                let entries = synthesis.entries().map_err(wrap)?;
                Ok((gate.name(), entries))
            })
            .collect::<Result<_>>()?;

        for (name, entries) in synthesized {
            info!("{} -> {}", name, format_entries(&entries));
            self.insert(name, entries);
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Space-separated entries, for log lines
pub fn format_entries(entries: &[TemplateEntry]) -> String {
    entries.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(" ")
}
