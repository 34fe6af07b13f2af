//! Structured text reports of an assembly.
//!
//! Reports are plain text, not JSON, because they are meant to be read in
//! test failure output.

use std::fmt;

use crate::oracle::OracleVerdict;
use crate::workflow::AssemblyBuilder;

/// A complete assembly report with all sections.
pub struct AssemblyReport {
    pub base_model: String,
    pub part_entries: Vec<PartEntry>,
    pub open_points: Vec<String>,
    pub consumed_points: Vec<String>,
    pub oracle_results: Vec<OracleVerdict>,
}

/// A single placed part's report entry.
pub struct PartEntry {
    pub name: String,
    pub key: String,
    pub model: String,
    pub category: String,
    pub point: String,
    /// Harness name of the owning part, or `base`.
    pub owner: String,
    pub score: f64,
    pub degraded: bool,
    pub translation: [f64; 3],
    pub rotation_deg: f64,
}

impl AssemblyReport {
    /// Format the report as text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Carriage Assembly Report ===\n\n");
        out.push_str(&format!("Base: {}\n\n", self.base_model));

        let degraded = self.part_entries.iter().filter(|e| e.degraded).count();
        out.push_str(&format!(
            "Placed Parts ({} parts, {} degraded):\n",
            self.part_entries.len(),
            degraded,
        ));
        for entry in &self.part_entries {
            let flag = if entry.degraded { " [PLACEHOLDER]" } else { "" };
            out.push_str(&format!(
                "  \"{}\" {} ({}){}\n",
                entry.name, entry.key, entry.category, flag,
            ));
            out.push_str(&format!(
                "      on {} @ {} | score {:.3}\n",
                entry.owner, entry.point, entry.score,
            ));
            let [x, y, z] = entry.translation;
            out.push_str(&format!(
                "      at ({:.2}, {:.2}, {:.2}), turned {:.1} deg\n",
                x, y, z, entry.rotation_deg,
            ));
        }

        out.push_str(&format!("\nOpen Points ({}):\n", self.open_points.len()));
        for name in &self.open_points {
            out.push_str(&format!("  {}\n", name));
        }
        if !self.consumed_points.is_empty() {
            out.push_str(&format!("\nConsumed Points ({}):\n", self.consumed_points.len()));
            for name in &self.consumed_points {
                out.push_str(&format!("  {}\n", name));
            }
        }

        if !self.oracle_results.is_empty() {
            out.push_str(&format!(
                "\nOracle Results ({} checks):\n",
                self.oracle_results.len()
            ));
            for v in &self.oracle_results {
                let status = if v.passed { "PASS" } else { "FAIL" };
                out.push_str(&format!("  [{}] {}: {}\n", status, v.oracle_name, v.detail));
            }
        }

        out
    }

    pub fn all_passed(&self) -> bool {
        self.oracle_results.iter().all(|v| v.passed)
    }
}

impl fmt::Display for AssemblyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl AssemblyBuilder {
    /// Generate a complete assembly report.
    pub fn report(&self) -> AssemblyReport {
        let session = &self.session;
        let mut part_entries: Vec<PartEntry> = session
            .parts()
            .map(|(id, part)| PartEntry {
                name: self.name_of(id).unwrap_or_else(|| part.key.to_string()),
                key: part.key.to_string(),
                model: part.model.to_string(),
                category: part.category.to_string(),
                point: part.point.name.clone(),
                owner: part
                    .owner
                    .map(|o| self.name_of(o).unwrap_or_else(|| part.owner_key.to_string()))
                    .unwrap_or_else(|| "base".to_string()),
                score: part.score,
                degraded: part.degraded,
                translation: part.transform.translation.to_array(),
                rotation_deg: part.transform.rotation.angle().to_degrees(),
            })
            .collect();
        part_entries.sort_by(|a, b| a.key.cmp(&b.key));

        let label = |owner_key: &dyn fmt::Display, name: &str| format!("{owner_key}:{name}");
        let (consumed, open): (Vec<_>, Vec<_>) = session.points().partition(|p| p.consumed);

        AssemblyReport {
            base_model: session.base_model().to_string(),
            part_entries,
            open_points: open.iter().map(|p| label(&p.owner_key, &p.name)).collect(),
            consumed_points: consumed.iter().map(|p| label(&p.owner_key, &p.name)).collect(),
            oracle_results: self.check_all(),
        }
    }
}
