//! JSON report: serialises results with `serde_json` rather than an
//! XML+RELAX-NG toolchain, sidestepping a RELAX-NG validation
//! implementation. Top-level sections mirror the OpenPSA report:
//! `information` (tool
//! version, time, settings, model summary) and `results`, which carries
//! zero or more of `sum_of_products`, `probability`, `importance`,
//! `uncertainty`, `curve`, `safety_integrity_levels`.
//!
//! This module only defines the wire shape and the renderers that turn
//! this crate's internal types (`sop::Expr`, `quantify::Importance`,
//! `montecarlo::UncertaintyResult`) into it; `scram-cli` is responsible
//! for populating `Information` and writing the file.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cutset::{BitLayout, CutSetMode};
use crate::model::ids::BasicEventId;
use crate::model::Model;
use crate::montecarlo::UncertaintyResult;
use crate::quantify::{Importance, ProbabilityResult, SilBand};
use crate::sop::Expr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub information: Information,
    pub results: Results,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Information {
    pub tool_version: String,
    pub generated_at: String,
    pub model_name: String,
    pub settings: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Results {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_of_products: Option<SumOfProductsReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<ProbabilityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<Vec<ImportanceEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<UncertaintyReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve: Option<Vec<CurvePoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_integrity_levels: Option<SilReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SumOfProductsReport {
    /// `"minimal-cut-sets"` or `"prime-implicants"`.
    pub mode: String,
    pub count: usize,
    /// One entry per product; complemented events are prefixed `"not "`.
    pub products: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbabilityReport {
    pub value: f64,
    pub approximation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceEntry {
    pub event: String,
    pub fussell_vesely: f64,
    pub birnbaum: f64,
    pub criticality: f64,
    pub raw: f64,
    pub rrw: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UncertaintyReport {
    pub mean_probability: f64,
    pub modes: Vec<ModeEntry>,
    pub importance: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeEntry {
    pub events: Vec<String>,
    pub count: u64,
    pub frequency: f64,
    pub std_error: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurvePoint {
    pub time: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SilReport {
    /// Band name (`"SIL4"`..`"SIL1"`, `"out-of-range"`) to fraction of
    /// mission time spent in it.
    pub fractions: HashMap<String, f64>,
}

fn event_name(model: &Model, bit: usize) -> String {
    let id = BasicEventId::new(BitLayout::event_of(bit) as u32);
    let name = &model.basic_events[id].id;
    if BitLayout::is_positive(bit) {
        name.clone()
    } else {
        format!("not {name}")
    }
}

pub fn render_sum_of_products(model: &Model, sop: &Expr, mode: CutSetMode) -> SumOfProductsReport {
    let products = sop
        .groups()
        .iter()
        .map(|g| g.bits().iter_ones().map(|bit| event_name(model, bit)).collect())
        .collect();
    SumOfProductsReport {
        mode: match mode {
            CutSetMode::MinimalCutSets => "minimal-cut-sets".to_string(),
            CutSetMode::PrimeImplicants => "prime-implicants".to_string(),
        },
        count: sop.count(),
        products,
    }
}

pub fn render_probability(result: &ProbabilityResult) -> ProbabilityReport {
    ProbabilityReport {
        value: result.value,
        approximation: match result.approximation {
            crate::quantify::Approximation::Exact => "exact".to_string(),
            crate::quantify::Approximation::RareEvent => "rare-event".to_string(),
            crate::quantify::Approximation::Mcub => "mcub".to_string(),
        },
        warning: result.warning.clone(),
    }
}

pub fn render_importance(model: &Model, importance: &HashMap<BasicEventId, Importance>) -> Vec<ImportanceEntry> {
    let mut entries: Vec<ImportanceEntry> = importance
        .iter()
        .map(|(id, imp)| ImportanceEntry {
            event: model.basic_events[*id].id.clone(),
            fussell_vesely: imp.fussell_vesely,
            birnbaum: imp.birnbaum,
            criticality: imp.criticality,
            raw: imp.raw,
            rrw: imp.rrw,
        })
        .collect();
    entries.sort_by(|a, b| b.fussell_vesely.partial_cmp(&a.fussell_vesely).unwrap_or(std::cmp::Ordering::Equal));
    entries
}

pub fn render_uncertainty(model: &Model, result: &UncertaintyResult) -> UncertaintyReport {
    let modes = result
        .modes
        .iter()
        .map(|m| ModeEntry {
            events: m.bits.iter_ones().map(|i| model.basic_events[BasicEventId::new(i as u32)].id.clone()).collect(),
            count: m.count,
            frequency: m.frequency,
            std_error: m.std_error,
        })
        .collect();
    let importance = result
        .importance
        .iter()
        .map(|(id, value)| (model.basic_events[*id].id.clone(), *value))
        .collect();
    UncertaintyReport { mean_probability: result.mean_probability, modes, importance }
}

pub fn render_curve(points: &[(f64, f64)]) -> Vec<CurvePoint> {
    points.iter().map(|&(time, probability)| CurvePoint { time, probability }).collect()
}

pub fn sil_band_name(band: SilBand) -> &'static str {
    match band {
        SilBand::BelowSil4 => "better-than-SIL4",
        SilBand::Sil4 => "SIL4",
        SilBand::Sil3 => "SIL3",
        SilBand::Sil2 => "SIL2",
        SilBand::Sil1 => "SIL1",
        SilBand::OutOfRange => "out-of-range",
    }
}

pub fn render_sil(fractions: &HashMap<SilBand, f64>) -> SilReport {
    SilReport { fractions: fractions.iter().map(|(band, frac)| (sil_band_name(*band).to_string(), *frac)).collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::BitSet;
    use crate::model::event::{BasicEvent, Role};
    use crate::sop::Group;

    fn model_with_two_events() -> Model {
        let mut model = Model::new("report-demo");
        let root = model.root;
        model.add_basic_event(root, BasicEvent { id: "PumpOne".into(), role: Role::Public, expression: None });
        model.add_basic_event(root, BasicEvent { id: "PumpTwo".into(), role: Role::Public, expression: None });
        model
    }

    #[test]
    fn renders_products_with_names_and_complements() {
        let model = model_with_two_events();
        let width = 4;
        let mut sop = Expr::create(width);
        sop.or_group(Group::new(BitSet::from_indices(width, [0, 3]))); // PumpOne, not PumpTwo
        let rendered = render_sum_of_products(&model, &sop, CutSetMode::PrimeImplicants);
        assert_eq!(rendered.count, 1);
        assert_eq!(rendered.products[0], vec!["PumpOne".to_string(), "not PumpTwo".to_string()]);
    }

    #[test]
    fn report_roundtrips_through_json() {
        let report = Report {
            information: Information {
                tool_version: "0.1.0".into(),
                generated_at: "2026-07-28T00:00:00Z".into(),
                model_name: "demo".into(),
                settings: serde_json::json!({"mission_time": 8760.0}),
            },
            results: Results::default(),
        };
        let text = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&text).unwrap();
        assert_eq!(back.information.model_name, "demo");
    }
}
