//! Static reference tables for the virtual lab: equipment, reagents and the
//! parameter templates the experimenter uses to make its numbers plausible.

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equipment {
    pub name: &'static str,
    pub specs: &'static [(&'static str, &'static str)],
    pub capabilities: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reagent {
    pub name: &'static str,
    /// g/mol
    pub molecular_weight: f64,
    pub solubility: &'static str,
    pub storage_temp_c: i32,
    pub function: &'static str,
}

/// Parameter ranges for one family of simulated measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BiologicalTemplate {
    /// Sigmoidal (Hill) dose-response.
    DoseResponse {
        name: &'static str,
        baseline: f64,
        max_response: f64,
        midpoint: (f64, f64),
        midpoint_label: &'static str,
        hill_coefficient: f64,
        variability: f64,
    },
    /// Michaelis-Menten kinetics.
    Kinetics {
        name: &'static str,
        km_mm: (f64, f64),
        vmax: (f64, f64),
        variability: f64,
    },
}

impl BiologicalTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DoseResponse { name, .. } | Self::Kinetics { name, .. } => name,
        }
    }
}

pub const EQUIPMENT: &[Equipment] = &[
    Equipment {
        name: "spectrophotometer",
        specs: &[("wavelength range", "200-800nm"), ("accuracy", "±1nm")],
        capabilities: &["absorbance", "transmittance", "kinetics"],
    },
    Equipment {
        name: "pcr_machine",
        specs: &[("temperature range", "4-100°C"), ("accuracy", "±0.1°C")],
        capabilities: &["pcr", "qpcr", "melting_curves"],
    },
    Equipment {
        name: "centrifuge",
        specs: &[("max speed", "15000rpm"), ("temperature range", "4-40°C")],
        capabilities: &["cell_pelleting", "protein_purification"],
    },
    Equipment {
        name: "incubator",
        specs: &[
            ("temperature range", "15-70°C"),
            ("humidity control", "yes"),
            ("CO2 control", "yes"),
        ],
        capabilities: &["cell_culture", "bacterial_growth"],
    },
    Equipment {
        name: "microscope",
        specs: &[
            ("magnification", "40x-1000x"),
            ("illumination", "brightfield, fluorescence"),
        ],
        capabilities: &["cell_counting", "morphology", "live_imaging"],
    },
];

pub const REAGENTS: &[Reagent] = &[
    Reagent {
        name: "IPTG",
        molecular_weight: 238.3,
        solubility: "water",
        storage_temp_c: -20,
        function: "protein expression inducer",
    },
    Reagent {
        name: "DMSO",
        molecular_weight: 78.13,
        solubility: "universal",
        storage_temp_c: 25,
        function: "solvent",
    },
    Reagent {
        name: "MTT",
        molecular_weight: 414.32,
        solubility: "water",
        storage_temp_c: -20,
        function: "viability dye",
    },
    Reagent {
        name: "ONPG",
        molecular_weight: 301.25,
        solubility: "water",
        storage_temp_c: -20,
        function: "enzyme substrate",
    },
];

pub const TEMPLATES: &[BiologicalTemplate] = &[
    BiologicalTemplate::DoseResponse {
        name: "protein_expression",
        baseline: 0.1,
        max_response: 10.0,
        midpoint: (0.5, 0.5),
        midpoint_label: "EC50 (mM IPTG)",
        hill_coefficient: 2.0,
        variability: 0.15,
    },
    BiologicalTemplate::DoseResponse {
        name: "cell_viability",
        baseline: 100.0,
        max_response: 95.0,
        midpoint: (10.0, 100.0),
        midpoint_label: "IC50 (µM)",
        hill_coefficient: 1.5,
        variability: 0.1,
    },
    BiologicalTemplate::Kinetics {
        name: "enzyme_kinetics",
        km_mm: (0.5, 5.0),
        vmax: (1.0, 10.0),
        variability: 0.08,
    },
];

pub fn equipment(name: &str) -> Option<&'static Equipment> {
    EQUIPMENT.iter().find(|e| e.name == name)
}

/// Reagent names are matched case-insensitively.
pub fn reagent(name: &str) -> Option<&'static Reagent> {
    REAGENTS.iter().find(|r| r.name.eq_ignore_ascii_case(name))
}

pub fn template(name: &str) -> Option<&'static BiologicalTemplate> {
    TEMPLATES.iter().find(|t| t.name() == name)
}

/// Render every table as plain text for use in a prompt.
pub fn reference_sheet() -> String {
    let mut out = String::from("Lab reference data\n\nEquipment:\n");

    // Writing to a String cannot fail.
    for e in EQUIPMENT {
        let specs: Vec<String> = e.specs.iter().map(|(k, v)| format!("{k} {v}")).collect();
        let _ = writeln!(
            out,
            "- {}: {}; capabilities: {}",
            e.name,
            specs.join(", "),
            e.capabilities.join(", ")
        );
    }

    out.push_str("\nReagents:\n");
    for r in REAGENTS {
        let _ = writeln!(
            out,
            "- {}: MW {} g/mol, soluble in {}, store at {}°C, {}",
            r.name, r.molecular_weight, r.solubility, r.storage_temp_c, r.function
        );
    }

    out.push_str("\nResponse templates:\n");
    for t in TEMPLATES {
        match t {
            BiologicalTemplate::DoseResponse {
                name,
                baseline,
                max_response,
                midpoint,
                midpoint_label,
                hill_coefficient,
                variability,
            } => {
                let midpoint = if midpoint.0 == midpoint.1 {
                    format!("{}", midpoint.0)
                } else {
                    format!("{}-{}", midpoint.0, midpoint.1)
                };
                let _ = writeln!(
                    out,
                    "- {name}: baseline {baseline}, max {max_response}, {midpoint_label} {midpoint}, \
                     Hill coefficient {hill_coefficient}, variability {:.0}%",
                    variability * 100.0
                );
            }
            BiologicalTemplate::Kinetics {
                name,
                km_mm,
                vmax,
                variability,
            } => {
                let _ = writeln!(
                    out,
                    "- {name}: Km {}-{} mM, Vmax {}-{} µmol/min/mg, variability {:.0}%",
                    km_mm.0,
                    km_mm.1,
                    vmax.0,
                    vmax.1,
                    variability * 100.0
                );
            }
        }
    }

    out
}
