//! The fixed set of pre-written experiments.

use thiserror::Error;

/// A named experiment and the function that writes its description.
#[derive(Clone, Copy)]
pub struct CatalogEntry {
    pub name: &'static str,
    generator: fn() -> String,
}

impl CatalogEntry {
    /// The full experiment description handed to the pipeline.
    pub fn describe(&self) -> String {
        (self.generator)()
    }

    /// `drug_screening` -> `Drug Screening`
    pub fn title(&self) -> String {
        self.name
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }

    /// First non-empty line of the description.
    pub fn headline(&self) -> String {
        self.describe()
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

impl std::fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEntry").field("name", &self.name).finish()
    }
}

/// Lookup miss. The message lists every valid name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("experiment '{name}' not found; available experiments: {}", .available.join(", "))]
pub struct UnknownExperiment {
    pub name: String,
    pub available: Vec<&'static str>,
}

pub struct Catalog {
    entries: &'static [CatalogEntry],
}

impl Catalog {
    pub fn new() -> Self {
        Self { entries: ENTRIES }
    }

    pub fn get(&self, name: &str) -> Result<&CatalogEntry, UnknownExperiment> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| UnknownExperiment {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Names in catalog order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn entries(&self) -> &'static [CatalogEntry] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

const ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        name: "drug_screening",
        generator: drug_screening,
    },
    CatalogEntry {
        name: "protein_purification",
        generator: protein_purification,
    },
    CatalogEntry {
        name: "pcr_optimization",
        generator: pcr_optimization,
    },
    CatalogEntry {
        name: "cell_counting",
        generator: cell_counting,
    },
    CatalogEntry {
        name: "ph_optimization",
        generator: ph_optimization,
    },
];

fn drug_screening() -> String {
    "\
Screen potential anticancer compound XYZ-123 on HeLa cells:

Experimental Design:
- Cell line: HeLa (cervical cancer)
- Compound concentrations: 0.1, 1, 10, 50, 100, 500 μM
- Controls: DMSO vehicle control, Doxorubicin positive control (10 μM)
- Assay: MTT viability assay
- Time points: 24h and 48h treatment
- Replicates: n=6 per condition

Measurements:
- Cell viability percentage
- IC50 calculation
- Statistical analysis (ANOVA)
- Dose-response curves

Expected deliverables:
- IC50 values at both time points
- Dose-response graphs
- Statistical significance testing
- Recommendations for follow-up concentrations
"
    .to_string()
}

fn protein_purification() -> String {
    "\
Purify His-tagged recombinant protein from E. coli:

Experimental Steps:
1. Bacterial lysis (sonication buffer: 50mM Tris pH 7.5, 300mM NaCl)
2. Centrifugation (12,000g, 30min, 4°C)
3. Ni-NTA column purification
4. Wash steps (20mM imidazole)
5. Elution (250mM imidazole)
6. Buffer exchange (dialysis to PBS)

Analysis:
- SDS-PAGE at each step
- Bradford assay for protein concentration
- Western blot confirmation
- Activity assay (if enzyme)

Calculate:
- Protein yield at each step
- Purification fold
- Recovery percentage
- Purity assessment
"
    .to_string()
}

fn pcr_optimization() -> String {
    "\
Optimize PCR conditions for amplifying 1.2 kb gene fragment:

Variables to test:
- Annealing temperatures: 50°C, 55°C, 60°C, 65°C
- MgCl2 concentrations: 1.5mM, 2.0mM, 2.5mM, 3.0mM
- Primer concentrations: 0.2μM, 0.5μM, 1.0μM

PCR Protocol:
- Initial denaturation: 95°C, 5min
- 35 cycles: 95°C 30s, variable temp 30s, 72°C 90s
- Final extension: 72°C, 10min

Analysis:
- Agarose gel electrophoresis (1% gel)
- Band intensity measurement
- Product size verification
- Optimization matrix analysis

Output: Recommended optimal conditions
"
    .to_string()
}

fn cell_counting() -> String {
    "\
Monitor bacterial growth under different nutrient conditions:

Media conditions:
- Rich media (LB broth)
- Minimal media (M9 + glucose)
- Minimal media + amino acids
- Minimal media + vitamins
- Nutrient-limited media

Measurements:
- OD600 every 2 hours for 24 hours
- Viable cell counts (CFU/ml) at 8h, 16h, 24h
- pH measurements

Calculations:
- Growth rates (doubling time)
- Maximum cell density
- Lag time analysis
- Statistical comparison between conditions

Deliverables:
- Growth curves for each condition
- Growth parameter table
- Recommendations for optimal medium
"
    .to_string()
}

fn ph_optimization() -> String {
    "\
Determine optimal pH for enzyme activity:

Enzyme: β-galactosidase
pH range: 5.0, 5.5, 6.0, 6.5, 7.0, 7.5, 8.0, 8.5, 9.0

Buffer systems:
- pH 5.0-6.0: Acetate buffer (50mM)
- pH 6.5-7.5: Phosphate buffer (50mM)
- pH 8.0-9.0: Tris buffer (50mM)

Assay conditions:
- Substrate: ONPG (2mM)
- Enzyme concentration: 10 μg/ml
- Temperature: 37°C
- Reaction time: 10 minutes
- Detection: A420nm

Analysis:
- Activity vs pH curve
- Optimal pH determination
- Buffer compatibility assessment
- Temperature stability at optimal pH
"
    .to_string()
}
