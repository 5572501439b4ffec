//! Soil type labels produced by the on-device classifier

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Soil type of one scan, fixed once the scan completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilTypeLabel {
    Alluvial,
    Black,
    Clay,
    Red,
    Sandy,
    Loam,
    Laterite,
    Yellow,
    Peaty,
    Chalky,
    /// Model output index outside the known classes
    Unknown,
    /// No image supplied with the scan
    #[serde(rename = "Not Scanned")]
    NotScanned,
    /// Model load or inference failed
    #[serde(rename = "Analysis Error")]
    AnalysisError,
}

/// Classifier output classes, in model output order
pub const CLASSIFIER_LABELS: [SoilTypeLabel; 10] = [
    SoilTypeLabel::Alluvial,
    SoilTypeLabel::Black,
    SoilTypeLabel::Clay,
    SoilTypeLabel::Red,
    SoilTypeLabel::Sandy,
    SoilTypeLabel::Loam,
    SoilTypeLabel::Laterite,
    SoilTypeLabel::Yellow,
    SoilTypeLabel::Peaty,
    SoilTypeLabel::Chalky,
];

impl SoilTypeLabel {
    /// Map a model output index to its label; out-of-range indices are `Unknown`
    pub fn from_class_index(index: usize) -> Self {
        CLASSIFIER_LABELS
            .get(index)
            .copied()
            .unwrap_or(SoilTypeLabel::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilTypeLabel::Alluvial => "Alluvial",
            SoilTypeLabel::Black => "Black",
            SoilTypeLabel::Clay => "Clay",
            SoilTypeLabel::Red => "Red",
            SoilTypeLabel::Sandy => "Sandy",
            SoilTypeLabel::Loam => "Loam",
            SoilTypeLabel::Laterite => "Laterite",
            SoilTypeLabel::Yellow => "Yellow",
            SoilTypeLabel::Peaty => "Peaty",
            SoilTypeLabel::Chalky => "Chalky",
            SoilTypeLabel::Unknown => "Unknown",
            SoilTypeLabel::NotScanned => "Not Scanned",
            SoilTypeLabel::AnalysisError => "Analysis Error",
        }
    }

    /// True when the label names an actual soil class
    pub fn is_classified(&self) -> bool {
        CLASSIFIER_LABELS.contains(self)
    }
}

impl fmt::Display for SoilTypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoilTypeLabel {
    type Err = String;

    /// Case-insensitive; a trailing " Soil" is ignored ("Black Soil" -> Black)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lowered = trimmed.to_ascii_lowercase();
        let name = lowered.strip_suffix(" soil").unwrap_or(&lowered);

        let terminal = [
            SoilTypeLabel::Unknown,
            SoilTypeLabel::NotScanned,
            SoilTypeLabel::AnalysisError,
        ];
        let found = CLASSIFIER_LABELS
            .iter()
            .chain(terminal.iter())
            .find(|label| label.as_str().eq_ignore_ascii_case(name))
            .copied();

        found
            .ok_or_else(|| format!("Unknown soil type label: {}", trimmed))
    }
}
