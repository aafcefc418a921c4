//! Treatment metadata attached to disease labels in the retained dataset.

use serde::Serialize;

use super::loader::{DatasetTable, RowView};

/// Placeholder for treatment fields the dataset leaves blank or omits.
pub const NOT_AVAILABLE: &str = "N/A";

const FIELD_SUFFIXES: [&str; 6] = [
    "medicine",
    "frequency",
    "meal_relation",
    "routine",
    "side_effects",
    "contraindications",
];

/// One treatment track (allopathic or ayurvedic).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentInfo {
    pub medicine_name: String,
    pub frequency: String,
    pub meal_relation: String,
    pub routine: String,
    pub side_effects: String,
    pub contraindications: String,
}

/// Both treatment tracks for a predicted disease.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentPlan {
    pub allopathic_treatment: TreatmentInfo,
    pub ayurvedic_treatment: TreatmentInfo,
}

impl TreatmentPlan {
    /// Treatment columns of the first row labeled `label`, or `None` when the label is absent.
    pub fn lookup(table: &DatasetTable, label: &str) -> Option<Self> {
        let row = table.first_row_for(label)?;
        Some(Self {
            allopathic_treatment: TreatmentInfo::from_row(&row, "allopathic"),
            ayurvedic_treatment: TreatmentInfo::from_row(&row, "ayurvedic"),
        })
    }
}

impl TreatmentInfo {
    fn from_row(row: &RowView<'_>, prefix: &str) -> Self {
        let [medicine, frequency, meal_relation, routine, side_effects, contraindications] =
            FIELD_SUFFIXES.map(|suffix| {
                row.cell(&format!("{prefix}_{suffix}"))
                    .unwrap_or(NOT_AVAILABLE)
                    .to_string()
            });
        Self {
            medicine_name: medicine,
            frequency,
            meal_relation,
            routine,
            side_effects,
            contraindications,
        }
    }
}
