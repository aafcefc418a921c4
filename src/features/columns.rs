//! Fixed input vocabulary shared by the dataset, the encoder, and request validation.

/// Numeric age column.
pub const AGE: &str = "age";
/// Categorical gender column.
pub const GENDER: &str = "gender";
/// Categorical symptom-duration bucket column.
pub const PRIMARY_SYMPTOM_DURATION: &str = "primary_symptom_duration";

/// Fields every request must supply.
pub const MANDATORY_FIELDS: &[&str] = &[AGE, GENDER, PRIMARY_SYMPTOM_DURATION];

/// Columns expanded into one-hot indicators.
pub const CATEGORICAL_COLUMNS: &[&str] = &[GENDER, PRIMARY_SYMPTOM_DURATION];

/// Binary symptom flags, `0` when absent from a request.
pub const SYMPTOM_COLUMNS: &[&str] = &[
    "fever",
    "cough",
    "headache",
    "sore_throat",
    "fatigue",
    "body_ache",
    "runny_nose",
    "sneezing",
    "shortness_of_breath",
    "chills",
    "nausea",
    "vomiting",
    "diarrhea",
    "abdominal_pain",
    "joint_pain",
    "rash",
    "frequent_urination",
    "burning_sensation_urination",
    "back_pain",
    "excessive_thirst",
    "blurred_vision",
    "anxiety",
    "insomnia",
    "depression",
];

/// Every model input column in dataset order.
pub fn feature_columns() -> impl Iterator<Item = &'static str> {
    MANDATORY_FIELDS
        .iter()
        .chain(SYMPTOM_COLUMNS.iter())
        .copied()
}

pub fn is_categorical(column: &str) -> bool {
    CATEGORICAL_COLUMNS.contains(&column)
}

pub fn is_symptom(column: &str) -> bool {
    SYMPTOM_COLUMNS.contains(&column)
}
