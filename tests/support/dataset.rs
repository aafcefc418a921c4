#![allow(dead_code)]

use std::path::Path;

pub const HEADERS: &[&str] = &[
    "age",
    "gender",
    "primary_symptom_duration",
    "fever",
    "cough",
    "headache",
    "sore_throat",
    "runny_nose",
    "sneezing",
    "nausea",
    "joint_pain",
    "rash",
    "frequent_urination",
    "excessive_thirst",
    "prognosis",
    "allopathic_medicine",
    "allopathic_frequency",
    "ayurvedic_medicine",
];

/// Disease profile: label, active symptoms, duration bucket, medicine names.
struct Profile {
    label: &'static str,
    symptoms: &'static [&'static str],
    duration: &'static str,
    base_age: u32,
    allopathic: &'static str,
    ayurvedic: &'static str,
}

const PROFILES: &[Profile] = &[
    Profile {
        label: "Common Cold",
        symptoms: &["fever", "cough", "sore_throat", "runny_nose", "sneezing"],
        duration: "3-7 days",
        base_age: 20,
        allopathic: "Paracetamol",
        ayurvedic: "Tulsi tea",
    },
    Profile {
        label: "Migraine",
        symptoms: &["headache", "nausea"],
        duration: "1-2 days",
        base_age: 30,
        allopathic: "Sumatriptan",
        ayurvedic: "",
    },
    Profile {
        label: "Dengue",
        symptoms: &["fever", "headache", "joint_pain", "rash"],
        duration: "3-7 days",
        base_age: 25,
        allopathic: "",
        ayurvedic: "Papaya leaf extract",
    },
    Profile {
        label: "Diabetes",
        symptoms: &["frequent_urination", "excessive_thirst"],
        duration: "> 2 weeks",
        base_age: 50,
        allopathic: "Metformin",
        ayurvedic: "",
    },
];

fn csv_line(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| {
            if cell.contains(',') || cell.contains('"') {
                format!("\"{}\"", cell.replace('"', "\"\""))
            } else {
                cell.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn profile_row(profile: &Profile, idx: usize) -> Vec<String> {
    let gender = if idx % 2 == 0 { "Male" } else { "Female" };
    HEADERS
        .iter()
        .map(|column| match *column {
            "age" => (profile.base_age + (idx as u32 % 15)).to_string(),
            "gender" => gender.to_string(),
            "primary_symptom_duration" => profile.duration.to_string(),
            "prognosis" => profile.label.to_string(),
            "allopathic_medicine" => profile.allopathic.to_string(),
            "allopathic_frequency" => if profile.allopathic.is_empty() {
                String::new()
            } else {
                "Twice daily".to_string()
            },
            "ayurvedic_medicine" => profile.ayurvedic.to_string(),
            symptom => u8::from(profile.symptoms.contains(&symptom)).to_string(),
        })
        .collect()
}

/// CSV text with `rows_per_class` rows for each built-in disease profile, plus `extra` raw lines.
pub fn dataset_csv(rows_per_class: usize, extra: &[&str]) -> String {
    let mut lines = vec![HEADERS.join(",")];
    for idx in 0..rows_per_class {
        for profile in PROFILES {
            lines.push(csv_line(&profile_row(profile, idx)));
        }
    }
    lines.extend(extra.iter().map(|line| line.to_string()));
    lines.join("\n") + "\n"
}

pub fn write_dataset(path: &Path, rows_per_class: usize, extra: &[&str]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create dataset parent dirs");
    }
    std::fs::write(path, dataset_csv(rows_per_class, extra)).expect("write dataset csv");
}

/// A raw line for `label` with only `age`/`gender`/duration set and every symptom cleared.
pub fn sparse_line(label: &str) -> String {
    let mut cells = vec!["40".to_string(), "Male".to_string(), "1-2 days".to_string()];
    cells.extend(std::iter::repeat_n("0".to_string(), HEADERS.len() - 7));
    cells.push(label.to_string());
    cells.extend(std::iter::repeat_n(String::new(), 3));
    csv_line(&cells)
}
