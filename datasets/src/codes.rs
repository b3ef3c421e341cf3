//! Closed category enumerations of the processed patient table
//!
//! Every derived categorical column accepts a fixed set of values. Raw codes outside of the known
//! range are not an error, they are mapped to the sentinel [`CHECK`] so that they stay visible
//! in later stages.
use cardio::table::Column;

/// Sentinel for raw codes without a known category
pub const CHECK: &str = "check";

/// A closed enumeration of category names
pub trait Category: Sized + Copy {
    /// Valid category names, the sentinel excluded
    const VALUES: &'static [&'static str];

    /// Map a raw numeric code
    fn from_code(code: f64) -> Option<Self>;

    fn as_str(&self) -> &'static str;
}

/// Decode a column of raw codes into category names
pub fn decode<C: Category>(codes: &[f64]) -> Column {
    Column::Categorical(
        codes
            .iter()
            .map(|code| {
                C::from_code(*code)
                    .map(|c| c.as_str())
                    .unwrap_or(CHECK)
                    .to_string()
            })
            .collect(),
    )
}

fn code_index(code: f64, n: usize) -> Option<usize> {
    if code.fract() == 0.0 && code >= 1.0 && code <= n as f64 {
        Some(code as usize - 1)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
}

impl Category for Gender {
    const VALUES: &'static [&'static str] = &["female", "male"];

    fn from_code(code: f64) -> Option<Self> {
        code_index(code, 2).map(|idx| [Gender::Female, Gender::Male][idx])
    }

    fn as_str(&self) -> &'static str {
        Self::VALUES[*self as usize]
    }
}

/// Three-level lab result shared by cholesterol and glucose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Normal,
    AboveNormal,
    WellAboveNormal,
}

impl Level {
    fn from_code(code: f64) -> Option<Self> {
        code_index(code, 3).map(|idx| [Level::Normal, Level::AboveNormal, Level::WellAboveNormal][idx])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cholesterol(pub Level);

impl Category for Cholesterol {
    const VALUES: &'static [&'static str] = &[
        "cholesterol_normal",
        "cholesterol_above_normal",
        "cholesterol_well_above_normal",
    ];

    fn from_code(code: f64) -> Option<Self> {
        Level::from_code(code).map(Cholesterol)
    }

    fn as_str(&self) -> &'static str {
        Self::VALUES[self.0 as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glucose(pub Level);

impl Category for Glucose {
    const VALUES: &'static [&'static str] = &[
        "glucose_normal",
        "glucose_above_normal",
        "glucose_well_above_normal",
    ];

    fn from_code(code: f64) -> Option<Self> {
        Level::from_code(code).map(Glucose)
    }

    fn as_str(&self) -> &'static str {
        Self::VALUES[self.0 as usize]
    }
}

/// Blood pressure category
///
/// Raw data either carries a label, see [`PressureCategory::from_label`], or the category is
/// derived from the measured pressures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureCategory {
    Normal,
    Elevated,
    HypertensionStage1,
    HypertensionStage2,
    HypertensiveCrisis,
}

impl PressureCategory {
    const LABELS: [&'static str; 5] = [
        "Normal",
        "Elevated",
        "Hypertension Stage 1",
        "Hypertension Stage 2",
        "Hypertensive Crisis",
    ];
    const ALL: [PressureCategory; 5] = [
        PressureCategory::Normal,
        PressureCategory::Elevated,
        PressureCategory::HypertensionStage1,
        PressureCategory::HypertensionStage2,
        PressureCategory::HypertensiveCrisis,
    ];

    /// Parse a raw category label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::LABELS
            .iter()
            .position(|x| *x == label.trim())
            .map(|idx| Self::ALL[idx])
    }

    /// Classify a systolic / diastolic measurement in mmHg
    pub fn from_pressures(systolic: f64, diastolic: f64) -> Self {
        if systolic > 180.0 || diastolic > 120.0 {
            PressureCategory::HypertensiveCrisis
        } else if systolic >= 140.0 || diastolic >= 90.0 {
            PressureCategory::HypertensionStage2
        } else if systolic >= 130.0 || diastolic >= 80.0 {
            PressureCategory::HypertensionStage1
        } else if systolic >= 120.0 {
            PressureCategory::Elevated
        } else {
            PressureCategory::Normal
        }
    }

    /// Decode raw labels, unknown labels become the sentinel
    pub fn decode_labels(labels: &[String]) -> Column {
        Column::Categorical(
            labels
                .iter()
                .map(|label| {
                    Self::from_label(label)
                        .map(|c| c.as_str())
                        .unwrap_or(CHECK)
                        .to_string()
                })
                .collect(),
        )
    }
}

impl Category for PressureCategory {
    const VALUES: &'static [&'static str] = &[
        "pressure_normal",
        "pressure_elevated",
        "hypertension_stage_1",
        "hypertension_stage_2",
        "hypertensive_crisis",
    ];

    fn from_code(code: f64) -> Option<Self> {
        code_index(code, 5).map(|idx| Self::ALL[idx])
    }

    fn as_str(&self) -> &'static str {
        Self::VALUES[*self as usize]
    }
}
