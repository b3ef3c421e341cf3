//! Utility functions for randomly generating patient cohorts

use cardio::error::{Error, Result};
use cardio::table::{Column, Table};
use ndarray_rand::rand::{seq::SliceRandom, Rng};
use ndarray_rand::rand_distr::StandardNormal;

use crate::codes::{Category, Cholesterol, Gender, Glucose, Level, PressureCategory};

/// Identifier column of the processed table
pub const ID_COLUMN: &str = "patient_id";
/// Outcome column of the processed table
pub const TARGET: &str = "flag_cardio_disease";

/// Columns of the processed patient table, in table order
pub const COLUMNS: [&str; 15] = [
    ID_COLUMN,
    "age_years",
    "gender",
    "height",
    "weight",
    "bmi",
    "systolic_pressure",
    "diastolic_pressure",
    "pressure_category",
    "cholesterol",
    "glucose",
    "flag_smoker",
    "flag_alcohol",
    "flag_active",
    TARGET,
];

fn normal(rng: &mut impl Rng, mean: f64, std: f64) -> f64 {
    mean + std * rng.sample::<f64, _>(StandardNormal)
}

fn round_to(x: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (x * scale).round() / scale
}

fn flag(rng: &mut impl Rng, p: f64) -> f64 {
    if rng.gen_bool(p.clamp(0.0, 1.0)) {
        1.0
    } else {
        0.0
    }
}

/// Draw a lab level, a positive outcome shifts the mass towards the higher levels
fn level(rng: &mut impl Rng, present: bool) -> Level {
    let (normal, above) = if present { (0.62, 0.2) } else { (0.82, 0.11) };
    let u: f64 = rng.gen();
    if u < normal {
        Level::Normal
    } else if u < normal + above {
        Level::AboveNormal
    } else {
        Level::WellAboveNormal
    }
}

/// Generate a synthetic processed patient table
///
/// The table holds the columns of [`COLUMNS`] with `n_patients` rows. Exactly
/// `round(n_patients * positive_rate)` rows have a positive outcome, their positions are
/// shuffled. Ages, pressures, weights and lab levels depend on the outcome, so classifiers can
/// learn a signal above chance.
pub fn cohort(n_patients: usize, positive_rate: f64, rng: &mut impl Rng) -> Result<Table> {
    if !(0.0..=1.0).contains(&positive_rate) {
        return Err(Error::Parameters(format!(
            "positive rate should be in [0, 1], but was {}",
            positive_rate
        )));
    }

    let npositive = (n_patients as f64 * positive_rate).round() as usize;
    let mut outcome = (0..n_patients).map(|idx| idx < npositive).collect::<Vec<_>>();
    outcome.shuffle(rng);

    let mut ids = Vec::with_capacity(n_patients);
    let mut age = Vec::with_capacity(n_patients);
    let mut gender = Vec::with_capacity(n_patients);
    let mut height = Vec::with_capacity(n_patients);
    let mut weight = Vec::with_capacity(n_patients);
    let mut bmi = Vec::with_capacity(n_patients);
    let mut systolic = Vec::with_capacity(n_patients);
    let mut diastolic = Vec::with_capacity(n_patients);
    let mut pressure = Vec::with_capacity(n_patients);
    let mut cholesterol = Vec::with_capacity(n_patients);
    let mut glucose = Vec::with_capacity(n_patients);
    let mut smoker = Vec::with_capacity(n_patients);
    let mut alcohol = Vec::with_capacity(n_patients);
    let mut active = Vec::with_capacity(n_patients);
    let mut target = Vec::with_capacity(n_patients);

    for (idx, present) in outcome.into_iter().enumerate() {
        let shift = if present { 1.0 } else { 0.0 };
        let is_male = rng.gen_bool(0.35);

        let h = normal(rng, if is_male { 170.0 } else { 161.0 }, 7.0).clamp(140.0, 200.0).round();
        let w = round_to(normal(rng, 70.0 + 5.0 * shift, 12.0).clamp(40.0, 180.0), 1);
        let sys = normal(rng, 120.0 + 14.0 * shift, 13.0).clamp(80.0, 220.0).round();
        let dia = normal(rng, 78.0 + 7.0 * shift, 8.0).clamp(50.0, 140.0).min(sys - 10.0).round();

        ids.push((idx + 1) as f64);
        age.push(normal(rng, 52.0 + 4.0 * shift, 6.5).clamp(30.0, 65.0).round());
        gender.push(
            if is_male { Gender::Male } else { Gender::Female }
                .as_str()
                .to_string(),
        );
        height.push(h);
        weight.push(w);
        bmi.push(round_to(w / (h / 100.0).powi(2), 2));
        systolic.push(sys);
        diastolic.push(dia);
        pressure.push(PressureCategory::from_pressures(sys, dia).as_str().to_string());
        cholesterol.push(Cholesterol(level(rng, present)).as_str().to_string());
        glucose.push(Glucose(level(rng, present)).as_str().to_string());
        smoker.push(flag(rng, if is_male { 0.2 } else { 0.03 }));
        alcohol.push(flag(rng, 0.05));
        active.push(flag(rng, 0.82 - 0.05 * shift));
        target.push(shift);
    }

    Table::from_columns(vec![
        (COLUMNS[0], Column::Numeric(ids)),
        (COLUMNS[1], Column::Numeric(age)),
        (COLUMNS[2], Column::Categorical(gender)),
        (COLUMNS[3], Column::Numeric(height)),
        (COLUMNS[4], Column::Numeric(weight)),
        (COLUMNS[5], Column::Numeric(bmi)),
        (COLUMNS[6], Column::Numeric(systolic)),
        (COLUMNS[7], Column::Numeric(diastolic)),
        (COLUMNS[8], Column::Categorical(pressure)),
        (COLUMNS[9], Column::Categorical(cholesterol)),
        (COLUMNS[10], Column::Categorical(glucose)),
        (COLUMNS[11], Column::Numeric(smoker)),
        (COLUMNS[12], Column::Numeric(alcohol)),
        (COLUMNS[13], Column::Numeric(active)),
        (COLUMNS[14], Column::Numeric(target)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cardio::features::FeatureSet;
    use ndarray_rand::rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn cohort_has_schema_and_rate() {
        let mut rng = SmallRng::seed_from_u64(42);
        let table = cohort(1000, 0.3, &mut rng).unwrap();

        assert_eq!(table.nrows(), 1000);
        assert_eq!(table.names(), &COLUMNS[..]);

        let outcome = table.binary(TARGET).unwrap();
        assert_eq!(outcome.iter().filter(|x| **x).count(), 300);

        let features = FeatureSet::classify(&table, ID_COLUMN, TARGET, "flag_").unwrap();
        assert_eq!(features.len(), 13);
        assert_eq!(features.categorical.len(), 7);
    }

    #[test]
    fn cohort_is_reproducible() {
        let a = cohort(50, 0.5, &mut SmallRng::seed_from_u64(1)).unwrap();
        let b = cohort(50, 0.5, &mut SmallRng::seed_from_u64(1)).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn categories_are_closed() {
        let table = cohort(200, 0.3, &mut SmallRng::seed_from_u64(5)).unwrap();

        for value in table.categorical("cholesterol").unwrap() {
            assert!(Cholesterol::VALUES.contains(&value.as_str()));
        }
        for value in table.categorical("pressure_category").unwrap() {
            assert!(PressureCategory::VALUES.contains(&value.as_str()));
        }
    }

    #[test]
    fn bmi_follows_height_and_weight() {
        let table = cohort(20, 0.3, &mut SmallRng::seed_from_u64(9)).unwrap();
        let height = table.numeric("height").unwrap();
        let weight = table.numeric("weight").unwrap();
        let bmi = table.numeric("bmi").unwrap();

        for i in 0..20 {
            assert_abs_diff_eq!(bmi[i], weight[i] / (height[i] / 100.0).powi(2), epsilon = 0.01);
        }
    }

    #[test]
    fn invalid_rate_is_rejected() {
        assert!(cohort(10, 1.5, &mut SmallRng::seed_from_u64(0)).is_err());
    }
}
