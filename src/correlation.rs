//! Correlation analysis for dataset features

use std::fmt;

use ndarray::{Array2, ArrayBase, Axis, Data, Ix2};

use crate::dataset::{DatasetBase, Records};
use crate::error::{Error, Result};
use crate::Float;

/// Calculate the Pearson Correlation Coefficients from a dataset
///
/// The PCC describes the linear correlation between two variables. It is the covariance divided
/// by the product of the standard deviations, therefore normalized to [-1, 1]. A feature with
/// zero variance correlates with nothing, its coefficients are NaN.
fn pearson_correlation<F: Float, D: Data<Elem = F>>(data: &ArrayBase<D, Ix2>) -> Result<Array2<F>> {
    let nobservations = data.nrows();
    if nobservations < 2 {
        return Err(Error::NotEnoughSamples(format!(
            "correlation needs at least two observations, got {}",
            nobservations
        )));
    }

    let mean = data
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::NotEnoughSamples("empty records".to_string()))?;
    let denoised = data - &mean.insert_axis(Axis(0));
    let covariance = denoised.t().dot(&denoised) / F::cast(nobservations - 1);
    let std_deviation = covariance.diag().mapv(|x| x.sqrt());

    let mut coefficients = Array2::zeros(covariance.raw_dim());
    for ((i, j), coeff) in coefficients.indexed_iter_mut() {
        *coeff = if i == j {
            F::one()
        } else {
            covariance[(i, j)] / std_deviation[i] / std_deviation[j]
        };
    }

    Ok(coefficients)
}

/// Pearson correlation matrix of all features
pub struct PearsonCorrelation<F> {
    coefficients: Array2<F>,
    feature_names: Vec<String>,
}

impl<F: Float> PearsonCorrelation<F> {
    /// Calculate the Pearson Correlation Coefficients of all feature pairs
    pub fn from_dataset<D: Data<Elem = F>, T>(
        dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Self> {
        Ok(PearsonCorrelation {
            coefficients: pearson_correlation(dataset.records())?,
            feature_names: dataset.feature_names(),
        })
    }

    /// Full symmetric coefficient matrix with unit diagonal
    pub fn get_coeffs(&self) -> &Array2<F> {
        &self.coefficients
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Coefficient between two named features
    pub fn coefficient(&self, a: &str, b: &str) -> Option<F> {
        let i = self.feature_names.iter().position(|x| x == a)?;
        let j = self.feature_names.iter().position(|x| x == b)?;

        Some(self.coefficients[(i, j)])
    }
}

impl<F: Float> fmt::Display for PearsonCorrelation<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let longest = self.feature_names.iter().map(|x| x.len()).max().unwrap_or(0);

        for (i, name) in self.feature_names.iter().enumerate() {
            write!(f, "{:>width$}", name, width = longest)?;
            for j in 0..self.feature_names.len() {
                write!(f, " {:>6.3}", self.coefficients[(i, j)])?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl<F: Float, D: Data<Elem = F>, T> DatasetBase<ArrayBase<D, Ix2>, T>
where
    ArrayBase<D, Ix2>: Records,
{
    /// Calculate the Pearson Correlation Coefficients of all features
    pub fn pearson_correlation(&self) -> Result<PearsonCorrelation<F>> {
        PearsonCorrelation::from_dataset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dataset;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, concatenate, Array2, Axis};
    use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
    use rand::rngs::SmallRng;

    #[test]
    fn uniform_random() {
        let mut rng = SmallRng::seed_from_u64(42);
        let data = Array2::random_using((1000, 4), Uniform::new(-1., 1.), &mut rng);
        let dataset = Dataset::new(data, ndarray::Array1::<bool>::default(1000));

        let pcc = dataset.pearson_correlation().unwrap();
        for ((i, j), coeff) in pcc.get_coeffs().indexed_iter() {
            if i == j {
                assert_abs_diff_eq!(*coeff, 1.0);
            } else {
                assert_abs_diff_eq!(*coeff, 0.0, epsilon = 0.1);
            }
        }
    }

    #[test]
    fn perfectly_correlated() {
        let v = array![[1.0], [2.0], [3.0], [4.0]];
        let data = concatenate(Axis(1), &[v.view(), (&v * 2.0).view(), (-&v).view()]).unwrap();
        let dataset = Dataset::new(data, array![true, false, true, false])
            .with_feature_names(vec!["a", "b", "c"]);

        let pcc = dataset.pearson_correlation().unwrap();
        assert_abs_diff_eq!(pcc.coefficient("a", "b").unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pcc.coefficient("a", "c").unwrap(), -1.0, epsilon = 1e-12);
        assert!(pcc.coefficient("a", "z").is_none());
    }

    #[test]
    fn single_observation_is_rejected() {
        let dataset = Dataset::new(array![[1.0, 2.0]], array![true]);

        assert!(dataset.pearson_correlation().is_err());
    }
}
