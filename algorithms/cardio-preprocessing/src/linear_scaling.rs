//! Standard scaling of numeric features

use crate::error::{PreprocessingError, Result};
use approx::abs_diff_eq;
use cardio::dataset::{DatasetBase, Records};
use cardio::traits::{Fit, Transformer};
use cardio::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2, Zip};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Standard scaler: learns the mean and standard deviation of every feature of a dataset,
/// producing a [fitted linear scaler](FittedLinearScaler) that applies them to other datasets.
///
/// The standard deviation is the population one, computed with zero degrees of freedom. A
/// constant feature keeps a scale of one, so it is only centered.
///
/// ### Example
///
/// ```rust
/// use cardio::traits::{Fit, Transformer};
/// use cardio::Dataset;
/// use cardio_preprocessing::LinearScaler;
/// use ndarray::array;
///
/// let dataset = Dataset::new(array![[1., 10.], [3., 10.]], array![true, false]);
/// let scaler = LinearScaler::standard().fit(&dataset).unwrap();
/// let scaled = scaler.transform(dataset.records().clone());
/// assert_eq!(scaled, array![[-1., 0.], [1., 0.]]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinearScaler;

impl LinearScaler {
    /// Centers every feature and scales it to unit variance
    pub fn standard() -> Self {
        LinearScaler
    }
}

impl<F: Float, D: Data<Elem = F>, T> Fit<ArrayBase<D, Ix2>, T, PreprocessingError>
    for LinearScaler
where
    ArrayBase<D, Ix2>: Records,
{
    type Object = FittedLinearScaler<F>;

    /// Learns the feature means and standard deviations, failing on a dataset without samples
    fn fit(&self, x: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        FittedLinearScaler::standard(x.records())
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
/// The result of fitting a [linear scaler](LinearScaler).
/// Scales datasets with the parameters learned during fitting.
pub struct FittedLinearScaler<F: Float> {
    offsets: Array1<F>,
    scales: Array1<F>,
}

impl<F: Float> FittedLinearScaler<F> {
    pub(crate) fn standard<D: Data<Elem = F>>(records: &ArrayBase<D, Ix2>) -> Result<Self> {
        if records.dim().0 == 0 {
            return Err(PreprocessingError::NotEnoughSamples);
        }
        let means = records
            .mean_axis(Axis(0))
            .ok_or(PreprocessingError::NotEnoughSamples)?;
        let scales = records.std_axis(Axis(0), F::zero()).mapv(|s| {
            // constant features are only centered
            if abs_diff_eq!(s, F::zero()) {
                F::one()
            } else {
                F::one() / s
            }
        });
        Ok(Self {
            offsets: means,
            scales,
        })
    }

    /// Array of size `n_features` that contains the offset that will be subtracted to each feature
    pub fn offsets(&self) -> &Array1<F> {
        &self.offsets
    }

    /// Array of size `n_features` that contains the scale that will be applied to each feature
    pub fn scales(&self) -> &Array1<F> {
        &self.scales
    }

    /// Scales a matrix with the fitted parameters
    pub fn try_transform(&self, x: Array2<F>) -> Result<Array2<F>> {
        if x.ncols() != self.offsets.len() {
            return Err(PreprocessingError::FeatureCount {
                expected: self.offsets.len(),
                actual: x.ncols(),
            });
        }

        Ok(self.transform(x))
    }
}

impl<F: Float> Transformer<Array2<F>, Array2<F>> for FittedLinearScaler<F> {
    /// Scales an array of size (nsamples, nfeatures) according to the scaler's `offsets` and
    /// `scales`. Panics if the shape of the input array is not compatible with the shape of the
    /// dataset used for fitting.
    fn transform(&self, x: Array2<F>) -> Array2<F> {
        if x.is_empty() {
            return x;
        }
        let mut x = x;
        Zip::from(x.columns_mut())
            .and(self.offsets())
            .and(self.scales())
            .for_each(|mut col, &offset, &scale| {
                col.mapv_inplace(|el| (el - offset) * scale);
            });
        x
    }
}
