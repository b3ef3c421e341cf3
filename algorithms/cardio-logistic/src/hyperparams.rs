use crate::error::Error;
use crate::float::Float;
use crate::LogisticRegression;
use cardio::ParamGuard;
use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Checked hyperparameters of a two class logistic regression
///
/// The cost minimized by the solver is the negative log-likelihood of the training data plus
/// `alpha / 2` times the squared l2 norm of the coefficients. The intercept is not penalized.
/// Setting `alpha` to `1 / C` gives the objective of an inverse regularization strength `C`.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct LogisticRegressionValidParams<F, C> {
    alpha: F,
    fit_intercept: bool,
    max_iterations: u64,
    gradient_tolerance: F,
    phantom: PhantomData<C>,
}

impl<F: Float, C> LogisticRegressionValidParams<F, C> {
    pub fn alpha(&self) -> F {
        self.alpha
    }

    pub fn fit_intercept(&self) -> bool {
        self.fit_intercept
    }

    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    pub fn gradient_tolerance(&self) -> F {
        self.gradient_tolerance
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct LogisticRegressionParams<F, C>(LogisticRegressionValidParams<F, C>);

impl<F: Float, C> Default for LogisticRegressionParams<F, C> {
    fn default() -> LogisticRegressionParams<F, C> {
        LogisticRegressionParams::new()
    }
}

impl<F: Float, C: Ord + Clone> LogisticRegression<F, C> {
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> LogisticRegressionParams<F, C> {
        LogisticRegressionParams::new()
    }
}

impl<F: Float, C> LogisticRegressionParams<F, C> {
    /// `alpha = 1`, an intercept, at most 100 iterations and a gradient tolerance of `1e-4`
    pub fn new() -> LogisticRegressionParams<F, C> {
        Self(LogisticRegressionValidParams {
            alpha: F::cast(1.0),
            fit_intercept: true,
            max_iterations: 100,
            gradient_tolerance: F::cast(1e-4),
            phantom: PhantomData,
        })
    }

    /// Weight of the squared l2 norm of the coefficients in the cost
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Set the inverse regularization strength, equivalent to `alpha(1 / c)`
    pub fn c(self, c: F) -> Self {
        self.alpha(F::one() / c)
    }

    /// Fit an unpenalised intercept next to the coefficients
    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.0.fit_intercept = fit_intercept;
        self
    }

    /// Upper bound on the L-BFGS iterations
    pub fn max_iterations(mut self, max_iterations: u64) -> Self {
        self.0.max_iterations = max_iterations;
        self
    }

    /// The solver stops once the gradient norm falls below this value
    pub fn gradient_tolerance(mut self, gradient_tolerance: F) -> Self {
        self.0.gradient_tolerance = gradient_tolerance;
        self
    }
}

impl<F: Float, C> ParamGuard for LogisticRegressionParams<F, C> {
    type Checked = LogisticRegressionValidParams<F, C>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if !self.0.alpha.is_finite() || self.0.alpha < F::zero() {
            return Err(Error::InvalidAlpha(
                num_traits::ToPrimitive::to_f64(&self.0.alpha).unwrap_or(f64::NAN),
            ));
        }
        if !self.0.gradient_tolerance.is_finite() || self.0.gradient_tolerance <= F::zero() {
            return Err(Error::InvalidGradientTolerance);
        }
        if self.0.max_iterations == 0 {
            return Err(Error::InvalidMaxIterations);
        }

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_strength_sets_alpha() {
        let params = LogisticRegression::<f64, bool>::params().c(4.0);
        assert_eq!(params.check_ref().unwrap().alpha(), 0.25);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            LogisticRegression::<f64, bool>::params().alpha(-1.0).check(),
            Err(Error::InvalidAlpha(_))
        ));
        assert!(matches!(
            LogisticRegression::<f64, bool>::params().c(0.0).check(),
            Err(Error::InvalidAlpha(_))
        ));
        assert!(matches!(
            LogisticRegression::<f64, bool>::params()
                .gradient_tolerance(0.0)
                .check(),
            Err(Error::InvalidGradientTolerance)
        ));
        assert!(matches!(
            LogisticRegression::<f64, bool>::params()
                .max_iterations(0)
                .check(),
            Err(Error::InvalidMaxIterations)
        ));
    }
}
