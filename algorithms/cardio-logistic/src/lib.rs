//! # Logistic Regression
//!
//! `cardio-logistic` provides a two class [logistic regression model](struct.LogisticRegression.html)
//! with l2 regularization, fitted by L-BFGS with a More-Thuente line search from `argmin`.
//!
//! The fitted model reports class probabilities through [`PredictProba`], so it can be ranked by
//! ROC AUC next to the tree based classifiers.

pub mod error;
mod float;
mod hyperparams;

use crate::error::{Error, Result};
use argmin::core::{CostFunction, Executor, Gradient};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use argmin_math::{
    ArgminAdd, ArgminDot, ArgminL1Norm, ArgminL2Norm, ArgminMinMax, ArgminMul, ArgminSignum,
    ArgminSub, ArgminZero,
};
use cardio::prelude::{AsTargets, DatasetBase};
use cardio::traits::{Fit, PredictInplace, PredictProba};
use ndarray::{s, Array1, Array2, ArrayBase, ArrayView2, Data, Ix2, Zip};
use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

pub use float::Float;
pub use hyperparams::{LogisticRegressionParams, LogisticRegressionValidParams};

/// A two-class logistic regression model.
///
/// Logistic regression combines linear models with
/// the sigmoid function `sigm(x) = 1/(1+exp(-x))`
/// to learn a family of functions that map the feature space to `[0,1]`.
///
/// The predicted value is interpreted as the probability that the sample belongs to the larger
/// of the two classes seen while fitting. Any ordered pair of labels can be used, for the
/// cardiovascular outcome these are `false` and `true`.
///
/// ## Examples
///
/// ```rust
/// use cardio::prelude::*;
/// use cardio_logistic::LogisticRegression;
/// use ndarray::array;
///
/// let dataset = Dataset::new(array![[-1.0], [-0.5], [0.5], [1.0]], array![false, false, true, true]);
/// let model = LogisticRegression::params().c(10.0).fit(&dataset).unwrap();
/// let proba = model.predict_proba(dataset.records());
/// assert!(proba[(3, 1)] > 0.5);
/// ```
pub struct LogisticRegression<F, C> {
    marker: PhantomData<(F, C)>,
}

impl<F, C, D, T> Fit<ArrayBase<D, Ix2>, T, Error> for LogisticRegressionValidParams<F, C>
where
    F: Float,
    C: Ord + Clone,
    D: Data<Elem = F>,
    T: AsTargets<Elem = C>,
    Array1<F>: ArgminAdd<Array1<F>, Array1<F>>
        + ArgminSub<Array1<F>, Array1<F>>
        + ArgminSub<F, Array1<F>>
        + ArgminAdd<F, Array1<F>>
        + ArgminMul<F, Array1<F>>
        + ArgminMul<Array1<F>, Array1<F>>
        + ArgminDot<Array1<F>, F>
        + ArgminL2Norm<F>
        + ArgminL1Norm<F>
        + ArgminSignum
        + ArgminMinMax,
    F: ArgminMul<Array1<F>, Array1<F>> + ArgminZero,
{
    type Object = FittedLogisticRegression<F, C>;

    /// Minimise the penalised negative log-likelihood of the records
    ///
    /// Fails unless the targets hold exactly two labels, one per record, and every record value
    /// is finite.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records();
        let (classes, target) = label_classes(dataset.targets().as_targets().iter())?;
        validate_data(x, &target)?;

        let problem = PenalisedLikelihood {
            x: x.view(),
            target,
            alpha: self.alpha(),
            fit_intercept: self.fit_intercept(),
        };
        let init_params = Array1::zeros(x.ncols() + self.fit_intercept() as usize);

        let linesearch = MoreThuenteLineSearch::new();
        let solver = LBFGS::new(linesearch, 10).with_tolerance_grad(self.gradient_tolerance())?;
        let mut result = Executor::new(problem, solver)
            .configure(|state| state.param(init_params).max_iters(self.max_iterations()))
            .run()?;

        let w = result.state.take_best_param().ok_or(Error::NoSolution)?;
        let (params, intercept) = convert_params(x.ncols(), &w);
        Ok(FittedLogisticRegression::new(intercept, params, classes))
    }
}

/// Sorted labels of `y` and the `±1` encoding of every sample, `+1` for the larger label
fn label_classes<'a, F, C>(y: impl Iterator<Item = &'a C> + Clone) -> Result<(Vec<C>, Array1<F>)>
where
    F: Float,
    C: 'a + Ord + Clone,
{
    let mut classes = y.clone().cloned().collect::<Vec<_>>();
    classes.sort();
    classes.dedup();
    if classes.len() != 2 {
        return Err(Error::WrongNumberOfClasses(classes.len()));
    }

    let target = y
        .map(|c| {
            if *c == classes[1] {
                F::POSITIVE_LABEL
            } else {
                F::NEGATIVE_LABEL
            }
        })
        .collect();

    Ok((classes, target))
}

/// One target per record, no infinite or missing values
fn validate_data<F: Float, A: Data<Elem = F>>(
    x: &ArrayBase<A, Ix2>,
    y: &Array1<F>,
) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(Error::MismatchedShapes(x.nrows(), y.len()));
    }
    if x.iter().any(|x| !x.is_finite()) {
        return Err(Error::InvalidValues);
    }
    Ok(())
}

/// Coefficients are the first `n_features` entries of `w`, an intercept, if any, comes last
fn convert_params<F: Float>(n_features: usize, w: &Array1<F>) -> (Array1<F>, F) {
    let params = w.slice(s![..n_features]).to_owned();
    let intercept = w.get(n_features).copied().unwrap_or_else(F::zero);
    (params, intercept)
}

/// Sigmoid
fn logistic<F: Float>(x: F) -> F {
    F::one() / (F::one() + (-x).exp())
}

/// `ln(sigmoid(x))` without overflowing `exp` for inputs of large magnitude
fn log_logistic<F: Float>(x: F) -> F {
    if x > F::zero() {
        -(F::one() + (-x).exp()).ln()
    } else {
        x - (F::one() + x.exp()).ln()
    }
}

/// Negative log-likelihood for labels in `{-1, 1}` plus `alpha / 2 * |params|^2`
///
/// With `z = x.params + intercept` the likelihood of a sample is `sigmoid(y * z)` for either
/// label.
fn logistic_loss<F: Float, A: Data<Elem = F>>(
    x: &ArrayBase<A, Ix2>,
    y: &Array1<F>,
    alpha: F,
    w: &Array1<F>,
) -> F {
    let (params, intercept) = convert_params(x.ncols(), w);
    let mut yz = (x.dot(&params) + intercept) * y;
    yz.mapv_inplace(log_logistic);
    -yz.sum() + F::cast(0.5) * alpha * params.dot(&params)
}

/// Derivative of [`logistic_loss`] with respect to every entry of `w`
fn logistic_grad<F: Float, A: Data<Elem = F>>(
    x: &ArrayBase<A, Ix2>,
    y: &Array1<F>,
    alpha: F,
    w: &Array1<F>,
) -> Array1<F> {
    let n_features = x.ncols();
    let (params, intercept) = convert_params(n_features, w);
    let mut yz = (x.dot(&params) + intercept) * y;
    yz.mapv_inplace(logistic);
    yz -= F::one();
    yz *= y;

    let mut grad = Array1::zeros(w.len());
    grad.slice_mut(s![..n_features])
        .assign(&(x.t().dot(&yz) + &(params * alpha)));
    if w.len() > n_features {
        grad[n_features] = yz.sum();
    }
    grad
}

/// Coefficients and intercept of a fitted two class logistic regression
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, PartialEq, Debug)]
pub struct FittedLogisticRegression<F, C> {
    threshold: F,
    intercept: F,
    params: Array1<F>,
    classes: Vec<C>,
}

impl<F: Float, C: Clone> FittedLogisticRegression<F, C> {
    fn new(intercept: F, params: Array1<F>, classes: Vec<C>) -> FittedLogisticRegression<F, C> {
        FittedLogisticRegression {
            threshold: F::cast(0.5),
            intercept,
            params,
            classes,
        }
    }

    /// Probability from which on `predict` returns the larger label, 0.5 unless changed
    pub fn set_threshold(mut self, threshold: F) -> Result<FittedLogisticRegression<F, C>> {
        if !(threshold >= F::zero() && threshold <= F::one()) {
            return Err(Error::InvalidThreshold(
                num_traits::ToPrimitive::to_f64(&threshold).unwrap_or(f64::NAN),
            ));
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub fn intercept(&self) -> F {
        self.intercept
    }

    pub fn params(&self) -> &Array1<F> {
        &self.params
    }

    /// The two classes seen while fitting, in ascending order
    pub fn classes(&self) -> &[C] {
        &self.classes
    }

    /// Probability of the larger label for every row of `x`
    pub fn predict_probabilities<A: Data<Elem = F>>(&self, x: &ArrayBase<A, Ix2>) -> Array1<F> {
        let mut probs = x.dot(&self.params) + self.intercept;
        probs.mapv_inplace(logistic);
        probs
    }
}

impl<F: Float, C: Clone, D: Data<Elem = F>> PredictProba<ArrayBase<D, Ix2>, F>
    for FittedLogisticRegression<F, C>
{
    /// Probabilities of the smaller and the larger class, in this column order
    fn predict_proba(&self, x: &ArrayBase<D, Ix2>) -> Array2<F> {
        let positive = self.predict_probabilities(x);
        let mut proba = Array2::zeros((x.nrows(), 2));
        Zip::from(proba.rows_mut())
            .and(&positive)
            .for_each(|mut row, &p| {
                row[0] = F::one() - p;
                row[1] = p;
            });
        proba
    }
}

impl<C: Clone + Default, F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<C>>
    for FittedLogisticRegression<F, C>
{
    /// Larger label where its probability reaches the threshold, smaller label elsewhere
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<C>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        assert_eq!(
            x.ncols(),
            self.params.len(),
            "Number of data features must match the number of features the model was trained with."
        );

        Zip::from(&self.predict_probabilities(x))
            .and(y)
            .for_each(|prob, out| {
                *out = if *prob >= self.threshold {
                    self.classes[1].clone()
                } else {
                    self.classes[0].clone()
                }
            });
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<C> {
        Array1::default(x.nrows())
    }
}

/// Objective handed to the `argmin` executor
struct PenalisedLikelihood<'a, F: Float> {
    x: ArrayView2<'a, F>,
    target: Array1<F>,
    alpha: F,
    fit_intercept: bool,
}

impl<'a, F: Float> CostFunction for PenalisedLikelihood<'a, F> {
    type Param = Array1<F>;
    type Output = F;

    fn cost(&self, p: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
        debug_assert_eq!(p.len(), self.x.ncols() + self.fit_intercept as usize);
        Ok(logistic_loss(&self.x, &self.target, self.alpha, p))
    }
}

impl<'a, F: Float> Gradient for PenalisedLikelihood<'a, F> {
    type Param = Array1<F>;
    type Gradient = Array1<F>;

    fn gradient(&self, p: &Self::Param) -> std::result::Result<Self::Param, argmin::core::Error> {
        Ok(logistic_grad(&self.x, &self.target, self.alpha, p))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::{assert_abs_diff_eq, AbsDiffEq};
    use cardio::prelude::{Dataset, Predict};
    use ndarray::array;

    fn ramp() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((10, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(10, |i| if i < 4 { -1.0 } else { 1.0 });
        (x, y)
    }

    #[test]
    fn loss_at_the_origin_is_n_log_two() {
        let (x, y) = ramp();
        for alpha in &[0.0, 1.0, 10.0] {
            let loss = logistic_loss(&x, &y, *alpha, &array![0.0, 0.0]);
            assert_abs_diff_eq!(loss, 10.0 * 2f64.ln(), epsilon = 1e-12);
        }
    }

    #[test]
    fn penalty_skips_the_intercept() {
        let (x, y) = ramp();
        let plain = logistic_loss(&x, &y, 0.0, &array![0.5, -2.0]);
        let penalised = logistic_loss(&x, &y, 4.0, &array![0.5, -2.0]);
        // alpha / 2 * 0.5^2, the intercept of -2 is not penalised
        assert_abs_diff_eq!(penalised - plain, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let (x, y) = ramp();
        let h = 1e-6;
        for w in &[array![0.0, 0.0], array![0.3, -1.2], array![-1.0, 2.0]] {
            for alpha in &[0.0, 2.5] {
                let grad = logistic_grad(&x, &y, *alpha, w);
                for k in 0..w.len() {
                    let mut up = w.clone();
                    let mut down = w.clone();
                    up[k] += h;
                    down[k] -= h;
                    let numeric = (logistic_loss(&x, &y, *alpha, &up)
                        - logistic_loss(&x, &y, *alpha, &down))
                        / (2.0 * h);
                    assert_abs_diff_eq!(grad[k], numeric, epsilon = 1e-4);
                }
            }
        }
    }

    #[test]
    fn log_logistic_is_stable_for_large_inputs() {
        assert_abs_diff_eq!(log_logistic(800.0), 0.0);
        assert_abs_diff_eq!(log_logistic(-800.0), -800.0);
        assert_abs_diff_eq!(log_logistic(0.0), -(2f64.ln()), epsilon = 1e-12);
    }

    #[test]
    fn simple_example_1() {
        let x = array![[-1.0], [-0.01], [0.01], [1.0]];
        let y = array![false, false, true, true];
        let dataset = Dataset::new(x, y);
        let res = LogisticRegression::params().fit(&dataset).unwrap();
        assert_abs_diff_eq!(res.intercept(), 0.0, epsilon = 1e-6);
        assert!(res.params().abs_diff_eq(&array![0.681], 1e-3));
        assert_eq!(&res.predict(dataset.records()), dataset.targets());
    }

    #[test]
    fn simple_example_2() {
        let x = array![
            [0.0],
            [1.0],
            [2.0],
            [3.0],
            [4.0],
            [5.0],
            [6.0],
            [7.0],
            [8.0],
            [9.0]
        ];
        let y = array![false, false, false, false, true, true, true, true, true, true];
        let dataset = Dataset::new(x, y);
        let res = LogisticRegression::params()
            .alpha(1.0)
            .fit(&dataset)
            .unwrap();
        // L-BFGS stops at a gradient norm of 1e-4, close to the optimum at -4.1262 and 1.1811
        assert!(res.intercept().abs_diff_eq(&-4.1262, 1e-3));
        assert!(res.params().abs_diff_eq(&array![1.1811], 1e-3));
        assert_eq!(&res.predict(dataset.records()), dataset.targets());
    }

    #[test]
    fn probabilities_follow_class_order() {
        let x = array![[0.01], [1.0], [-1.0], [-0.01]];
        let y = array![true, true, false, false];
        let dataset = Dataset::new(x, y);
        let res = LogisticRegression::params().fit(&dataset).unwrap();

        assert_eq!(res.classes(), &[false, true]);
        let proba = res.predict_proba(dataset.records());
        assert!(proba
            .column(1)
            .abs_diff_eq(&array![0.501, 0.664, 0.335, 0.498], 1e-3));
        for row in proba.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn threshold_moves_the_decision() {
        let x = array![[-1.0], [-0.01], [0.01], [1.0]];
        let dataset = Dataset::new(x, array![false, false, true, true]);
        let res = LogisticRegression::params().fit(&dataset).unwrap();

        let strict = res.clone().set_threshold(0.6).unwrap();
        assert_eq!(
            strict.predict(dataset.records()),
            array![false, false, false, true]
        );
        assert!(res.set_threshold(1.5).is_err());
    }

    #[test]
    fn regularization_shrinks_coefficients() {
        let x = array![[-2.0], [-1.0], [-0.5], [0.5], [1.0], [2.0]];
        let dataset = Dataset::new(x, array![false, false, true, false, true, true]);

        let weak = LogisticRegression::params().c(100.0).fit(&dataset).unwrap();
        let strong = LogisticRegression::params().c(0.01).fit(&dataset).unwrap();
        let (strong, weak): (f64, f64) = (strong.params()[0], weak.params()[0]);
        assert!(strong.abs() < weak.abs());
    }

    #[test]
    fn rejects_single_class() {
        let dataset = Dataset::new(array![[0.0], [1.0]], array![true, true]);
        let res = LogisticRegression::params().fit(&dataset);
        assert!(matches!(res, Err(Error::WrongNumberOfClasses(1))));
    }

    #[test]
    fn rejects_mismatching_targets() {
        let dataset = Dataset::new(array![[0.0], [1.0], [2.0]], array![false, true]);
        let res = LogisticRegression::<f64, bool>::params().fit(&dataset);
        assert!(matches!(res, Err(Error::MismatchedShapes(3, 2))));
    }

    #[test]
    fn rejects_nan_values() {
        let dataset = Dataset::new(array![[f64::NAN], [1.0]], array![false, true]);
        let res = LogisticRegression::params().fit(&dataset);
        assert!(matches!(res, Err(Error::InvalidValues)));
    }

    #[test]
    fn without_intercept() {
        let x = array![[-1.0], [-0.5], [0.5], [1.0]];
        let dataset = Dataset::new(x, array![false, false, true, true]);
        let res = LogisticRegression::params()
            .with_intercept(false)
            .fit(&dataset)
            .unwrap();
        assert_eq!(res.intercept(), 0.0);
        assert!(res.params()[0] > 0.0);
    }
}
