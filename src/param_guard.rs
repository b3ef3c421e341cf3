use std::error::Error;

use crate::{
    dataset::{DatasetBase, Records},
    traits::Fit,
};

/// Builder of hyperparameters which are validated before use
///
/// Estimators implement [`Fit`] on the `Checked` type only. The blanket implementation below
/// lets the unchecked builder be fitted directly, validating it first. `check_ref` and `check`
/// must apply the same rules.
pub trait ParamGuard {
    type Checked;
    /// Reported for invalid settings
    type Error: Error;

    /// Validate and borrow the checked settings
    fn check_ref(&self) -> Result<&Self::Checked, Self::Error>;

    /// Validate and take the checked settings
    fn check(self) -> Result<Self::Checked, Self::Error>;
}

/// Fit after validation, a failed check surfaces as the estimator's error type
impl<R: Records, T, E, P: ParamGuard> Fit<R, T, E> for P
where
    P::Checked: Fit<R, T, E>,
    E: Error + From<crate::error::Error> + From<P::Error>,
{
    type Object = <<P as ParamGuard>::Checked as Fit<R, T, E>>::Object;

    fn fit(&self, dataset: &DatasetBase<R, T>) -> Result<Self::Object, E> {
        let checked = self.check_ref()?;
        checked.fit(dataset)
    }
}
