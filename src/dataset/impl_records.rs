use super::{Float, Records, Select};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};

/// Two dimensional arrays hold one sample per row
impl<F: Float, S: Data<Elem = F>> Records for ArrayBase<S, Ix2> {
    fn nsamples(&self) -> usize {
        self.len_of(Axis(0))
    }

    fn nfeatures(&self) -> usize {
        self.len_of(Axis(1))
    }
}

impl Records for () {
    fn nsamples(&self) -> usize {
        0
    }

    fn nfeatures(&self) -> usize {
        0
    }
}

impl<R: Records> Records for &R {
    fn nsamples(&self) -> usize {
        (*self).nsamples()
    }

    fn nfeatures(&self) -> usize {
        (*self).nfeatures()
    }
}

impl<A: Clone> Select for Array2<A> {
    fn select_rows(&self, indices: &[usize]) -> Self {
        self.select(Axis(0), indices)
    }
}

impl<A: Clone> Select for Array1<A> {
    fn select_rows(&self, indices: &[usize]) -> Self {
        self.select(Axis(0), indices)
    }
}
