use std::collections::HashMap;

use super::{AsTargets, Label, Labels};
use ndarray::{ArrayBase, ArrayView1, Data, Ix1};

impl<L, S: Data<Elem = L>> AsTargets for ArrayBase<S, Ix1> {
    type Elem = L;

    fn as_targets(&self) -> ArrayView1<L> {
        self.view()
    }
}

impl<L: Label, T: AsTargets<Elem = L>> Labels for T {
    type Elem = L;

    fn label_count(&self) -> HashMap<L, usize> {
        let mut count = HashMap::new();

        for label in self.as_targets().iter() {
            *count.entry(label.clone()).or_insert(0) += 1;
        }

        count
    }
}
