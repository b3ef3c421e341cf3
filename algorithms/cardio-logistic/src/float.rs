use argmin::core::ArgminFloat;

/// Floats usable by the solver, the intersection of what `ndarray`, `argmin` and `cardio` require
pub trait Float: ArgminFloat + cardio::Float {
    const POSITIVE_LABEL: Self;
    const NEGATIVE_LABEL: Self;
}

impl Float for f32 {
    const POSITIVE_LABEL: Self = 1.0;
    const NEGATIVE_LABEL: Self = -1.0;
}

impl Float for f64 {
    const POSITIVE_LABEL: Self = 1.0;
    const NEGATIVE_LABEL: Self = -1.0;
}
