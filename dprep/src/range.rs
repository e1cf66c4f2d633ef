use ndarray::Array1;
use num_traits::Float;

use crate::{
    data::Scalar,
    errors::Result,
    field::Field,
};

/// A regularly spaced series of floating point values, e.g. altitude levels or grid positions.
///
#[derive(Clone, Debug)]
pub struct FloatRange<N>
where
    N: Float + Scalar,
{
    pub start: N,
    pub step: N,
    pub steps: usize,
}

impl<N> FloatRange<N>
where
    N: Float + Scalar,
{
    pub fn new(start: N, step: N, steps: usize) -> Self {
        Self { start, step, steps }
    }

    pub fn get(&self, index: usize) -> Option<N> {
        if index < self.steps {
            Some(N::from(index)? * self.step + self.start)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.steps
    }

    pub fn values(&self) -> Array1<N> {
        // Computed from the index rather than accumulated so values don't drift
        Array1::from_iter((0..self.steps).filter_map(|i| self.get(i)))
    }

    /// A coordinate named after its own dimension, which makes it an indexed coordinate.
    ///
    pub fn coordinate<S: Into<String>>(&self, name: S) -> Result<Field> {
        let name = name.into();
        let data = N::into_data(vec![name.clone()], self.values().into_dyn())?;

        Ok(Field::new(name, data))
    }
}
