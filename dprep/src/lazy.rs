//! Deferred, chunked N-dimensional arrays with named dimensions.
//!
//! A `LazyArray` is a recipe for producing data rather than the data itself. Every operation
//! builds a new recipe on top of its inputs and no numeric work happens until `compute` is called.
//! When a chunk layout is attached, `compute` produces the array one chunk at a time, asking the
//! recipe only for the region it needs, so the peak working set is bounded by the chunk size
//! rather than the array size.
//!
use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use ndarray::{ArrayD, Dimension, IxDyn, Slice, Zip};
use num_traits::Zero;

use crate::{
    errors::{Error, Result},
    geom::{ChunkGrid, Region},
    helpers::{broadcast_dims, broadcast_to, project, region_shape},
};

/// Types that can be stored in a `LazyArray`
pub trait Element: Copy + Zero + Send + Sync + fmt::Debug + 'static {}

impl<T> Element for T where T: Copy + Zero + Send + Sync + fmt::Debug + 'static {}

type Source<T> = Arc<dyn Fn(&Region) -> Result<ArrayD<T>> + Send + Sync>;

#[derive(Clone)]
pub struct LazyArray<T: Element> {
    dims: Vec<String>,
    shape: Vec<usize>,
    chunks: Option<Vec<usize>>,
    source: Source<T>,
}

impl<T: Element> fmt::Debug for LazyArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "LazyArray {{ dims: {:?}, shape: {:?}, chunks: {:?} }}",
            self.dims, self.shape, self.chunks
        )
    }
}

impl<T: Element> LazyArray<T> {
    /// Wrap an in memory array. Axis `i` of `array` is labelled `dims[i]`.
    ///
    pub fn from_array<S: Into<String>>(dims: Vec<S>, array: ArrayD<T>) -> Result<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != array.ndim() {
            return Err(Error::ShapeMismatch {
                dim: dims.join(","),
                expected: dims.len(),
                found: array.ndim(),
            });
        }

        let shape = array.shape().to_vec();
        let array = Arc::new(array);
        let source: Source<T> = Arc::new(move |region: &Region| {
            Ok(array
                .slice_each_axis(|axis| Slice::from(region[axis.axis.index()].clone()))
                .to_owned())
        });

        Ok(Self {
            dims,
            shape,
            chunks: None,
            source,
        })
    }

    /// A generated array whose value at each index is `f(index)`. Nothing is allocated until the
    /// array is computed.
    ///
    pub fn from_fn<S, F>(dims: Vec<S>, shape: Vec<usize>, f: F) -> Result<Self>
    where
        S: Into<String>,
        F: Fn(&[usize]) -> T + Send + Sync + 'static,
    {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != shape.len() {
            return Err(Error::ShapeMismatch {
                dim: dims.join(","),
                expected: dims.len(),
                found: shape.len(),
            });
        }

        let source: Source<T> = Arc::new(move |region: &Region| {
            Ok(ArrayD::from_shape_fn(IxDyn(&region_shape(region)), |index| {
                let index: Vec<usize> = index
                    .slice()
                    .iter()
                    .zip(region)
                    .map(|(i, range)| i + range.start)
                    .collect();
                f(&index)
            }))
        });

        Ok(Self {
            dims,
            shape,
            chunks: None,
            source,
        })
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Chunk size along each axis, or `None` if the array is computed as a single block.
    ///
    pub fn chunks(&self) -> Option<&[usize]> {
        self.chunks.as_deref()
    }

    pub fn is_chunked(&self) -> bool {
        self.chunks.is_some()
    }

    /// Size of dimension `dim`, if this array has it
    pub fn size_of(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|axis| self.shape[axis])
    }

    fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Attach a chunk layout.
    ///
    /// Dimensions in `plan` that this array doesn't have are ignored. Dimensions of this array
    /// missing from `plan` keep their current chunk size, or span the whole dimension if the array
    /// isn't chunked yet. Sizes larger than the dimension are clamped to it.
    ///
    pub fn chunk(&self, plan: &IndexMap<String, usize>) -> Result<Self> {
        let mut chunks = Vec::with_capacity(self.ndim());
        for (axis, dim) in self.dims.iter().enumerate() {
            let len = self.shape[axis];
            let size = match plan.get(dim) {
                Some(&size) => size,
                None => match &self.chunks {
                    Some(chunks) => chunks[axis],
                    None => len,
                },
            };
            if size == 0 {
                return Err(Error::InvalidChunkSize {
                    dim: dim.clone(),
                    size,
                });
            }
            chunks.push(size.min(len.max(1)));
        }

        Ok(Self {
            chunks: Some(chunks),
            ..self.clone()
        })
    }

    /// Drop the chunk layout so the array is computed as one block.
    ///
    pub fn unchunked(&self) -> Self {
        Self {
            chunks: None,
            ..self.clone()
        }
    }

    pub fn map<U, F>(&self, f: F) -> LazyArray<U>
    where
        U: Element,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let source = Arc::clone(&self.source);
        LazyArray {
            dims: self.dims.clone(),
            shape: self.shape.clone(),
            chunks: self.chunks.clone(),
            source: Arc::new(move |region: &Region| Ok(source(region)?.mapv(&f))),
        }
    }

    pub fn try_map<U, F>(&self, f: F) -> LazyArray<U>
    where
        U: Element,
        F: Fn(T) -> Result<U> + Send + Sync + 'static,
    {
        let source = Arc::clone(&self.source);
        LazyArray {
            dims: self.dims.clone(),
            shape: self.shape.clone(),
            chunks: self.chunks.clone(),
            source: Arc::new(move |region: &Region| {
                let block = source(region)?;
                let values = block.iter().map(|&value| f(value)).collect::<Result<Vec<U>>>()?;

                Ok(ArrayD::from_shape_vec(block.raw_dim(), values)?)
            }),
        }
    }

    /// Combine two arrays elementwise, broadcasting by dimension name.
    ///
    /// The result has this array's dimensions followed by whichever of `other`'s dimensions this
    /// array doesn't have. Shared dimensions must be the same size. If either input is chunked,
    /// the result is chunked, taking chunk sizes from this array first.
    ///
    pub fn zip_with<U, V, F>(&self, other: &LazyArray<U>, f: F) -> Result<LazyArray<V>>
    where
        U: Element,
        V: Element,
        F: Fn(T, U) -> V + Send + Sync + 'static,
    {
        let dims = broadcast_dims(&self.dims, &other.dims);
        let mut shape = Vec::with_capacity(dims.len());
        let mut chunks = Vec::with_capacity(dims.len());
        for dim in &dims {
            let left = self.axis_of(dim);
            let right = other.axis_of(dim);
            let len = match (left, right) {
                (Some(left), Some(right)) => {
                    let (expected, found) = (self.shape[left], other.shape[right]);
                    if expected != found {
                        return Err(Error::ShapeMismatch {
                            dim: dim.clone(),
                            expected,
                            found,
                        });
                    }
                    expected
                }
                (Some(left), None) => self.shape[left],
                (None, Some(right)) => other.shape[right],
                (None, None) => unreachable!(),
            };
            let chunk = left
                .and_then(|axis| self.chunks.as_ref().map(|chunks| chunks[axis]))
                .or_else(|| right.and_then(|axis| other.chunks.as_ref().map(|c| c[axis])))
                .unwrap_or(len);
            shape.push(len);
            chunks.push(chunk);
        }
        let chunks = if self.is_chunked() || other.is_chunked() {
            Some(chunks)
        } else {
            None
        };

        let left_source = Arc::clone(&self.source);
        let right_source = Arc::clone(&other.source);
        let left_dims = self.dims.clone();
        let right_dims = other.dims.clone();
        let out_dims = dims.clone();
        let source = move |region: &Region| {
            let shape = region_shape(region);
            let left = left_source(&project(region, &out_dims, &left_dims)?)?;
            let left = broadcast_to(&left, &left_dims, &out_dims, &shape)?;
            let right = right_source(&project(region, &out_dims, &right_dims)?)?;
            let right = broadcast_to(&right, &right_dims, &out_dims, &shape)?;

            Ok(Zip::from(&left)
                .and(&right)
                .map_collect(|&left, &right| f(left, right)))
        };

        Ok(LazyArray {
            dims,
            shape,
            chunks,
            source: Arc::new(source),
        })
    }

    /// Materialize the array.
    ///
    pub fn compute(&self) -> Result<ArrayD<T>> {
        let grid = ChunkGrid::new(
            self.shape.clone(),
            self.chunks.clone().unwrap_or_else(|| self.shape.clone()),
        )?;
        if !self.is_chunked() {
            let array = (self.source)(&grid.full())?;
            self.check_block(&grid.full(), &array)?;

            return Ok(array);
        }

        let mut array = ArrayD::zeros(IxDyn(&self.shape));
        for region in grid.iter() {
            let block = (self.source)(&region)?;
            self.check_block(&region, &block)?;
            array
                .slice_each_axis_mut(|axis| Slice::from(region[axis.axis.index()].clone()))
                .assign(&block);
        }

        Ok(array)
    }

    fn check_block(&self, region: &Region, block: &ArrayD<T>) -> Result<()> {
        let expected = region_shape(region);
        for (axis, dim) in self.dims.iter().enumerate() {
            if block.shape().get(axis) != Some(&expected[axis]) {
                return Err(Error::ShapeMismatch {
                    dim: dim.clone(),
                    expected: expected[axis],
                    found: block.shape().get(axis).copied().unwrap_or(0),
                });
            }
        }

        Ok(())
    }
}
