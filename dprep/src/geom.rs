use std::ops::Range;

use crate::errors::{Error, Result};

/// A rectangular region of an N-dimensional array, one half open range per axis.
///
pub type Region = Vec<Range<usize>>;

/// The grid of chunks covering an array of a given shape.
///
/// Chunks along each axis are `chunks[axis]` wide, except the last one which may be narrower
/// when the chunk size doesn't evenly divide the axis length.
///
#[derive(Clone, Debug)]
pub struct ChunkGrid {
    pub shape: Vec<usize>,
    pub chunks: Vec<usize>,
    _private: (),
}

impl ChunkGrid {
    pub fn new(shape: Vec<usize>, chunks: Vec<usize>) -> Result<Self> {
        if shape.len() != chunks.len() {
            return Err(Error::ShapeMismatch {
                dim: String::from("chunks"),
                expected: shape.len(),
                found: chunks.len(),
            });
        }
        let chunks = chunks.into_iter().map(|size| size.max(1)).collect();

        Ok(Self {
            shape,
            chunks,
            _private: (),
        })
    }

    /// Number of chunks along each axis
    pub fn counts(&self) -> Vec<usize> {
        self.shape
            .iter()
            .zip(&self.chunks)
            .map(|(len, size)| (len + size - 1) / size)
            .collect()
    }

    /// Total number of chunks in the grid
    pub fn len(&self) -> usize {
        self.counts().iter().product()
    }

    /// Region covering the whole array
    pub fn full(&self) -> Region {
        self.shape.iter().map(|&len| 0..len).collect()
    }

    pub fn iter(&self) -> ChunkGridIter {
        let counts = self.counts();
        let done = counts.iter().any(|&count| count == 0);
        ChunkGridIter {
            index: vec![0; counts.len()],
            counts,
            grid: self.clone(),
            done,
        }
    }
}

pub struct ChunkGridIter {
    index: Vec<usize>,
    counts: Vec<usize>,
    grid: ChunkGrid,
    done: bool,
}

impl Iterator for ChunkGridIter {
    type Item = Region;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let region = self
            .index
            .iter()
            .enumerate()
            .map(|(axis, &i)| {
                let start = i * self.grid.chunks[axis];
                let end = (start + self.grid.chunks[axis]).min(self.grid.shape[axis]);
                start..end
            })
            .collect();

        // Odometer style increment, last axis varies fastest
        self.done = true;
        for axis in (0..self.index.len()).rev() {
            self.index[axis] += 1;
            if self.index[axis] < self.counts[axis] {
                self.done = false;
                break;
            }
            self.index[axis] = 0;
        }

        Some(region)
    }
}
