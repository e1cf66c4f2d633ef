use std::ops::Deref;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::{
    dataset::Dataset,
    errors::{Error, Result},
};

/// Chunks larger than this, in bytes, are worth a warning
pub const MEMORY_LIMIT: u64 = 1024 * 1024 * 1024;

/// Chunk size for every dimension of a dataset
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkPlan {
    sizes: IndexMap<String, usize>,
}

/// Worst case in memory size of one chunk of a variable
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkFootprint {
    pub variable: String,
    pub bytes: u64,
}

impl ChunkPlan {
    /// Build a plan covering every dimension of `dataset`.
    ///
    /// Sizes are taken from `overrides` where given, otherwise a dimension spans a single chunk.
    /// Overrides larger than their dimension are clamped to it. A zero override is kept as is and
    /// rejected when the plan is applied. Overrides for dimensions `dataset` doesn't have are
    /// ignored. Use `validate` first to catch overrides for dimensions that don't exist at all.
    ///
    pub fn new(dataset: &Dataset, overrides: &IndexMap<String, usize>) -> Self {
        let sizes = dataset
            .dims()
            .iter()
            .map(|(dim, &len)| {
                let size = overrides
                    .get(dim)
                    .map_or(len, |&size| size.min(len.max(1)));
                (dim.clone(), size)
            })
            .collect();

        Self { sizes }
    }

    /// Check that every dimension named in `overrides` is a dimension of `dataset`.
    ///
    pub fn validate(dataset: &Dataset, overrides: &IndexMap<String, usize>) -> Result<()> {
        for dim in overrides.keys() {
            if !dataset.dims().contains_key(dim) {
                return Err(Error::DimensionNotFound(dim.clone()));
            }
        }

        Ok(())
    }

    pub fn sizes(&self) -> &IndexMap<String, usize> {
        &self.sizes
    }

    pub fn contains(&self, dim: &str) -> bool {
        self.sizes.contains_key(dim)
    }

    /// Estimate the size of one chunk of each data variable in `dataset`.
    ///
    /// The estimate is the product of the planned chunk sizes over the variable's dimensions times
    /// the size of one element.
    ///
    pub fn footprints(&self, dataset: &Dataset) -> Result<Vec<ChunkFootprint>> {
        let mut footprints = vec![];
        for field in dataset.variables() {
            let mut elements: u64 = 1;
            for dim in field.dims() {
                let size = self
                    .sizes
                    .get(dim)
                    .ok_or_else(|| Error::DimensionNotFound(dim.clone()))?;
                elements = elements.saturating_mul(*size as u64);
            }
            footprints.push(ChunkFootprint {
                variable: field.name.clone(),
                bytes: elements.saturating_mul(field.dtype().itemsize() as u64),
            });
        }

        Ok(footprints)
    }

    /// Warn about any variable whose chunks would exceed `MEMORY_LIMIT`. Returns the offenders.
    ///
    /// This is advisory only. Nothing stops the oversized chunks from being used.
    ///
    pub fn check_memory(&self, dataset: &Dataset) -> Result<Vec<ChunkFootprint>> {
        let mut oversized = vec![];
        for footprint in self.footprints(dataset)? {
            debug!(
                "Chunks of '{}' take up to {} bytes",
                footprint.variable, footprint.bytes
            );
            if footprint.bytes > MEMORY_LIMIT {
                warn!(
                    "The chunk size for '{}' ({} bytes) exceeds {} bytes.",
                    footprint.variable, footprint.bytes, MEMORY_LIMIT
                );
                oversized.push(footprint);
            }
        }

        Ok(oversized)
    }
}

impl Deref for ChunkPlan {
    type Target = IndexMap<String, usize>;

    fn deref(&self) -> &Self::Target {
        &self.sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{data::Data, field::Field, lazy::LazyArray, testing};

    fn overrides(entries: &[(&str, usize)]) -> IndexMap<String, usize> {
        entries
            .iter()
            .map(|(dim, size)| (dim.to_string(), *size))
            .collect()
    }

    #[test]
    fn test_defaults_to_full_dimension() {
        let dataset = testing::dataset();
        let plan = ChunkPlan::new(&dataset, &overrides(&[("time", 6)]));
        assert_eq!(plan.len(), 4);
        assert_eq!(plan["time"], 6);
        assert_eq!(plan["x"], 10);
        assert_eq!(plan["y"], 10);
        assert_eq!(plan["altitude"], 3);
    }

    #[test]
    fn test_oversized_override_is_clamped() -> Result<()> {
        let dataset = testing::dataset();
        let plan = ChunkPlan::new(&dataset, &overrides(&[("time", 1_000_000_000), ("x", 0)]));
        assert_eq!(plan["time"], dataset.dims()["time"]);

        // Zero is left for chunking to reject
        assert_eq!(plan["x"], 0);

        let plan = ChunkPlan::new(&dataset, &overrides(&[("time", 1_000_000_000)]));
        assert!(plan.check_memory(&dataset)?.is_empty());
        assert_eq!(
            plan.footprints(&dataset)?[0],
            ChunkFootprint {
                variable: String::from("t2m"),
                bytes: 24 * 10 * 10 * 4,
            }
        );

        // The plan matches the layout chunking actually produces
        let chunked = dataset.chunk(&plan)?;
        assert_eq!(
            chunked.field("t2m")?.data.chunks(),
            Some(&[plan["time"], plan["x"], plan["y"]][..])
        );

        Ok(())
    }

    #[test]
    fn test_ignores_dims_outside_subset() -> Result<()> {
        let dataset = testing::dataset();
        let subset = dataset.subset(&["time"])?;
        let over = overrides(&[("time", 1), ("x", 5)]);
        ChunkPlan::validate(&dataset, &over)?;

        let plan = ChunkPlan::new(&subset, &over);
        assert_eq!(plan.sizes(), &overrides(&[("time", 1)]));
        assert!(plan.contains("time"));
        assert!(!plan.contains("x"));

        Ok(())
    }

    #[test]
    fn test_validate() {
        let dataset = testing::dataset();
        let result = ChunkPlan::validate(&dataset, &overrides(&[("time", 1), ("level", 2)]));
        assert!(matches!(result, Err(Error::DimensionNotFound(ref dim)) if dim == "level"));
    }

    #[test]
    fn test_footprints() -> Result<()> {
        let dataset = testing::dataset();
        let plan = ChunkPlan::new(&dataset, &overrides(&[("time", 2)]));
        let footprints = plan.footprints(&dataset)?;

        // t2m(time, x, y) f32, u(time, altitude, x, y) f32
        assert_eq!(
            footprints,
            vec![
                ChunkFootprint {
                    variable: String::from("t2m"),
                    bytes: 2 * 10 * 10 * 4,
                },
                ChunkFootprint {
                    variable: String::from("u"),
                    bytes: 2 * 3 * 10 * 10 * 4,
                },
            ]
        );
        assert!(plan.check_memory(&dataset)?.is_empty());

        Ok(())
    }

    #[test]
    fn test_oversized_chunks_warn() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        // 1024 x 512 x 512 f64 is 2 GiB, but nothing is allocated until it's computed
        let data = LazyArray::from_fn(vec!["time", "y", "x"], vec![1024, 512, 512], |_| 0.0)?;
        let mut dataset = Dataset::new();
        dataset.add_variable(Field::new("huge", Data::F64(data)))?;

        let plan = ChunkPlan::new(&dataset, &IndexMap::new());
        let oversized = plan.check_memory(&dataset)?;
        assert_eq!(
            oversized,
            vec![ChunkFootprint {
                variable: String::from("huge"),
                bytes: 2 * MEMORY_LIMIT,
            }]
        );

        let plan = ChunkPlan::new(&dataset, &overrides(&[("time", 256)]));
        assert!(plan.check_memory(&dataset)?.is_empty());

        Ok(())
    }
}
