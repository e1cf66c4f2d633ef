use log::debug;

use crate::{chunking::ChunkPlan, dataset::Dataset, errors::Result};

/// Coordinates temporarily demoted to data variables so they can be chunked.
///
/// An indexed coordinate can't be chunked while it indexes its dimension. `detach` drops the
/// index of every required coordinate and demotes those that the chunk plan covers to plain data
/// variables. Once the derived fields have been added to the output, `reattach` puts the demoted
/// arrays back as coordinates of the output.
///
#[must_use = "demoted coordinates must be reattached to the output dataset"]
#[derive(Debug)]
pub struct Detached {
    names: Vec<String>,
}

impl Detached {
    /// Prepare `subset` for chunking according to `plan`.
    ///
    /// # Arguments
    ///
    /// * `subset` - The input subset for one derived variable. Modified in place.
    /// * `required` - Names of the fields the derived variable needs. Names that aren't
    ///   coordinates of `subset` are ignored.
    /// * `plan` - The chunk plan that will be applied to `subset`.
    ///
    pub fn detach<S: AsRef<str>>(
        subset: &mut Dataset,
        required: &[S],
        plan: &ChunkPlan,
    ) -> Result<Self> {
        let coordinates: Vec<&str> = required
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| subset.is_coordinate(name))
            .collect();
        subset.drop_indexes(&coordinates);

        let mut names = vec![];
        for name in coordinates {
            if plan.contains(name) {
                debug!("Demoting coordinate '{name}' for chunking");
                subset.reset_coords(name)?;
                names.push(name.to_string());
            }
        }

        Ok(Self { names })
    }

    /// Names of the demoted coordinates
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Copy each demoted coordinate, still chunked, from `input` to `output` as a coordinate.
    /// Replaces any coordinate of the same name already in `output`.
    ///
    pub fn reattach(self, input: &Dataset, output: &mut Dataset) -> Result<()> {
        for name in self.names {
            debug!("Reattaching coordinate '{name}'");
            output.set_coordinate(input.field(&name)?.clone())?;
        }

        Ok(())
    }
}
