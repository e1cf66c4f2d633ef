use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};

use crate::{
    errors::{Error, Result},
    geom::Region,
};

/// Dimensions of the result of combining arrays with dimensions `left` and `right`.
///
/// Left's dimensions come first, in order, followed by any of right's dimensions that left doesn't
/// have.
///
pub(crate) fn broadcast_dims(left: &[String], right: &[String]) -> Vec<String> {
    let mut dims = left.to_vec();
    for dim in right {
        if !dims.contains(dim) {
            dims.push(dim.clone());
        }
    }

    dims
}

/// Restrict a region expressed over `from` dimensions to the `to` dimensions.
///
/// Fails with `DimensionNotFound` if a dimension in `to` isn't one of `from`.
///
pub(crate) fn project(region: &Region, from: &[String], to: &[String]) -> Result<Region> {
    to.iter()
        .map(|dim| {
            from.iter()
                .position(|d| d == dim)
                .and_then(|axis| region.get(axis).cloned())
                .ok_or_else(|| Error::DimensionNotFound(dim.clone()))
        })
        .collect()
}

/// Lay out `array`, whose axes are labelled by `dims`, as an array labelled by `target` with the
/// given `shape`, reordering axes and broadcasting over missing ones.
///
pub(crate) fn broadcast_to<T: Clone>(
    array: &ArrayD<T>,
    dims: &[String],
    target: &[String],
    shape: &[usize],
) -> Result<ArrayD<T>> {
    let order: Vec<usize> = target
        .iter()
        .filter_map(|dim| dims.iter().position(|d| d == dim))
        .collect();
    let mut view: ArrayViewD<T> = array.view().permuted_axes(IxDyn(&order));
    for (axis, dim) in target.iter().enumerate() {
        if !dims.contains(dim) {
            view = view.insert_axis(Axis(axis));
        }
    }

    let broadcast = view.broadcast(IxDyn(shape)).map(|view| view.to_owned());
    match broadcast {
        Some(broadcast) => Ok(broadcast),
        None => Err(Error::ShapeMismatch {
            dim: target.join(","),
            expected: shape.iter().product(),
            found: array.len(),
        }),
    }
}

pub(crate) fn region_shape(region: &Region) -> Vec<usize> {
    region.iter().map(|range| range.end - range.start).collect()
}
