use ndarray::{Array2, Array3, Array4};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    data::Data,
    dataset::Dataset,
    field::{Field, FieldMetadata},
    range::FloatRange,
    time::TimeRange,
};

/// 2020-01-01T00:00:00Z
pub(crate) const START: i64 = 1577836800;

pub(crate) const TIME: usize = 24;
pub(crate) const X: usize = 10;
pub(crate) const Y: usize = 10;
pub(crate) const ALTITUDE: usize = 3;

/// A small dataset shaped like a regional weather model's output.
///
/// Dimensions are `time=24` (hourly from `START`), `x=10`, `y=10` and `altitude=3`. Coordinates
/// are `time`, `x`, `y` and `altitude`, all indexed, plus two dimensional `lat(x, y)` and
/// `lon(x, y)`. Data variables are `t2m(time, x, y)` and `u(time, altitude, x, y)`.
///
pub(crate) fn dataset() -> Dataset {
    let mut rng = StdRng::seed_from_u64(42);
    let mut dataset = Dataset::new().with_attr("source", "testing");

    let coordinates = vec![
        TimeRange::new(START, 3600, TIME).coordinate("time").unwrap(),
        FloatRange::new(0.0_f64, 2500.0, X).coordinate("x").unwrap(),
        FloatRange::new(0.0_f64, 2500.0, Y).coordinate("y").unwrap(),
        FloatRange::new(10.0_f32, 40.0, ALTITUDE)
            .coordinate("altitude")
            .unwrap()
            .with_metadata(FieldMetadata::new("m", "altitude above ground")),
    ];
    for coordinate in coordinates {
        dataset.add_coordinate(coordinate).unwrap();
    }

    let lat = Array2::from_shape_fn([X, Y], |(x, y)| 50.0 + 0.2 * x as f64 + 0.05 * y as f64);
    let lon = Array2::from_shape_fn([X, Y], |(x, y)| 0.25 * y as f64 - 0.05 * x as f64);
    dataset
        .add_coordinate(
            Field::new(
                "lat",
                Data::from_f64(vec!["x", "y"], lat.into_dyn()).unwrap(),
            )
            .with_metadata(FieldMetadata::new("degrees_north", "latitude")),
        )
        .unwrap();
    dataset
        .add_coordinate(
            Field::new(
                "lon",
                Data::from_f64(vec!["x", "y"], lon.into_dyn()).unwrap(),
            )
            .with_metadata(FieldMetadata::new("degrees_east", "longitude")),
        )
        .unwrap();

    let t2m = Array3::from_shape_fn([TIME, X, Y], |_| rng.gen_range(260.0_f32..300.0));
    dataset
        .add_variable(
            Field::new(
                "t2m",
                Data::from_f32(vec!["time", "x", "y"], t2m.into_dyn()).unwrap(),
            )
            .with_metadata(FieldMetadata::new("K", "2 metre temperature")),
        )
        .unwrap();

    let u = Array4::from_shape_fn([TIME, ALTITUDE, X, Y], |_| rng.gen_range(-20.0_f32..20.0));
    dataset
        .add_variable(
            Field::new(
                "u",
                Data::from_f32(vec!["time", "altitude", "x", "y"], u.into_dyn()).unwrap(),
            )
            .with_metadata(FieldMetadata::new("m s**-1", "u component of wind")),
        )
        .unwrap();

    dataset
}
