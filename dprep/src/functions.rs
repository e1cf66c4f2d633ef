//! Built-in derivation functions.
//!
//! Each function is available to configurations by its bare name or under `resolver::NAMESPACE`.
//! All of them only build a lazy computation. Nothing is computed until the caller computes the
//! returned fields.
//!
use std::f64::consts::PI;

use log::info;

use crate::{
    data::Data,
    errors::Result,
    field::{Field, FieldMetadata},
    lazy::LazyArray,
    resolver::{Arguments, Derived, Module},
    time,
};

/// Solar constant, in W m^-2
pub const SOLAR_CONSTANT: f64 = 1366.0;

/// The module of built-in functions
pub fn builtins() -> Module {
    Module::new()
        .with_function("calculate_toa_radiation", calculate_toa_radiation)
        .with_function("calculate_hour_of_day", calculate_hour_of_day)
        .with_function("calculate_day_of_year", calculate_day_of_year)
}

fn calculate_toa_radiation(mut args: Arguments) -> Result<Derived> {
    let lat = args.take("lat")?;
    let lon = args.take("lon")?;
    let time = args.take("time")?;
    args.finish()?;

    Ok(Derived::Single(toa_radiation(&lat, &lon, &time)?))
}

fn calculate_hour_of_day(mut args: Arguments) -> Result<Derived> {
    let time = args.take("time")?;
    args.finish()?;

    let (cos, sin) = hour_of_day(&time)?;
    Ok(Derived::Multiple(vec![cos, sin]))
}

fn calculate_day_of_year(mut args: Arguments) -> Result<Derived> {
    let time = args.take("time")?;
    args.finish()?;

    let (cos, sin) = day_of_year(&time)?;
    Ok(Derived::Multiple(vec![cos, sin]))
}

/// Top of the atmosphere incoming solar radiation.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees
/// * `lon` - Longitude in degrees, on the same dimensions as `lat`
/// * `time` - Datetime field
///
/// The result has `time`'s dimensions followed by the lat/lon dimensions. Negative values, which
/// correspond to the sun being below the horizon, are clamped to zero.
///
pub fn toa_radiation(lat: &Field, lon: &Field, time: &Field) -> Result<Field> {
    info!("Calculating top-of-atmosphere radiation");

    let lat = lat.data.to_f64()?;
    let lon = lon.data.to_f64()?;
    let timestamps = time.data.to_datetime()?;

    // Solar declination, in radians
    let declination = timestamps.try_map(|seconds| {
        let day = f64::from(time::day_of_year(seconds)?);
        Ok((23.45 * (2.0 * PI * (284.0 + day) / 365.0).sin()).to_radians())
    });
    let hour = timestamps.try_map(|seconds| Ok(f64::from(time::hour_of_day(seconds)?)));

    // Hour angle, in degrees
    let hour_angle = hour.zip_with(&lon, |hour, lon| 15.0 * (hour + lon / 15.0 - 12.0))?;

    // Cosine of the solar zenith angle
    let sin_term = declination.zip_with(&lat, |dec, lat| lat.to_radians().sin() * dec.sin())?;
    let cos_term = declination
        .zip_with(&lat, |dec, lat| lat.to_radians().cos() * dec.cos())?
        .zip_with(&hour_angle, |term, angle| term * angle.to_radians().cos())?;
    let cos_sza = sin_term.zip_with(&cos_term, |a, b| a + b)?;

    let radiation = cos_sza.map(|cos_sza| (SOLAR_CONSTANT * cos_sza).max(0.0));

    Ok(Field::new("toa_radiation", Data::F64(radiation)).with_metadata(
        FieldMetadata::new("W*m**-2", "top-of-the-atmosphere radiation"),
    ))
}

/// Cyclically encoded hour of the day, as `(hour_of_day_cos, hour_of_day_sin)`.
///
pub fn hour_of_day(time: &Field) -> Result<(Field, Field)> {
    info!("Calculating hour of day");

    let hours = time
        .data
        .to_datetime()?
        .try_map(|seconds| Ok(f64::from(time::hour_of_day(seconds)?)));
    let (cos, sin) = cyclic_encoding(&hours, 24.0);

    Ok((
        Field::new("hour_of_day_cos", Data::F64(cos)).with_metadata(FieldMetadata::new(
            "1",
            "Cosine component of cyclically encoded hour of day",
        )),
        Field::new("hour_of_day_sin", Data::F64(sin)).with_metadata(FieldMetadata::new(
            "1",
            "Sine component of cyclically encoded hour of day",
        )),
    ))
}

/// Cyclically encoded day of the year, as `(day_of_year_cos, day_of_year_sin)`.
///
/// The period is 366 days so that December 31st of a leap year doesn't wrap around to January
/// 1st.
///
pub fn day_of_year(time: &Field) -> Result<(Field, Field)> {
    info!("Calculating day of year");

    let days = time
        .data
        .to_datetime()?
        .try_map(|seconds| Ok(f64::from(time::day_of_year(seconds)?)));
    let (cos, sin) = cyclic_encoding(&days, 366.0);

    Ok((
        Field::new("day_of_year_cos", Data::F64(cos)).with_metadata(FieldMetadata::new(
            "1",
            "Cosine component of cyclically encoded day of year",
        )),
        Field::new("day_of_year_sin", Data::F64(sin)).with_metadata(FieldMetadata::new(
            "1",
            "Sine component of cyclically encoded day of year",
        )),
    ))
}

/// Map values with period `max` onto the unit circle. Returns `(cos, sin)`.
///
pub fn cyclic_encoding(data: &LazyArray<f64>, max: f64) -> (LazyArray<f64>, LazyArray<f64>) {
    let cos = data.map(move |value| (2.0 * PI * value / max).cos());
    let sin = data.map(move |value| (2.0 * PI * value / max).sin());

    (cos, sin)
}
