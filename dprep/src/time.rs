use chrono::{DateTime, Datelike, Timelike, Utc};
use ndarray::Array1;

use crate::{
    data::Data,
    errors::{Error, Result},
    field::{Field, FieldMetadata},
};

/// A regularly spaced series of instants, in seconds since the Unix epoch.
///
#[derive(Clone, Debug)]
pub struct TimeRange {
    pub start: i64,
    pub step: i64,
    pub steps: usize,
}

impl TimeRange {
    pub fn new(start: i64, step: i64, steps: usize) -> Self {
        Self { start, step, steps }
    }

    pub fn get(&self, index: usize) -> i64 {
        self.start + (index as i64) * self.step
    }

    pub fn values(&self) -> Array1<i64> {
        Array1::from_iter((0..self.steps).map(|i| self.get(i)))
    }

    /// An indexed time coordinate named after its own dimension
    pub fn coordinate<S: Into<String>>(&self, name: S) -> Result<Field> {
        let name = name.into();
        let data = Data::from_datetime(vec![name.clone()], self.values().into_dyn())?;

        Ok(Field::new(name, data).with_metadata(FieldMetadata {
            units: Some(String::from("seconds since 1970-01-01T00:00:00Z")),
            long_name: Some(String::from("time")),
        }))
    }
}

fn datetime(seconds: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(seconds, 0).ok_or(Error::InvalidTimestamp(seconds))
}

/// Hour of the day, 0 to 23, in UTC
pub fn hour_of_day(seconds: i64) -> Result<u32> {
    Ok(datetime(seconds)?.hour())
}

/// Day of the year, starting at 1 for January 1st
pub fn day_of_year(seconds: i64) -> Result<u32> {
    Ok(datetime(seconds)?.ordinal())
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    // 2020-01-01T00:00:00Z
    const NEW_YEAR_2020: i64 = 1577836800;

    #[test]
    fn test_get() {
        let range = TimeRange::new(1000000, 3600, 200);
        assert_eq!(range.get(0), 1000000);
        assert_eq!(range.get(100), 1360000);
    }

    #[test]
    fn test_values() {
        let range = TimeRange::new(1000000, 3600, 2);
        assert_eq!(range.values(), array![1000000, 1003600]);
    }

    #[test]
    fn test_coordinate() -> Result<()> {
        let field = TimeRange::new(NEW_YEAR_2020, 3600, 24).coordinate("time")?;
        assert_eq!(field.name, "time");
        assert_eq!(field.dims(), &["time"]);
        assert_eq!(field.shape(), &[24]);
        assert_eq!(field.data.compute_datetime()?[[23]], NEW_YEAR_2020 + 23 * 3600);

        Ok(())
    }

    #[test]
    fn test_calendar() -> Result<()> {
        assert_eq!(hour_of_day(NEW_YEAR_2020)?, 0);
        assert_eq!(hour_of_day(NEW_YEAR_2020 + 13 * 3600 + 59 * 60)?, 13);
        assert_eq!(day_of_year(NEW_YEAR_2020)?, 1);

        // 2020 is a leap year
        assert_eq!(day_of_year(NEW_YEAR_2020 + 365 * 86400)?, 366);
        assert_eq!(day_of_year(NEW_YEAR_2020 + 366 * 86400)?, 1);

        assert!(matches!(
            hour_of_day(i64::MAX),
            Err(Error::InvalidTimestamp(i64::MAX))
        ));

        Ok(())
    }
}
