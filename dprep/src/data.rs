use std::mem::size_of;

use indexmap::IndexMap;
use ndarray::ArrayD;
use paste::paste;

use crate::{
    errors::{Error, Result},
    lazy::{Element, LazyArray},
};

/// The kind of numerical data stored in a variable
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    F32,
    F64,
    I32,
    I64,

    /// Seconds since the Unix epoch
    Datetime,
}

impl DType {
    /// Number of bytes per element
    pub fn itemsize(&self) -> usize {
        match self {
            DType::F32 => size_of::<f32>(),
            DType::F64 => size_of::<f64>(),
            DType::I32 => size_of::<i32>(),
            DType::I64 | DType::Datetime => size_of::<i64>(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::Datetime => "datetime",
        }
    }
}

/// Lazily evaluated array data of one of the supported element types
#[derive(Clone, Debug)]
pub enum Data {
    F32(LazyArray<f32>),
    F64(LazyArray<f64>),
    I32(LazyArray<i32>),
    I64(LazyArray<i64>),
    Datetime(LazyArray<i64>),
}

/// Run `$body` with `$array` bound to the typed `LazyArray` inside `$data`, whatever its type.
macro_rules! dispatch {
    ($data:expr, $array:ident => $body:expr) => {
        match $data {
            Data::F32($array) => $body,
            Data::F64($array) => $body,
            Data::I32($array) => $body,
            Data::I64($array) => $body,
            Data::Datetime($array) => $body,
        }
    };
}

/// Same as `dispatch!` but rewraps the result in the same variant.
macro_rules! rewrap {
    ($data:expr, $array:ident => $body:expr) => {
        match $data {
            Data::F32($array) => Data::F32($body),
            Data::F64($array) => Data::F64($body),
            Data::I32($array) => Data::I32($body),
            Data::I64($array) => Data::I64($body),
            Data::Datetime($array) => Data::Datetime($body),
        }
    };
}

/// Element types that can be wrapped directly in `Data`
pub trait Scalar: Element {
    fn into_data<S: Into<String>>(dims: Vec<S>, array: ArrayD<Self>) -> Result<Data>;
}

macro_rules! Typed {
    ($type:ident, $variant:ident) => {
        paste! {
            impl Scalar for $type {
                fn into_data<S: Into<String>>(dims: Vec<S>, array: ArrayD<$type>) -> Result<Data> {
                    Data::[<from_ $type>](dims, array)
                }
            }

            impl Data {
                pub fn [<from_ $type>]<S: Into<String>>(
                    dims: Vec<S>,
                    array: ArrayD<$type>,
                ) -> Result<Self> {
                    Ok(Data::$variant(LazyArray::from_array(dims, array)?))
                }

                /// Materialize the data, failing if it is of another type
                pub fn [<compute_ $type>](&self) -> Result<ArrayD<$type>> {
                    match self {
                        Data::$variant(array) => array.compute(),
                        _ => Err(Error::DataType {
                            expected: stringify!($type),
                            found: self.dtype().name(),
                        }),
                    }
                }
            }
        }
    };
}

Typed!(f32, F32);
Typed!(f64, F64);
Typed!(i32, I32);
Typed!(i64, I64);

impl Data {
    pub fn from_datetime<S: Into<String>>(dims: Vec<S>, seconds: ArrayD<i64>) -> Result<Self> {
        Ok(Data::Datetime(LazyArray::from_array(dims, seconds)?))
    }

    pub fn dtype(&self) -> DType {
        match self {
            Data::F32(_) => DType::F32,
            Data::F64(_) => DType::F64,
            Data::I32(_) => DType::I32,
            Data::I64(_) => DType::I64,
            Data::Datetime(_) => DType::Datetime,
        }
    }

    pub fn dims(&self) -> &[String] {
        dispatch!(self, array => array.dims())
    }

    pub fn shape(&self) -> &[usize] {
        dispatch!(self, array => array.shape())
    }

    pub fn chunks(&self) -> Option<&[usize]> {
        dispatch!(self, array => array.chunks())
    }

    pub fn size_of(&self, dim: &str) -> Option<usize> {
        dispatch!(self, array => array.size_of(dim))
    }

    pub fn chunk(&self, plan: &IndexMap<String, usize>) -> Result<Self> {
        Ok(rewrap!(self, array => array.chunk(plan)?))
    }

    pub fn unchunked(&self) -> Self {
        rewrap!(self, array => array.unchunked())
    }

    /// Numeric data as `f64`. Integer and `f32` data are converted lazily.
    ///
    pub fn to_f64(&self) -> Result<LazyArray<f64>> {
        match self {
            Data::F32(array) => Ok(array.map(f64::from)),
            Data::F64(array) => Ok(array.clone()),
            Data::I32(array) => Ok(array.map(f64::from)),
            Data::I64(array) => Ok(array.map(|value| value as f64)),
            Data::Datetime(_) => Err(Error::DataType {
                expected: "numeric",
                found: DType::Datetime.name(),
            }),
        }
    }

    /// Datetime data as seconds since the Unix epoch.
    ///
    pub fn to_datetime(&self) -> Result<LazyArray<i64>> {
        match self {
            Data::Datetime(array) => Ok(array.clone()),
            _ => Err(Error::DataType {
                expected: DType::Datetime.name(),
                found: self.dtype().name(),
            }),
        }
    }

    pub fn compute_datetime(&self) -> Result<ArrayD<i64>> {
        self.to_datetime()?.compute()
    }
}
