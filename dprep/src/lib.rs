mod chunking;
mod config;
mod data;
mod dataset;
mod derive;
mod errors;
mod field;
mod functions;
mod geom;
mod helpers;
mod lazy;
mod range;
mod reconcile;
mod resolver;
mod time;

#[cfg(test)]
mod testing;

pub use chunking::ChunkFootprint;
pub use chunking::ChunkPlan;
pub use chunking::MEMORY_LIMIT;

pub use config::ChunkingOverride;
pub use config::DerivedVariable;
pub use config::DerivedVariables;

pub use data::DType;
pub use data::Data;
pub use data::Scalar;

pub use dataset::Coordinate;
pub use dataset::Dataset;

pub use derive::derive_variables;
pub use derive::LATLON;

pub use errors::Error;
pub use errors::Result;

pub use field::AttributeOverwrite;
pub use field::Field;
pub use field::FieldMetadata;

pub use functions::cyclic_encoding;
pub use functions::day_of_year;
pub use functions::hour_of_day;
pub use functions::toa_radiation;
pub use functions::SOLAR_CONSTANT;

pub use geom::ChunkGrid;
pub use geom::Region;

pub use lazy::Element;
pub use lazy::LazyArray;

pub use range::FloatRange;

pub use reconcile::Detached;

pub use resolver::Arguments;
pub use resolver::DeriveFn;
pub use resolver::Derived;
pub use resolver::Module;
pub use resolver::Resolver;
pub use resolver::NAMESPACE;

pub use time::TimeRange;
