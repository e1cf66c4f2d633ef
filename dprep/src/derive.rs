use log::debug;

use crate::{
    chunking::ChunkPlan,
    config::{ChunkingOverride, DerivedVariable, DerivedVariables},
    dataset::Dataset,
    errors::{Error, Result},
    field::{AttributeOverwrite, Field},
    reconcile::Detached,
    resolver::{Arguments, Resolver},
};

/// Names in `kwargs` that always refer to the dataset's latitude and longitude
pub const LATLON: [&str; 2] = ["lat", "lon"];

/// Compute derived variables from the fields of `dataset`.
///
/// Variables are derived one at a time in the order they're declared. Each gets its own subset of
/// the input, chunked according to `chunking` (dimensions not mentioned span a single chunk), and
/// is built lazily. Nothing is computed until the fields of the returned dataset are.
///
/// The returned dataset holds the derived fields, any coordinates that had to be demoted for
/// chunking, and a copy of `dataset`'s top level attributes. `dataset` itself is not modified.
///
/// # Arguments
///
/// * `dataset` - The input dataset
/// * `configs` - What to derive, by output name
/// * `chunking` - Chunk size overrides by dimension. Every dimension named must exist in
///   `dataset`.
/// * `resolver` - Resolves the function named by each configuration
///
pub fn derive_variables(
    dataset: &Dataset,
    configs: &DerivedVariables,
    chunking: &ChunkingOverride,
    resolver: &Resolver,
) -> Result<Dataset> {
    ChunkPlan::validate(dataset, chunking)?;

    let mut output = Dataset::new();
    output.attrs = dataset.attrs.clone();
    for (name, config) in configs {
        let overwrites = derive_variable(dataset, name, config, chunking, resolver, &mut output)
            .map_err(|err| Error::Derivation {
                variable: name.clone(),
                source: Box::new(err),
            })?;
        debug!(
            "Derived '{name}', {} attribute(s) overwritten by configuration",
            overwrites.len()
        );
    }

    Ok(output)
}

/// Derive the fields for one configuration and add them to `output`. Returns the computed
/// attributes that were replaced by configured ones.
///
fn derive_variable(
    dataset: &Dataset,
    name: &str,
    config: &DerivedVariable,
    chunking: &ChunkingOverride,
    resolver: &Resolver,
    output: &mut Dataset,
) -> Result<Vec<AttributeOverwrite>> {
    debug!("Deriving '{name}' with '{}'", config.function);

    let (latlon, sources): (Vec<_>, Vec<_>) = config
        .kwargs
        .iter()
        .partition(|(source, _)| LATLON.contains(&source.as_str()));
    let required: Vec<&str> = sources.iter().map(|(source, _)| source.as_str()).collect();

    let mut subset = dataset.subset(&required)?;
    let plan = ChunkPlan::new(&subset, chunking);
    debug!("Chunk plan for '{name}': {:?}", plan.sizes());
    let detached = Detached::detach(&mut subset, &required, &plan)?;
    plan.check_memory(&subset)?;
    let subset = subset.chunk(&plan)?;

    let mut args = Arguments::new();
    for (source, parameter) in latlon {
        args.insert(parameter.clone(), unchunked(dataset, source)?);
    }
    for (source, parameter) in sources {
        args.insert(parameter.clone(), subset.field(source)?.clone());
    }

    let function = resolver.resolve(&config.function)?;
    let fields = function(args)?.into_fields()?;

    let configured = config.metadata();
    let mut overwrites = vec![];
    for mut field in fields {
        let (metadata, replaced) = field.metadata.merge(&configured, &field.name)?;
        field.metadata = metadata;
        overwrites.extend(replaced);
        debug!("Adding derived field '{}'", field.name);
        output.add_variable(field)?;
    }

    detached.reattach(&subset, output)?;

    Ok(overwrites)
}

/// Latitude or longitude in one piece, straight from the full input dataset
fn unchunked(dataset: &Dataset, name: &str) -> Result<Field> {
    let field = dataset.field(name)?;

    Ok(Field {
        data: field.data.unchunked(),
        ..field.clone()
    })
}
