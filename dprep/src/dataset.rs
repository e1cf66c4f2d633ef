use indexmap::{IndexMap, IndexSet};

use crate::{
    errors::{Error, Result},
    field::Field,
};

/// A collection of named fields sharing a set of dimensions.
///
/// Fields are either data variables or coordinates. Every field's dimensions are dimensions of the
/// dataset and every field agrees with the dataset about the size of each of its dimensions.
///
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    dims: IndexMap<String, usize>,
    coordinates: IndexMap<String, Coordinate>,
    variables: IndexMap<String, Field>,

    /// Free form, top level attributes
    pub attrs: IndexMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct Coordinate {
    pub field: Field,

    /// Whether the coordinate is used to index its dimension. Indexed coordinates are kept in
    /// memory and are never chunked.
    pub indexed: bool,
}

impl Coordinate {
    /// A one dimensional coordinate named after its own dimension is indexed, like `time(time)`.
    ///
    fn new(field: Field) -> Self {
        let indexed = field.dims().len() == 1 && field.dims()[0] == field.name;
        Self { field, indexed }
    }
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attr<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Dimension names and sizes
    pub fn dims(&self) -> &IndexMap<String, usize> {
        &self.dims
    }

    pub fn coordinates(&self) -> impl Iterator<Item = &Coordinate> {
        self.coordinates.values()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Field> {
        self.variables.values()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name) || self.coordinates.contains_key(name)
    }

    pub fn is_coordinate(&self, name: &str) -> bool {
        self.coordinates.contains_key(name)
    }

    pub fn get_coordinate(&self, name: &str) -> Option<&Coordinate> {
        self.coordinates.get(name)
    }

    pub fn get_variable(&self, name: &str) -> Option<&Field> {
        self.variables.get(name)
    }

    /// Look up a field by name, whether it's a data variable or a coordinate
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.variables
            .get(name)
            .or_else(|| self.coordinates.get(name).map(|coord| &coord.field))
    }

    pub fn field(&self, name: &str) -> Result<&Field> {
        self.get(name)
            .ok_or_else(|| Error::VariableNotFound(name.to_string()))
    }

    /// Add a data variable. Fails if a variable or coordinate with that name already exists.
    ///
    pub fn add_variable(&mut self, field: Field) -> Result<()> {
        if self.contains(&field.name) {
            return Err(Error::DuplicateVariable(field.name));
        }
        self.add_dims(&field)?;
        self.variables.insert(field.name.clone(), field);

        Ok(())
    }

    /// Add a coordinate. Fails if a variable or coordinate with that name already exists.
    ///
    pub fn add_coordinate(&mut self, field: Field) -> Result<()> {
        if self.contains(&field.name) {
            return Err(Error::DuplicateVariable(field.name));
        }
        self.set_coordinate(field)
    }

    /// Add a coordinate, replacing any coordinate already present with the same name.
    ///
    pub fn set_coordinate(&mut self, field: Field) -> Result<()> {
        if self.variables.contains_key(&field.name) {
            return Err(Error::DuplicateVariable(field.name));
        }
        self.add_dims(&field)?;
        self.coordinates
            .insert(field.name.clone(), Coordinate::new(field));

        Ok(())
    }

    fn add_dims(&mut self, field: &Field) -> Result<()> {
        for (dim, &size) in field.dims().iter().zip(field.shape()) {
            if let Some(&expected) = self.dims.get(dim) {
                if expected != size {
                    return Err(Error::ShapeMismatch {
                        dim: dim.clone(),
                        expected,
                        found: size,
                    });
                }
            }
        }
        for (dim, &size) in field.dims().iter().zip(field.shape()) {
            self.dims.entry(dim.clone()).or_insert(size);
        }

        Ok(())
    }

    /// Select a subset of fields by name.
    ///
    /// Named coordinates stay coordinates and keep their index. Any other coordinate whose
    /// dimensions are all covered by the selection comes along too. Top level attributes are kept.
    ///
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Result<Dataset> {
        let mut subset = Dataset::new();
        subset.attrs = self.attrs.clone();

        let mut needed: IndexSet<&String> = IndexSet::new();
        for name in names {
            let name = name.as_ref();
            if let Some(field) = self.variables.get(name) {
                needed.extend(field.dims());
                subset.add_variable(field.clone())?;
            } else if let Some(coord) = self.coordinates.get(name) {
                needed.extend(coord.field.dims());
                subset.add_dims(&coord.field)?;
                subset
                    .coordinates
                    .insert(name.to_string(), coord.clone());
            } else {
                return Err(Error::VariableNotFound(name.to_string()));
            }
        }

        for (name, coord) in &self.coordinates {
            if !subset.contains(name) && coord.field.dims().iter().all(|dim| needed.contains(dim)) {
                subset.add_dims(&coord.field)?;
                subset.coordinates.insert(name.clone(), coord.clone());
            }
        }

        Ok(subset)
    }

    /// Remove the index from the named coordinates. Names that aren't indexed coordinates are
    /// ignored.
    ///
    pub fn drop_indexes<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            if let Some(coord) = self.coordinates.get_mut(name.as_ref()) {
                coord.indexed = false;
            }
        }
    }

    /// Demote a coordinate to a plain data variable.
    ///
    pub fn reset_coords(&mut self, name: &str) -> Result<()> {
        match self.coordinates.shift_remove(name) {
            Some(coord) => {
                self.variables.insert(name.to_string(), coord.field);
                Ok(())
            }
            None => Err(Error::VariableNotFound(name.to_string())),
        }
    }

    /// Chunk the dataset.
    ///
    /// Every data variable and every coordinate without an index is chunked according to `plan`.
    /// Dimensions not mentioned in `plan` span a single chunk. Indexed coordinates are left as they
    /// are. Any failure is reported as `Error::Chunking`.
    ///
    pub fn chunk(&self, plan: &IndexMap<String, usize>) -> Result<Dataset> {
        self.try_chunk(plan)
            .map_err(|err| Error::Chunking(Box::new(err)))
    }

    fn try_chunk(&self, plan: &IndexMap<String, usize>) -> Result<Dataset> {
        for dim in plan.keys() {
            if !self.dims.contains_key(dim) {
                return Err(Error::DimensionNotFound(dim.clone()));
            }
        }

        let mut chunked = self.clone();
        for field in chunked.variables.values_mut() {
            field.data = field.data.chunk(plan)?;
        }
        for coord in chunked.coordinates.values_mut() {
            if !coord.indexed {
                coord.field.data = coord.field.data.chunk(plan)?;
            }
        }

        Ok(chunked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::{Array1, Array2, Array3};

    use crate::{data::Data, testing};

    fn field(name: &str, dims: Vec<&str>, shape: &[usize]) -> Field {
        let data = ndarray::ArrayD::<f32>::zeros(shape);
        Field::new(name, Data::from_f32(dims, data).unwrap())
    }

    #[test]
    fn test_new() -> Result<()> {
        let dataset = testing::dataset();
        assert_eq!(dataset.dims().get("time"), Some(&24));
        assert_eq!(dataset.dims().get("x"), Some(&10));
        assert_eq!(dataset.dims().get("y"), Some(&10));
        assert_eq!(dataset.dims().get("altitude"), Some(&3));

        assert!(dataset.get_coordinate("time").unwrap().indexed);
        assert!(dataset.get_coordinate("altitude").unwrap().indexed);
        assert!(!dataset.get_coordinate("lat").unwrap().indexed);
        assert!(dataset.get_variable("t2m").is_some());
        assert!(dataset.get("lat").is_some());
        assert!(dataset.get("doesn't exist").is_none());
        assert!(matches!(
            dataset.field("doesn't exist"),
            Err(Error::VariableNotFound(_))
        ));
        assert_eq!(dataset.attrs.get("source").unwrap(), "testing");

        Ok(())
    }

    #[test]
    fn test_add_variable_conflicts() -> Result<()> {
        let mut dataset = Dataset::new();
        dataset.add_variable(field("a", vec!["x", "y"], &[3, 4]))?;

        let result = dataset.add_variable(field("a", vec!["x"], &[3]));
        assert!(matches!(result, Err(Error::DuplicateVariable(ref name)) if name == "a"));

        let result = dataset.add_variable(field("b", vec!["y"], &[5]));
        assert!(matches!(
            result,
            Err(Error::ShapeMismatch { ref dim, expected: 4, found: 5 }) if dim == "y"
        ));

        // Failed additions don't leave new dimensions behind
        let result = dataset.add_variable(field("c", vec!["z", "y"], &[2, 5]));
        assert!(result.is_err());
        assert!(dataset.dims().get("z").is_none());

        dataset.add_variable(field("b", vec!["y", "z"], &[4, 2]))?;
        assert_eq!(dataset.dims().len(), 3);

        Ok(())
    }

    #[test]
    fn test_set_coordinate() -> Result<()> {
        let mut dataset = Dataset::new();
        dataset.add_coordinate(field("x", vec!["x"], &[3]))?;
        assert!(dataset.add_coordinate(field("x", vec!["x"], &[3])).is_err());
        dataset.set_coordinate(field("x", vec!["x"], &[3]))?;
        assert!(dataset.get_coordinate("x").unwrap().indexed);

        dataset.add_variable(field("v", vec!["x"], &[3]))?;
        assert!(dataset.set_coordinate(field("v", vec!["x"], &[3])).is_err());

        Ok(())
    }

    #[test]
    fn test_subset() -> Result<()> {
        let dataset = testing::dataset();
        let subset = dataset.subset(&["t2m"])?;

        // t2m(time, x, y) brings time, lat(x, y) and lon(x, y) along, but not altitude
        assert!(subset.get_variable("t2m").is_some());
        assert!(subset.get_coordinate("time").unwrap().indexed);
        assert!(subset.get_coordinate("lat").is_some());
        assert!(subset.get_coordinate("lon").is_some());
        assert!(subset.get("altitude").is_none());
        assert!(subset.get("u").is_none());
        assert_eq!(subset.dims().len(), 3);
        assert_eq!(subset.attrs, dataset.attrs);

        Ok(())
    }

    #[test]
    fn test_subset_coordinate_only() -> Result<()> {
        let dataset = testing::dataset();
        let subset = dataset.subset(&["time"])?;
        assert_eq!(subset.coordinates().count(), 1);
        assert_eq!(subset.variables().count(), 0);
        assert_eq!(subset.dims().len(), 1);
        assert_eq!(subset.dims().get("time"), Some(&24));

        Ok(())
    }

    #[test]
    fn test_subset_missing() {
        let dataset = testing::dataset();
        let result = dataset.subset(&["t2m", "nope"]);
        assert!(matches!(result, Err(Error::VariableNotFound(ref name)) if name == "nope"));
    }

    #[test]
    fn test_drop_indexes_and_reset_coords() -> Result<()> {
        let mut dataset = testing::dataset().subset(&["time", "altitude"])?;
        dataset.drop_indexes(&["time", "not_a_coordinate"]);
        assert!(!dataset.get_coordinate("time").unwrap().indexed);
        assert!(dataset.get_coordinate("altitude").unwrap().indexed);

        dataset.reset_coords("time")?;
        assert!(dataset.get_coordinate("time").is_none());
        assert!(dataset.get_variable("time").is_some());
        assert!(matches!(
            dataset.reset_coords("time"),
            Err(Error::VariableNotFound(_))
        ));

        Ok(())
    }

    #[test]
    fn test_chunk() -> Result<()> {
        let dataset = testing::dataset();
        let plan: IndexMap<String, usize> = [("time".to_string(), 6)].into_iter().collect();
        let chunked = dataset.chunk(&plan)?;

        let t2m = chunked.get_variable("t2m").unwrap();
        assert_eq!(t2m.data.chunks(), Some(&[6, 10, 10][..]));

        // Non-indexed coordinates are chunked, indexed ones are not
        assert_eq!(
            chunked.get_coordinate("lat").unwrap().field.data.chunks(),
            Some(&[10, 10][..])
        );
        assert!(chunked
            .get_coordinate("time")
            .unwrap()
            .field
            .data
            .chunks()
            .is_none());

        // Values survive
        assert_eq!(
            t2m.data.compute_f32()?,
            dataset.get_variable("t2m").unwrap().data.compute_f32()?
        );

        Ok(())
    }

    #[test]
    fn test_chunk_errors() {
        let dataset = testing::dataset();

        let plan: IndexMap<String, usize> = [("level".to_string(), 6)].into_iter().collect();
        match dataset.chunk(&plan) {
            Err(Error::Chunking(cause)) => {
                assert!(matches!(*cause, Error::DimensionNotFound(ref dim) if dim == "level"))
            }
            _ => panic!("expected a chunking error"),
        }

        let plan: IndexMap<String, usize> = [("x".to_string(), 0)].into_iter().collect();
        match dataset.chunk(&plan) {
            Err(Error::Chunking(cause)) => {
                assert!(matches!(*cause, Error::InvalidChunkSize { size: 0, .. }))
            }
            _ => panic!("expected a chunking error"),
        }
    }

    #[test]
    fn test_mixed_shapes() -> Result<()> {
        let mut dataset = Dataset::new().with_attr("a", "b");
        let one = Array1::<f64>::zeros(4).into_dyn();
        let two = Array2::<f64>::zeros([4, 2]).into_dyn();
        let three = Array3::<f64>::zeros([4, 2, 5]).into_dyn();
        dataset.add_variable(Field::new("one", Data::from_f64(vec!["a"], one)?))?;
        dataset.add_variable(Field::new("two", Data::from_f64(vec!["a", "b"], two)?))?;
        dataset.add_variable(Field::new(
            "three",
            Data::from_f64(vec!["a", "b", "c"], three)?,
        ))?;
        let dims: Vec<(&String, &usize)> = dataset.dims().iter().collect();
        assert_eq!(dims.len(), 3);
        assert_eq!(dataset.dims()["c"], 5);

        Ok(())
    }
}
