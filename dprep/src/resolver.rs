use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;
use log::debug;
use parking_lot::Mutex;

use crate::{
    errors::{Error, Result},
    field::Field,
    functions,
};

/// Namespace of the built-in derivation functions
pub const NAMESPACE: &str = "dprep.derived_variables";

/// A derivation function. Takes its inputs as named arguments and returns one or more fields.
pub type DeriveFn = Arc<dyn Fn(Arguments) -> Result<Derived> + Send + Sync>;

type Loader = Box<dyn Fn() -> Result<Module> + Send + Sync>;

/// What a derivation function returns
#[derive(Debug)]
pub enum Derived {
    Single(Field),
    Multiple(Vec<Field>),
}

impl Derived {
    /// Check the shape of the return value and flatten it to a list of fields.
    ///
    /// A collection must hold at least one field and every field must be named, since fields are
    /// stored in the output dataset under their own names.
    ///
    pub fn into_fields(self) -> Result<Vec<Field>> {
        let description = self.describe();
        let fields = match self {
            Derived::Single(field) => vec![field],
            Derived::Multiple(fields) => fields,
        };
        if fields.is_empty() || fields.iter().any(|field| field.name.is_empty()) {
            return Err(Error::InvalidDerivedField(description));
        }

        Ok(fields)
    }

    fn describe(&self) -> String {
        let describe_field = |field: &Field| {
            if field.name.is_empty() {
                String::from("unnamed field")
            } else {
                format!("field '{}'", field.name)
            }
        };
        match self {
            Derived::Single(field) => describe_field(field),
            Derived::Multiple(fields) if fields.is_empty() => String::from("an empty collection"),
            Derived::Multiple(fields) => format!(
                "a collection of {}",
                fields
                    .iter()
                    .map(describe_field)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Named arguments for a derivation function
#[derive(Debug, Default)]
pub struct Arguments {
    values: IndexMap<String, Field>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, parameter: S, field: Field) {
        self.values.insert(parameter.into(), field);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove and return the argument for `parameter`.
    pub fn take(&mut self, parameter: &str) -> Result<Field> {
        self.values
            .shift_remove(parameter)
            .ok_or_else(|| Error::MissingArgument(parameter.to_string()))
    }

    /// Fail if any arguments were passed that the function didn't take.
    pub fn finish(self) -> Result<()> {
        if self.values.is_empty() {
            Ok(())
        } else {
            Err(Error::UnexpectedArgument(self.values.into_keys().collect()))
        }
    }
}

/// A named collection of derivation functions
#[derive(Clone, Default)]
pub struct Module {
    functions: HashMap<String, DeriveFn>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function<S, F>(mut self, name: S, function: F) -> Self
    where
        S: Into<String>,
        F: Fn(Arguments) -> Result<Derived> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    pub fn get(&self, name: &str) -> Option<DeriveFn> {
        self.functions.get(name).map(Arc::clone)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

/// Resolves textual function references, like `"calculate_toa_radiation"` or
/// `"my.module.my_function"`, to derivation functions.
///
/// Bare names and names in `NAMESPACE` refer to the built-in functions. Any other namespace must
/// have been registered with `register_module`. A registered module is loaded the first time one
/// of its functions is resolved and the loaded module is kept for the life of the resolver.
///
pub struct Resolver {
    builtins: Module,
    loaders: HashMap<String, Loader>,
    loaded: Mutex<HashMap<String, Arc<Module>>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            builtins: functions::builtins(),
            loaders: HashMap::new(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Make the functions of module `name` available under that namespace.
    ///
    /// # Arguments
    ///
    /// * `name` - The module's namespace, e.g. `"my_project.fields"`. Functions in it are
    ///   referenced as `"my_project.fields.<function>"`.
    /// * `loader` - Builds the module. Called at most once, the first time a function in the
    ///   module is resolved. If it fails, it will be called again on the next attempt.
    ///
    pub fn register_module<S, F>(&mut self, name: S, loader: F)
    where
        S: Into<String>,
        F: Fn() -> Result<Module> + Send + Sync + 'static,
    {
        let name = name.into();
        self.loaded.lock().remove(&name);
        self.loaders.insert(name, Box::new(loader));
    }

    /// Whether module `name` has been loaded
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.lock().contains_key(name)
    }

    /// Look up the function for `reference`.
    ///
    pub fn resolve(&self, reference: &str) -> Result<DeriveFn> {
        let unresolved = |reason: String| Error::UnresolvedFunction {
            reference: reference.to_string(),
            reason,
        };

        match reference.rsplit_once('.') {
            None => self.builtins.get(reference).ok_or_else(|| {
                unresolved(format!("no built-in function in '{NAMESPACE}' has that name"))
            }),
            Some((module_path, name)) if module_path == NAMESPACE => {
                self.builtins.get(name).ok_or_else(|| {
                    unresolved(format!("no built-in function in '{NAMESPACE}' has that name"))
                })
            }
            Some((module_path, name)) => {
                let module = self.load(module_path).map_err(|err| match err {
                    Error::UnresolvedFunction { reason, .. } => unresolved(reason),
                    err => unresolved(format!("module '{module_path}' failed to load: {err}")),
                })?;
                module.get(name).ok_or_else(|| {
                    unresolved(format!("module '{module_path}' has no function '{name}'"))
                })
            }
        }
    }

    fn load(&self, module_path: &str) -> Result<Arc<Module>> {
        if let Some(module) = self.loaded.lock().get(module_path) {
            return Ok(Arc::clone(module));
        }

        let loader = self
            .loaders
            .get(module_path)
            .ok_or_else(|| Error::UnresolvedFunction {
                reference: module_path.to_string(),
                reason: format!("module '{module_path}' is not registered"),
            })?;
        debug!("Loading module '{module_path}'");
        let module = Arc::new(loader()?);

        // If somebody else got here first, use theirs
        let mut loaded = self.loaded.lock();
        let module = loaded
            .entry(module_path.to_string())
            .or_insert(module);

        Ok(Arc::clone(module))
    }
}
