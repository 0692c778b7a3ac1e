//! # Function Catalog
//!
//! Immutable table of callable function signatures, indexed by name.
//! Overloads are tried in registration order; the first signature whose
//! declared argument types accept the actual argument types wins.

use std::collections::HashMap;

use crate::errors::{ODataError, ODataResult};
use crate::metadata::EdmType;

/// Name of the internal null test used by null-guard expansion
pub const IS_NULL: &str = "is_null";

/// A callable function signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub arg_types: Vec<EdmType>,
    pub return_type: EdmType,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>, arg_types: &[EdmType], return_type: EdmType) -> Self {
        Self {
            name: name.into(),
            arg_types: arg_types.to_vec(),
            return_type,
        }
    }

    /// `is_null(resource)`, never resolvable from `$filter` text
    pub fn is_null() -> Self {
        Self::new(IS_NULL, &[EdmType::Resource], EdmType::Boolean)
    }

    pub fn arity(&self) -> usize {
        self.arg_types.len()
    }

    /// Whether every declared argument accepts the given actual type
    pub fn accepts(&self, arg_types: &[EdmType]) -> bool {
        self.arity() == arg_types.len()
            && self
                .arg_types
                .iter()
                .zip(arg_types)
                .all(|(declared, actual)| declared.accepts(*actual))
    }
}

/// Function signatures by name
#[derive(Debug, Clone)]
pub struct FunctionCatalog {
    signatures: HashMap<String, Vec<FunctionSignature>>,
}

impl Default for FunctionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl FunctionCatalog {
    /// Catalog with no functions
    pub fn empty() -> Self {
        Self {
            signatures: HashMap::new(),
        }
    }

    /// Canonical string, date and math functions
    pub fn standard() -> Self {
        use EdmType::*;

        let mut catalog = Self::empty();
        let signatures = [
            FunctionSignature::new("substringof", &[String, String], Boolean),
            FunctionSignature::new("startswith", &[String, String], Boolean),
            FunctionSignature::new("endswith", &[String, String], Boolean),
            FunctionSignature::new("indexof", &[String, String], Int32),
            FunctionSignature::new("length", &[String], Int32),
            FunctionSignature::new("replace", &[String, String, String], String),
            FunctionSignature::new("substring", &[String, Int32], String),
            FunctionSignature::new("substring", &[String, Int32, Int32], String),
            FunctionSignature::new("tolower", &[String], String),
            FunctionSignature::new("toupper", &[String], String),
            FunctionSignature::new("trim", &[String], String),
            FunctionSignature::new("concat", &[String, String], String),
            FunctionSignature::new("year", &[DateTime], Int32),
            FunctionSignature::new("month", &[DateTime], Int32),
            FunctionSignature::new("day", &[DateTime], Int32),
            FunctionSignature::new("hour", &[DateTime], Int32),
            FunctionSignature::new("minute", &[DateTime], Int32),
            FunctionSignature::new("second", &[DateTime], Int32),
            // Decimal before Double so integral and decimal arguments stay decimal
            FunctionSignature::new("round", &[Decimal], Decimal),
            FunctionSignature::new("round", &[Double], Double),
            FunctionSignature::new("floor", &[Decimal], Decimal),
            FunctionSignature::new("floor", &[Double], Double),
            FunctionSignature::new("ceiling", &[Decimal], Decimal),
            FunctionSignature::new("ceiling", &[Double], Double),
        ];
        for signature in signatures {
            catalog.register(signature);
        }
        catalog
    }

    /// Add a signature, returning the extended catalog
    pub fn with_signature(mut self, signature: FunctionSignature) -> Self {
        self.register(signature);
        self
    }

    fn register(&mut self, signature: FunctionSignature) {
        self.signatures
            .entry(signature.name.clone())
            .or_default()
            .push(signature);
    }

    /// Whether any signature carries this name
    pub fn contains(&self, name: &str) -> bool {
        self.signatures.contains_key(name)
    }

    /// Candidate signatures with the given name and arity
    pub fn resolve(&self, name: &str, arg_count: usize) -> Vec<&FunctionSignature> {
        self.signatures
            .get(name)
            .map(|sigs| sigs.iter().filter(|s| s.arity() == arg_count).collect())
            .unwrap_or_default()
    }

    /// First candidate accepting the actual argument types
    pub fn best_match(
        &self,
        name: &str,
        candidates: &[&FunctionSignature],
        arg_types: &[EdmType],
    ) -> ODataResult<FunctionSignature> {
        candidates
            .iter()
            .find(|candidate| candidate.accepts(arg_types))
            .map(|candidate| (*candidate).clone())
            .ok_or_else(|| {
                let names: Vec<String> = arg_types.iter().map(|t| t.to_string()).collect();
                ODataError::unknown_function(name, &names)
            })
    }

    /// Resolve and match in one step
    pub fn lookup(&self, name: &str, arg_types: &[EdmType]) -> ODataResult<FunctionSignature> {
        let candidates = self.resolve(name, arg_types.len());
        self.best_match(name, &candidates, arg_types)
    }
}
