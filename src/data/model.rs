use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ProfileError, Result};

// ---------------------------------------------------------------------------
// AttributeValue – a single netCDF-style attribute
// ---------------------------------------------------------------------------

/// Attribute value attached to a variable or to the whole dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
    Numbers(Vec<f64>),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(s) => write!(f, "{s}"),
            AttributeValue::Number(v) => write!(f, "{v}"),
            AttributeValue::Numbers(vs) => {
                let parts: Vec<String> = vs.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl AttributeValue {
    /// Numeric view of the attribute (first element for arrays).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(v) => Some(*v),
            AttributeValue::Numbers(vs) => vs.first().copied(),
            AttributeValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

pub type Attributes = BTreeMap<String, AttributeValue>;

// ---------------------------------------------------------------------------
// Variable – one named n-dimensional array
// ---------------------------------------------------------------------------

/// A named array stored row-major; the leading dimension indexes dive cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
    pub attributes: Attributes,
}

impl Variable {
    /// Build a variable, checking that `shape` accounts for every value.
    pub fn new(name: impl Into<String>, shape: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(ProfileError::InvalidShape {
                name,
                shape,
                len: values.len(),
            });
        }
        Ok(Variable {
            name,
            shape,
            values,
            attributes: Attributes::new(),
        })
    }

    /// A rank-1 variable holding a single stream.
    pub fn from_series(name: impl Into<String>, values: Vec<f64>) -> Self {
        Variable {
            name: name.into(),
            shape: vec![values.len()],
            values,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: AttributeValue) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of dive cycles. Rank 0 and rank 1 variables hold one.
    pub fn cycles(&self) -> usize {
        if self.rank() >= 2 {
            self.shape[0]
        } else {
            1
        }
    }

    /// Samples per dive cycle once the trailing dimensions are flattened.
    pub fn cycle_len(&self) -> usize {
        match self.rank() {
            0 => 1,
            1 => self.shape[0],
            _ => self.shape[1..].iter().product(),
        }
    }

    pub fn units(&self) -> Option<&str> {
        self.attributes.get("units").and_then(AttributeValue::as_str)
    }

    pub fn long_name(&self) -> Option<&str> {
        self.attributes
            .get("long_name")
            .and_then(AttributeValue::as_str)
    }
}

// ---------------------------------------------------------------------------
// ProfileDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// All variables of one deployment file, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ProfileDataset {
    /// Path or URL the dataset was read from.
    pub location: String,
    pub variables: BTreeMap<String, Variable>,
    pub attributes: Attributes,
}

impl ProfileDataset {
    pub fn from_variables(location: impl Into<String>, variables: Vec<Variable>) -> Self {
        ProfileDataset {
            location: location.into(),
            variables: variables.into_iter().map(|v| (v.name.clone(), v)).collect(),
            attributes: Attributes::new(),
        }
    }

    /// Look up a variable, failing with [`ProfileError::VariableNotFound`].
    pub fn variable(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| ProfileError::VariableNotFound {
                name: name.to_string(),
            })
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    /// Largest dive-cycle count among the variables.
    pub fn cycles(&self) -> usize {
        self.variables
            .values()
            .map(Variable::cycles)
            .max()
            .unwrap_or(0)
    }

    /// Dataset title from the global attributes, falling back to the location.
    pub fn title(&self) -> &str {
        self.attributes
            .get("title")
            .and_then(AttributeValue::as_str)
            .unwrap_or(&self.location)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the dataset holds no variables.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
