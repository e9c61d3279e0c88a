//! Configuration surface of an effect.
//!
//! Each effect declares its tunable values as [`ParamSpec`]s. A [`ParamSet`]
//! stores the current values, clamps every write into the declared range, and
//! produces the [`ParamDescriptor`] list a generic form generator (or the key
//! bindings in [`input`](crate::input)) needs to drive it.
//!
//! ```
//! use vfxe::params::{ParamSet, ParamSpec};
//!
//! let mut params = ParamSet::new(vec![
//!     ParamSpec::new("opacity", "Opacity", 0.1, 1.0, 0.1, 0.8),
//! ]);
//! assert_eq!(params.set("opacity", 3.0), Some(1.0));
//! ```

/// Declaration of one tunable parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Key used by `configure`.
    pub name: &'static str,
    /// Human readable label.
    pub label: &'static str,
    /// Inclusive lower bound.
    pub min: f32,
    /// Inclusive upper bound.
    pub max: f32,
    /// UI step size.
    pub step: f32,
    /// Initial value.
    pub default: f32,
    /// Whether the value is a whole number (counts, iteration budgets).
    pub integer: bool,
}

impl ParamSpec {
    /// A continuous parameter.
    pub const fn new(
        name: &'static str,
        label: &'static str,
        min: f32,
        max: f32,
        step: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            label,
            min,
            max,
            step,
            default,
            integer: false,
        }
    }

    /// A whole-number parameter. Written values are rounded.
    pub const fn integer(
        name: &'static str,
        label: &'static str,
        min: f32,
        max: f32,
        step: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            label,
            min,
            max,
            step,
            default,
            integer: true,
        }
    }

    /// Bring `value` into range. NaN maps to the default.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        let v = value.clamp(self.min, self.max);
        if self.integer {
            v.round()
        } else {
            v
        }
    }
}

/// One row of an effect's configuration surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

/// Current values for a fixed list of parameters.
#[derive(Debug, Clone)]
pub struct ParamSet {
    specs: Vec<ParamSpec>,
    values: Vec<f32>,
}

impl ParamSet {
    /// Create a set with every parameter at its default.
    pub fn new(specs: Vec<ParamSpec>) -> Self {
        let values = specs.iter().map(|s| s.clamp(s.default)).collect();
        Self { specs, values }
    }

    /// Current value of `name`, if declared.
    pub fn get(&self, name: &str) -> Option<f32> {
        self.index_of(name).map(|i| self.values[i])
    }

    /// Current value of a parameter the caller declared itself.
    ///
    /// Falls back to 0 for an undeclared name; effects only read their own keys.
    pub fn value(&self, name: &str) -> f32 {
        self.get(name).unwrap_or(0.0)
    }

    /// Clamp and store. Returns the stored value, or `None` for an unknown name.
    pub fn set(&mut self, name: &str, value: f32) -> Option<f32> {
        let i = self.index_of(name)?;
        let v = self.specs[i].clamp(value);
        self.values[i] = v;
        Some(v)
    }

    /// Declaration for `name`.
    pub fn spec(&self, name: &str) -> Option<&ParamSpec> {
        self.index_of(name).map(|i| &self.specs[i])
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether no parameters are declared.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// The configuration surface, in declaration order.
    pub fn describe(&self) -> Vec<ParamDescriptor> {
        self.specs
            .iter()
            .zip(&self.values)
            .map(|(s, &value)| ParamDescriptor {
                name: s.name,
                label: s.label,
                value,
                min: s.min,
                max: s.max,
                step: s.step,
            })
            .collect()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.name == name)
    }
}
