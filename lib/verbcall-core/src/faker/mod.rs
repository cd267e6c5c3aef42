//! Example request synthesis from a JSON Schema.
//!
//! The [`SchemaFaker`] generates one document satisfying a JSON Schema
//! (draft-04, draft-06 and draft-07 subset). It follows the settings the verb
//! console relies on:
//!
//! - optional properties are always generated, like required ones,
//! - arrays never hold more than [`FakerOptions::max_items`] elements (2 by default),
//!   whatever `minItems` says,
//! - no schema gives an empty document (an empty string, not `{}`).
//!
//! ```rust
//! use verbcall_core::SchemaFaker;
//!
//! let schema = r#"{
//!     "type": "object",
//!     "properties": { "name": { "type": "string" } },
//!     "required": []
//! }"#;
//!
//! let mut faker = SchemaFaker::with_seed(7);
//! let text = faker.fake_request(Some(schema))?;
//! let document: serde_json::Value = serde_json::from_str(&text)?;
//! assert!(document["name"].is_string());
//!
//! assert_eq!(faker.fake_request(None)?, "");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Number, Value};
use tracing::debug;

mod error;
pub use self::error::FakerError;

mod resolver;
use self::resolver::{deref_schema, flatten_all_of, merge_branch, schema_types};

mod strings;

/// Depth after which the generation stops, even for required properties.
const HARD_DEPTH_MARGIN: usize = 32;

/// Spread of the generated numbers when a bound is missing.
const DEFAULT_NUMBER_SPAN: f64 = 100.0;

/// Tries before giving up on an extra unique array item.
const UNIQUE_ITEM_ATTEMPTS: usize = 8;

/// Consecutive factors tried for a `multipleOf` value.
const MULTIPLE_ATTEMPTS: u16 = 32;

/// Decimal places kept for a fractional `multipleOf`.
const MAX_DECIMALS: i32 = 12;

/// Options of the [`SchemaFaker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakerOptions {
    /// Maximum number of generated array elements (default: 2).
    pub max_items: usize,
    /// Generate optional properties too (default: `true`).
    pub always_fake_optionals: bool,
    /// Nesting depth after which only required properties and minimal arrays
    /// are generated (default: 6).
    pub max_depth: usize,
}

impl Default for FakerOptions {
    fn default() -> Self {
        Self {
            max_items: 2,
            always_fake_optionals: true,
            max_depth: 6,
        }
    }
}

/// Generates example documents from JSON Schemas.
///
/// The faker never mutates the schema it receives.
#[derive(derive_more::Debug, Clone)]
pub struct SchemaFaker {
    options: FakerOptions,
    #[debug(skip)]
    rng: StdRng,
}

impl Default for SchemaFaker {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaFaker {
    /// Creates a faker seeded from the OS entropy.
    pub fn new() -> Self {
        Self {
            options: FakerOptions::default(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a reproducible faker.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            options: FakerOptions::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Replaces the generation options.
    #[must_use]
    pub fn with_options(mut self, options: FakerOptions) -> Self {
        self.options = options;
        self
    }

    /// The current options.
    pub fn options(&self) -> FakerOptions {
        self.options
    }

    /// Generates the initial request text for a verb.
    ///
    /// Returns an empty string without schema, otherwise the generated document
    /// indented with 2 spaces.
    ///
    /// # Errors
    ///
    /// Fails if the schema text is not JSON, or if it cannot be satisfied.
    pub fn fake_request(&mut self, schema: Option<&str>) -> Result<String, FakerError> {
        let Some(schema) = schema else {
            return Ok(String::new());
        };
        let schema = serde_json::from_str::<Value>(schema)?;
        let document = self.generate(&schema)?;
        crate::json::to_string_pretty(&document).map_err(FakerError::Serialization)
    }

    /// Generates a document satisfying the schema.
    ///
    /// # Errors
    ///
    /// Fails on unresolved `$ref`, contradictory constraints, or unbounded
    /// recursion through required properties.
    pub fn generate(&mut self, schema: &Value) -> Result<Value, FakerError> {
        self.generate_value(schema, schema, 0)
    }

    fn generate_value(&mut self, root: &Value, schema: &Value, depth: usize) -> Result<Value, FakerError> {
        if depth > self.options.max_depth + HARD_DEPTH_MARGIN {
            return Err(FakerError::RecursionLimit { depth });
        }

        let schema = deref_schema(root, schema)?;
        let Value::Object(keywords) = schema else {
            // `true`, `false` or garbage
            return Ok(Value::Null);
        };

        if keywords.contains_key("allOf") {
            let flat = flatten_all_of(root, schema)?;
            return self.generate_value(root, &flat, depth + 1);
        }
        if let Some(value) = keywords.get("const") {
            return Ok(value.clone());
        }
        if let Some(Value::Array(values)) = keywords.get("enum") {
            return Ok(values.choose(&mut self.rng).cloned().unwrap_or(Value::Null));
        }
        if let Some(Value::Array(branches)) = keywords.get("oneOf").or_else(|| keywords.get("anyOf")) {
            // the first `oneOf` branch is the most likely to exclude the others
            let branch = if keywords.contains_key("oneOf") {
                branches.first()
            } else {
                branches.choose(&mut self.rng)
            };
            if let Some(branch) = branch {
                let merged = merge_branch(root, schema, branch)?;
                return self.generate_value(root, &merged, depth + 1);
            }
        }

        let types = schema_types(schema);
        let candidates = types
            .iter()
            .copied()
            .filter(|name| *name != "null")
            .collect::<Vec<_>>();
        let Some(kind) = candidates.choose(&mut self.rng).copied() else {
            return Ok(Value::Null);
        };

        match kind {
            "object" => self.fake_object(root, keywords, depth),
            "array" => self.fake_array(root, keywords, depth),
            "string" => Ok(Value::String(strings::fake_string(&mut self.rng, schema))),
            "integer" => self.fake_integer(keywords),
            "number" => self.fake_number(keywords),
            "boolean" => Ok(Value::Bool(self.rng.gen_bool(0.5))),
            _ => Ok(Value::Null),
        }
    }

    fn fake_object(
        &mut self,
        root: &Value,
        keywords: &Map<String, Value>,
        depth: usize,
    ) -> Result<Value, FakerError> {
        let deep = depth >= self.options.max_depth;
        let required = keywords
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();
        let additional = keywords.get("additionalProperties");
        let extra_schema = match additional {
            Some(Value::Object(_)) => additional.cloned(),
            Some(Value::Bool(false)) => None,
            _ => Some(serde_json::json!({ "type": "string" })),
        };

        let mut result = Map::new();
        if let Some(Value::Object(properties)) = keywords.get("properties") {
            for (name, property) in properties {
                let is_required = required.contains(&name.as_str());
                let include = is_required
                    || (!deep
                        && (self.options.always_fake_optionals || self.rng.gen_bool(0.5)));
                if include {
                    let value = self.generate_value(root, property, depth + 1)?;
                    result.insert(name.clone(), value);
                }
            }
        }

        // required names without a declared property
        for name in &required {
            if result.contains_key(*name) {
                continue;
            }
            let value = match &extra_schema {
                Some(extra) => self.generate_value(root, extra, depth + 1)?,
                None => Value::Null,
            };
            result.insert(name.to_string(), value);
        }

        let min_properties = usize_keyword(keywords, "minProperties").unwrap_or(0);
        if let Some(extra) = &extra_schema {
            let mut index = 1;
            while result.len() < min_properties {
                let key = format!("key{index}");
                index += 1;
                if result.contains_key(&key) {
                    continue;
                }
                let value = self.generate_value(root, extra, depth + 1)?;
                result.insert(key, value);
            }
        }

        if let Some(max_properties) = usize_keyword(keywords, "maxProperties") {
            let optionals = result
                .keys()
                .filter(|key| !required.contains(&key.as_str()))
                .cloned()
                .collect::<Vec<_>>();
            for key in optionals.into_iter().rev() {
                if result.len() <= max_properties {
                    break;
                }
                result.shift_remove(&key);
            }
        }

        Ok(Value::Object(result))
    }

    fn fake_array(
        &mut self,
        root: &Value,
        keywords: &Map<String, Value>,
        depth: usize,
    ) -> Result<Value, FakerError> {
        let cap = self.options.max_items;
        let min_items = usize_keyword(keywords, "minItems").unwrap_or(0);
        let upper = usize_keyword(keywords, "maxItems").map_or(cap, |max| max.min(cap));
        let lower = min_items.min(upper);
        let count = if depth >= self.options.max_depth || lower == upper {
            lower
        } else {
            self.rng.gen_range(lower.max(1)..=upper)
        };
        let unique = keywords
            .get("uniqueItems")
            .and_then(Value::as_bool)
            .unwrap_or_default();

        let default_item = serde_json::json!({ "type": "string" });
        let mut items = Vec::with_capacity(count);
        for index in 0..count {
            let item_schema = match keywords.get("items") {
                Some(Value::Array(tuple)) => match tuple.get(index) {
                    Some(schema) => schema,
                    None => break,
                },
                Some(schema) => schema,
                None => &default_item,
            };

            let mut item = self.generate_value(root, item_schema, depth + 1)?;
            if unique {
                let mut attempts = 0;
                while items.contains(&item) && attempts < UNIQUE_ITEM_ATTEMPTS {
                    item = self.generate_value(root, item_schema, depth + 1)?;
                    attempts += 1;
                }
                if items.contains(&item) {
                    debug!(index, "cannot generate another unique item");
                    break;
                }
            }
            items.push(item);
        }

        Ok(Value::Array(items))
    }

    fn fake_integer(&mut self, keywords: &Map<String, Value>) -> Result<Value, FakerError> {
        let (low, high) = numeric_bounds(keywords);
        let low = low.map(|bound| bound.lowest(INTEGER_STEP));
        let high = high.map(|bound| bound.highest(INTEGER_STEP));
        let (min, max) = span_around(low, high, 1.0);
        let (min, max) = (clamp_i64(min), clamp_i64(max));

        let value = if let Some(step) = multiple_of(keywords) {
            // integers are multiples of lcm(step, 1)
            let integer_step = integer_multiple(step).ok_or_else(|| {
                unsatisfiable(format!("no integer is a representable multiple of {step}"))
            })?;
            let first = div_ceil(min, integer_step);
            let last = max.div_euclid(integer_step);
            if first > last {
                return Err(unsatisfiable(format!(
                    "no multiple of {step} between {min} and {max}"
                )));
            }
            #[allow(clippy::cast_precision_loss)]
            let (first, last, scale) = (first as f64, last as f64, integer_step as f64);
            clamp_i64(self.pick_multiple(first, last, scale, step, 0))
        } else {
            if min > max {
                return Err(unsatisfiable(format!(
                    "minimum {min} is greater than maximum {max}"
                )));
            }
            self.rng.gen_range(min..=max)
        };
        Ok(Value::Number(Number::from(value)))
    }

    fn fake_number(&mut self, keywords: &Map<String, Value>) -> Result<Value, FakerError> {
        let (low, high) = numeric_bounds(keywords);
        let nudge = match (low, high) {
            (Some(low), Some(high)) => ((high.value - low.value).abs() / 1000.0).min(0.01),
            _ => 0.01,
        };
        let low = low.map(|bound| bound.lowest(nudge));
        let high = high.map(|bound| bound.highest(nudge));
        let (min, max) = span_around(low, high, 0.0);
        if min > max {
            return Err(unsatisfiable(format!(
                "minimum {min} is greater than maximum {max}"
            )));
        }

        let value = if let Some(step) = multiple_of(keywords) {
            let first = (min / step).ceil();
            let last = (max / step).floor();
            if first > last {
                return Err(unsatisfiable(format!(
                    "no multiple of {step} between {min} and {max}"
                )));
            }
            self.pick_multiple(first, last, step, step, decimal_places(step))
        } else {
            let raw = if min < max {
                self.rng.gen_range(min..=max)
            } else {
                min
            };
            // two decimals when it stays within bounds
            let rounded = (raw * 100.0).round() / 100.0;
            if (min..=max).contains(&rounded) {
                rounded
            } else {
                raw
            }
        };

        Ok(Number::from_f64(value).map_or(Value::Null, Value::Number))
    }

    /// Draws `factor * scale` for a factor within `first..=last`, rounded to
    /// `decimals`, and keeps the first candidate `jsonschema` accepts as a
    /// multiple of `step`.
    fn pick_multiple(
        &mut self,
        first: f64,
        last: f64,
        scale: f64,
        step: f64,
        decimals: i32,
    ) -> f64 {
        let start = if first < last {
            self.rng.gen_range(first..=last).round()
        } else {
            first
        };
        let candidate = |factor: f64| round_to(factor * scale, decimals);

        let check = serde_json::json!({ "multipleOf": step });
        let Ok(validator) = jsonschema::validator_for(&check) else {
            return candidate(start);
        };
        let span = last - first + 1.0;
        let mut offset = 0.0;
        while offset < span && offset < f64::from(MULTIPLE_ATTEMPTS) {
            let factor = first + (start - first + offset) % span;
            let value = candidate(factor);
            if Number::from_f64(value)
                .is_some_and(|number| validator.is_valid(&Value::Number(number)))
            {
                return value;
            }
            offset += 1.0;
        }
        // zero is a multiple of anything
        if (first..=last).contains(&0.0) {
            return 0.0;
        }
        debug!(step, "no candidate accepted as a multiple, keeping the first one");
        candidate(start)
    }
}

const INTEGER_STEP: f64 = 1.0;

/// A numeric bound, possibly exclusive.
#[derive(Debug, Clone, Copy)]
struct Bound {
    value: f64,
    exclusive: bool,
}

impl Bound {
    /// Smallest admissible value when used as a lower bound.
    fn lowest(self, step: f64) -> f64 {
        match (self.exclusive, step >= INTEGER_STEP) {
            (true, true) => self.value.floor() + 1.0,
            (true, false) => self.value + step,
            (false, true) => self.value.ceil(),
            (false, false) => self.value,
        }
    }

    /// Largest admissible value when used as an upper bound.
    fn highest(self, step: f64) -> f64 {
        match (self.exclusive, step >= INTEGER_STEP) {
            (true, true) => self.value.ceil() - 1.0,
            (true, false) => self.value - step,
            (false, true) => self.value.floor(),
            (false, false) => self.value,
        }
    }
}

/// Fills a missing side with [`DEFAULT_NUMBER_SPAN`].
fn span_around(low: Option<f64>, high: Option<f64>, default_low: f64) -> (f64, f64) {
    match (low, high) {
        (Some(low), Some(high)) => (low, high),
        (Some(low), None) => (low, low + DEFAULT_NUMBER_SPAN),
        (None, Some(high)) => (high - DEFAULT_NUMBER_SPAN, high),
        (None, None) => (default_low, default_low + DEFAULT_NUMBER_SPAN),
    }
}

/// Reads `minimum`/`maximum` with both draft-04 (boolean) and draft-06+
/// (numeric) exclusive bounds.
fn numeric_bounds(keywords: &Map<String, Value>) -> (Option<Bound>, Option<Bound>) {
    let bound = |inclusive: &str, exclusive: &str| {
        let inclusive_value = keywords.get(inclusive).and_then(Value::as_f64);
        match keywords.get(exclusive) {
            Some(Value::Bool(true)) => inclusive_value.map(|value| Bound {
                value,
                exclusive: true,
            }),
            Some(Value::Number(number)) => {
                let exclusive_value = number.as_f64().unwrap_or_default();
                let exclusive_bound = Bound {
                    value: exclusive_value,
                    exclusive: true,
                };
                // keep the most restrictive of both
                Some(match inclusive_value {
                    Some(value) if inclusive == "minimum" && value > exclusive_value => Bound {
                        value,
                        exclusive: false,
                    },
                    Some(value) if inclusive == "maximum" && value < exclusive_value => Bound {
                        value,
                        exclusive: false,
                    },
                    _ => exclusive_bound,
                })
            }
            _ => inclusive_value.map(|value| Bound {
                value,
                exclusive: false,
            }),
        }
    };
    (
        bound("minimum", "exclusiveMinimum"),
        bound("maximum", "exclusiveMaximum"),
    )
}

fn usize_keyword(keywords: &Map<String, Value>, key: &str) -> Option<usize> {
    keywords
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|value| usize::try_from(value).ok())
}

#[allow(clippy::cast_possible_truncation)]
fn clamp_i64(value: f64) -> i64 {
    // `as` saturates on overflow
    value as i64
}

/// A strictly positive `multipleOf`.
fn multiple_of(keywords: &Map<String, Value>) -> Option<f64> {
    keywords
        .get("multipleOf")
        .and_then(Value::as_f64)
        .filter(|step| step.is_finite() && *step > 0.0)
}

/// Decimal places of the shortest representation of `step`.
fn decimal_places(step: f64) -> i32 {
    let text = step.to_string();
    let decimals = text
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len());
    i32::try_from(decimals).map_or(MAX_DECIMALS, |decimals| decimals.min(MAX_DECIMALS))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    if decimals == 0 {
        return value.round();
    }
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// The smallest integer multiple of `step`: `lcm(step, 1)`.
fn integer_multiple(step: f64) -> Option<i64> {
    let decimals = decimal_places(step);
    let denominator = 10_i64.checked_pow(u32::try_from(decimals).ok()?)?;
    #[allow(clippy::cast_precision_loss)]
    let numerator = clamp_i64((step * denominator as f64).round());
    if numerator <= 0 {
        return None;
    }
    let lcm = numerator.checked_mul(denominator)? / gcd(numerator, denominator);
    Some(lcm / denominator)
}

fn gcd(mut left: i64, mut right: i64) -> i64 {
    while right != 0 {
        (left, right) = (right, left % right);
    }
    left
}

fn div_ceil(value: i64, step: i64) -> i64 {
    let quotient = value.div_euclid(step);
    if value.rem_euclid(step) == 0 {
        quotient
    } else {
        quotient + 1
    }
}

fn unsatisfiable(reason: String) -> FakerError {
    FakerError::Unsatisfiable { reason }
}
