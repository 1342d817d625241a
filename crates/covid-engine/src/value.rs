//! The nested output structure every view produces.
//!
//! A [`Value`] is plain data: strings, numbers, lists and insertion-ordered
//! mappings. It is built fresh per request and handed to the serialization
//! boundary. Mappings keep insertion order so ranked views serialize in rank
//! order; every other view inserts keys in sorted order.

use serde::{Serialize, Serializer, ser::SerializeMap};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Null,
  Int(i64),
  Float(f64),
  Text(String),
  List(Vec<Value>),
  Map(Mapping),
}

impl Value {
  /// Convert any serde-serializable value (records, projections) into a
  /// [`Value`].
  pub fn from_serialize<T: Serialize>(value: &T) -> serde_json::Result<Self> {
    Ok(Self::from(serde_json::to_value(value)?))
  }

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Int(i) => Some(*i as f64),
      Self::Float(f) => Some(*f),
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_map(&self) -> Option<&Mapping> {
    match self {
      Self::Map(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[Value]> {
    match self {
      Self::List(l) => Some(l),
      _ => None,
    }
  }

  /// `true` for an empty mapping or list.
  pub fn is_empty(&self) -> bool {
    match self {
      Self::Map(m) => m.is_empty(),
      Self::List(l) => l.is_empty(),
      _ => false,
    }
  }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self { Self::Int(v) }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self { Self::Float(v) }
}

impl From<String> for Value {
  fn from(v: String) -> Self { Self::Text(v) }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl From<Mapping> for Value {
  fn from(v: Mapping) -> Self { Self::Map(v) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

impl From<serde_json::Value> for Value {
  fn from(v: serde_json::Value) -> Self {
    match v {
      serde_json::Value::Null => Self::Null,
      serde_json::Value::Bool(b) => Self::Int(i64::from(b)),
      serde_json::Value::Number(n) => match n.as_i64() {
        Some(i) => Self::Int(i),
        None => n.as_f64().map_or(Self::Null, Self::Float),
      },
      serde_json::Value::String(s) => Self::Text(s),
      serde_json::Value::Array(items) => {
        Self::List(items.into_iter().map(Self::from).collect())
      }
      serde_json::Value::Object(obj) => {
        Self::Map(obj.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
      }
    }
  }
}

impl Serialize for Value {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::Null => serializer.serialize_none(),
      Self::Int(i) => serializer.serialize_i64(*i),
      // JSON has no NaN or infinity.
      Self::Float(f) if !f.is_finite() => serializer.serialize_none(),
      Self::Float(f) => serializer.serialize_f64(*f),
      Self::Text(s) => serializer.serialize_str(s),
      Self::List(items) => items.serialize(serializer),
      Self::Map(m) => m.serialize(serializer),
    }
  }
}

// ─── Mapping ─────────────────────────────────────────────────────────────────

/// An insertion-ordered string-keyed mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping(Vec<(String, Value)>);

impl Mapping {
  pub fn new() -> Self { Self::default() }

  /// Insert or replace `key`. A new key goes to the end; a replaced key keeps
  /// its position.
  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
    let key = key.into();
    let value = value.into();
    match self.0.iter_mut().find(|(k, _)| *k == key) {
      Some((_, slot)) => *slot = value,
      None => self.0.push((key, value)),
    }
  }

  /// The nested mapping under `key`, created empty if absent. A non-mapping
  /// value under `key` is replaced.
  pub fn child(&mut self, key: &str) -> &mut Mapping {
    let idx = match self.0.iter().position(|(k, _)| k == key) {
      Some(idx) => idx,
      None => {
        self.0.push((key.to_owned(), Value::Map(Mapping::new())));
        self.0.len() - 1
      }
    };
    let slot = &mut self.0[idx].1;
    if !matches!(slot, Value::Map(_)) {
      *slot = Value::Map(Mapping::new());
    }
    match slot {
      Value::Map(m) => m,
      _ => unreachable!("slot was just set to a mapping"),
    }
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> { self.0.iter().map(|(k, _)| k.as_str()) }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut m = Mapping::new();
    for (k, v) in iter {
      m.insert(k, v);
    }
    m
  }
}

impl Serialize for Mapping {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.0.len()))?;
    for (k, v) in &self.0 {
      map.serialize_entry(k, v)?;
    }
    map.end()
  }
}
