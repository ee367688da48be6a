//! Generated value trees.

use crate::schema::{names, ClassId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::json;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// An owned, finite value produced for a node.
///
/// Cycles in the type structure are cut by back-edges, which produce `Null`
/// (or a primitive default), so a value tree never refers to itself.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Uuid(uuid::Uuid),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Instant(DateTime<Utc>),
    Enum {
        class: ClassId,
        variant: Arc<str>,
    },
    Record {
        class: ClassId,
        /// Values passed to the constructor, by parameter name.
        constructor_args: Vec<(Arc<str>, Value)>,
        fields: Vec<(Arc<str>, Value)>,
    },
    Collection {
        class: ClassId,
        items: Vec<Value>,
    },
    Map {
        class: ClassId,
        entries: Vec<(Value, Value)>,
    },
    Array {
        component: ClassId,
        items: Vec<Value>,
    },
}

impl Value {
    /// The default for a position of class `class`: zero for primitives,
    /// `Null` for everything else.
    pub fn default_for(class: &ClassId) -> Value {
        match class.as_str() {
            "boolean" => Value::Bool(false),
            "char" => Value::Char('\0'),
            "byte" => Value::Byte(0),
            "short" => Value::Short(0),
            "int" => Value::Int(0),
            "long" => Value::Long(0),
            "float" => Value::Float(0.0),
            "double" => Value::Double(0.0),
            _ => Value::Null,
        }
    }

    /// Runtime class of the value. Scalars report their boxed class; `Null`
    /// has none.
    pub fn runtime_class(&self) -> Option<ClassId> {
        let name = match self {
            Value::Null => return None,
            Value::Bool(_) => "Boolean",
            Value::Char(_) => "Character",
            Value::Byte(_) => "Byte",
            Value::Short(_) => "Short",
            Value::Int(_) => "Integer",
            Value::Long(_) => "Long",
            Value::Float(_) => "Float",
            Value::Double(_) => "Double",
            Value::Str(_) => names::STRING,
            Value::Uuid(_) => names::UUID,
            Value::Date(_) => names::LOCAL_DATE,
            Value::DateTime(_) => names::LOCAL_DATE_TIME,
            Value::Instant(_) => names::INSTANT,
            Value::Enum { class, .. }
            | Value::Record { class, .. }
            | Value::Collection { class, .. }
            | Value::Map { class, .. } => return Some(class.clone()),
            Value::Array { component, .. } => return Some(ClassId::array_of(component)),
        };
        Some(ClassId::new(name))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// A record field by name. A subclass field shadows an inherited one.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record { fields, .. } => fields
                .iter()
                .rev()
                .find(|(n, _)| n.as_ref() == name)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn constructor_arg(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record {
                constructor_args, ..
            } => constructor_args
                .iter()
                .find(|(n, _)| n.as_ref() == name)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Elements of a collection or array.
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Value::Collection { items, .. } | Value::Array { items, .. } => Some(items),
            _ => None,
        }
    }

    pub fn entries(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map { entries, .. } => Some(entries),
            _ => None,
        }
    }

    /// Element or entry count of a container.
    pub fn len(&self) -> Option<usize> {
        self.items()
            .map(<[Value]>::len)
            .or_else(|| self.entries().map(<[(Value, Value)]>::len))
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Total order used to emit sorted containers.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        use Value::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Char(a), Char(b)) => a.cmp(b),
            (Byte(a), Byte(b)) => a.cmp(b),
            (Short(a), Short(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Long(a), Long(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Double(a), Double(b)) => a.total_cmp(b),
            (Str(a), Str(b)) => a.cmp(b),
            (Uuid(a), Uuid(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            (Instant(a), Instant(b)) => a.cmp(b),
            (Enum { variant: a, .. }, Enum { variant: b, .. }) => a.cmp(b),
            (Record { fields: a, .. }, Record { fields: b, .. }) => cmp_seq(
                a.iter().map(|(_, v)| v),
                b.iter().map(|(_, v)| v),
            ),
            (Collection { items: a, .. }, Collection { items: b, .. })
            | (Array { items: a, .. }, Array { items: b, .. }) => cmp_seq(a.iter(), b.iter()),
            (Map { entries: a, .. }, Map { entries: b, .. }) => cmp_seq(
                a.iter().flat_map(|(k, v)| [k, v]),
                b.iter().flat_map(|(k, v)| [k, v]),
            ),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Char(_) => 2,
            Value::Byte(_) => 3,
            Value::Short(_) => 4,
            Value::Int(_) => 5,
            Value::Long(_) => 6,
            Value::Float(_) => 7,
            Value::Double(_) => 8,
            Value::Str(_) => 9,
            Value::Uuid(_) => 10,
            Value::Date(_) => 11,
            Value::DateTime(_) => 12,
            Value::Instant(_) => 13,
            Value::Enum { .. } => 14,
            Value::Record { .. } => 15,
            Value::Collection { .. } => 16,
            Value::Map { .. } => 17,
            Value::Array { .. } => 18,
        }
    }

    /// Render as JSON. Records become objects (constructor arguments first),
    /// containers become arrays, maps with scalar keys become objects and
    /// other maps become arrays of `[key, value]` pairs.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(v) => json!(v),
            Value::Char(v) => json!(v.to_string()),
            Value::Byte(v) => json!(v),
            Value::Short(v) => json!(v),
            Value::Int(v) => json!(v),
            Value::Long(v) => json!(v),
            Value::Float(v) => json!(v),
            Value::Double(v) => json!(v),
            Value::Str(v) => json!(v),
            Value::Uuid(v) => json!(v.to_string()),
            Value::Date(v) => json!(v.to_string()),
            Value::DateTime(v) => json!(v.to_string()),
            Value::Instant(v) => json!(v.to_rfc3339()),
            Value::Enum { variant, .. } => json!(variant.to_string()),
            Value::Record {
                constructor_args,
                fields,
                ..
            } => {
                let mut object = serde_json::Map::new();
                for (name, value) in constructor_args.iter().chain(fields) {
                    object.insert(name.to_string(), value.to_json());
                }
                serde_json::Value::Object(object)
            }
            Value::Collection { items, .. } | Value::Array { items, .. } => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map { entries, .. } => {
                if entries.iter().all(|(k, _)| k.is_scalar()) {
                    let mut object = serde_json::Map::new();
                    for (key, value) in entries {
                        object.insert(key.key_text(), value.to_json());
                    }
                    serde_json::Value::Object(object)
                } else {
                    serde_json::Value::Array(
                        entries
                            .iter()
                            .map(|(k, v)| json!([k.to_json(), v.to_json()]))
                            .collect(),
                    )
                }
            }
        }
    }

    fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Value::Record { .. } | Value::Collection { .. } | Value::Map { .. } | Value::Array { .. }
        )
    }

    fn key_text(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Char(c) => c.to_string(),
            other => other.to_string(),
        }
    }
}

fn cmp_seq<'a>(
    mut a: impl Iterator<Item = &'a Value>,
    mut b: impl Iterator<Item = &'a Value>,
) -> Ordering {
    loop {
        match (a.next(), b.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match x.total_cmp(y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

fn write_seq<T>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
    mut each: impl FnMut(&mut fmt::Formatter<'_>, T) -> fmt::Result,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        each(f, item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "'{}'", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "\"{}\"", v),
            Value::Uuid(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v),
            Value::Instant(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Enum { variant, .. } => f.write_str(variant),
            Value::Record {
                class,
                constructor_args,
                fields,
            } => {
                write!(f, "{}{{", class)?;
                write_seq(f, constructor_args.iter().chain(fields), |f, (name, value)| {
                    write!(f, "{}={}", name, value)
                })?;
                f.write_str("}")
            }
            Value::Collection { items, .. } | Value::Array { items, .. } => {
                f.write_str("[")?;
                write_seq(f, items.iter(), |f, item| write!(f, "{}", item))?;
                f.write_str("]")
            }
            Value::Map { entries, .. } => {
                f.write_str("{")?;
                write_seq(f, entries.iter(), |f, (k, v)| write!(f, "{}={}", k, v))?;
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}
