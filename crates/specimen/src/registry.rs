//! Leaf producers, container shells and user producer specs.

use crate::config::{Range, Settings};
use crate::core::{Generator, GeneratorExt, SharedGenerator};
use crate::error::ProducerError;
use crate::rng::Random;
use crate::schema::{names, ClassId};
use crate::value::Value;
use chrono::{DateTime, Utc};
use rand::RngCore;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Built-in scalar leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LeafKind {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Uuid,
    LocalDate,
    LocalDateTime,
    Instant,
}

/// Latest instant produced for temporal leaves (2033-05-18).
const MAX_EPOCH_SECONDS: i64 = 2_000_000_000;

impl LeafKind {
    fn produce(self, rng: &mut Random, hints: &Hints, settings: &Settings) -> Result<Value, ProducerError> {
        let ints = hints.int_range.unwrap_or(settings.integer_range);
        if ints.min > ints.max {
            return Err(ProducerError::invalid_hint("range", ints.min, ints.max));
        }
        let floats = hints.float_range.unwrap_or(settings.float_range);
        if floats.min > floats.max {
            return Err(ProducerError::invalid_hint("range", floats.min, floats.max));
        }

        Ok(match self {
            LeafKind::Boolean => Value::Bool(rng.coin()),
            LeafKind::Char => Value::Char(rng.upper_alpha(1).chars().next().unwrap_or('A')),
            LeafKind::Byte => Value::Byte(clamped(rng, ints, i8::MIN.into(), i8::MAX.into()) as i8),
            LeafKind::Short => Value::Short(clamped(rng, ints, i16::MIN.into(), i16::MAX.into()) as i16),
            LeafKind::Int => Value::Int(clamped(rng, ints, i32::MIN.into(), i32::MAX.into()) as i32),
            LeafKind::Long => Value::Long(rng.long_range(ints.min, ints.max)),
            LeafKind::Float => Value::Float(rng.double_range(floats.min, floats.max) as f32),
            LeafKind::Double => Value::Double(rng.double_range(floats.min, floats.max)),
            LeafKind::String => {
                let length = hints.length.unwrap_or(settings.string_length);
                if length.min > length.max {
                    return Err(ProducerError::invalid_hint("length", length.min, length.max));
                }
                let len = rng.usize_range(length.min, length.max);
                Value::Str(rng.upper_alpha(len))
            }
            LeafKind::Uuid => {
                let mut bytes = [0u8; 16];
                rng.fill_bytes(&mut bytes);
                Value::Uuid(uuid::Builder::from_random_bytes(bytes).into_uuid())
            }
            LeafKind::LocalDate => Value::Date(instant(rng).date_naive()),
            LeafKind::LocalDateTime => Value::DateTime(instant(rng).naive_utc()),
            LeafKind::Instant => Value::Instant(instant(rng)),
        })
    }
}

/// Draw from `range` narrowed to `[lo, hi]`. A range entirely outside the
/// type falls back to the nearest bound.
fn clamped(rng: &mut Random, range: Range<i64>, lo: i64, hi: i64) -> i64 {
    let min = range.min.clamp(lo, hi);
    let max = range.max.clamp(lo, hi);
    rng.long_range(min, max)
}

fn instant(rng: &mut Random) -> DateTime<Utc> {
    DateTime::from_timestamp(rng.long_range(0, MAX_EPOCH_SECONDS), 0).unwrap_or_default()
}

/// Allocates empty containers of a concrete class.
#[derive(Clone, Debug, PartialEq)]
pub struct Shell {
    pub class: ClassId,
    /// Class allocated when `class` is abstract and has no subtype mapping.
    pub default_impl: ClassId,
}

impl Shell {
    /// The class to allocate, honouring the subtype map.
    pub fn concrete_class(&self, subtypes: &BTreeMap<ClassId, ClassId>) -> ClassId {
        subtypes
            .get(&self.class)
            .cloned()
            .unwrap_or_else(|| self.default_impl.clone())
    }
}

#[derive(Clone)]
pub enum LeafProducer {
    Builtin(LeafKind),
    Shell(Shell),
    /// A user-registered leaf class.
    Custom(SharedGenerator<Value>),
}

impl LeafProducer {
    /// Produce a leaf value. Shells are not leaves and produce `Null`; the
    /// structural producers allocate through [`Shell::concrete_class`].
    pub fn produce(&self, rng: &mut Random, hints: &Hints, settings: &Settings) -> Result<Value, ProducerError> {
        match self {
            LeafProducer::Builtin(kind) => kind.produce(rng, hints, settings),
            LeafProducer::Custom(generator) => Ok(generator.generate(rng)),
            LeafProducer::Shell(_) => Ok(Value::Null),
        }
    }

    pub fn is_shell(&self) -> bool {
        matches!(self, LeafProducer::Shell(_))
    }
}

impl fmt::Debug for LeafProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafProducer::Builtin(kind) => write!(f, "Builtin({:?})", kind),
            LeafProducer::Shell(shell) => write!(f, "Shell({})", shell.default_impl),
            LeafProducer::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Class to producer map consulted for leaves and container shells.
#[derive(Clone, Debug)]
pub struct LeafRegistry {
    producers: HashMap<ClassId, LeafProducer>,
}

impl LeafRegistry {
    pub fn builtin() -> Self {
        use LeafKind::*;

        let mut producers = HashMap::new();
        let scalars = [
            ("boolean", "Boolean", Boolean),
            ("char", "Character", Char),
            ("byte", "Byte", Byte),
            ("short", "Short", Short),
            ("int", "Integer", Int),
            ("long", "Long", Long),
            ("float", "Float", Float),
            ("double", "Double", Double),
        ];
        for (primitive, boxed, kind) in scalars {
            producers.insert(ClassId::new(primitive), LeafProducer::Builtin(kind));
            producers.insert(ClassId::new(boxed), LeafProducer::Builtin(kind));
        }
        for (name, kind) in [
            (names::STRING, String),
            (names::UUID, Uuid),
            (names::LOCAL_DATE, LocalDate),
            (names::LOCAL_DATE_TIME, LocalDateTime),
            (names::INSTANT, Instant),
        ] {
            producers.insert(ClassId::new(name), LeafProducer::Builtin(kind));
        }

        let shells = [
            (names::COLLECTION, names::ARRAY_LIST),
            (names::LIST, names::ARRAY_LIST),
            (names::ARRAY_LIST, names::ARRAY_LIST),
            (names::LINKED_LIST, names::LINKED_LIST),
            (names::SET, names::HASH_SET),
            (names::HASH_SET, names::HASH_SET),
            (names::LINKED_HASH_SET, names::LINKED_HASH_SET),
            (names::SORTED_SET, names::TREE_SET),
            (names::TREE_SET, names::TREE_SET),
            (names::MAP, names::HASH_MAP),
            (names::HASH_MAP, names::HASH_MAP),
            (names::LINKED_HASH_MAP, names::LINKED_HASH_MAP),
            (names::SORTED_MAP, names::TREE_MAP),
            (names::TREE_MAP, names::TREE_MAP),
        ];
        for (class, default_impl) in shells {
            producers.insert(
                ClassId::new(class),
                LeafProducer::Shell(Shell {
                    class: ClassId::new(class),
                    default_impl: ClassId::new(default_impl),
                }),
            );
        }

        Self { producers }
    }

    pub fn get(&self, class: &ClassId) -> Option<&LeafProducer> {
        self.producers.get(class)
    }

    pub fn shell(&self, class: &ClassId) -> Option<&Shell> {
        match self.producers.get(class) {
            Some(LeafProducer::Shell(shell)) => Some(shell),
            _ => None,
        }
    }

    /// Treat `class` as a leaf produced by `generator`.
    pub fn register<G>(mut self, class: impl Into<ClassId>, generator: G) -> Self
    where
        G: Generator<Value> + 'static,
    {
        self.producers
            .insert(class.into(), LeafProducer::Custom(generator.shared()));
        self
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}

impl Default for LeafRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ----------------------------------------------------------------------------
// User producers
// ----------------------------------------------------------------------------

/// Parameters a producer spec passes to the producer it overrides.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hints {
    pub size: Option<Range<usize>>,
    pub int_range: Option<Range<i64>>,
    pub float_range: Option<Range<f64>>,
    pub length: Option<Range<usize>>,
}

impl Hints {
    /// Exact element count of a collection, map or array.
    pub fn size(mut self, n: usize) -> Self {
        self.size = Some(Range::new(n, n));
        self
    }

    pub fn size_between(mut self, min: usize, max: usize) -> Self {
        self.size = Some(Range::new(min, max));
        self
    }

    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.int_range = Some(Range::new(min, max));
        self
    }

    pub fn float_range(mut self, min: f64, max: f64) -> Self {
        self.float_range = Some(Range::new(min, max));
        self
    }

    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.length = Some(Range::new(min, max));
        self
    }

    /// Target size for a container, from the hint or the settings range.
    pub fn pick_size(&self, rng: &mut Random, default: Range<usize>) -> Result<usize, ProducerError> {
        let range = self.size.unwrap_or(default);
        if range.min > range.max {
            return Err(ProducerError::invalid_hint("size", range.min, range.max));
        }
        Ok(rng.usize_range(range.min, range.max))
    }
}

pub fn collection() -> Hints {
    Hints::default()
}

pub fn map() -> Hints {
    Hints::default()
}

pub fn array() -> Hints {
    Hints::default()
}

pub fn ints() -> Hints {
    Hints::default()
}

pub fn doubles() -> Hints {
    Hints::default()
}

pub fn strings() -> Hints {
    Hints::default()
}

/// A producer bound by the user to a field or class.
#[derive(Clone)]
pub enum UserProducer {
    /// Supplies the whole value.
    Supplier(SharedGenerator<Value>),
    /// Parameterizes the producer that would otherwise be used.
    Spec(Hints),
}

impl UserProducer {
    pub fn supplier<G: Generator<Value> + 'static>(generator: G) -> Self {
        UserProducer::Supplier(generator.shared())
    }

    pub fn hints(&self) -> Option<&Hints> {
        match self {
            UserProducer::Spec(hints) => Some(hints),
            UserProducer::Supplier(_) => None,
        }
    }

    pub fn is_supplier(&self) -> bool {
        matches!(self, UserProducer::Supplier(_))
    }
}

impl From<Hints> for UserProducer {
    fn from(hints: Hints) -> Self {
        UserProducer::Spec(hints)
    }
}

impl PartialEq for UserProducer {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (UserProducer::Supplier(a), UserProducer::Supplier(b)) => Arc::ptr_eq(a, b),
            (UserProducer::Spec(a), UserProducer::Spec(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for UserProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserProducer::Supplier(_) => f.write_str("Supplier"),
            UserProducer::Spec(hints) => f.debug_tuple("Spec").field(hints).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Constant;

    fn produce(class: &str, hints: &Hints) -> Result<Value, ProducerError> {
        let registry = LeafRegistry::builtin();
        let mut rng = Random::new(42);
        registry
            .get(&ClassId::new(class))
            .unwrap()
            .produce(&mut rng, hints, &Settings::default())
    }

    #[test]
    fn test_primitive_and_boxed_share_a_producer() {
        assert!(matches!(produce("int", &Hints::default()), Ok(Value::Int(_))));
        assert!(matches!(produce("Integer", &Hints::default()), Ok(Value::Int(_))));
        assert!(matches!(produce("char", &Hints::default()), Ok(Value::Char(_))));
    }

    #[test]
    fn test_int_range_hint() {
        let registry = LeafRegistry::builtin();
        let producer = registry.get(&"int".into()).unwrap();
        let mut rng = Random::new(1);
        let hints = ints().range(-3, 3);
        for _ in 0..100 {
            let value = producer.produce(&mut rng, &hints, &Settings::default()).unwrap();
            assert!((-3..=3).contains(&value.as_int().unwrap()));
        }
    }

    #[test]
    fn test_byte_range_is_clamped() {
        let mut rng = Random::new(5);
        for _ in 0..50 {
            let value = LeafKind::Byte
                .produce(&mut rng, &ints().range(100, 100_000), &Settings::default())
                .unwrap();
            assert!(matches!(value, Value::Byte(b) if b >= 100));
        }
    }

    #[test]
    fn test_string_length_hint() {
        let value = produce("String", &strings().length(4, 4)).unwrap();
        assert_eq!(value.as_str().map(str::len), Some(4));
    }

    #[test]
    fn test_inverted_hint_is_a_domain_error() {
        let err = produce("int", &ints().range(9, 1)).unwrap_err();
        assert_eq!(err, ProducerError::invalid_hint("range", 9, 1));
        let err = collection().size_between(4, 2).pick_size(&mut Random::new(0), Range::new(1, 1));
        assert!(err.is_err());
    }

    #[test]
    fn test_shell_defaults_and_subtypes() {
        let registry = LeafRegistry::builtin();
        let list = registry.shell(&"List".into()).unwrap();
        assert_eq!(list.concrete_class(&BTreeMap::new()), ClassId::new("ArrayList"));

        let mut subtypes = BTreeMap::new();
        subtypes.insert(ClassId::new("List"), ClassId::new("LinkedList"));
        assert_eq!(list.concrete_class(&subtypes), ClassId::new("LinkedList"));

        let sorted = registry.shell(&"SortedMap".into()).unwrap();
        assert_eq!(sorted.concrete_class(&BTreeMap::new()), ClassId::new("TreeMap"));
        assert!(registry.shell(&"String".into()).is_none());
    }

    #[test]
    fn test_custom_leaf() {
        let registry = LeafRegistry::builtin().register("Money", Constant(Value::Long(100)));
        let mut rng = Random::new(0);
        let value = registry
            .get(&"Money".into())
            .unwrap()
            .produce(&mut rng, &Hints::default(), &Settings::default())
            .unwrap();
        assert_eq!(value, Value::Long(100));
    }

    #[test]
    fn test_pick_size_honours_exact_hint() {
        let mut rng = Random::new(9);
        assert_eq!(map().size(5).pick_size(&mut rng, Range::new(1, 3)).unwrap(), 5);
        let n = Hints::default().pick_size(&mut rng, Range::new(1, 3)).unwrap();
        assert!((1..=3).contains(&n));
    }
}
