//! Classes every schema knows about.

use super::{ClassDef, ClassId, ClassShape, Construction, ContainerFlavor, TypeDesc, TypeVar};
use crate::error::SchemaError;

/// Names of the built-in classes.
pub mod names {
    pub const OBJECT: &str = "Object";
    pub const NUMBER: &str = "Number";
    pub const STRING: &str = "String";
    pub const UUID: &str = "UUID";
    pub const LOCAL_DATE: &str = "LocalDate";
    pub const LOCAL_DATE_TIME: &str = "LocalDateTime";
    pub const INSTANT: &str = "Instant";

    pub const COLLECTION: &str = "Collection";
    pub const LIST: &str = "List";
    pub const ARRAY_LIST: &str = "ArrayList";
    pub const LINKED_LIST: &str = "LinkedList";
    pub const SET: &str = "Set";
    pub const HASH_SET: &str = "HashSet";
    pub const LINKED_HASH_SET: &str = "LinkedHashSet";
    pub const SORTED_SET: &str = "SortedSet";
    pub const TREE_SET: &str = "TreeSet";
    pub const MAP: &str = "Map";
    pub const HASH_MAP: &str = "HashMap";
    pub const LINKED_HASH_MAP: &str = "LinkedHashMap";
    pub const SORTED_MAP: &str = "SortedMap";
    pub const TREE_MAP: &str = "TreeMap";

    /// (primitive, boxed) pairs.
    pub const SCALARS: [(&str, &str); 8] = [
        ("boolean", "Boolean"),
        ("char", "Character"),
        ("byte", "Byte"),
        ("short", "Short"),
        ("int", "Integer"),
        ("long", "Long"),
        ("float", "Float"),
        ("double", "Double"),
    ];
}

use names::*;

fn leaf(name: &str, primitive: bool, superclass: Option<&str>) -> ClassDef {
    ClassDef {
        id: ClassId::new(name),
        type_params: Vec::new(),
        superclass: superclass.map(TypeDesc::class),
        interfaces: Vec::new(),
        shape: ClassShape::Leaf { primitive },
        is_abstract: false,
        fields: Vec::new(),
        construction: Construction::NoArg,
    }
}

fn record(name: &str, is_abstract: bool, superclass: Option<&str>) -> ClassDef {
    ClassDef {
        id: ClassId::new(name),
        type_params: Vec::new(),
        superclass: superclass.map(TypeDesc::class),
        interfaces: Vec::new(),
        shape: ClassShape::Record,
        is_abstract,
        fields: Vec::new(),
        construction: if is_abstract {
            Construction::Unavailable
        } else {
            Construction::NoArg
        },
    }
}

fn container(
    name: &str,
    params: &[&str],
    interfaces: &[&str],
    flavor: ContainerFlavor,
    is_abstract: bool,
) -> Result<ClassDef, SchemaError> {
    let id = ClassId::new(name);
    let type_params: Vec<TypeVar> = params.iter().map(|p| TypeVar::new(id.clone(), p)).collect();
    let interfaces = interfaces
        .iter()
        .map(|text| TypeDesc::parse_in(text, &id, &type_params))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClassDef {
        id,
        type_params,
        superclass: None,
        interfaces,
        shape: ClassShape::Container(flavor),
        is_abstract,
        fields: Vec::new(),
        construction: if is_abstract {
            Construction::Unavailable
        } else {
            Construction::NoArg
        },
    })
}

pub(super) fn classes() -> Result<Vec<ClassDef>, SchemaError> {
    use ContainerFlavor::*;

    let mut out = vec![
        record(OBJECT, false, None),
        record(NUMBER, true, None),
        leaf(STRING, false, None),
        leaf(UUID, false, None),
        leaf(LOCAL_DATE, false, None),
        leaf(LOCAL_DATE_TIME, false, None),
        leaf(INSTANT, false, None),
    ];

    for (primitive, boxed) in SCALARS {
        out.push(leaf(primitive, true, None));
        let numeric = !matches!(boxed, "Boolean" | "Character");
        out.push(leaf(boxed, false, numeric.then_some(NUMBER)));
    }

    out.extend([
        container(COLLECTION, &["E"], &[], List, true)?,
        container(LIST, &["E"], &["Collection<E>"], List, true)?,
        container(ARRAY_LIST, &["E"], &["List<E>"], List, false)?,
        container(LINKED_LIST, &["E"], &["List<E>"], List, false)?,
        container(SET, &["E"], &["Collection<E>"], Set, true)?,
        container(HASH_SET, &["E"], &["Set<E>"], Set, false)?,
        container(LINKED_HASH_SET, &["E"], &["Set<E>"], Set, false)?,
        container(SORTED_SET, &["E"], &["Set<E>"], SortedSet, true)?,
        container(TREE_SET, &["E"], &["SortedSet<E>"], SortedSet, false)?,
        container(MAP, &["K", "V"], &[], Map, true)?,
        container(HASH_MAP, &["K", "V"], &["Map<K, V>"], Map, false)?,
        container(LINKED_HASH_MAP, &["K", "V"], &["Map<K, V>"], Map, false)?,
        container(SORTED_MAP, &["K", "V"], &["Map<K, V>"], SortedMap, true)?,
        container(TREE_MAP, &["K", "V"], &["SortedMap<K, V>"], SortedMap, false)?,
    ]);

    Ok(out)
}
