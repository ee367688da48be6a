//! Type-variable resolution.
//!
//! Declared descriptors are turned into resolved ones by looking type
//! variables up in a [`TypeMap`]. A node's map is its parent's map extended
//! with the bindings its own parameterization induces, including those of
//! every supertype, so that inherited generic fields resolve.

use crate::schema::{names, ClassId, Introspector, TypeDesc, TypeVar};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::warn;

/// Type variable to resolved descriptor. Ordered so that maps compare and
/// iterate deterministically.
pub type TypeMap = BTreeMap<TypeVar, TypeDesc>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("unresolved type variable '{0}'")]
    Unresolved(TypeVar),

    #[error("unknown class '{0}'")]
    UnknownClass(ClassId),

    #[error("class '{class}' declares {expected} type parameters but {found} were supplied")]
    Arity {
        class: ClassId,
        expected: usize,
        found: usize,
    },
}

/// Resolve a declared descriptor against `map`.
///
/// Wildcards collapse to their first upper bound, or `Object` when unbounded.
pub fn resolve(declared: &TypeDesc, map: &TypeMap) -> Result<TypeDesc, ResolveError> {
    match declared {
        TypeDesc::Class(_) => Ok(declared.clone()),
        TypeDesc::Var(var) => map
            .get(var)
            .cloned()
            .ok_or_else(|| ResolveError::Unresolved(var.clone())),
        TypeDesc::Parameterized { raw, args } => Ok(TypeDesc::Parameterized {
            raw: raw.clone(),
            args: args
                .iter()
                .map(|arg| resolve(arg, map))
                .collect::<Result<_, _>>()?,
        }),
        TypeDesc::Wildcard { upper } => match upper.as_slice() {
            [] => Ok(TypeDesc::class(names::OBJECT)),
            [first, rest @ ..] => {
                if !rest.is_empty() {
                    warn!(wildcard = %declared, "multi-bound wildcard resolved to its first bound");
                }
                resolve(first, map)
            }
        },
        TypeDesc::Array(component) => Ok(TypeDesc::array(resolve(component, map)?)),
    }
}

/// Replace variables bound in `bindings`, leaving the others in place.
pub fn substitute(desc: &TypeDesc, bindings: &TypeMap) -> TypeDesc {
    match desc {
        TypeDesc::Class(_) => desc.clone(),
        TypeDesc::Var(var) => bindings.get(var).cloned().unwrap_or_else(|| desc.clone()),
        TypeDesc::Parameterized { raw, args } => TypeDesc::Parameterized {
            raw: raw.clone(),
            args: args.iter().map(|arg| substitute(arg, bindings)).collect(),
        },
        TypeDesc::Wildcard { upper } => TypeDesc::Wildcard {
            upper: upper.iter().map(|b| substitute(b, bindings)).collect(),
        },
        TypeDesc::Array(component) => TypeDesc::array(substitute(component, bindings)),
    }
}

/// Bindings of `desc`'s raw class parameters to its arguments.
fn local_bindings(schema: &dyn Introspector, desc: &TypeDesc) -> Result<TypeMap, ResolveError> {
    let Some(raw) = desc.raw_class() else {
        return Ok(TypeMap::new());
    };
    if raw.is_array() {
        return Ok(TypeMap::new());
    }
    let def = schema
        .class(&raw)
        .ok_or_else(|| ResolveError::UnknownClass(raw.clone()))?;
    let args = desc.args();
    if args.is_empty() {
        return Ok(TypeMap::new());
    }
    if args.len() != def.type_params.len() {
        return Err(ResolveError::Arity {
            class: raw,
            expected: def.type_params.len(),
            found: args.len(),
        });
    }
    Ok(def.type_params.iter().cloned().zip(args.iter().cloned()).collect())
}

/// Extend `map` with the bindings induced by `resolved`: its raw class's
/// variables, then those of every supertype. Entries for other variables are
/// kept as they are.
pub fn extend(schema: &dyn Introspector, map: &TypeMap, resolved: &TypeDesc) -> Result<TypeMap, ResolveError> {
    let mut out = map.clone();
    let mut seen = HashSet::new();
    bind(schema, &mut out, resolved, &mut seen)?;
    Ok(out)
}

fn bind(
    schema: &dyn Introspector,
    out: &mut TypeMap,
    desc: &TypeDesc,
    seen: &mut HashSet<ClassId>,
) -> Result<(), ResolveError> {
    let Some(raw) = desc.raw_class() else {
        return Ok(());
    };
    if raw.is_array() || !seen.insert(raw.clone()) {
        return Ok(());
    }
    let local = local_bindings(schema, desc)?;
    let Some(def) = schema.class(&raw) else {
        return Ok(());
    };
    for (var, bound) in &local {
        out.insert(var.clone(), bound.clone());
    }

    // A raw use leaves its variables to whatever the enclosing map binds.
    let scope = if local.is_empty() { &*out } else { &local };
    let supers: Vec<TypeDesc> = def
        .supertypes()
        .filter_map(|s| resolve(s, scope).ok())
        .collect();
    for sup in supers {
        bind(schema, out, &sup, seen)?;
    }
    Ok(())
}

/// Arguments of `desc` viewed as its supertype `target`, in terms of
/// whatever variables `desc` itself carries. `None` when `target` is not a
/// supertype.
pub fn supertype_args(schema: &dyn Introspector, desc: &TypeDesc, target: &ClassId) -> Option<Vec<TypeDesc>> {
    let mut seen = HashSet::new();
    view_as(schema, desc, target, &mut seen)
}

fn view_as(
    schema: &dyn Introspector,
    desc: &TypeDesc,
    target: &ClassId,
    seen: &mut HashSet<ClassId>,
) -> Option<Vec<TypeDesc>> {
    let raw = desc.raw_class()?;
    if &raw == target {
        let def = schema.class(&raw)?;
        if desc.args().is_empty() {
            return Some(def.type_params.iter().cloned().map(TypeDesc::Var).collect());
        }
        return Some(desc.args().to_vec());
    }
    if !seen.insert(raw.clone()) {
        return None;
    }
    let def = schema.class(&raw)?;
    let local = local_bindings(schema, desc).ok()?;
    let found = def
        .supertypes()
        .find_map(|sup| view_as(schema, &substitute(sup, &local), target, seen));
    found
}

/// Replace `resolved` by its subtype mapping, if any. Variables of the
/// concrete class are bound by unifying its view of the declared class with
/// the declared arguments.
pub fn apply_subtype(
    schema: &dyn Introspector,
    subtypes: &BTreeMap<ClassId, ClassId>,
    resolved: &TypeDesc,
) -> Result<TypeDesc, ResolveError> {
    let Some(raw) = resolved.raw_class() else {
        return Ok(resolved.clone());
    };
    let Some(concrete) = subtypes.get(&raw).filter(|c| **c != raw) else {
        return Ok(resolved.clone());
    };
    let def = schema
        .class(concrete)
        .ok_or_else(|| ResolveError::UnknownClass(concrete.clone()))?;
    if def.type_params.is_empty() {
        return Ok(TypeDesc::Class(concrete.clone()));
    }

    let own = TypeDesc::parameterized(
        concrete.clone(),
        def.type_params.iter().cloned().map(TypeDesc::Var).collect(),
    );
    let mut bindings = TypeMap::new();
    if let Some(view) = supertype_args(schema, &own, &raw) {
        for (pattern, actual) in view.iter().zip(resolved.args()) {
            unify(pattern, actual, &mut bindings);
        }
    }

    let args = def
        .type_params
        .iter()
        .map(|var| {
            bindings
                .get(var)
                .cloned()
                .ok_or_else(|| ResolveError::Unresolved(var.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TypeDesc::parameterized(concrete.clone(), args))
}

fn unify(pattern: &TypeDesc, actual: &TypeDesc, bindings: &mut TypeMap) {
    match (pattern, actual) {
        (TypeDesc::Var(var), _) => {
            bindings.entry(var.clone()).or_insert_with(|| actual.clone());
        }
        (
            TypeDesc::Parameterized { raw: a, args: xs },
            TypeDesc::Parameterized { raw: b, args: ys },
        ) if a == b => {
            for (x, y) in xs.iter().zip(ys) {
                unify(x, y, bindings);
            }
        }
        (TypeDesc::Array(x), TypeDesc::Array(y)) => unify(x, y, bindings),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ClassDecl, Schema};

    fn schema() -> Schema {
        Schema::builder()
            .class(ClassDecl::record("Item").type_params(["T"]).field("value", "T"))
            .class(
                ClassDecl::record("Pair")
                    .type_params(["L", "R"])
                    .field("left", "L")
                    .field("right", "R"),
            )
            .class(ClassDecl::record("Base").type_params(["B"]).field("base", "B"))
            .class(ClassDecl::record("Middle").type_params(["M"]).extends("Base<List<M>>"))
            .class(ClassDecl::record("Leaf").extends("Middle<Integer>"))
            .class(
                ClassDecl::abstract_class("Shape")
                    .type_params(["S"])
                    .field("tag", "S"),
            )
            .class(
                ClassDecl::record("Circle")
                    .type_params(["C"])
                    .extends("Shape<C>")
                    .field("radius", "int"),
            )
            .build()
            .unwrap()
    }

    fn parse(text: &str) -> TypeDesc {
        TypeDesc::parse(text).unwrap()
    }

    #[test]
    fn test_resolve_variables_and_wildcards() {
        let mut map = TypeMap::new();
        map.insert(TypeVar::new("Item", "T"), parse("String"));

        let declared = TypeDesc::parameterized(
            "List",
            vec![TypeDesc::Var(TypeVar::new("Item", "T"))],
        );
        assert_eq!(resolve(&declared, &map).unwrap(), parse("List<String>"));
        assert_eq!(resolve(&parse("List<?>"), &map).unwrap(), parse("List<Object>"));
        assert_eq!(
            resolve(&parse("? extends Number & Comparable"), &map).unwrap(),
            parse("Number")
        );
    }

    #[test]
    fn test_unbound_variable_is_an_error() {
        let var = TypeVar::new("Item", "T");
        let err = resolve(&TypeDesc::Var(var.clone()), &TypeMap::new()).unwrap_err();
        assert_eq!(err, ResolveError::Unresolved(var));
    }

    #[test]
    fn test_extend_binds_own_parameters() {
        let schema = schema();
        let map = extend(&schema, &TypeMap::new(), &parse("Pair<Integer, String>")).unwrap();
        assert_eq!(map[&TypeVar::new("Pair", "L")], parse("Integer"));
        assert_eq!(map[&TypeVar::new("Pair", "R")], parse("String"));
    }

    #[test]
    fn test_extend_walks_generic_supertypes() {
        let schema = schema();
        let map = extend(&schema, &TypeMap::new(), &parse("Leaf")).unwrap();
        assert_eq!(map[&TypeVar::new("Middle", "M")], parse("Integer"));
        assert_eq!(map[&TypeVar::new("Base", "B")], parse("List<Integer>"));
    }

    #[test]
    fn test_extend_overrides_same_class_bindings_only() {
        let schema = schema();
        let mut map = TypeMap::new();
        map.insert(TypeVar::new("Item", "T"), parse("String"));
        map.insert(TypeVar::new("Pair", "L"), parse("Long"));
        let map = extend(&schema, &map, &parse("Item<Integer>")).unwrap();
        assert_eq!(map[&TypeVar::new("Item", "T")], parse("Integer"));
        assert_eq!(map[&TypeVar::new("Pair", "L")], parse("Long"));
    }

    #[test]
    fn test_supertype_view_of_containers() {
        let schema = schema();
        let view = supertype_args(&schema, &parse("TreeMap<Integer, Item<String>>"), &"Map".into());
        assert_eq!(view, Some(vec![parse("Integer"), parse("Item<String>")]));
        let element = supertype_args(&schema, &parse("ArrayList<String>"), &"Collection".into());
        assert_eq!(element, Some(vec![parse("String")]));
        assert_eq!(supertype_args(&schema, &parse("String"), &"Collection".into()), None);
    }

    #[test]
    fn test_apply_subtype_unifies_through_supertypes() {
        let schema = schema();
        let mut subtypes = BTreeMap::new();
        subtypes.insert(ClassId::new("Shape"), ClassId::new("Circle"));
        subtypes.insert(ClassId::new("List"), ClassId::new("LinkedList"));

        assert_eq!(
            apply_subtype(&schema, &subtypes, &parse("Shape<String>")).unwrap(),
            parse("Circle<String>")
        );
        assert_eq!(
            apply_subtype(&schema, &subtypes, &parse("List<Integer>")).unwrap(),
            parse("LinkedList<Integer>")
        );
        assert_eq!(
            apply_subtype(&schema, &subtypes, &parse("Set<Integer>")).unwrap(),
            parse("Set<Integer>")
        );
    }
}
