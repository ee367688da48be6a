//! Type schema: the explicit description of user types that the engine walks.
//!
//! Rust has no runtime reflection, so every class the engine may meet is
//! declared up front as a [`ClassDecl`] and registered in a [`Schema`]. The
//! schema then acts as the class introspector: it answers which fields a class
//! has, which type variables it declares, what its supertypes are, and how an
//! instance is constructed.
//!
//! # Example
//! ```
//! use specimen::schema::{ClassDecl, Introspector, Schema};
//!
//! let schema = Schema::builder()
//!     .class(ClassDecl::record("Item").type_params(["T"]).field("value", "T"))
//!     .class(ClassDecl::record("Basket").field("items", "List<Item<String>>"))
//!     .build()
//!     .unwrap();
//!
//! let fields = schema.fields(&"Basket".into());
//! assert_eq!(fields[0].field.declared.to_string(), "List<Item<String>>");
//! ```

mod builtin;
mod parse;

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, RwLock};

pub use builtin::names;

// ----------------------------------------------------------------------------
// Class tokens and type descriptors
// ----------------------------------------------------------------------------

/// Interned class name. Array classes are named `<component>[]`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(Arc<str>);

impl ClassId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The array class whose component is `component`.
    pub fn array_of(component: &ClassId) -> Self {
        Self::new(format!("{}[]", component))
    }

    pub fn is_array(&self) -> bool {
        self.0.ends_with("[]")
    }

    /// Component class of an array class.
    pub fn component(&self) -> Option<ClassId> {
        self.0.strip_suffix("[]").map(ClassId::new)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ClassId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A type variable, qualified by the class that declares it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TypeVar {
    pub owner: ClassId,
    pub name: Arc<str>,
}

impl TypeVar {
    pub fn new(owner: impl Into<ClassId>, name: &str) -> Self {
        Self {
            owner: owner.into(),
            name: Arc::from(name),
        }
    }
}

impl fmt::Display for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

/// Description of a type at a use site.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum TypeDesc {
    /// A concrete (or raw) class.
    Class(ClassId),
    /// A generic class applied to arguments, e.g. `Map<Integer, Item<String>>`.
    Parameterized { raw: ClassId, args: Vec<TypeDesc> },
    /// A type variable such as `T`.
    Var(TypeVar),
    /// `?` (no bounds) or `? extends A & B`.
    Wildcard { upper: Vec<TypeDesc> },
    /// `C[]`
    Array(Box<TypeDesc>),
}

impl TypeDesc {
    pub fn class(name: impl Into<ClassId>) -> Self {
        TypeDesc::Class(name.into())
    }

    pub fn parameterized(raw: impl Into<ClassId>, args: Vec<TypeDesc>) -> Self {
        TypeDesc::Parameterized {
            raw: raw.into(),
            args,
        }
    }

    pub fn array(component: TypeDesc) -> Self {
        TypeDesc::Array(Box::new(component))
    }

    /// Parse a type expression in which every identifier names a class.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        parse::parse_type(text, None)
    }

    /// Parse a type expression inside the declaration of `owner`, so that
    /// identifiers matching one of `params` become type variables.
    pub fn parse_in(text: &str, owner: &ClassId, params: &[TypeVar]) -> Result<Self, SchemaError> {
        let scope = parse::Scope { owner, params };
        parse::parse_type(text, Some(&scope))
    }

    /// The class this descriptor instantiates, if it names one.
    pub fn raw_class(&self) -> Option<ClassId> {
        match self {
            TypeDesc::Class(id) => Some(id.clone()),
            TypeDesc::Parameterized { raw, .. } => Some(raw.clone()),
            TypeDesc::Array(component) => component.raw_class().map(|c| ClassId::array_of(&c)),
            TypeDesc::Var(_) | TypeDesc::Wildcard { .. } => None,
        }
    }

    pub fn args(&self) -> &[TypeDesc] {
        match self {
            TypeDesc::Parameterized { args, .. } => args,
            _ => &[],
        }
    }

    /// True when the descriptor contains no type variables or wildcards.
    pub fn is_concrete(&self) -> bool {
        match self {
            TypeDesc::Class(_) => true,
            TypeDesc::Parameterized { args, .. } => args.iter().all(TypeDesc::is_concrete),
            TypeDesc::Array(component) => component.is_concrete(),
            TypeDesc::Var(_) | TypeDesc::Wildcard { .. } => false,
        }
    }

    /// Visit every class named anywhere in the descriptor.
    pub(crate) fn for_each_class(&self, f: &mut dyn FnMut(&ClassId, usize)) {
        match self {
            TypeDesc::Class(id) => f(id, 0),
            TypeDesc::Parameterized { raw, args } => {
                f(raw, args.len());
                for arg in args {
                    arg.for_each_class(f);
                }
            }
            TypeDesc::Array(component) => component.for_each_class(f),
            TypeDesc::Wildcard { upper } => {
                for bound in upper {
                    bound.for_each_class(f);
                }
            }
            TypeDesc::Var(_) => {}
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Class(id) => write!(f, "{}", id),
            TypeDesc::Parameterized { raw, args } => {
                write!(f, "{}<", raw)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
            TypeDesc::Var(var) => f.write_str(&var.name),
            TypeDesc::Wildcard { upper } if upper.is_empty() => f.write_str("?"),
            TypeDesc::Wildcard { upper } => {
                f.write_str("? extends ")?;
                for (i, bound) in upper.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{}", bound)?;
                }
                Ok(())
            }
            TypeDesc::Array(component) => write!(f, "{}[]", component),
        }
    }
}

// ----------------------------------------------------------------------------
// Class definitions
// ----------------------------------------------------------------------------

/// Container semantics shared by the built-in collection and map classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerFlavor {
    List,
    Set,
    SortedSet,
    Map,
    SortedMap,
}

impl ContainerFlavor {
    pub fn is_map(self) -> bool {
        matches!(self, ContainerFlavor::Map | ContainerFlavor::SortedMap)
    }

    pub fn is_sorted(self) -> bool {
        matches!(self, ContainerFlavor::SortedSet | ContainerFlavor::SortedMap)
    }

    /// Sets and maps collapse equal elements (keys).
    pub fn collapses_duplicates(self) -> bool {
        !matches!(self, ContainerFlavor::List)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClassShape {
    Record,
    Enumeration(Vec<Arc<str>>),
    Leaf { primitive: bool },
    Container(ContainerFlavor),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: Arc<str>,
    pub declared: TypeDesc,
    pub is_static: bool,
    pub synthetic: bool,
}

/// A constructor parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Arc<str>,
    pub declared: TypeDesc,
}

/// How an instance of a record class is obtained.
#[derive(Clone, Debug, PartialEq)]
pub enum Construction {
    NoArg,
    Constructor(Vec<Param>),
    Unavailable,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDef {
    pub id: ClassId,
    pub type_params: Vec<TypeVar>,
    pub superclass: Option<TypeDesc>,
    pub interfaces: Vec<TypeDesc>,
    pub shape: ClassShape,
    pub is_abstract: bool,
    pub fields: Vec<FieldDef>,
    pub construction: Construction,
}

impl ClassDef {
    /// Superclass first, then interfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeDesc> {
        self.superclass.iter().chain(self.interfaces.iter())
    }
}

/// An instance field as seen from a class, possibly inherited.
#[derive(Clone, Debug, PartialEq)]
pub struct DeclaredField {
    /// The class that declares the field.
    pub owner: ClassId,
    pub field: FieldDef,
}

// ----------------------------------------------------------------------------
// Declarations (text form)
// ----------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub synthetic: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorDecl {
    #[default]
    NoArg,
    Params(Vec<ParamDecl>),
    Unavailable,
}

/// A class declaration whose types are written as type expressions.
///
/// This is the form users write (in code or in a YAML schema file); the
/// [`SchemaBuilder`] parses it into a [`ClassDef`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub constructor: ConstructorDecl,
}

impl ClassDecl {
    /// A concrete record class with a no-arg constructor.
    pub fn record(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn abstract_class(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_abstract: true,
            constructor: ConstructorDecl::Unavailable,
            ..Default::default()
        }
    }

    pub fn enumeration<I, S>(name: &str, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            variants: variants.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn type_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn extends(mut self, ty: &str) -> Self {
        self.extends = Some(ty.to_string());
        self
    }

    pub fn implements(mut self, ty: &str) -> Self {
        self.implements.push(ty.to_string());
        self
    }

    pub fn field(mut self, name: &str, ty: &str) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            ty: ty.to_string(),
            ..Default::default()
        });
        self
    }

    pub fn static_field(mut self, name: &str, ty: &str) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            ty: ty.to_string(),
            is_static: true,
            synthetic: false,
        });
        self
    }

    pub fn synthetic_field(mut self, name: &str, ty: &str) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            ty: ty.to_string(),
            is_static: false,
            synthetic: true,
        });
        self
    }

    /// Instances are built through a constructor taking these parameters.
    pub fn constructor<'a, I>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.constructor = ConstructorDecl::Params(
            params
                .into_iter()
                .map(|(name, ty)| ParamDecl {
                    name: name.to_string(),
                    ty: ty.to_string(),
                })
                .collect(),
        );
        self
    }

    pub fn no_constructor(mut self) -> Self {
        self.constructor = ConstructorDecl::Unavailable;
        self
    }

    fn to_def(&self) -> Result<ClassDef, SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::syntax(&self.name, "class name is empty"));
        }
        let id = ClassId::new(self.name.trim());
        let type_params: Vec<TypeVar> = self
            .type_params
            .iter()
            .map(|name| TypeVar::new(id.clone(), name.trim()))
            .collect();

        let parse = |text: &str| TypeDesc::parse_in(text, &id, &type_params);

        let superclass = self.extends.as_deref().map(parse).transpose()?;
        let interfaces = self
            .implements
            .iter()
            .map(|text| parse(text))
            .collect::<Result<Vec<_>, _>>()?;
        let fields = self
            .fields
            .iter()
            .map(|decl| {
                Ok(FieldDef {
                    name: Arc::from(decl.name.as_str()),
                    declared: parse(&decl.ty)?,
                    is_static: decl.is_static,
                    synthetic: decl.synthetic,
                })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;
        let construction = match &self.constructor {
            ConstructorDecl::NoArg => Construction::NoArg,
            ConstructorDecl::Unavailable => Construction::Unavailable,
            ConstructorDecl::Params(params) => Construction::Constructor(
                params
                    .iter()
                    .map(|p| {
                        Ok(Param {
                            name: Arc::from(p.name.as_str()),
                            declared: parse(&p.ty)?,
                        })
                    })
                    .collect::<Result<Vec<_>, SchemaError>>()?,
            ),
        };
        let shape = if self.variants.is_empty() {
            ClassShape::Record
        } else {
            ClassShape::Enumeration(self.variants.iter().map(|v| Arc::from(v.as_str())).collect())
        };

        Ok(ClassDef {
            id,
            type_params,
            superclass,
            interfaces,
            shape,
            is_abstract: self.is_abstract,
            fields,
            construction,
        })
    }
}

// ----------------------------------------------------------------------------
// Introspection
// ----------------------------------------------------------------------------

/// The class-introspection seam consulted by the node-graph builder.
pub trait Introspector: Send + Sync {
    fn class(&self, id: &ClassId) -> Option<Arc<ClassDef>>;

    /// Instance fields of `id`, inherited ones first, with static and
    /// synthetic fields removed.
    fn fields(&self, id: &ClassId) -> Arc<[DeclaredField]>;

    fn type_params(&self, id: &ClassId) -> Vec<TypeVar> {
        self.class(id)
            .map(|def| def.type_params.clone())
            .unwrap_or_default()
    }

    fn is_primitive(&self, id: &ClassId) -> bool {
        self.class(id)
            .is_some_and(|def| matches!(def.shape, ClassShape::Leaf { primitive: true }))
    }

    /// Whether a value of class `from` may be stored where `to` is declared.
    fn is_assignable(&self, from: &ClassId, to: &ClassId) -> bool {
        if from == to || to.as_str() == names::OBJECT {
            return true;
        }
        if let (Some(from_component), Some(to_component)) = (from.component(), to.component()) {
            return self.is_assignable(&from_component, &to_component);
        }

        let mut queue = VecDeque::from([from.clone()]);
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if &current == to {
                return true;
            }
            if let Some(def) = self.class(&current) {
                queue.extend(def.supertypes().filter_map(TypeDesc::raw_class));
            }
        }
        false
    }

    /// Container semantics of `id`, inherited from the nearest built-in
    /// container ancestor.
    fn container_flavor(&self, id: &ClassId) -> Option<ContainerFlavor> {
        let mut queue = VecDeque::from([id.clone()]);
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let def = self.class(&current)?;
            if let ClassShape::Container(flavor) = def.shape {
                return Some(flavor);
            }
            queue.extend(def.supertypes().filter_map(TypeDesc::raw_class));
        }
        None
    }

    /// Find a field by name on `owner` or one of its superclasses.
    fn find_field(&self, owner: &ClassId, name: &str) -> Option<DeclaredField> {
        self.fields(owner)
            .iter()
            .rev()
            .find(|f| f.field.name.as_ref() == name)
            .cloned()
    }
}

/// Registered class definitions plus a lazily filled field-list cache.
pub struct Schema {
    classes: HashMap<ClassId, Arc<ClassDef>>,
    field_cache: RwLock<HashMap<ClassId, Arc<[DeclaredField]>>>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// A schema holding only the built-in classes.
    pub fn builtin() -> Result<Self, SchemaError> {
        SchemaBuilder::default().build()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, id: &ClassId) -> bool {
        self.classes.contains_key(id)
    }

    fn collect_fields(&self, id: &ClassId) -> Vec<DeclaredField> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.classes.get(id).cloned();
        while let Some(def) = current {
            if !seen.insert(def.id.clone()) {
                break;
            }
            current = def
                .superclass
                .as_ref()
                .and_then(TypeDesc::raw_class)
                .and_then(|super_id| self.classes.get(&super_id).cloned());
            chain.push(def);
        }

        chain
            .iter()
            .rev()
            .flat_map(|def| {
                def.fields
                    .iter()
                    .filter(|f| !f.is_static && !f.synthetic)
                    .map(|f| DeclaredField {
                        owner: def.id.clone(),
                        field: f.clone(),
                    })
            })
            .collect()
    }
}

impl Introspector for Schema {
    fn class(&self, id: &ClassId) -> Option<Arc<ClassDef>> {
        self.classes.get(id).cloned()
    }

    fn fields(&self, id: &ClassId) -> Arc<[DeclaredField]> {
        if let Some(hit) = self
            .field_cache
            .read()
            .ok()
            .and_then(|cache| cache.get(id).cloned())
        {
            return hit;
        }

        let computed: Arc<[DeclaredField]> = self.collect_fields(id).into();
        if let Ok(mut cache) = self.field_cache.write() {
            return cache.entry(id.clone()).or_insert(computed).clone();
        }
        computed
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.classes.keys().map(ClassId::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Schema").field("classes", &names).finish()
    }
}

/// Collects class declarations and validates them into a [`Schema`].
#[derive(Default)]
pub struct SchemaBuilder {
    decls: Vec<ClassDecl>,
}

impl SchemaBuilder {
    pub fn class(mut self, decl: ClassDecl) -> Self {
        self.decls.push(decl);
        self
    }

    pub fn classes(mut self, decls: impl IntoIterator<Item = ClassDecl>) -> Self {
        self.decls.extend(decls);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut classes: HashMap<ClassId, Arc<ClassDef>> = builtin::classes()?
            .into_iter()
            .map(|def| (def.id.clone(), Arc::new(def)))
            .collect();

        for decl in &self.decls {
            let def = decl.to_def()?;
            if classes.contains_key(&def.id) {
                return Err(SchemaError::DuplicateClass {
                    class: def.id.to_string(),
                });
            }
            classes.insert(def.id.clone(), Arc::new(def));
        }

        for def in classes.values() {
            validate_references(def, &classes)?;
        }

        Ok(Schema {
            classes,
            field_cache: RwLock::new(HashMap::new()),
        })
    }
}

fn validate_references(
    def: &ClassDef,
    classes: &HashMap<ClassId, Arc<ClassDef>>,
) -> Result<(), SchemaError> {
    let mut descs: Vec<&TypeDesc> = def.supertypes().collect();
    descs.extend(def.fields.iter().map(|f| &f.declared));
    if let Construction::Constructor(params) = &def.construction {
        descs.extend(params.iter().map(|p| &p.declared));
    }

    let mut result = Ok(());
    for desc in descs {
        desc.for_each_class(&mut |id, arity| {
            if result.is_err() {
                return;
            }
            match classes.get(id) {
                None => {
                    result = Err(SchemaError::UnknownClass {
                        class: id.to_string(),
                        referenced_by: def.id.to_string(),
                    })
                }
                Some(target) if arity > 0 && target.type_params.len() != arity => {
                    result = Err(SchemaError::ArityMismatch {
                        class: id.to_string(),
                        expected: target.type_params.len(),
                        found: arity,
                    })
                }
                Some(_) => {}
            }
        });
    }
    result
}
