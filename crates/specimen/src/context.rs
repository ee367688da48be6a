//! Model context: everything a `create` call needs, validated up front.

use crate::config::Settings;
use crate::core::{Constant, Generator};
use crate::error::{GenerationError, Warning};
use crate::registry::{LeafRegistry, UserProducer};
use crate::schema::{ClassId, Construction, Introspector, TypeDesc};
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// A field identified by the class that declares it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldRef {
    pub owner: ClassId,
    pub name: Arc<str>,
}

impl FieldRef {
    pub fn new(owner: impl Into<ClassId>, name: &str) -> Self {
        Self {
            owner: owner.into(),
            name: Arc::from(name),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

/// Target of an override.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Binding {
    /// A field; the owner defaults to the root class when absent.
    Field {
        owner: Option<ClassId>,
        name: Arc<str>,
    },
    /// Every position whose class is this class.
    Class(ClassId),
}

impl Binding {
    pub fn field(name: &str) -> Self {
        Binding::Field {
            owner: None,
            name: Arc::from(name),
        }
    }

    pub fn field_of(owner: impl Into<ClassId>, name: &str) -> Self {
        Binding::Field {
            owner: Some(owner.into()),
            name: Arc::from(name),
        }
    }

    pub fn class(name: impl Into<ClassId>) -> Self {
        Binding::Class(name.into())
    }
}

impl From<FieldRef> for Binding {
    fn from(field: FieldRef) -> Self {
        Binding::Field {
            owner: Some(field.owner),
            name: field.name,
        }
    }
}

pub type WarningHook = Arc<dyn Fn(&Warning) + Send + Sync>;

/// User customizations, in the order they were given.
#[derive(Clone, Default)]
pub struct Overrides {
    pub ignored: Vec<Binding>,
    pub nullable: Vec<Binding>,
    pub producers: Vec<(Binding, UserProducer)>,
    pub subtypes: Vec<(ClassId, ClassId)>,
    pub seed: Option<u64>,
    pub settings: Settings,
    pub registry: Option<Arc<LeafRegistry>>,
    pub on_warning: Option<WarningHook>,
}

/// Build a model context in one call.
pub fn build_context(
    schema: Arc<dyn Introspector>,
    root: TypeDesc,
    root_type_params: Vec<TypeDesc>,
    overrides: Overrides,
) -> Result<ModelContext, GenerationError> {
    ModelContextBuilder {
        schema,
        root,
        root_type_params,
        overrides,
    }
    .build()
}

/// Immutable, validated generation parameters.
#[derive(Clone)]
pub struct ModelContext {
    schema: Arc<dyn Introspector>,
    root: TypeDesc,
    root_class: ClassId,
    root_type_params: Vec<TypeDesc>,
    ignored_fields: BTreeSet<FieldRef>,
    ignored_classes: BTreeSet<ClassId>,
    nullable_fields: BTreeSet<FieldRef>,
    nullable_classes: BTreeSet<ClassId>,
    field_producers: BTreeMap<FieldRef, UserProducer>,
    class_producers: BTreeMap<ClassId, UserProducer>,
    subtypes: BTreeMap<ClassId, ClassId>,
    seed: Option<u64>,
    settings: Settings,
    registry: Arc<LeafRegistry>,
    on_warning: Option<WarningHook>,
}

impl ModelContext {
    pub fn builder(schema: Arc<dyn Introspector>, root: TypeDesc) -> ModelContextBuilder {
        ModelContextBuilder {
            schema,
            root,
            root_type_params: Vec::new(),
            overrides: Overrides::default(),
        }
    }

    /// Start a builder for a root written as a type expression, such as
    /// `"PairContainer<Integer, String>"`.
    pub fn builder_for(schema: Arc<dyn Introspector>, root: &str) -> Result<ModelContextBuilder, GenerationError> {
        Ok(Self::builder(schema, TypeDesc::parse(root)?))
    }

    /// A builder that rebuilds an equal context.
    pub fn to_builder(&self) -> ModelContextBuilder {
        let fields = |set: &BTreeSet<FieldRef>| set.iter().cloned().map(Binding::from).collect::<Vec<_>>();
        let classes = |set: &BTreeSet<ClassId>| set.iter().cloned().map(Binding::Class).collect::<Vec<_>>();

        let mut ignored = fields(&self.ignored_fields);
        ignored.extend(classes(&self.ignored_classes));
        let mut nullable = fields(&self.nullable_fields);
        nullable.extend(classes(&self.nullable_classes));

        let mut producers: Vec<(Binding, UserProducer)> = self
            .field_producers
            .iter()
            .map(|(field, p)| (Binding::from(field.clone()), p.clone()))
            .collect();
        producers.extend(
            self.class_producers
                .iter()
                .map(|(class, p)| (Binding::Class(class.clone()), p.clone())),
        );

        ModelContextBuilder {
            schema: self.schema.clone(),
            root: self.root.clone(),
            root_type_params: self.root_type_params.clone(),
            overrides: Overrides {
                ignored,
                nullable,
                producers,
                subtypes: self
                    .subtypes
                    .iter()
                    .map(|(from, to)| (from.clone(), to.clone()))
                    .collect(),
                seed: self.seed,
                settings: self.settings.clone(),
                registry: Some(self.registry.clone()),
                on_warning: self.on_warning.clone(),
            },
        }
    }

    pub fn schema(&self) -> &dyn Introspector {
        self.schema.as_ref()
    }

    pub fn root(&self) -> &TypeDesc {
        &self.root
    }

    pub fn root_class(&self) -> &ClassId {
        &self.root_class
    }

    pub fn root_type_params(&self) -> &[TypeDesc] {
        &self.root_type_params
    }

    /// The root as one descriptor: the declared root applied to the root
    /// type parameters, if any were given.
    pub fn root_descriptor(&self) -> TypeDesc {
        if self.root_type_params.is_empty() {
            self.root.clone()
        } else {
            TypeDesc::parameterized(self.root_class.clone(), self.root_type_params.clone())
        }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &LeafRegistry {
        &self.registry
    }

    pub fn subtypes(&self) -> &BTreeMap<ClassId, ClassId> {
        &self.subtypes
    }

    pub fn is_field_ignored(&self, field: &FieldRef) -> bool {
        self.ignored_fields.contains(field)
    }

    pub fn is_class_ignored(&self, class: &ClassId) -> bool {
        self.ignored_classes.contains(class)
    }

    /// Whether the field, or any of `classes`, was marked nullable.
    pub fn is_nullable(&self, field: Option<&FieldRef>, classes: &[&ClassId]) -> bool {
        field.is_some_and(|f| self.nullable_fields.contains(f))
            || classes.iter().any(|c| self.nullable_classes.contains(*c))
    }

    /// The user producer bound to a position: the field binding first, then
    /// the first of `classes` with a class binding.
    pub fn producer_for(&self, field: Option<&FieldRef>, classes: &[&ClassId]) -> Option<&UserProducer> {
        field
            .and_then(|f| self.field_producers.get(f))
            .or_else(|| classes.iter().find_map(|c| self.class_producers.get(*c)))
    }

    /// Report a non-fatal anomaly to the log and to the warning hook.
    pub fn warn(&self, warning: &Warning) {
        warn!("{}", warning);
        if let Some(hook) = &self.on_warning {
            hook(warning);
        }
    }
}

impl PartialEq for ModelContext {
    fn eq(&self, other: &Self) -> bool {
        let same_hook = match (&self.on_warning, &other.on_warning) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        Arc::ptr_eq(&self.schema, &other.schema)
            && Arc::ptr_eq(&self.registry, &other.registry)
            && same_hook
            && self.root == other.root
            && self.root_class == other.root_class
            && self.root_type_params == other.root_type_params
            && self.ignored_fields == other.ignored_fields
            && self.ignored_classes == other.ignored_classes
            && self.nullable_fields == other.nullable_fields
            && self.nullable_classes == other.nullable_classes
            && self.field_producers == other.field_producers
            && self.class_producers == other.class_producers
            && self.subtypes == other.subtypes
            && self.seed == other.seed
            && self.settings == other.settings
    }
}

impl fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelContext")
            .field("root", &self.root_descriptor().to_string())
            .field("ignored_fields", &self.ignored_fields)
            .field("ignored_classes", &self.ignored_classes)
            .field("nullable_fields", &self.nullable_fields)
            .field("nullable_classes", &self.nullable_classes)
            .field("field_producers", &self.field_producers)
            .field("class_producers", &self.class_producers)
            .field("subtypes", &self.subtypes)
            .field("seed", &self.seed)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Accumulates overrides in any order; [`build`](Self::build) validates them.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use specimen::context::{Binding, ModelContext};
/// use specimen::registry::collection;
/// use specimen::schema::{ClassDecl, Schema};
///
/// let schema = Schema::builder()
///     .class(ClassDecl::record("Basket").field("items", "List<String>"))
///     .build()
///     .unwrap();
///
/// let ctx = ModelContext::builder_for(Arc::new(schema), "Basket")
///     .unwrap()
///     .generate(Binding::field("items"), collection().size(3))
///     .seed(7)
///     .build()
///     .unwrap();
/// let basket = specimen::create(&ctx).unwrap();
/// assert_eq!(basket.field("items").and_then(|v| v.len()), Some(3));
/// ```
#[derive(Clone)]
pub struct ModelContextBuilder {
    schema: Arc<dyn Introspector>,
    root: TypeDesc,
    root_type_params: Vec<TypeDesc>,
    overrides: Overrides,
}

impl ModelContextBuilder {
    /// Bind the root class's type variables positionally.
    pub fn root_type_params(mut self, params: impl IntoIterator<Item = TypeDesc>) -> Self {
        self.root_type_params = params.into_iter().collect();
        self
    }

    pub fn ignore(mut self, binding: Binding) -> Self {
        self.overrides.ignored.push(binding);
        self
    }

    pub fn with_nullable(mut self, binding: Binding) -> Self {
        self.overrides.nullable.push(binding);
        self
    }

    /// Bind a producer (a value supplier or a hint spec) to a field or class.
    pub fn generate(mut self, binding: Binding, producer: impl Into<UserProducer>) -> Self {
        self.overrides.producers.push((binding, producer.into()));
        self
    }

    /// Always produce `value` at the binding.
    pub fn set(self, binding: Binding, value: impl Into<Value>) -> Self {
        self.supply(binding, Constant(value.into()))
    }

    pub fn supply<G: Generator<Value> + 'static>(self, binding: Binding, generator: G) -> Self {
        self.generate(binding, UserProducer::supplier(generator))
    }

    /// Produce `concrete` wherever `declared` is declared.
    pub fn subtype(mut self, declared: impl Into<ClassId>, concrete: impl Into<ClassId>) -> Self {
        self.overrides.subtypes.push((declared.into(), concrete.into()));
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.overrides.seed = Some(seed);
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.overrides.settings = settings;
        self
    }

    pub fn registry(mut self, registry: LeafRegistry) -> Self {
        self.overrides.registry = Some(Arc::new(registry));
        self
    }

    pub fn on_warning(mut self, hook: impl Fn(&Warning) + Send + Sync + 'static) -> Self {
        self.overrides.on_warning = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<ModelContext, GenerationError> {
        let schema = self.schema.as_ref();
        self.overrides.settings.validate()?;

        let root_class = self.validate_root()?;
        let resolver = Resolver {
            schema,
            root: &root_class,
        };

        let mut ignored_fields = BTreeSet::new();
        let mut ignored_classes = BTreeSet::new();
        for binding in &self.overrides.ignored {
            match resolver.target(binding)? {
                Target::Field(field, _) => ignored_fields.insert(field),
                Target::Class(class) => ignored_classes.insert(class),
            };
        }

        let mut nullable_fields = BTreeSet::new();
        let mut nullable_classes = BTreeSet::new();
        for binding in &self.overrides.nullable {
            match resolver.target(binding)? {
                Target::Field(field, declared) => {
                    if declared.raw_class().is_some_and(|c| schema.is_primitive(&c)) {
                        return Err(GenerationError::invalid_configuration(format!(
                            "primitive field {} ({}) cannot be nullable",
                            field, declared
                        )));
                    }
                    nullable_fields.insert(field);
                }
                Target::Class(class) => {
                    if schema.is_primitive(&class) {
                        return Err(GenerationError::invalid_configuration(format!(
                            "primitive class {} cannot be nullable",
                            class
                        )));
                    }
                    nullable_classes.insert(class);
                }
            }
        }

        let mut field_producers = BTreeMap::new();
        let mut class_producers = BTreeMap::new();
        for (binding, producer) in &self.overrides.producers {
            match resolver.target(binding)? {
                Target::Field(field, _) => field_producers.insert(field, producer.clone()),
                Target::Class(class) => class_producers.insert(class, producer.clone()),
            };
        }

        let mut subtypes = BTreeMap::new();
        for (declared, concrete) in &self.overrides.subtypes {
            validate_subtype(schema, declared, concrete)?;
            subtypes.insert(declared.clone(), concrete.clone());
        }

        Ok(ModelContext {
            schema: self.schema.clone(),
            root: self.root,
            root_class,
            root_type_params: self.root_type_params,
            ignored_fields,
            ignored_classes,
            nullable_fields,
            nullable_classes,
            field_producers,
            class_producers,
            subtypes,
            seed: self.overrides.seed,
            settings: self.overrides.settings,
            registry: self
                .overrides
                .registry
                .unwrap_or_else(|| Arc::new(LeafRegistry::builtin())),
            on_warning: self.overrides.on_warning,
        })
    }

    fn validate_root(&self) -> Result<ClassId, GenerationError> {
        let schema = self.schema.as_ref();
        let root_class = self.root.raw_class().ok_or_else(|| {
            GenerationError::invalid_configuration(format!("root type {} does not name a class", self.root))
        })?;

        for desc in std::iter::once(&self.root).chain(&self.root_type_params) {
            check_known(schema, desc)?;
        }

        if root_class.is_array() {
            if !self.root_type_params.is_empty() {
                return Err(GenerationError::invalid_configuration(format!(
                    "array root {} takes no type parameters",
                    root_class
                )));
            }
            return Ok(root_class);
        }

        let expected = schema.type_params(&root_class).len();
        let args = self.root.args().len();
        if args > 0 && !self.root_type_params.is_empty() {
            return Err(GenerationError::invalid_configuration(format!(
                "root type {} is already parameterized; root type parameters must be empty",
                self.root
            )));
        }
        let found = if args > 0 { args } else { self.root_type_params.len() };
        if found != expected {
            return Err(GenerationError::invalid_configuration(format!(
                "root type {} declares {} type parameters but {} were supplied",
                root_class, expected, found
            )));
        }
        Ok(root_class)
    }
}

fn check_known(schema: &dyn Introspector, desc: &TypeDesc) -> Result<(), GenerationError> {
    let mut missing = None;
    desc.for_each_class(&mut |class, _| {
        let known = match class.component() {
            Some(component) => schema.class(&component).is_some(),
            None => schema.class(class).is_some(),
        };
        if !known && missing.is_none() {
            missing = Some(class.clone());
        }
    });
    match missing {
        Some(class) => Err(GenerationError::invalid_configuration(format!(
            "unknown class {} in {}",
            class, desc
        ))),
        None => Ok(()),
    }
}

fn validate_subtype(schema: &dyn Introspector, declared: &ClassId, concrete: &ClassId) -> Result<(), GenerationError> {
    for class in [declared, concrete] {
        if schema.class(class).is_none() {
            return Err(GenerationError::invalid_configuration(format!(
                "subtype mapping refers to unknown class {}",
                class
            )));
        }
    }
    if !schema.is_assignable(concrete, declared) {
        return Err(GenerationError::invalid_configuration(format!(
            "{} is not a subtype of {}",
            concrete, declared
        )));
    }
    let instantiable = schema
        .class(concrete)
        .is_some_and(|def| !def.is_abstract && def.construction != Construction::Unavailable);
    if !instantiable {
        return Err(GenerationError::invalid_configuration(format!(
            "subtype {} of {} cannot be instantiated",
            concrete, declared
        )));
    }
    Ok(())
}

enum Target {
    Field(FieldRef, TypeDesc),
    Class(ClassId),
}

struct Resolver<'a> {
    schema: &'a dyn Introspector,
    root: &'a ClassId,
}

impl Resolver<'_> {
    fn target(&self, binding: &Binding) -> Result<Target, GenerationError> {
        match binding {
            Binding::Field { owner, name } => {
                let owner = owner.as_ref().unwrap_or(self.root);
                if self.schema.class(owner).is_none() {
                    return Err(GenerationError::invalid_configuration(format!(
                        "field binding {}.{} refers to unknown class {}",
                        owner, name, owner
                    )));
                }
                let found = self.schema.find_field(owner, name).ok_or_else(|| {
                    GenerationError::invalid_configuration(format!("class {} has no field '{}'", owner, name))
                })?;
                Ok(Target::Field(FieldRef::new(found.owner, name), found.field.declared))
            }
            Binding::Class(class) => {
                if self.schema.class(class).is_none() {
                    return Err(GenerationError::invalid_configuration(format!(
                        "class binding refers to unknown class {}",
                        class
                    )));
                }
                Ok(Target::Class(class.clone()))
            }
        }
    }
}
