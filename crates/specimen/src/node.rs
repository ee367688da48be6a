//! Node graph: the typed traversal plan for one root type.
//!
//! Each node is one use site of a type: the root, a record field, a
//! constructor parameter, a collection element or a map key/value. Nodes
//! live in an arena and refer to each other by [`NodeId`]. Recursion in the
//! declared types is cut by back-edges, and by truncating nodes deeper than
//! the configured maximum depth.

use crate::context::{FieldRef, ModelContext};
use crate::error::{GenerationError, PathEntry, PathToRoot};
use crate::resolve::{self, ResolveError, TypeMap};
use crate::schema::{names, ClassId, ClassShape, Construction, ContainerFlavor, Introspector, TypeDesc, TypeVar};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Record,
    Collection(ContainerFlavor),
    Map(ContainerFlavor),
    Array,
    Enumeration(Vec<Arc<str>>),
    Leaf,
}

impl NodeKind {
    fn label(&self) -> &'static str {
        match self {
            NodeKind::Record => "record",
            NodeKind::Collection(_) => "collection",
            NodeKind::Map(_) => "map",
            NodeKind::Array => "array",
            NodeKind::Enumeration(_) => "enum",
            NodeKind::Leaf => "leaf",
        }
    }
}

/// Where a node sits in its parent.
#[derive(Clone, Debug, PartialEq)]
pub enum Origin {
    Root,
    Field(FieldRef),
    ConstructorParam(Arc<str>),
    Element,
    MapKey,
    MapValue,
}

impl Origin {
    /// Constructor parameters are anonymous positions that user producers
    /// and nullability bindings never apply to.
    pub fn accepts_overrides(&self) -> bool {
        !matches!(self, Origin::ConstructorParam(_))
    }

    pub fn field(&self) -> Option<&FieldRef> {
        match self {
            Origin::Field(field) => Some(field),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    Tree,
    /// Points at an ancestor with the same cycle key; not expanded again.
    Back,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub kind: EdgeKind,
    pub target: NodeId,
    pub origin: Origin,
}

impl Edge {
    pub fn is_back(&self) -> bool {
        self.kind == EdgeKind::Back
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub origin: Origin,
    /// Type as written at the use site.
    pub declared: TypeDesc,
    /// Type after variable resolution.
    pub resolved: TypeDesc,
    /// Type after subtype mapping; what is actually produced.
    pub effective: TypeDesc,
    pub effective_class: ClassId,
    /// Nearest enclosing record class.
    pub declaring_class: Option<ClassId>,
    pub type_map: TypeMap,
    pub depth: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<Edge>,
    /// Constructor parameter children, in parameter order.
    pub params: Vec<Edge>,
    pub construction: Option<Construction>,
    /// Deeper than the maximum depth; produced as the type default.
    pub truncated: bool,
    /// A value supplier is bound here, so children were not expanded.
    pub supplied: bool,
}

impl Node {
    pub fn field(&self) -> Option<&FieldRef> {
        self.origin.field()
    }

    /// Binding of `var` in this node's type map.
    pub fn binding(&self, var: &TypeVar) -> Option<&TypeDesc> {
        self.type_map.get(var)
    }

    fn path_entry(&self) -> PathEntry {
        entry(self.depth, &self.origin, &self.declared, &self.effective_class, self.declaring_class.as_ref())
    }
}

fn entry(
    depth: usize,
    origin: &Origin,
    declared: &TypeDesc,
    effective: &ClassId,
    declaring: Option<&ClassId>,
) -> PathEntry {
    match origin {
        Origin::Field(field) => PathEntry {
            depth,
            class: field.owner.to_string(),
            field: Some(format!("{} {}", declared, field.name)),
        },
        Origin::ConstructorParam(name) => PathEntry {
            depth,
            class: declaring.unwrap_or(effective).to_string(),
            field: Some(format!("{} {}", declared, name)),
        },
        _ => PathEntry {
            depth,
            class: effective.to_string(),
            field: None,
        },
    }
}

/// Arena of nodes rooted at [`NodeGraph::root`].
#[derive(Clone, Debug)]
pub struct NodeGraph {
    nodes: Vec<Node>,
    root: NodeId,
}

impl NodeGraph {
    pub fn build(ctx: &ModelContext) -> Result<Self, GenerationError> {
        let mut builder = GraphBuilder {
            ctx,
            schema: ctx.schema(),
            nodes: Vec::new(),
            ancestors: Vec::new(),
        };
        let edge = builder
            .visit(Pending {
                parent: None,
                origin: Origin::Root,
                declared: ctx.root_descriptor(),
                declaring: None,
                map: TypeMap::new(),
                depth: 0,
            })?
            .ok_or_else(|| GenerationError::invalid_configuration("root type was excluded"))?;

        debug!(
            root = %ctx.root_descriptor(),
            nodes = builder.nodes.len(),
            "built node graph"
        );
        Ok(Self {
            nodes: builder.nodes,
            root: edge.target,
        })
    }

    pub fn root(&self) -> &Node {
        &self.nodes[self.root.0]
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The child of `id` reached through the field or constructor parameter
    /// `name`.
    pub fn child(&self, id: NodeId, name: &str) -> Option<&Edge> {
        let node = self.node(id);
        node.children.iter().chain(&node.params).find(|edge| match &edge.origin {
            Origin::Field(field) => field.name.as_ref() == name,
            Origin::ConstructorParam(param) => param.as_ref() == name,
            _ => false,
        })
    }

    /// Entries from `id` up to the root.
    pub fn path_to_root(&self, id: NodeId) -> PathToRoot {
        let mut entries = Vec::new();
        let mut current = Some(id);
        while let Some(at) = current {
            let node = self.node(at);
            entries.push(node.path_entry());
            current = node.parent;
        }
        PathToRoot::new(entries)
    }

    /// Indented tree, one line per edge.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_node(&mut out, self.root, &Origin::Root, 0);
        out
    }

    fn render_node(&self, out: &mut String, id: NodeId, origin: &Origin, indent: usize) {
        let node = self.node(id);
        let name = match origin {
            Origin::Root => "root".to_string(),
            Origin::Field(field) => field.name.to_string(),
            Origin::ConstructorParam(param) => format!("{} (constructor)", param),
            Origin::Element => "element".to_string(),
            Origin::MapKey => "key".to_string(),
            Origin::MapValue => "value".to_string(),
        };
        let mut flags = String::new();
        if node.truncated {
            flags.push_str(" [max depth]");
        }
        if node.supplied {
            flags.push_str(" [supplied]");
        }
        let _ = writeln!(
            out,
            "{}{}: {} ({}){}",
            "  ".repeat(indent),
            name,
            node.effective,
            node.kind.label(),
            flags
        );
        for edge in node.params.iter().chain(&node.children) {
            if edge.is_back() {
                let target = self.node(edge.target);
                let label = match &edge.origin {
                    Origin::Field(field) => field.name.to_string(),
                    Origin::Element => "element".to_string(),
                    Origin::MapKey => "key".to_string(),
                    Origin::MapValue => "value".to_string(),
                    Origin::ConstructorParam(param) => param.to_string(),
                    Origin::Root => "root".to_string(),
                };
                let _ = writeln!(
                    out,
                    "{}{}: {} [cycle]",
                    "  ".repeat(indent + 1),
                    label,
                    target.effective
                );
            } else {
                self.render_node(out, edge.target, &edge.origin, indent + 1);
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Builder
// ----------------------------------------------------------------------------

/// A node about to be created.
struct Pending {
    parent: Option<NodeId>,
    origin: Origin,
    declared: TypeDesc,
    declaring: Option<ClassId>,
    map: TypeMap,
    depth: usize,
}

type CycleKey = (Option<ClassId>, ClassId, TypeMap);

struct GraphBuilder<'a> {
    ctx: &'a ModelContext,
    schema: &'a dyn Introspector,
    nodes: Vec<Node>,
    ancestors: Vec<(CycleKey, NodeId)>,
}

impl GraphBuilder<'_> {
    fn path(&self, pending: &Pending, effective: Option<&ClassId>) -> PathToRoot {
        let fallback = pending
            .declared
            .raw_class()
            .unwrap_or_else(|| ClassId::new(pending.declared.to_string()));
        let head = entry(
            pending.depth,
            &pending.origin,
            &pending.declared,
            effective.unwrap_or(&fallback),
            pending.declaring.as_ref(),
        );
        let mut entries = vec![head];
        let mut current = pending.parent;
        while let Some(at) = current {
            let node = &self.nodes[at.0];
            entries.push(node.path_entry());
            current = node.parent;
        }
        PathToRoot::new(entries)
    }

    fn resolve_error(&self, err: ResolveError, pending: &Pending) -> GenerationError {
        let path = self.path(pending, None);
        match err {
            ResolveError::Unresolved(var) => GenerationError::UnresolvedTypeVariable {
                variable: var.to_string(),
                path,
            },
            ResolveError::UnknownClass(class) => {
                GenerationError::unconstructible(class, "class is not declared in the schema", path)
            }
            other @ ResolveError::Arity { .. } => GenerationError::invalid_configuration(other.to_string()),
        }
    }

    fn visit(&mut self, pending: Pending) -> Result<Option<Edge>, GenerationError> {
        let schema = self.schema;
        let ctx = self.ctx;

        let resolved = resolve::resolve(&pending.declared, &pending.map).map_err(|e| self.resolve_error(e, &pending))?;
        let resolved_class = resolved
            .raw_class()
            .ok_or_else(|| self.resolve_error(ResolveError::UnknownClass(ClassId::new(resolved.to_string())), &pending))?;

        let effective = resolve::apply_subtype(schema, ctx.subtypes(), &resolved)
            .map_err(|e| self.resolve_error(e, &pending))?;
        let effective_class = effective.raw_class().unwrap_or_else(|| resolved_class.clone());

        if matches!(pending.origin, Origin::Field(_))
            && (ctx.is_class_ignored(&effective_class) || ctx.is_class_ignored(&resolved_class))
        {
            trace!(class = %effective_class, "field excluded by ignored class");
            return Ok(None);
        }

        let type_map = resolve::extend(schema, &pending.map, &effective).map_err(|e| self.resolve_error(e, &pending))?;

        let key: CycleKey = (pending.declaring.clone(), effective_class.clone(), type_map.clone());
        if let Some((_, ancestor)) = self.ancestors.iter().find(|(k, _)| *k == key) {
            trace!(class = %effective_class, "back-edge to ancestor");
            return Ok(Some(Edge {
                kind: EdgeKind::Back,
                target: *ancestor,
                origin: pending.origin,
            }));
        }

        let kind = self.classify(&effective, &effective_class);
        let supplied = pending.origin.accepts_overrides()
            && ctx
                .producer_for(pending.origin.field(), &[&effective_class, &resolved_class])
                .is_some_and(|p| p.is_supplier());
        let truncated = pending.depth > ctx.settings().max_depth;

        let mut construction = None;
        if !supplied && !truncated {
            construction = self.check_constructible(&kind, &effective_class, &pending)?;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind: kind.clone(),
            origin: pending.origin.clone(),
            declared: pending.declared.clone(),
            resolved,
            effective: effective.clone(),
            effective_class: effective_class.clone(),
            declaring_class: pending.declaring.clone(),
            type_map: type_map.clone(),
            depth: pending.depth,
            parent: pending.parent,
            children: Vec::new(),
            params: Vec::new(),
            construction: construction.clone(),
            truncated,
            supplied,
        });

        if truncated {
            trace!(class = %effective_class, depth = pending.depth, "node truncated at max depth");
        }
        if !supplied && !truncated {
            self.ancestors.push((key, id));
            let expanded = self.expand(id, &kind, &effective, &effective_class, &pending, type_map, construction);
            self.ancestors.pop();
            expanded?;
        }

        Ok(Some(Edge {
            kind: EdgeKind::Tree,
            target: id,
            origin: pending.origin,
        }))
    }

    fn classify(&self, effective: &TypeDesc, class: &ClassId) -> NodeKind {
        let schema = self.schema;
        if matches!(effective, TypeDesc::Array(_)) {
            return NodeKind::Array;
        }
        if schema.is_assignable(class, &ClassId::new(names::MAP)) {
            return NodeKind::Map(schema.container_flavor(class).unwrap_or(ContainerFlavor::Map));
        }
        if schema.is_assignable(class, &ClassId::new(names::COLLECTION)) {
            return NodeKind::Collection(schema.container_flavor(class).unwrap_or(ContainerFlavor::List));
        }
        if let Some(def) = schema.class(class) {
            if let ClassShape::Enumeration(variants) = &def.shape {
                return NodeKind::Enumeration(variants.clone());
            }
        }
        if self.ctx.registry().get(class).is_some_and(|p| !p.is_shell()) {
            return NodeKind::Leaf;
        }
        NodeKind::Record
    }

    fn check_constructible(
        &self,
        kind: &NodeKind,
        class: &ClassId,
        pending: &Pending,
    ) -> Result<Option<Construction>, GenerationError> {
        let unconstructible =
            |reason: &str| GenerationError::unconstructible(class.clone(), reason, self.path(pending, Some(class)));

        match kind {
            NodeKind::Record => {
                let def = self
                    .schema
                    .class(class)
                    .ok_or_else(|| unconstructible("class is not declared in the schema"))?;
                if def.is_abstract {
                    return Err(unconstructible("abstract class has no subtype mapping"));
                }
                if def.construction == Construction::Unavailable {
                    return Err(unconstructible("class has no usable constructor"));
                }
                Ok(Some(def.construction.clone()))
            }
            NodeKind::Collection(_) | NodeKind::Map(_) => {
                let abstract_class = self.schema.class(class).is_some_and(|def| def.is_abstract);
                if abstract_class && self.ctx.registry().shell(class).is_none() {
                    return Err(unconstructible("abstract container has no subtype mapping"));
                }
                Ok(None)
            }
            NodeKind::Array | NodeKind::Enumeration(_) | NodeKind::Leaf => Ok(None),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn expand(
        &mut self,
        id: NodeId,
        kind: &NodeKind,
        effective: &TypeDesc,
        class: &ClassId,
        pending: &Pending,
        map: TypeMap,
        construction: Option<Construction>,
    ) -> Result<(), GenerationError> {
        let depth = pending.depth + 1;
        let child = |origin: Origin, declared: TypeDesc, declaring: Option<ClassId>| Pending {
            parent: Some(id),
            origin,
            declared,
            declaring,
            map: map.clone(),
            depth,
        };

        match kind {
            NodeKind::Record => {
                if let Some(Construction::Constructor(params)) = construction {
                    for param in params {
                        let pending = child(
                            Origin::ConstructorParam(param.name.clone()),
                            param.declared.clone(),
                            Some(class.clone()),
                        );
                        if let Some(edge) = self.visit(pending)? {
                            self.nodes[id.0].params.push(edge);
                        }
                    }
                }
                for declared in self.schema.fields(class).iter() {
                    let field = FieldRef {
                        owner: declared.owner.clone(),
                        name: declared.field.name.clone(),
                    };
                    if self.ctx.is_field_ignored(&field) {
                        trace!(field = %field, "field ignored");
                        continue;
                    }
                    let pending = child(Origin::Field(field), declared.field.declared.clone(), Some(class.clone()));
                    if let Some(edge) = self.visit(pending)? {
                        self.nodes[id.0].children.push(edge);
                    }
                }
            }
            NodeKind::Collection(_) => {
                let [element] = self.container_args::<1>(effective, names::COLLECTION, &["E"]);
                let pending = child(Origin::Element, element, pending.declaring.clone());
                if let Some(edge) = self.visit(pending)? {
                    self.nodes[id.0].children.push(edge);
                }
            }
            NodeKind::Map(_) => {
                let [key, value] = self.container_args::<2>(effective, names::MAP, &["K", "V"]);
                for (origin, declared) in [(Origin::MapKey, key), (Origin::MapValue, value)] {
                    let pending = child(origin, declared, pending.declaring.clone());
                    if let Some(edge) = self.visit(pending)? {
                        self.nodes[id.0].children.push(edge);
                    }
                }
            }
            NodeKind::Array => {
                if let TypeDesc::Array(component) = effective {
                    let pending = child(Origin::Element, (**component).clone(), pending.declaring.clone());
                    if let Some(edge) = self.visit(pending)? {
                        self.nodes[id.0].children.push(edge);
                    }
                }
            }
            NodeKind::Enumeration(_) | NodeKind::Leaf => {}
        }
        Ok(())
    }

    /// Element descriptors from the `target` supertype view. Positions the
    /// view cannot supply stay as `target`'s own variables, which fail to
    /// resolve with a path when the child is visited.
    fn container_args<const N: usize>(&self, effective: &TypeDesc, target: &str, vars: &[&str; N]) -> [TypeDesc; N] {
        let target = ClassId::new(target);
        let view = resolve::supertype_args(self.schema, effective, &target).unwrap_or_default();
        std::array::from_fn(|i| {
            view.get(i)
                .cloned()
                .unwrap_or_else(|| TypeDesc::Var(TypeVar::new(target.clone(), vars[i])))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Binding;
    use crate::registry::UserProducer;
    use crate::core::Constant;
    use crate::schema::{ClassDecl, Schema};
    use crate::value::Value;

    fn schema() -> Arc<dyn Introspector> {
        Arc::new(
            Schema::builder()
                .class(ClassDecl::record("Item").type_params(["T"]).field("value", "T"))
                .class(
                    ClassDecl::record("Pair")
                        .type_params(["L", "R"])
                        .field("left", "L")
                        .field("right", "R"),
                )
                .class(
                    ClassDecl::record("PairContainer")
                        .type_params(["X", "Y"])
                        .field("pairValue", "Pair<X, Y>"),
                )
                .class(ClassDecl::record("Owner").field("map1", "Map<Integer, Item<String>>"))
                .class(ClassDecl::record("Parent").field("child", "Child"))
                .class(ClassDecl::record("Child").field("parent", "Parent"))
                .class(ClassDecl::record("Chain").type_params(["T"]).field("next", "Chain<List<T>>"))
                .class(ClassDecl::abstract_class("Pet"))
                .class(ClassDecl::record("Dog").extends("Pet").field("name", "String"))
                .class(ClassDecl::record("Home").field("pet", "Pet"))
                .class(
                    ClassDecl::record("Money")
                        .constructor([("amount", "long"), ("currency", "String")])
                        .field("amount", "long"),
                )
                .class(ClassDecl::record("Raw").field("items", "List"))
                .build()
                .unwrap(),
        )
    }

    fn graph(root: &str) -> Result<NodeGraph, GenerationError> {
        let ctx = ModelContext::builder_for(schema(), root).unwrap().build().unwrap();
        NodeGraph::build(&ctx)
    }

    #[test]
    fn test_generic_pair_container() {
        let graph = graph("PairContainer<Integer, String>").unwrap();
        let edge = graph.child(graph.root_id(), "pairValue").unwrap();
        let pair = graph.node(edge.target);
        assert_eq!(pair.binding(&TypeVar::new("Pair", "L")), Some(&TypeDesc::class("Integer")));
        assert_eq!(pair.binding(&TypeVar::new("Pair", "R")), Some(&TypeDesc::class("String")));
        assert_eq!(pair.children.len(), 2);

        let left = graph.node(graph.child(edge.target, "left").unwrap().target);
        let right = graph.node(graph.child(edge.target, "right").unwrap().target);
        assert_eq!(left.effective_class, ClassId::new("Integer"));
        assert_eq!(right.effective_class, ClassId::new("String"));
        assert_eq!(left.kind, NodeKind::Leaf);
    }

    #[test]
    fn test_map_children_are_key_then_value() {
        let graph = graph("Owner").unwrap();
        let map = graph.node(graph.child(graph.root_id(), "map1").unwrap().target);
        assert_eq!(map.kind, NodeKind::Map(ContainerFlavor::Map));
        let key = graph.node(map.children[0].target);
        let value = graph.node(map.children[1].target);
        assert_eq!(key.origin, Origin::MapKey);
        assert_eq!(key.effective_class, ClassId::new("Integer"));
        assert_eq!(value.effective, TypeDesc::parse("Item<String>").unwrap());
        assert_eq!(value.children.len(), 1);
    }

    #[test]
    fn test_cycle_produces_back_edge() {
        let graph = graph("Parent").unwrap();
        let child = graph.child(graph.root_id(), "child").unwrap();
        assert!(!child.is_back());
        let parent = graph.child(child.target, "parent").unwrap();
        assert!(!parent.is_back());
        let back = graph.child(parent.target, "child").unwrap();
        assert!(back.is_back());
        assert_eq!(back.target, child.target);
    }

    #[test]
    fn test_max_depth_truncates_growing_recursion() {
        let graph = graph("Chain<String>").unwrap();
        let mut id = graph.root_id();
        let mut steps = 0;
        while let Some(edge) = graph.child(id, "next") {
            id = edge.target;
            steps += 1;
        }
        assert!(graph.node(id).truncated);
        assert_eq!(steps, 9);
    }

    #[test]
    fn test_abstract_without_mapping_is_unconstructible() {
        let err = graph("Home").unwrap_err();
        match err {
            GenerationError::UnconstructibleType { class, path, .. } => {
                assert_eq!(class, ClassId::new("Pet"));
                assert_eq!(path.lines(), vec!["<1:Home: Pet pet>", "<0:Home>"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_subtype_mapping_and_supplier_skip_checks() {
        let ctx = ModelContext::builder_for(schema(), "Home")
            .unwrap()
            .subtype("Pet", "Dog")
            .build()
            .unwrap();
        let graph = NodeGraph::build(&ctx).unwrap();
        let pet = graph.node(graph.child(graph.root_id(), "pet").unwrap().target);
        assert_eq!(pet.effective_class, ClassId::new("Dog"));
        assert_eq!(pet.children.len(), 1);

        let ctx = ModelContext::builder_for(schema(), "Home")
            .unwrap()
            .generate(Binding::field("pet"), UserProducer::supplier(Constant(Value::Null)))
            .build()
            .unwrap();
        let graph = NodeGraph::build(&ctx).unwrap();
        let pet = graph.node(graph.child(graph.root_id(), "pet").unwrap().target);
        assert!(pet.supplied);
        assert!(pet.children.is_empty());
    }

    #[test]
    fn test_constructor_params_become_children() {
        let graph = graph("Money").unwrap();
        let root = graph.root();
        assert_eq!(root.params.len(), 2);
        assert!(matches!(root.construction, Some(Construction::Constructor(_))));
        let currency = graph.node(graph.child(graph.root_id(), "currency").unwrap().target);
        assert_eq!(currency.origin, Origin::ConstructorParam(Arc::from("currency")));
    }

    #[test]
    fn test_raw_collection_reports_unresolved_variable() {
        let err = graph("Raw").unwrap_err();
        match err {
            GenerationError::UnresolvedTypeVariable { variable, path } => {
                assert_eq!(variable, "List.E");
                assert_eq!(path.lines(), vec!["<2:E>", "<1:Raw: List items>", "<0:Raw>"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_path_to_root_and_render() {
        let graph = graph("Owner").unwrap();
        let map = graph.child(graph.root_id(), "map1").unwrap().target;
        let value = graph.node(map).children[1].target;
        assert_eq!(
            graph.path_to_root(value).lines(),
            vec![
                "<2:Item>",
                "<1:Owner: Map<Integer, Item<String>> map1>",
                "<0:Owner>"
            ]
        );
        let rendered = graph.render();
        assert!(rendered.starts_with("root: Owner (record)"));
        assert!(rendered.contains("  map1: Map<Integer, Item<String>> (map)"));
    }
}
