//! Generation pipeline: walks a node graph and produces a value per node.

use crate::context::ModelContext;
use crate::core::{Generator, SharedGenerator};
use crate::error::{GenerationError, PathToRoot, TypeMismatch, Warning};
use crate::node::{Edge, Node, NodeGraph, NodeId, NodeKind, Origin};
use crate::registry::{Hints, LeafProducer, UserProducer};
use crate::rng::{Random, SeededRngFactory};
use crate::schema::{names, ClassId, ContainerFlavor, TypeDesc};
use crate::value::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Result of a `create` call with everything needed to reproduce it.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationReport {
    pub value: Value,
    /// Seed the run used; pass it to `ModelContextBuilder::seed` to replay.
    pub seed: u64,
    pub warnings: Vec<Warning>,
}

/// Create one populated instance of the context's root type.
pub fn create(ctx: &ModelContext) -> Result<Value, GenerationError> {
    create_with_report(ctx).map(|report| report.value)
}

pub fn create_with_report(ctx: &ModelContext) -> Result<GenerationReport, GenerationError> {
    let graph = NodeGraph::build(ctx)?;
    let mut rng = match ctx.seed() {
        Some(seed) => Random::new(seed),
        None => Random::from_entropy(),
    };
    debug!(seed = rng.seed(), root = %ctx.root_descriptor(), "generating instance");

    let mut generator = InstanceGenerator::new(ctx, &graph);
    let value = generator.generate(&mut rng)?;
    Ok(GenerationReport {
        value,
        seed: rng.seed(),
        warnings: generator.into_warnings(),
    })
}

/// Create `count` instances, each from its own stream derived from the
/// context seed.
pub fn create_list(ctx: &ModelContext, count: usize) -> Result<Vec<Value>, GenerationError> {
    let graph = NodeGraph::build(ctx)?;
    let master = ctx.seed().unwrap_or_else(|| Random::from_entropy().seed());
    let factory = SeededRngFactory::new(master);
    debug!(seed = master, count, "generating instance list");

    (0..count)
        .map(|index| {
            let mut rng = factory.indexed_stream("root", index as u64);
            InstanceGenerator::new(ctx, &graph).generate(&mut rng)
        })
        .collect()
}

/// States a node passes through while it is generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeState {
    Fresh,
    Selected,
    Null,
    Default,
    Producing,
    Populating,
    Done,
}

/// How a node's value is obtained. User producers and leaf producers carry
/// the hints of any spec bound to the node.
enum Producer<'a> {
    Leaf(&'a LeafProducer, Hints),
    Structural(Hints),
    UserProvided(&'a SharedGenerator<Value>),
}

/// Produces values for the nodes of one graph.
pub struct InstanceGenerator<'a> {
    ctx: &'a ModelContext,
    graph: &'a NodeGraph,
    warnings: Vec<Warning>,
}

impl<'a> InstanceGenerator<'a> {
    pub fn new(ctx: &'a ModelContext, graph: &'a NodeGraph) -> Self {
        Self {
            ctx,
            graph,
            warnings: Vec::new(),
        }
    }

    pub fn generate(&mut self, rng: &mut Random) -> Result<Value, GenerationError> {
        self.produce(self.graph.root_id(), rng)
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    fn is_nullable(&self, node: &Node) -> bool {
        let classes = position_classes(node);
        let classes: Vec<&ClassId> = classes.iter().collect();
        self.ctx.is_nullable(node.field(), &classes)
    }

    fn transition(&self, id: NodeId, from: NodeState, to: NodeState) {
        trace!(node = id.index(), ?from, ?to, "node state");
    }

    fn select(&self, node: &'a Node) -> Producer<'a> {
        let mut hints = Hints::default();
        if node.origin.accepts_overrides() {
            let classes = position_classes(node);
            let classes: Vec<&ClassId> = classes.iter().collect();
            match self.ctx.producer_for(node.field(), &classes) {
                Some(UserProducer::Supplier(generator)) => return Producer::UserProvided(generator),
                Some(UserProducer::Spec(spec)) => hints = spec.clone(),
                None => {}
            }
        }
        match (&node.kind, self.ctx.registry().get(&node.effective_class)) {
            (NodeKind::Leaf, Some(leaf)) => Producer::Leaf(leaf, hints),
            _ => Producer::Structural(hints),
        }
    }

    /// Value of a child position; back-edges yield the default.
    fn produce_edge(&mut self, edge: &Edge, rng: &mut Random) -> Result<Value, GenerationError> {
        if edge.is_back() {
            let target = self.graph.node(edge.target);
            self.transition(edge.target, NodeState::Fresh, NodeState::Default);
            return Ok(Value::default_for(&target.effective_class));
        }
        self.produce(edge.target, rng)
    }

    fn produce(&mut self, id: NodeId, rng: &mut Random) -> Result<Value, GenerationError> {
        let graph = self.graph;
        let node = graph.node(id);

        if node.truncated {
            self.transition(id, NodeState::Fresh, NodeState::Default);
            return Ok(Value::default_for(&node.effective_class));
        }

        let producer = self.select(node);
        self.transition(id, NodeState::Fresh, NodeState::Selected);

        if node.origin.accepts_overrides()
            && self.is_nullable(node)
            && rng.bool_with(self.ctx.settings().nullable_probability)
        {
            self.transition(id, NodeState::Selected, NodeState::Null);
            return Ok(Value::Null);
        }

        self.transition(id, NodeState::Selected, NodeState::Producing);
        let value = match producer {
            Producer::UserProvided(generator) => {
                let value = generator.generate(rng);
                self.check_supplied(id, node, &value)?;
                value
            }
            Producer::Leaf(leaf, hints) => leaf
                .produce(rng, &hints, self.ctx.settings())
                .map_err(|source| GenerationError::Producer {
                    source,
                    path: graph.path_to_root(id),
                })?,
            Producer::Structural(hints) => {
                self.transition(id, NodeState::Producing, NodeState::Populating);
                self.structural(id, node, &hints, rng)?
            }
        };
        self.transition(id, NodeState::Producing, NodeState::Done);
        Ok(value)
    }

    fn structural(&mut self, id: NodeId, node: &Node, hints: &Hints, rng: &mut Random) -> Result<Value, GenerationError> {
        match &node.kind {
            NodeKind::Record => self.record(node, rng),
            NodeKind::Collection(flavor) => self.collection(id, node, *flavor, hints, rng),
            NodeKind::Map(flavor) => self.map(id, node, *flavor, hints, rng),
            NodeKind::Array => self.array(id, node, hints, rng),
            NodeKind::Enumeration(variants) => Ok(match rng.choose(variants) {
                Some(variant) => Value::Enum {
                    class: node.effective_class.clone(),
                    variant: variant.clone(),
                },
                None => Value::Null,
            }),
            NodeKind::Leaf => Ok(Value::default_for(&node.effective_class)),
        }
    }

    fn record(&mut self, node: &Node, rng: &mut Random) -> Result<Value, GenerationError> {
        let schema = self.ctx.schema();
        let declared = schema.fields(&node.effective_class);

        // Every effective field starts at its default; ignored ones stay there.
        let mut fields: Vec<(Arc<str>, Value)> = declared
            .iter()
            .map(|f| {
                let default = crate::resolve::resolve(&f.field.declared, &node.type_map)
                    .ok()
                    .and_then(|desc| desc.raw_class())
                    .map(|class| Value::default_for(&class))
                    .unwrap_or_default();
                (f.field.name.clone(), default)
            })
            .collect();

        let mut constructor_args = Vec::with_capacity(node.params.len());
        for edge in &node.params {
            let value = self.produce_edge(edge, rng)?;
            if let Origin::ConstructorParam(name) = &edge.origin {
                constructor_args.push((name.clone(), value));
            }
        }

        for edge in &node.children {
            let value = self.produce_edge(edge, rng)?;
            let Some(field) = edge.origin.field() else {
                continue;
            };
            let slot = declared
                .iter()
                .position(|f| f.owner == field.owner && f.field.name == field.name);
            if let Some(slot) = slot {
                fields[slot].1 = value;
            }
        }

        Ok(Value::Record {
            class: node.effective_class.clone(),
            constructor_args,
            fields,
        })
    }

    fn target_size(&self, id: NodeId, hints: &Hints, default: crate::config::Range<usize>, rng: &mut Random) -> Result<usize, GenerationError> {
        hints
            .pick_size(rng, default)
            .map_err(|source| GenerationError::Producer {
                source,
                path: self.graph.path_to_root(id),
            })
    }

    /// Concrete class of a container node, via its shell when it has one.
    fn container_class(&self, node: &Node) -> ClassId {
        match self.ctx.registry().shell(&node.effective_class) {
            Some(shell) => shell.concrete_class(self.ctx.subtypes()),
            None => node.effective_class.clone(),
        }
    }

    fn collection(
        &mut self,
        id: NodeId,
        node: &Node,
        flavor: ContainerFlavor,
        hints: &Hints,
        rng: &mut Random,
    ) -> Result<Value, GenerationError> {
        let class = self.container_class(node);
        let target = self.target_size(id, hints, self.ctx.settings().collection_size, rng)?;
        let mut items = Vec::with_capacity(target);

        match node.children.first() {
            Some(element) if !element.is_back() => {
                if flavor.collapses_duplicates() {
                    let budget = target.saturating_mul(self.ctx.settings().retry_factor);
                    let mut attempts = 0;
                    while items.len() < target && attempts < budget {
                        attempts += 1;
                        let item = self.produce_edge(element, rng)?;
                        if !items.contains(&item) {
                            items.push(item);
                        }
                    }
                    self.check_filled(id, target, items.len());
                } else {
                    for _ in 0..target {
                        items.push(self.produce_edge(element, rng)?);
                    }
                }
            }
            _ => trace!(node = id.index(), "element is a back-edge; collection left empty"),
        }

        if flavor.is_sorted() {
            items.sort_by(Value::total_cmp);
        }
        Ok(Value::Collection { class, items })
    }

    fn map(
        &mut self,
        id: NodeId,
        node: &Node,
        flavor: ContainerFlavor,
        hints: &Hints,
        rng: &mut Random,
    ) -> Result<Value, GenerationError> {
        let class = self.container_class(node);
        let target = self.target_size(id, hints, self.ctx.settings().map_size, rng)?;
        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(target);

        match (node.children.first(), node.children.get(1)) {
            (Some(key_edge), Some(value_edge)) if !key_edge.is_back() => {
                let budget = target.saturating_mul(self.ctx.settings().retry_factor);
                let mut attempts = 0;
                while entries.len() < target && attempts < budget {
                    attempts += 1;
                    let key = self.produce_edge(key_edge, rng)?;
                    if entries.iter().any(|(k, _)| *k == key) {
                        continue;
                    }
                    let value = self.produce_edge(value_edge, rng)?;
                    entries.push((key, value));
                }
                self.check_filled(id, target, entries.len());
            }
            _ => trace!(node = id.index(), "key is a back-edge; map left empty"),
        }

        if flavor.is_sorted() {
            entries.sort_by(|(a, _), (b, _)| a.total_cmp(b));
        }
        Ok(Value::Map { class, entries })
    }

    fn array(&mut self, id: NodeId, node: &Node, hints: &Hints, rng: &mut Random) -> Result<Value, GenerationError> {
        let component = match &node.effective {
            TypeDesc::Array(component) => component.raw_class(),
            _ => None,
        }
        .unwrap_or_else(|| ClassId::new(names::OBJECT));
        let target = self.target_size(id, hints, self.ctx.settings().array_size, rng)?;

        let mut items = Vec::with_capacity(target);
        match node.children.first() {
            Some(element) if !element.is_back() => {
                for _ in 0..target {
                    items.push(self.produce_edge(element, rng)?);
                }
            }
            _ => trace!(node = id.index(), "component is a back-edge; array left empty"),
        }
        Ok(Value::Array { component, items })
    }

    fn check_filled(&mut self, id: NodeId, requested: usize, actual: usize) {
        if actual < requested {
            let warning = Warning::PartiallyFilledContainer {
                path: self.graph.path_to_root(id),
                requested,
                actual,
            };
            self.ctx.warn(&warning);
            self.warnings.push(warning);
        }
    }

    /// A supplied value must fit the position it is assigned to.
    fn check_supplied(&self, id: NodeId, node: &Node, value: &Value) -> Result<(), GenerationError> {
        let target = node.resolved.raw_class().unwrap_or_else(|| node.effective_class.clone());
        let fits = match value.runtime_class() {
            None => !self.ctx.schema().is_primitive(&target),
            Some(runtime) => fits(self.ctx, &runtime, &target),
        };
        if fits {
            return Ok(());
        }

        let path = self.graph.path_to_root(id);
        Err(GenerationError::ProducerRejection {
            mismatch: TypeMismatch {
                target: describe_target(node, &path),
                provided_type: value
                    .runtime_class()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "null".to_string()),
                provided_value: value.to_string(),
            },
            path,
        })
    }
}

/// Classes a class binding may name for this position: the effective class,
/// then the class it was mapped from.
fn position_classes(node: &Node) -> Vec<ClassId> {
    let mut classes = vec![node.effective_class.clone()];
    if let Some(resolved) = node.resolved.raw_class() {
        if resolved != node.effective_class {
            classes.push(resolved);
        }
    }
    classes
}

fn fits(ctx: &ModelContext, runtime: &ClassId, target: &ClassId) -> bool {
    if ctx.schema().is_assignable(runtime, target) {
        return true;
    }
    names::SCALARS
        .iter()
        .any(|(primitive, boxed)| target.as_str() == *primitive && runtime.as_str() == *boxed)
}

fn describe_target(node: &Node, path: &PathToRoot) -> String {
    match node.field() {
        Some(field) => format!("{} {} (in {})", node.declared, field.name, field.owner),
        None => path.target(),
    }
}
