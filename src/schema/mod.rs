//! # Trellis Schema Registry
//!
//! One [`NodeSchema`] per node type, built once on first use and read-only
//! afterwards. The validator asks the registry what a node may carry; the
//! runtime asks it which nodes open loops or skip rendering.
//!
//! ## Module Structure
//!
//! - **`declarations`**: top-level nodes (`state`, `list`, `function`, ...)
//! - **`blocks`**: UI structure and event handlers
//! - **`properties`**: attributes plus the keyed child schemas
//! - **`conditionals`**: `if`, `else`, `breakpoint`
//! - **`actions`**: store mutations and escape hatches
//!
//! ## Lookup
//!
//! ```rust
//! use trellis::ast::Category;
//! use trellis::schema;
//! let each = schema::get("each").unwrap();
//! assert_eq!(each.category, Category::Block);
//! assert!(each.flags.manages_loop_variables);
//! assert!(schema::get("marquee").is_none());
//! ```

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::ast::{Category, Node};

pub mod actions;
pub mod blocks;
pub mod conditionals;
pub mod declarations;
pub mod properties;

// ============================================================================
// DATA CONTRACT
// ============================================================================

pub type ConstraintFn = fn(&Node) -> bool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Space,
    Comma,
}

impl Separator {
    pub fn split(self, data: &str) -> Vec<&str> {
        let parts: Vec<&str> = match self {
            Separator::Space => data.split_whitespace().collect(),
            Separator::Comma => data.split(',').collect(),
        };
        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Everything after the first `skip` parts, original spacing kept for
    /// space-separated data.
    ///
    /// ```rust
    /// use trellis::schema::Separator;
    /// assert_eq!(Separator::Space.tail("h1  Hello   there", 1), "Hello   there");
    /// assert_eq!(Separator::Comma.tail("tags, a, b", 1), "a, b");
    /// ```
    pub fn tail(self, data: &str, skip: usize) -> String {
        match self {
            Separator::Space => {
                let mut rest = data.trim();
                for _ in 0..skip {
                    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                    rest = rest[end..].trim_start();
                }
                rest.trim_end().to_string()
            }
            Separator::Comma => self.split(data).get(skip..).unwrap_or_default().join(self.joiner()),
        }
    }

    pub fn joiner(self) -> &'static str {
        match self {
            Separator::Space => " ",
            Separator::Comma => ", ",
        }
    }
}

/// A named slice of a node's data, optionally checked by a registered
/// data-type validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    pub name: &'static str,
    pub validator: Option<&'static str>,
}

impl Part {
    pub const fn new(name: &'static str, validator: &'static str) -> Self {
        Self {
            name,
            validator: Some(validator),
        }
    }

    pub const fn unchecked(name: &'static str) -> Self {
        Self {
            name,
            validator: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    /// First part, optional second part, then everything else.
    Positional {
        first: Option<Part>,
        second: Option<Part>,
        rest: Option<Part>,
    },
    /// One part per position.
    Ordered(Vec<Part>),
}

impl Format {
    /// Which part covers the given 0-based position.
    pub fn part_at(&self, index: usize) -> Option<Part> {
        match self {
            Format::Ordered(parts) => parts.get(index).copied(),
            Format::Positional {
                first,
                second,
                rest,
            } => {
                let mut slots = first.iter().chain(second.iter());
                match slots.nth(index) {
                    Some(part) => Some(*part),
                    None => *rest,
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub description: &'static str,
    pub check: ConstraintFn,
}

#[derive(Debug, Clone)]
pub struct DataContract {
    pub allowed: bool,
    pub required: bool,
    pub min: usize,
    pub max: Option<usize>,
    /// Rejects repeated values among the parts.
    pub no_repeats: bool,
    pub format: Option<Format>,
    pub separator: Separator,
    pub constraints: Vec<Constraint>,
}

impl DataContract {
    /// No data at all.
    pub fn none() -> Self {
        Self {
            allowed: false,
            required: false,
            min: 0,
            max: None,
            no_repeats: false,
            format: None,
            separator: Separator::Space,
            constraints: Vec::new(),
        }
    }

    /// Optional data with no declared format.
    pub fn free() -> Self {
        Self {
            allowed: true,
            ..Self::none()
        }
    }

    /// Data whose first part is `part`.
    pub fn first(part: Part) -> Self {
        Self {
            allowed: true,
            format: Some(Format::Positional {
                first: Some(part),
                second: None,
                rest: None,
            }),
            ..Self::none()
        }
    }

    /// Data made entirely of `part` repeated.
    pub fn rest(part: Part) -> Self {
        Self {
            allowed: true,
            format: Some(Format::Positional {
                first: None,
                second: None,
                rest: Some(part),
            }),
            ..Self::none()
        }
    }

    pub fn ordered(parts: Vec<Part>) -> Self {
        let count = parts.len();
        Self {
            allowed: true,
            max: Some(count),
            format: Some(Format::Ordered(parts)),
            ..Self::none()
        }
    }

    pub fn then(mut self, part: Part) -> Self {
        if let Some(Format::Positional { second, .. }) = &mut self.format {
            *second = Some(part);
        }
        self
    }

    pub fn then_rest(mut self, part: Part) -> Self {
        if let Some(Format::Positional { rest, .. }) = &mut self.format {
            *rest = Some(part);
        }
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.min = self.min.max(1);
        self
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = min;
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    pub fn no_repeats(mut self) -> Self {
        self.no_repeats = true;
        self
    }

    pub fn comma_separated(mut self) -> Self {
        self.separator = Separator::Comma;
        self
    }

    pub fn constraint(mut self, description: &'static str, check: ConstraintFn) -> Self {
        self.constraints.push(Constraint { description, check });
        self
    }

    /// Name of the part expected at `index`, for missing-part messages.
    pub fn part_name(&self, index: usize) -> &'static str {
        self.format
            .as_ref()
            .and_then(|f| f.part_at(index))
            .map(|p| p.name)
            .unwrap_or("data")
    }
}

// ============================================================================
// CHILD CONTRACTS
// ============================================================================

/// One allowed child type and its cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRule {
    pub name: &'static str,
    pub required: bool,
    pub max: Option<usize>,
}

impl ChildRule {
    pub const fn at_most(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }
}

pub const fn opt(name: &'static str) -> ChildRule {
    ChildRule {
        name,
        required: false,
        max: None,
    }
}

pub const fn req(name: &'static str) -> ChildRule {
    ChildRule {
        name,
        required: true,
        max: None,
    }
}

/// `opt(name).at_most(1)`, the common case.
pub const fn one(name: &'static str) -> ChildRule {
    opt(name).at_most(1)
}

#[derive(Debug, Clone, Default)]
pub struct BlocksContract {
    pub list: Vec<ChildRule>,
    /// Accepts every schema flagged as a container child.
    pub container_parent: bool,
    pub no_repeats: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PropertiesContract {
    pub list: Vec<ChildRule>,
    pub any: bool,
    /// Schema for keyed (open-vocabulary) children, if any are allowed.
    pub keyed: Option<&'static str>,
    pub no_repeats: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ActionsContract {
    pub allow_any: bool,
    pub list: Vec<&'static str>,
}

impl ActionsContract {
    pub fn permits_actions(&self) -> bool {
        self.allow_any || !self.list.is_empty()
    }

    pub fn allows(&self, action: &str) -> bool {
        self.allow_any || self.list.iter().any(|a| *a == action)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub manages_loop_variables: bool,
    pub check_variable_conflicts: bool,
    /// Type of the sibling that must immediately precede this node.
    pub requires_sibling: Option<&'static str>,
    pub requires_functional_context: bool,
    pub provides_functional_context: bool,
    pub initializes_state: bool,
    pub initializes_lists: bool,
    pub skips_rendering_in_loops: bool,
    /// Binds a name for later sibling actions (`getValue`, `getRecord`).
    pub updates_loop_variables: bool,
    pub container_child: bool,
    /// Exists only as the schema of keyed children.
    pub child_type: bool,
    /// Children are CSS-like properties (`style`, `styles`).
    pub styling: bool,
}

// ============================================================================
// NODE SCHEMA
// ============================================================================

#[derive(Debug, Clone)]
pub struct NodeSchema {
    pub name: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub data: DataContract,
    pub blocks: BlocksContract,
    pub properties: PropertiesContract,
    pub conditionals_allowed: bool,
    pub actions: ActionsContract,
    pub flags: Flags,
}

impl NodeSchema {
    pub fn new(name: &'static str, category: Category, description: &'static str) -> Self {
        Self {
            name,
            category,
            description,
            data: DataContract::none(),
            blocks: BlocksContract::default(),
            properties: PropertiesContract::default(),
            conditionals_allowed: false,
            actions: ActionsContract::default(),
            flags: Flags::default(),
        }
    }

    pub fn data(mut self, data: DataContract) -> Self {
        self.data = data;
        self
    }

    pub fn blocks(mut self, rules: impl IntoIterator<Item = ChildRule>) -> Self {
        self.blocks.list.extend(rules);
        self
    }

    pub fn container(mut self) -> Self {
        self.blocks.container_parent = true;
        self
    }

    pub fn properties(mut self, rules: impl IntoIterator<Item = ChildRule>) -> Self {
        self.properties.list.extend(rules);
        self
    }

    pub fn any_property(mut self) -> Self {
        self.properties.any = true;
        self
    }

    pub fn keyed(mut self, schema: &'static str) -> Self {
        self.properties.keyed = Some(schema);
        self
    }

    pub fn unique_properties(mut self) -> Self {
        self.properties.no_repeats = true;
        self
    }

    pub fn unique_blocks(mut self) -> Self {
        self.blocks.no_repeats = true;
        self
    }

    pub fn conditionals(mut self) -> Self {
        self.conditionals_allowed = true;
        self
    }

    pub fn any_action(mut self) -> Self {
        self.actions.allow_any = true;
        self
    }

    pub fn actions(mut self, names: impl IntoIterator<Item = &'static str>) -> Self {
        self.actions.list.extend(names);
        self
    }

    pub fn flags(mut self, edit: impl FnOnce(&mut Flags)) -> Self {
        edit(&mut self.flags);
        self
    }

    /// Every block type this schema accepts, sorted, container children
    /// included when this is a container parent.
    pub fn effective_blocks(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.blocks.list.iter().map(|r| r.name).collect();
        if self.blocks.container_parent {
            names.extend(container_children().iter().copied());
        }
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn allows_block(&self, name: &str) -> bool {
        self.blocks.list.iter().any(|r| r.name == name)
            || (self.blocks.container_parent && container_children().iter().any(|c| *c == name))
    }

    pub fn block_rule(&self, name: &str) -> Option<&ChildRule> {
        self.blocks.list.iter().find(|r| r.name == name)
    }

    pub fn property_rule(&self, name: &str) -> Option<&ChildRule> {
        self.properties.list.iter().find(|r| r.name == name)
    }

    pub fn allowed_properties(&self) -> Vec<&'static str> {
        self.properties.list.iter().map(|r| r.name).collect()
    }

    /// Required block and property children, in declaration order.
    pub fn required_children(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.blocks
            .list
            .iter()
            .chain(self.properties.list.iter())
            .filter(|r| r.required)
            .map(|r| r.name)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

static REGISTRY: Lazy<HashMap<&'static str, NodeSchema>> = Lazy::new(|| {
    let all = declarations::schemas()
        .into_iter()
        .chain(blocks::schemas())
        .chain(properties::schemas())
        .chain(conditionals::schemas())
        .chain(actions::schemas());
    let mut map = HashMap::new();
    for schema in all {
        map.insert(schema.name, schema);
    }
    log::debug!("schema registry built with {} node types", map.len());
    map
});

static CONTAINER_CHILDREN: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut names: Vec<&'static str> = REGISTRY
        .values()
        .filter(|s| s.flags.container_child)
        .map(|s| s.name)
        .collect();
    names.sort_unstable();
    names
});

pub fn get(name: &str) -> Option<&'static NodeSchema> {
    REGISTRY.get(name)
}

/// Every registered schema, sorted by name.
pub fn all() -> Vec<&'static NodeSchema> {
    let mut schemas: Vec<&'static NodeSchema> = REGISTRY.values().collect();
    schemas.sort_by_key(|s| s.name);
    schemas
}

/// Names of every schema flagged as a container child, sorted.
pub fn container_children() -> &'static [&'static str] {
    &CONTAINER_CHILDREN
}

/// The schema governing a node: its own for typed nodes, the parent's keyed
/// schema for keyed nodes.
pub fn for_node(node: &Node, parent: Option<&NodeSchema>) -> Option<&'static NodeSchema> {
    if node.is_keyed() {
        parent.and_then(|p| p.properties.keyed).and_then(get)
    } else {
        get(node.type_name())
    }
}
