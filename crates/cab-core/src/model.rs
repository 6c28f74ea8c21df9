//! Core tree data model for CAB.
//!
//! A loaded data set is an `ActionTree`: a rooted tree stored in a
//! `StableDiGraph` where edges go parent → child. Node payloads are tagged
//! variants (`NodeKind`) rather than loose JSON objects, so placement rules
//! and display accessors dispatch on a closed set of kinds.
//!
//! Child edges are never removed after build. Collapsing a node only flips
//! its `Visibility`; the full child set stays in the graph, which makes
//! expand/collapse lossless.

use crate::id::NodeId;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

// ─── Scalars ─────────────────────────────────────────────────────────────

/// A loosely-typed leaf value from the backend.
///
/// Ids, counts and times arrive as numbers or strings depending on the
/// column type. They are kept verbatim so follow-up requests echo exactly
/// what the server sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Integer view of the value, parsing text if needed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            Scalar::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Scalar::Float(_) => None,
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }

    /// `-1` marks an unlimited time or repeat count.
    pub fn is_infinite(&self) -> bool {
        self.as_i64() == Some(-1)
    }

    /// Zero and empty strings count as "not set".
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Int(n) => *n != 0,
            Scalar::Float(f) => *f != 0.0,
            Scalar::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

/// Render an optional scalar, `-` when missing.
fn show(value: &Option<Scalar>) -> String {
    value
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string)
}

fn show_text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

// ─── Train-number payloads ───────────────────────────────────────────────

/// Root of a train-number tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrainNumber {
    pub train_number_id: Option<Scalar>,
    #[serde(rename = "trainNumberShortName")]
    pub short_name: Option<Scalar>,
    pub line_id: Option<Scalar>,
    pub circulation_id: Option<Scalar>,
    /// Validity start, unix seconds.
    pub from_date: Option<i64>,
    /// Validity end, unix seconds.
    pub to_date: Option<i64>,
}

/// A section of the line between two stations (or the init section).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineSection {
    pub line_section_id: Option<Scalar>,
    pub from_station: Option<Scalar>,
    pub from_station_abbr: Option<Scalar>,
    pub to_station: Option<Scalar>,
    pub to_station_abbr: Option<Scalar>,
    /// 1 = station-to-station section, 2 = init section.
    pub line_section_type: Option<Scalar>,
}

/// A trigger on a line section that fires an action list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineEvent {
    pub event_id: Option<Scalar>,
    pub action_list_id: Option<Scalar>,
    pub trigger: Option<Scalar>,
}

/// Action types that carry a complex-action definition tree.
pub const COMPLEX_ACTION_TYPES: [&str; 2] = ["CAStatic", "CANonstatic"];

/// Identity of an action, shared by train-number leaves and complex-action nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionRef {
    pub action_id: Option<Scalar>,
    pub action_detail_id: Option<Scalar>,
    pub action_type: Option<String>,
    pub media_type: Option<String>,
}

impl ActionRef {
    /// Whether this action opens a complex-action tree.
    pub fn is_complex(&self) -> bool {
        self.action_type
            .as_deref()
            .is_some_and(|t| COMPLEX_ACTION_TYPES.contains(&t))
    }
}

// ─── Complex-action payloads ─────────────────────────────────────────────

/// The `type` of a node in a complex-action tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplexKind {
    ExactTime,
    MaxTime,
    MinTime,
    Repeat,
    EnableByExtSource,
    CancelByExtSource,
    EnableOnceByExtSource,
    Display,
    Announcement,
    Screen,
    Customerspec,
    CaStatic,
    CaNonstatic,
    /// Any other rule or combinator (`Serial`, `Parallel`, ...).
    Other(String),
}

impl ComplexKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "ExactTime" => Self::ExactTime,
            "MaxTime" => Self::MaxTime,
            "MinTime" => Self::MinTime,
            "Repeat" => Self::Repeat,
            "EnableByExtSource" => Self::EnableByExtSource,
            "CancelByExtSource" => Self::CancelByExtSource,
            // The database ships the misspelled name.
            "EnabeleOnceByExtSource" | "EnableOnceByExtSource" => Self::EnableOnceByExtSource,
            "Display" => Self::Display,
            "Announcement" => Self::Announcement,
            "Screen" => Self::Screen,
            "Customerspec" => Self::Customerspec,
            "CAStatic" => Self::CaStatic,
            "CANonstatic" => Self::CaNonstatic,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_time_limit(&self) -> bool {
        matches!(self, Self::ExactTime | Self::MaxTime | Self::MinTime)
    }

    pub fn is_ext_source(&self) -> bool {
        matches!(
            self,
            Self::EnableByExtSource | Self::CancelByExtSource | Self::EnableOnceByExtSource
        )
    }

    /// Leaf outputs (what the passenger sees or hears).
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            Self::Display | Self::Announcement | Self::Screen | Self::Customerspec
        )
    }
}

/// `CA_*` attributes attached to a complex-action node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaAttributes {
    #[serde(rename = "CA_Time")]
    pub time: Option<Scalar>,
    #[serde(rename = "CA_Count")]
    pub count: Option<Scalar>,
    #[serde(rename = "CA_ExtSource")]
    pub ext_source: Option<Scalar>,
    #[serde(rename = "CA_ReportStart")]
    pub report_start: Option<Scalar>,
    #[serde(rename = "CA_ReportEnd")]
    pub report_end: Option<Scalar>,
    #[serde(rename = "CA_CategoryName")]
    pub category_name: Option<Scalar>,
}

/// One node of a complex-action definition tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexAction {
    /// Raw `type` string as sent by the server.
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(skip)]
    pub kind: ComplexKind,
    #[serde(flatten)]
    pub action: ActionRef,
    #[serde(flatten)]
    pub attributes: CaAttributes,
}

impl ComplexAction {
    pub fn new(tag: &str, action: ActionRef, attributes: CaAttributes) -> Self {
        Self {
            tag: tag.to_string(),
            kind: ComplexKind::from_tag(tag),
            action,
            attributes,
        }
    }

    /// Short parenthesised summary of the rule parameters.
    pub fn attribute_summary(&self) -> String {
        let attrs = &self.attributes;
        if self.kind.is_time_limit() {
            let time = match &attrs.time {
                Some(t) if t.is_infinite() => "infinite".to_string(),
                Some(t) => format!("{t}s"),
                None => "-".to_string(),
            };
            format!("(time: {time})")
        } else if self.kind == ComplexKind::Repeat {
            let count = match &attrs.count {
                Some(c) if c.is_infinite() => "infinite".to_string(),
                Some(c) => c.to_string(),
                None => "-".to_string(),
            };
            format!("(count: {count})")
        } else if self.kind.is_ext_source() {
            format!("({})", show(&attrs.ext_source))
        } else {
            String::new()
        }
    }
}

// ─── Node kinds ──────────────────────────────────────────────────────────

/// Discriminant of `NodeKind`, used as the key of placement and link rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KindTag {
    TrainNumber,
    LineSection,
    LineEvent,
    Action,
    Complex,
}

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeKind {
    TrainNumber(TrainNumber),
    LineSection(LineSection),
    LineEvent(LineEvent),
    Action(ActionRef),
    Complex(ComplexAction),
}

/// Up to three text lines drawn inside a node box.
pub type LabelLines = SmallVec<[String; 3]>;

impl NodeKind {
    pub fn tag(&self) -> KindTag {
        match self {
            NodeKind::TrainNumber(_) => KindTag::TrainNumber,
            NodeKind::LineSection(_) => KindTag::LineSection,
            NodeKind::LineEvent(_) => KindTag::LineEvent,
            NodeKind::Action(_) => KindTag::Action,
            NodeKind::Complex(_) => KindTag::Complex,
        }
    }

    /// The action identity, for kinds that reference one.
    pub fn action(&self) -> Option<&ActionRef> {
        match self {
            NodeKind::Action(action) => Some(action),
            NodeKind::Complex(complex) => Some(&complex.action),
            _ => None,
        }
    }

    /// Text lines drawn inside the node box.
    pub fn label_lines(&self) -> LabelLines {
        let mut lines = LabelLines::new();
        match self {
            NodeKind::TrainNumber(tn) => {
                lines.push(format!("TrainNumber: '{}'", show(&tn.short_name)));
                lines.push(format!("TrainNumberID: {}", show(&tn.train_number_id)));
            }
            NodeKind::LineSection(ls) => {
                let title = match ls.line_section_type.as_ref().and_then(Scalar::as_i64) {
                    Some(2) => "Init".to_string(),
                    Some(1) => format!(
                        "{} ({})",
                        show(&ls.from_station),
                        show(&ls.from_station_abbr)
                    ),
                    _ => String::new(),
                };
                lines.push(title);
                lines.push(format!("LineSectionID: {}", show(&ls.line_section_id)));
            }
            NodeKind::LineEvent(ev) => {
                lines.push(show(&ev.trigger));
                lines.push(format!("ActionListID: {}", show(&ev.action_list_id)));
            }
            NodeKind::Action(action) => {
                lines.push(format!("ActionID: {}", show(&action.action_id)));
                lines.push(show_text(&action.action_type).to_string());
            }
            NodeKind::Complex(complex) => {
                lines.push(complex.tag.clone());
                lines.push(complex.attribute_summary());
                lines.push(format!("ActId:{}", show(&complex.action.action_id)));
            }
        }
        lines
    }

    /// Lines shown in the hover detail panel. Empty for kinds without details.
    pub fn detail_lines(&self) -> Vec<String> {
        let NodeKind::Complex(complex) = self else {
            return Vec::new();
        };
        let action = &complex.action;
        let attrs = &complex.attributes;
        let or_dash = |v: &Option<Scalar>| match v {
            Some(s) if s.is_truthy() => s.to_string(),
            _ => "-".to_string(),
        };

        let mut lines = vec![
            format!("ActDetId: {}", show(&action.action_detail_id)),
            format!("ActTyp: {}", show_text(&action.action_type)),
            format!("MedTyp: {}", show_text(&action.media_type)),
            format!("ReportStart: {}", or_dash(&attrs.report_start)),
            format!("ReportEnd: {}", or_dash(&attrs.report_end)),
        ];
        if let Some(cat) = attrs.category_name.as_ref().filter(|c| c.is_truthy()) {
            lines.push(format!("Cat: {cat}"));
        }
        lines
    }

    /// Box fill colour (CSS colour name).
    pub fn fill(&self) -> &'static str {
        match self {
            NodeKind::TrainNumber(_) => "lightgray",
            NodeKind::LineSection(_) => "lightsteelblue",
            NodeKind::LineEvent(_) => "lightblue",
            NodeKind::Action(action) if action.is_complex() => "linen",
            NodeKind::Action(_) => "ivory",
            NodeKind::Complex(complex) if complex.kind.is_media() => "ivory",
            NodeKind::Complex(_) => "linen",
        }
    }

    /// Clicking the node opens its complex-action tree.
    pub fn is_drillable(&self) -> bool {
        matches!(self, NodeKind::Action(action) if action.is_complex())
    }
}

/// Parameters identifying a complex action to load.
///
/// Serialized in camelCase as the `getcplxaction` request body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexActionQuery {
    pub action_id: Option<Scalar>,
    pub action_list_id: Option<Scalar>,
    pub action_detail_id: Option<Scalar>,
    pub action_type: Option<String>,
    pub media_type: Option<String>,
}

// ─── Tree ────────────────────────────────────────────────────────────────

/// Expansion state of a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Expanded,
    Collapsed,
}

/// Current and previous layout position.
///
/// `x` runs along depth (left → right), `y` along rows (top → bottom).
/// `x0`/`y0` hold the position from before the latest layout pass and are
/// the animation origin for the next one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub x0: f32,
    pub y0: f32,
}

impl Position {
    pub fn current(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn previous(&self) -> (f32, f32) {
        (self.x0, self.y0)
    }

    /// Remember the current position as the next animation origin.
    pub fn stash(&mut self) {
        self.x0 = self.x;
        self.y0 = self.y;
    }
}

/// A single node in the tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Root = 0.
    pub depth: usize,
    /// Pre-order rank at build time.
    pub order: usize,
    pub visibility: Visibility,
    pub position: Position,
}

/// Which wire format a tree was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeSchema {
    /// `getactions` response, discriminated by `childType`.
    TrainNumber,
    /// `getcplxaction` response, discriminated by `type`.
    ComplexAction,
}

impl TreeSchema {
    /// The field carrying the node kind.
    pub fn discriminator(self) -> &'static str {
        match self {
            TreeSchema::TrainNumber => "childType",
            TreeSchema::ComplexAction => "type",
        }
    }
}

/// Children of one node, in document order.
pub type ChildList = SmallVec<[NodeIndex; 4]>;

/// A loaded hierarchy.
#[derive(Debug, Clone)]
pub struct ActionTree {
    /// The underlying directed graph, edges parent → child.
    pub graph: StableDiGraph<TreeNode, ()>,

    /// The root node index.
    pub root: NodeIndex,

    /// Wire format this tree came from.
    pub schema: TreeSchema,

    /// Flat pre-order list; position `i` holds the node with `order == i`.
    preorder: Vec<NodeIndex>,
}

impl ActionTree {
    /// Create a tree holding only its root.
    pub fn with_root(kind: NodeKind, schema: TreeSchema) -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(TreeNode {
            id: NodeId::from_order(0),
            kind,
            depth: 0,
            order: 0,
            visibility: Visibility::Expanded,
            position: Position::default(),
        });
        Self {
            graph,
            root,
            schema,
            preorder: vec![root],
        }
    }

    /// Append a child under `parent` and return its index.
    ///
    /// `order` is the insertion rank, so inserting in pre-order (node before
    /// its children, siblings left to right) yields pre-order ranks.
    pub fn add_child(&mut self, parent: NodeIndex, kind: NodeKind) -> NodeIndex {
        let order = self.preorder.len();
        let depth = self.graph[parent].depth + 1;
        let idx = self.graph.add_node(TreeNode {
            id: NodeId::from_order(order),
            kind,
            depth,
            order,
            visibility: Visibility::Expanded,
            position: Position::default(),
        });
        self.graph.add_edge(parent, idx, ());
        self.preorder.push(idx);
        idx
    }

    /// Number of nodes in the full (expanded) hierarchy.
    pub fn len(&self) -> usize {
        self.preorder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preorder.is_empty()
    }

    pub fn node(&self, idx: NodeIndex) -> &TreeNode {
        &self.graph[idx]
    }

    /// All nodes in pre-order, regardless of visibility.
    pub fn preorder(&self) -> &[NodeIndex] {
        &self.preorder
    }

    /// Look up a node index by id.
    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.preorder.get(id.order()).copied()
    }

    /// Get the parent index of a node.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// The full child set of a node in document order, ignoring collapse state.
    ///
    /// Sorted by `NodeIndex`, which follows insertion order, so the result does
    /// not depend on petgraph's adjacency iteration order.
    pub fn children(&self, idx: NodeIndex) -> ChildList {
        let mut children: ChildList = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    pub fn is_leaf(&self, idx: NodeIndex) -> bool {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .next()
            .is_none()
    }

    /// Request parameters for opening the complex action behind `idx`.
    ///
    /// Only drillable actions qualify. The action list id comes from the
    /// owning line event.
    pub fn complex_action_query(&self, idx: NodeIndex) -> Option<ComplexActionQuery> {
        let node = &self.graph[idx];
        if !node.kind.is_drillable() {
            return None;
        }
        let action = node.kind.action()?;
        let action_list_id = self
            .parent(idx)
            .and_then(|p| match &self.graph[p].kind {
                NodeKind::LineEvent(ev) => ev.action_list_id.clone(),
                _ => None,
            });
        Some(ComplexActionQuery {
            action_id: action.action_id.clone(),
            action_list_id,
            action_detail_id: action.action_detail_id.clone(),
            action_type: action.action_type.clone(),
            media_type: action.media_type.clone(),
        })
    }
}
