//! # Bion
//!
//! Bion is a compact, self-describing binary wire format for the **Dia**
//! value model: booleans, arbitrary-precision integers and decimals,
//! durations, timestamps, strings, symbols, blobs, sequences, records, and
//! key/value annotations. No external schema is needed to decode a stream,
//! and value graphs may share substructure or contain themselves; the
//! codec emits a back-reference instead of recursing forever.
//!
//! # Usage
//!
//! Values live in a [`Graph`], an arena addressed by [`NodeId`]. Node
//! identity is the index, which is what makes cycles and sharing
//! expressible (and detectable) without pointer tricks.
//!
//! ```
//! use bion::prelude::*;
//!
//! let mut g = Graph::new();
//!
//! let name = g.put("gaius");
//! let age = g.put(54i64);
//! let person = g.rec(vec![Prop::new("name", name), Prop::new("age", age)]);
//!
//! // a sequence holding the same record twice: encoded once, referenced once
//! let pair = g.seq(vec![person, person]);
//!
//! let bytes = encode_full(&g, pair).unwrap();
//! let (decoded, root) = decode_full(&bytes).unwrap();
//!
//! assert!(g.eq_at(pair, &decoded, root));
//!
//! // the two slots decode to the *same* node, not equal copies
//! match &decoded[root].val {
//!     Dia::Seq(Some(items)) => assert_eq!(items[0], items[1]),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! # An overview of the wire format
//!
//! Every value is `header [attribute block] [payload]`.
//!
//! The header byte carries a 4-bit type tag and four flags:
//!
//! | bits  | meaning                                              |
//! | ---   | ---                                                  |
//! | 0–3   | type tag                                             |
//! | 4     | Annotated: an attribute block follows                |
//! | 5     | Null: the value is null, no payload follows          |
//! | 6     | Custom: kind-specific (see below)                    |
//! | 7     | Overflow: an extension byte sequence follows         |
//!
//! Type tags:
//!
//! | tag | kind      | tag | kind      |
//! | --- | ---       | --- | ---       |
//! | 1   | Attribute | 7   | String    |
//! | 2   | Boolean   | 8   | Symbol    |
//! | 3   | Integer   | 9   | Blob      |
//! | 4   | Decimal   | 10  | Sequence  |
//! | 5   | Duration  | 11  | Record    |
//! | 6   | Timestamp | 15  | Reference |
//!
//! The Custom flag means "true" for booleans, "has a value" for
//! attributes, and "a payload follows" everywhere else: it is clear for
//! zero numbers, empty text/blobs, and empty containers, all of which
//! encode as a bare header. Variable-length payloads are framed as
//! [ByteChunks](encoding::chunks) so nothing needs a length computed up
//! front, and counts travel as [VarBytes](encoding::varbytes).
//!
//! Sequences and records are tracked by node identity during an encode
//! pass; the second sighting of a node emits a reference token (tag 15)
//! holding the byte offset of the first. The decoder registers each
//! container before reading its children, so a reference to an ancestor
//! resolves to the partially-built node.

#![warn(
    deprecated_in_future,
    unsafe_code,
    unused_labels,
    keyword_idents,
    missing_copy_implementations,
    missing_debug_implementations,
    macro_use_extern_crate,
    unreachable_pub,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces
)]

pub mod attrs;
pub mod decimal;
pub mod encoding;
pub mod errors;
pub mod prelude;
pub mod time;

use attrs::{Attr, AttrSet};
use bytes::Bytes;
use decimal::Decimal;
use num_bigint::BigInt;
use std::{
    collections::HashSet,
    ops::{Index, IndexMut},
};
use time::Timestamp;

/// Handle to a node in a [`Graph`]. Only meaningful for the graph that
/// created it.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: u32) -> NodeId { NodeId(index) }

    /// The node's position in its graph.
    pub fn index(self) -> usize { self.0 as usize }
}

/// The kind of a Dia value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Kind {
    /// Key/value annotation.
    Attr,
    /// Boolean.
    Bool,
    /// Arbitrary-precision integer.
    Int,
    /// Arbitrary-precision decimal.
    Dec,
    /// Signed 64-bit nanosecond count.
    Dur,
    /// Calendar timestamp.
    Stamp,
    /// Text.
    Str,
    /// Symbol: text with identifier semantics.
    Sym,
    /// Raw bytes.
    Blob,
    /// Ordered sequence of values.
    Seq,
    /// Ordered name/value properties.
    Rec,
    /// Back-reference to an earlier container. Wire-only: decoded graphs
    /// never contain reference nodes.
    Ref,
}

/// A record property: a (possibly annotated) name and the node it points
/// at.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Prop {
    /// Property name.
    pub name: String,
    /// Annotations on the name itself.
    pub name_attrs: AttrSet,
    /// The property value.
    pub value: NodeId,
}

impl Prop {
    /// Creates a property with an unannotated name.
    pub fn new<S: Into<String>>(name: S, value: NodeId) -> Prop {
        Prop {
            name: name.into(),
            name_attrs: AttrSet::new(),
            value,
        }
    }
}

/// A Dia value. Nullability is orthogonal to emptiness: `Blob(None)` is a
/// null blob, `Blob(Some(b""))` an empty one, and they encode differently.
#[derive(Eq, PartialEq, Clone, Debug)]
pub enum Dia {
    /// Boolean.
    Bool(Option<bool>),
    /// Arbitrary-precision signed integer.
    Int(Option<BigInt>),
    /// Arbitrary-precision decimal.
    Dec(Option<Decimal>),
    /// Duration in nanoseconds.
    Dur(Option<i64>),
    /// Calendar timestamp.
    Stamp(Option<Timestamp>),
    /// Text.
    Str(Option<String>),
    /// Symbol.
    Sym(Option<String>),
    /// Raw bytes.
    Blob(Option<Bytes>),
    /// Sequence of child nodes.
    Seq(Option<Vec<NodeId>>),
    /// Record of named child nodes.
    Rec(Option<Vec<Prop>>),
    /// A standalone attribute. Never null and never annotated; any
    /// attribute set on its node is ignored by the encoder.
    Attr(Attr),
}

impl Dia {
    /// The value's kind. Never [`Kind::Ref`]: references exist only on
    /// the wire.
    pub fn kind(&self) -> Kind {
        match self {
            Dia::Bool(_) => Kind::Bool,
            Dia::Int(_) => Kind::Int,
            Dia::Dec(_) => Kind::Dec,
            Dia::Dur(_) => Kind::Dur,
            Dia::Stamp(_) => Kind::Stamp,
            Dia::Str(_) => Kind::Str,
            Dia::Sym(_) => Kind::Sym,
            Dia::Blob(_) => Kind::Blob,
            Dia::Seq(_) => Kind::Seq,
            Dia::Rec(_) => Kind::Rec,
            Dia::Attr(_) => Kind::Attr,
        }
    }

    /// Indicates whether the value is null. Attributes are never null.
    pub fn is_null(&self) -> bool {
        match self {
            Dia::Bool(v) => v.is_none(),
            Dia::Int(v) => v.is_none(),
            Dia::Dec(v) => v.is_none(),
            Dia::Dur(v) => v.is_none(),
            Dia::Stamp(v) => v.is_none(),
            Dia::Str(v) => v.is_none(),
            Dia::Sym(v) => v.is_none(),
            Dia::Blob(v) => v.is_none(),
            Dia::Seq(v) => v.is_none(),
            Dia::Rec(v) => v.is_none(),
            Dia::Attr(_) => false,
        }
    }

    /// Indicates whether the value is present but has no content: empty
    /// text, an empty blob, or a container with no children. Null values
    /// are not empty, and scalars are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Dia::Str(Some(s)) | Dia::Sym(Some(s)) => s.is_empty(),
            Dia::Blob(Some(b)) => b.is_empty(),
            Dia::Seq(Some(items)) => items.is_empty(),
            Dia::Rec(Some(props)) => props.is_empty(),
            _ => false,
        }
    }
}

impl From<bool> for Dia {
    fn from(b: bool) -> Dia { Dia::Bool(Some(b)) }
}

impl From<BigInt> for Dia {
    fn from(i: BigInt) -> Dia { Dia::Int(Some(i)) }
}

impl From<i64> for Dia {
    fn from(i: i64) -> Dia { Dia::Int(Some(BigInt::from(i))) }
}

impl From<Decimal> for Dia {
    fn from(d: Decimal) -> Dia { Dia::Dec(Some(d)) }
}

impl From<Timestamp> for Dia {
    fn from(t: Timestamp) -> Dia { Dia::Stamp(Some(t)) }
}

impl From<&str> for Dia {
    fn from(s: &str) -> Dia { Dia::Str(Some(s.to_string())) }
}

impl From<String> for Dia {
    fn from(s: String) -> Dia { Dia::Str(Some(s)) }
}

impl From<Bytes> for Dia {
    fn from(b: Bytes) -> Dia { Dia::Blob(Some(b)) }
}

impl From<Vec<u8>> for Dia {
    fn from(v: Vec<u8>) -> Dia { Dia::Blob(Some(Bytes::from(v))) }
}

impl From<Attr> for Dia {
    fn from(a: Attr) -> Dia { Dia::Attr(a) }
}

/// A value with its annotations.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Node {
    /// Annotations attached to the value.
    pub attrs: AttrSet,
    /// The value itself.
    pub val: Dia,
}

impl Node {
    /// Creates an unannotated node.
    pub fn new(val: Dia) -> Node {
        Node {
            attrs: AttrSet::new(),
            val,
        }
    }
}

/// An arena of [`Node`]s. All container children are [`NodeId`]s into the
/// same graph, so a node may appear in several containers (or inside
/// itself).
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Graph { Graph { nodes: Vec::new() } }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize { self.nodes.len() }

    /// Indicates whether the graph has no nodes.
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Adds a node, returning its id.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Adds an unannotated value.
    ///
    /// ```
    /// use bion::prelude::*;
    ///
    /// let mut g = Graph::new();
    /// let n = g.put(42i64);
    ///
    /// assert_eq!(g[n].val.kind(), Kind::Int);
    /// ```
    pub fn put<T: Into<Dia>>(&mut self, val: T) -> NodeId { self.add_node(Node::new(val.into())) }

    /// Adds a duration of `nanos` nanoseconds.
    pub fn duration(&mut self, nanos: i64) -> NodeId {
        self.add_node(Node::new(Dia::Dur(Some(nanos))))
    }

    /// Adds a symbol.
    pub fn symbol<S: Into<String>>(&mut self, s: S) -> NodeId {
        self.add_node(Node::new(Dia::Sym(Some(s.into()))))
    }

    /// Adds a sequence of existing nodes.
    pub fn seq(&mut self, items: Vec<NodeId>) -> NodeId {
        self.add_node(Node::new(Dia::Seq(Some(items))))
    }

    /// Adds a record of named properties.
    pub fn rec(&mut self, props: Vec<Prop>) -> NodeId {
        self.add_node(Node::new(Dia::Rec(Some(props))))
    }

    /// Adds the null value of a kind.
    ///
    /// # Panics
    ///
    /// Panics for [`Kind::Attr`] and [`Kind::Ref`], which have no null
    /// state.
    pub fn null(&mut self, kind: Kind) -> NodeId {
        let val = match kind {
            Kind::Bool => Dia::Bool(None),
            Kind::Int => Dia::Int(None),
            Kind::Dec => Dia::Dec(None),
            Kind::Dur => Dia::Dur(None),
            Kind::Stamp => Dia::Stamp(None),
            Kind::Str => Dia::Str(None),
            Kind::Sym => Dia::Sym(None),
            Kind::Blob => Dia::Blob(None),
            Kind::Seq => Dia::Seq(None),
            Kind::Rec => Dia::Rec(None),
            Kind::Attr | Kind::Ref => panic!("{:?} has no null state", kind),
        };
        self.add_node(Node::new(val))
    }

    /// Looks up a node, returning `None` if the id does not belong to
    /// this graph.
    pub fn node(&self, id: NodeId) -> Option<&Node> { self.nodes.get(id.index()) }

    /// Mutable lookup.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> { self.nodes.get_mut(id.index()) }

    /// Structural equality between `self[a]` and `other[b]`, following
    /// container children and tolerating cycles: two graphs are equal at a
    /// pair of roots when every reachable pair matches in kind, nullness,
    /// attributes, and content, with matching sharing topology treated as
    /// equal.
    ///
    /// ```
    /// use bion::prelude::*;
    ///
    /// let mut g = Graph::new();
    /// let a = g.put(1i64);
    /// let s = g.seq(vec![a]);
    ///
    /// let mut h = Graph::new();
    /// let b = h.put(1i64);
    /// let t = h.seq(vec![b]);
    ///
    /// assert!(g.eq_at(s, &h, t));
    /// ```
    pub fn eq_at(&self, a: NodeId, other: &Graph, b: NodeId) -> bool {
        let mut seen = HashSet::new();
        self.eq_nodes(a, other, b, &mut seen)
    }

    fn eq_nodes(
        &self,
        a: NodeId,
        other: &Graph,
        b: NodeId,
        seen: &mut HashSet<(NodeId, NodeId)>,
    ) -> bool {
        // a pair already under comparison is equal by coinduction
        if !seen.insert((a, b)) {
            return true;
        }

        let (na, nb) = match (self.node(a), other.node(b)) {
            (Some(x), Some(y)) => (x, y),
            _ => return false,
        };

        if na.attrs != nb.attrs {
            return false;
        }

        match (&na.val, &nb.val) {
            (Dia::Bool(x), Dia::Bool(y)) => x == y,
            (Dia::Int(x), Dia::Int(y)) => x == y,
            (Dia::Dec(x), Dia::Dec(y)) => x == y,
            (Dia::Dur(x), Dia::Dur(y)) => x == y,
            (Dia::Stamp(x), Dia::Stamp(y)) => x == y,
            (Dia::Str(x), Dia::Str(y)) => x == y,
            (Dia::Sym(x), Dia::Sym(y)) => x == y,
            (Dia::Blob(x), Dia::Blob(y)) => x == y,
            (Dia::Attr(x), Dia::Attr(y)) => x == y,
            (Dia::Seq(None), Dia::Seq(None)) => true,
            (Dia::Seq(Some(xs)), Dia::Seq(Some(ys))) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .zip(ys)
                        .all(|(&i, &j)| self.eq_nodes(i, other, j, seen))
            }
            (Dia::Rec(None), Dia::Rec(None)) => true,
            (Dia::Rec(Some(xs)), Dia::Rec(Some(ys))) => {
                xs.len() == ys.len()
                    && xs.iter().zip(ys).all(|(p, q)| {
                        p.name == q.name
                            && p.name_attrs == q.name_attrs
                            && self.eq_nodes(p.value, other, q.value, seen)
                    })
            }
            _ => false,
        }
    }
}

impl Index<NodeId> for Graph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node { &self.nodes[id.index()] }
}

impl IndexMut<NodeId> for Graph {
    fn index_mut(&mut self, id: NodeId) -> &mut Node { &mut self.nodes[id.index()] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_nullness() {
        let mut g = Graph::new();

        let n = g.put(true);
        assert_eq!(g[n].val.kind(), Kind::Bool);
        assert!(!g[n].val.is_null());

        let n = g.null(Kind::Blob);
        assert!(g[n].val.is_null());
        assert!(!g[n].val.is_empty());

        let n = g.put(Vec::<u8>::new());
        assert!(!g[n].val.is_null());
        assert!(g[n].val.is_empty());
    }

    #[test]
    fn structural_equality_with_cycles() {
        let mut g = Graph::new();
        let s = g.seq(vec![]);
        match &mut g[s].val {
            Dia::Seq(Some(items)) => items.push(s),
            _ => unreachable!(),
        }

        let mut h = Graph::new();
        let t = h.seq(vec![]);
        match &mut h[t].val {
            Dia::Seq(Some(items)) => items.push(t),
            _ => unreachable!(),
        }

        assert!(g.eq_at(s, &h, t));
    }

    #[test]
    fn structural_inequality() {
        let mut g = Graph::new();
        let a = g.put(1i64);
        let b = g.put(2i64);
        assert!(!g.eq_at(a, &g.clone(), b));

        let mut h = Graph::new();
        let null_str = h.null(Kind::Str);
        let empty_str = h.put("");
        assert!(!h.eq_at(null_str, &h.clone(), empty_str));
    }
}
