//! The Bion codec.
//!
//! [`encode`] walks a [`Graph`] from a root node and writes the wire form
//! into any [`Serializer`]; [`decode_full`] and [`decode_into`] rebuild a
//! graph from bytes. Shared and cyclic structure survives the trip: the
//! encoder emits a reference token the second time it sights a container
//! node, and the decoder resolves those tokens back to a single node.

pub mod chunks;
pub mod de;
mod header;
pub mod ser;
mod tracker;
pub mod varbytes;

pub use self::{de::Cursor, ser::Serializer};

use self::{de::Decoder, ser::Encoder};
use crate::{errors::Error, Graph, NodeId};

/// Encodes the value rooted at `root` into `out`.
///
/// Reference offsets are relative to the sink's position at the start of
/// the call, so output may be appended to a non-empty sink.
pub fn encode<S: Serializer>(graph: &Graph, root: NodeId, out: &mut S) -> Result<(), Error> {
    Encoder::new(graph, out).value(root)
}

/// Encodes the value rooted at `root` into a fresh buffer.
///
/// ```
/// use bion::prelude::*;
///
/// let mut g = Graph::new();
/// let n = g.put(0i64);
///
/// assert_eq!(encode_full(&g, n).unwrap(), vec![0x03]);
/// ```
pub fn encode_full(graph: &Graph, root: NodeId) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    encode(graph, root, &mut out)?;
    Ok(out)
}

/// Decodes one value from the front of `data` into an existing graph,
/// returning the root of what was built. Bytes past the value are left
/// alone.
pub fn decode_into(graph: &mut Graph, data: &[u8]) -> Result<NodeId, Error> {
    Decoder::new(graph, data).value()
}

/// Decodes one value from the front of `data` into a fresh graph.
///
/// ```
/// use bion::prelude::*;
///
/// let (g, root) = decode_full(&[0x03]).unwrap();
///
/// assert_eq!(g[root].val, Dia::Int(Some(BigInt::from(0))));
/// ```
pub fn decode_full(data: &[u8]) -> Result<(Graph, NodeId), Error> {
    let mut graph = Graph::new();
    let root = decode_into(&mut graph, data)?;
    Ok((graph, root))
}
