//! Convenience re-exports for working with Bion.

pub use crate::{
    attrs::{Attr, AttrSet},
    decimal::Decimal,
    encoding::{decode_full, decode_into, encode, encode_full},
    errors::Error,
    time::Timestamp,
    Dia, Graph, Kind, Node, NodeId, Prop,
};
pub use bytes::Bytes;
pub use num_bigint::BigInt;
