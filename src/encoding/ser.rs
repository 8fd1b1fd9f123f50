//! Output sinks and the encoder proper.

use super::{chunks, header::Header, tracker::RefTracker, varbytes};
use crate::{
    attrs::{Attr, AttrSet},
    errors::Error,
    time::Timestamp,
    Dia, Graph, Kind, NodeId,
};
use bytes::{Bytes, BytesMut};
use num_bigint::BigInt;
use num_traits::Zero;
use smallvec::SmallVec;

/// A byte sink the encoder writes into.
///
/// [`position`](Serializer::position) reports how many bytes the sink
/// holds; the encoder uses it to assign reference offsets, so it must
/// advance by exactly what was written.
pub trait Serializer {
    /// What [`finalize`](Serializer::finalize) produces.
    type Out;

    /// Writes one byte.
    fn put_u8(&mut self, u: u8);

    /// Writes a run of bytes.
    fn put_slice(&mut self, slice: &[u8]);

    /// Bytes written so far.
    fn position(&self) -> u64;

    /// Consumes the sink, returning the accumulated output.
    fn finalize(self) -> Self::Out;
}

impl Serializer for Vec<u8> {
    type Out = Vec<u8>;

    fn put_u8(&mut self, u: u8) { self.push(u) }

    fn put_slice(&mut self, slice: &[u8]) { self.extend_from_slice(slice) }

    fn position(&self) -> u64 { self.len() as u64 }

    fn finalize(self) -> Vec<u8> { self }
}

impl Serializer for BytesMut {
    type Out = Bytes;

    fn put_u8(&mut self, u: u8) { self.extend_from_slice(&[u]) }

    fn put_slice(&mut self, slice: &[u8]) { self.extend_from_slice(slice) }

    fn position(&self) -> u64 { self.len() as u64 }

    fn finalize(self) -> Bytes { self.freeze() }
}

/// One encoding pass over a graph.
///
/// Reference offsets are relative to the sink position at construction,
/// so a pass appended to a non-empty sink stays self-contained.
pub(crate) struct Encoder<'a, S: Serializer> {
    graph: &'a Graph,
    out: &'a mut S,
    base: u64,
    tracker: RefTracker,
}

impl<'a, S: Serializer> Encoder<'a, S> {
    pub fn new(graph: &'a Graph, out: &'a mut S) -> Encoder<'a, S> {
        let base = out.position();
        Encoder {
            graph,
            out,
            base,
            tracker: RefTracker::new(),
        }
    }

    fn offset(&self) -> u64 { self.out.position() - self.base }

    pub fn value(&mut self, id: NodeId) -> Result<(), Error> {
        let node = self.graph.node(id).ok_or(Error::Precondition {
            what: "node id does not belong to the graph being encoded",
        })?;

        match node.val.kind() {
            Kind::Seq | Kind::Rec => {
                if let Some(first) = self.tracker.sight(id, self.offset()) {
                    self.reference(first);
                    return Ok(());
                }
            }
            _ => {}
        }

        match &node.val {
            Dia::Bool(v) => {
                self.open(Kind::Bool, &node.attrs, v.is_none(), *v == Some(true), SmallVec::new())
            }
            Dia::Int(None) => self.open(Kind::Int, &node.attrs, true, false, SmallVec::new()),
            Dia::Int(Some(i)) => {
                if i.is_zero() {
                    self.open(Kind::Int, &node.attrs, false, false, SmallVec::new());
                } else {
                    self.open(Kind::Int, &node.attrs, false, true, SmallVec::new());
                    chunks::put_chunked(&i.to_signed_bytes_le(), self.out);
                }
            }
            Dia::Dec(None) => self.open(Kind::Dec, &node.attrs, true, false, SmallVec::new()),
            Dia::Dec(Some(d)) => {
                if d.is_zero() {
                    self.open(Kind::Dec, &node.attrs, false, false, SmallVec::new());
                } else {
                    let mut bits = 0u8;
                    if d.is_negative() {
                        bits |= 0b01;
                    }
                    if d.scale() < 0 {
                        bits |= 0b10;
                    }
                    let mut ext = SmallVec::new();
                    ext.push(bits);

                    self.open(Kind::Dec, &node.attrs, false, true, ext);
                    varbytes::put_uint(i128::from(d.scale()).abs() as u64, self.out);
                    chunks::put_chunked(&d.significand().to_bytes_le().1, self.out);
                }
            }
            Dia::Dur(None) => self.open(Kind::Dur, &node.attrs, true, false, SmallVec::new()),
            Dia::Dur(Some(n)) => {
                if *n == 0 {
                    self.open(Kind::Dur, &node.attrs, false, false, SmallVec::new());
                } else {
                    self.open(Kind::Dur, &node.attrs, false, true, SmallVec::new());
                    chunks::put_chunked(&i64_to_digits(*n), self.out);
                }
            }
            Dia::Stamp(None) => self.open(Kind::Stamp, &node.attrs, true, false, SmallVec::new()),
            Dia::Stamp(Some(t)) => {
                if t.is_min() {
                    self.open(Kind::Stamp, &node.attrs, false, false, SmallVec::new());
                } else {
                    let (packed, ext) = stamp_fields(t);
                    self.open(Kind::Stamp, &node.attrs, false, true, ext);
                    self.out.put_slice(&packed.to_le_bytes());
                    varbytes::put_int(t.year(), self.out);
                }
            }
            Dia::Str(v) => self.text(Kind::Str, &node.attrs, v.as_ref().map(String::as_str)),
            Dia::Sym(v) => self.text(Kind::Sym, &node.attrs, v.as_ref().map(String::as_str)),
            Dia::Blob(None) => self.open(Kind::Blob, &node.attrs, true, false, SmallVec::new()),
            Dia::Blob(Some(b)) => {
                if b.is_empty() {
                    self.open(Kind::Blob, &node.attrs, false, false, SmallVec::new());
                } else {
                    self.open(Kind::Blob, &node.attrs, false, true, SmallVec::new());
                    chunks::put_chunked(&b[..], self.out);
                }
            }
            Dia::Seq(None) => self.open(Kind::Seq, &node.attrs, true, false, SmallVec::new()),
            Dia::Seq(Some(items)) => {
                if items.is_empty() {
                    self.open(Kind::Seq, &node.attrs, false, false, SmallVec::new());
                } else {
                    self.open(Kind::Seq, &node.attrs, false, true, SmallVec::new());
                    varbytes::put_uint(items.len() as u64, self.out);
                    for &child in items {
                        self.value(child)?;
                    }
                }
            }
            Dia::Rec(None) => self.open(Kind::Rec, &node.attrs, true, false, SmallVec::new()),
            Dia::Rec(Some(props)) => {
                if props.is_empty() {
                    self.open(Kind::Rec, &node.attrs, false, false, SmallVec::new());
                } else {
                    self.open(Kind::Rec, &node.attrs, false, true, SmallVec::new());
                    varbytes::put_uint(props.len() as u64, self.out);
                    for prop in props {
                        self.text(Kind::Str, &prop.name_attrs, Some(&prop.name));
                        self.value(prop.value)?;
                    }
                }
            }
            Dia::Attr(a) => self.attribute(a),
        }

        Ok(())
    }

    /// Writes a header plus, when `attrs` is non-empty, the attribute
    /// block.
    fn open(
        &mut self,
        kind: Kind,
        attrs: &AttrSet,
        null: bool,
        custom: bool,
        extension: SmallVec<[u8; 4]>,
    ) {
        Header::of(kind, null, !attrs.is_empty(), custom, extension).write(self.out);
        if !attrs.is_empty() {
            self.attr_block(attrs);
        }
    }

    fn attr_block(&mut self, attrs: &AttrSet) {
        varbytes::put_uint(attrs.len() as u64, self.out);
        for attr in attrs {
            self.attribute(attr);
        }
    }

    fn attribute(&mut self, attr: &Attr) {
        Header::of(
            Kind::Attr,
            false,
            false,
            attr.value().is_some(),
            SmallVec::new(),
        )
        .write(self.out);
        chunks::put_chunked(&utf16_le(attr.key()), self.out);
        if let Some(v) = attr.value() {
            chunks::put_chunked(&utf16_le(v), self.out);
        }
    }

    fn text(&mut self, kind: Kind, attrs: &AttrSet, text: Option<&str>) {
        match text {
            None => self.open(kind, attrs, true, false, SmallVec::new()),
            Some("") => self.open(kind, attrs, false, false, SmallVec::new()),
            Some(s) => {
                self.open(kind, attrs, false, true, SmallVec::new());
                chunks::put_chunked(&utf16_le(s), self.out);
            }
        }
    }

    /// Writes a reference token pointing at `target`, a pass-relative
    /// byte offset.
    pub(crate) fn reference(&mut self, target: u64) {
        Header::plain(Kind::Ref).write(self.out);
        chunks::put_chunked(&BigInt::from(target).to_signed_bytes_le(), self.out);
    }
}

/// UTF-16LE code units of `s`.
pub(crate) fn utf16_le(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() * 2);
    for unit in s.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Minimal two's-complement little-endian bytes of `n`.
pub(crate) fn i64_to_digits(n: i64) -> SmallVec<[u8; 8]> {
    let bytes = n.to_le_bytes();
    let mut len = 8;
    if n >= 0 {
        while len > 1 && bytes[len - 1] == 0x00 && bytes[len - 2] & 0x80 == 0 {
            len -= 1;
        }
    } else {
        while len > 1 && bytes[len - 1] == 0xff && bytes[len - 2] & 0x80 != 0 {
            len -= 1;
        }
    }
    SmallVec::from_slice(&bytes[..len])
}

/// The fixed 64-bit timestamp field and the extension tail.
///
/// | bits   | field                              |
/// | ---    | ---                                |
/// | 0–46   | nanoseconds since local midnight   |
/// | 47–51  | day of month − 1                   |
/// | 52–55  | month − 1                          |
/// | 56–63  | low 8 bits of the offset magnitude |
///
/// The extension byte (present when nonzero) carries the offset sign in
/// bit 0 and the high 2 bits of the offset magnitude in bits 1–2.
fn stamp_fields(t: &Timestamp) -> (u64, SmallVec<[u8; 4]>) {
    let mag = t.offset_minutes().abs() as u16;
    let packed = t.nanos()
        | u64::from(t.day() - 1) << 47
        | u64::from(t.month() - 1) << 52
        | u64::from(mag & 0xff) << 56;

    let ext_byte = (t.offset_minutes() < 0) as u8 | ((mag >> 8) as u8) << 1;
    let mut ext = SmallVec::new();
    if ext_byte != 0 {
        ext.push(ext_byte);
    }
    (packed, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_is_little_endian() {
        assert_eq!(utf16_le("ab"), vec![97, 0, 98, 0]);
        assert_eq!(utf16_le("\u{20ac}"), vec![0xac, 0x20]);
        // astral plane: one char, two code units
        assert_eq!(utf16_le("\u{1f600}"), vec![0x3d, 0xd8, 0x00, 0xde]);
    }

    #[test]
    fn i64_digits_are_minimal() {
        assert_eq!(&i64_to_digits(1)[..], &[1]);
        assert_eq!(&i64_to_digits(127)[..], &[127]);
        assert_eq!(&i64_to_digits(128)[..], &[128, 0]);
        assert_eq!(&i64_to_digits(-1)[..], &[0xff]);
        assert_eq!(&i64_to_digits(-128)[..], &[0x80]);
        assert_eq!(&i64_to_digits(-129)[..], &[0x7f, 0xff]);
        assert_eq!(
            &i64_to_digits(i64::min_value())[..],
            &[0, 0, 0, 0, 0, 0, 0, 0x80]
        );
    }

    #[test]
    fn reference_token_bytes() {
        let g = Graph::new();
        let mut out = Vec::new();
        let mut enc = Encoder::new(&g, &mut out);
        enc.reference(34);
        drop(enc);

        assert_eq!(out, vec![15, 1, 0, 34]);
    }

    #[test]
    fn bytesmut_sink_matches_vec() {
        let mut g = Graph::new();
        let n = g.put("hello");

        let mut vec_out = Vec::new();
        Encoder::new(&g, &mut vec_out).value(n).unwrap();

        let mut buf = BytesMut::new();
        Encoder::new(&g, &mut buf).value(n).unwrap();

        assert_eq!(buf.finalize(), Bytes::from(vec_out));
    }
}
