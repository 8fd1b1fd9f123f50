//! Input cursor and the decoder proper.

use super::{
    chunks,
    header::Header,
    tracker::OffsetTable,
    varbytes,
};
use crate::{
    attrs::{Attr, AttrSet},
    decimal::Decimal,
    errors::Error,
    time::{Timestamp, MAX_OFFSET_MINUTES, NANOS_PER_DAY},
    Dia, Graph, Kind, Node, NodeId, Prop,
};
use bytes::Bytes;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{ToPrimitive, Zero};

/// A read position over a byte slice. Every read either succeeds in full
/// or fails with [`Error::Framing`] at the current offset; nothing is
/// consumed past the end.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Cursor<'a> { Cursor { buf, pos: 0 } }

    /// Offset of the next unread byte.
    pub fn position(&self) -> u64 { self.pos as u64 }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize { self.buf.len() - self.pos }

    pub(crate) fn take_u8(&mut self, what: &'static str) -> Result<u8, Error> {
        match self.buf.get(self.pos) {
            Some(&byte) => {
                self.pos += 1;
                Ok(byte)
            }
            None => Err(Error::framing(self.position(), what)),
        }
    }

    pub(crate) fn take_u16_le(&mut self, what: &'static str) -> Result<u16, Error> {
        let slice = self.take_slice(2, what)?;
        Ok(u16::from_le_bytes([slice[0], slice[1]]))
    }

    pub(crate) fn take_slice(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], Error> {
        if self.remaining() < len {
            return Err(Error::framing(self.position(), what));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}

/// One decoding pass, building nodes into a graph.
pub(crate) struct Decoder<'a, 'g> {
    cur: Cursor<'a>,
    graph: &'g mut Graph,
    table: OffsetTable,
}

impl<'a, 'g> Decoder<'a, 'g> {
    pub fn new(graph: &'g mut Graph, data: &'a [u8]) -> Decoder<'a, 'g> {
        Decoder {
            cur: Cursor::new(data),
            graph,
            table: OffsetTable::new(),
        }
    }

    pub fn value(&mut self) -> Result<NodeId, Error> {
        let start = self.cur.position();
        let header = Header::read(&mut self.cur)?;

        match header.kind {
            Kind::Ref => return self.reference(start),
            Kind::Seq | Kind::Rec => return self.container(start, header),
            _ => {}
        }

        let attrs = if header.annotated {
            self.attr_block()?
        } else {
            AttrSet::new()
        };
        let val = self.scalar(start, &header)?;
        Ok(self.graph.add_node(Node { attrs, val }))
    }

    fn scalar(&mut self, start: u64, header: &Header) -> Result<Dia, Error> {
        match header.kind {
            Kind::Bool => Ok(Dia::Bool(if header.null {
                None
            } else {
                Some(header.custom)
            })),

            Kind::Int => {
                if header.null {
                    return Ok(Dia::Int(None));
                }
                if !header.custom {
                    return Ok(Dia::Int(Some(BigInt::zero())));
                }
                let bytes = chunks::get_chunked(&mut self.cur)?;
                Ok(Dia::Int(Some(BigInt::from_signed_bytes_le(&bytes))))
            }

            Kind::Dec => {
                if header.null {
                    return Ok(Dia::Dec(None));
                }
                if !header.custom {
                    return Ok(Dia::Dec(Some(Decimal::new(BigInt::zero(), 0))));
                }

                let ext = header.extension.first().copied().unwrap_or(0);
                let neg_significand = ext & 0b01 != 0;
                let neg_scale = ext & 0b10 != 0;

                let at = self.cur.position();
                let mag = varbytes::get_uint(&mut self.cur)?;
                let scale = if neg_scale {
                    if mag > 1u64 << 63 {
                        return Err(Error::framing(at, "decimal scale out of range"));
                    }
                    -(mag as i128) as i64
                } else {
                    if mag > i64::max_value() as u64 {
                        return Err(Error::framing(at, "decimal scale out of range"));
                    }
                    mag as i64
                };

                let bytes = chunks::get_chunked(&mut self.cur)?;
                let sign = if neg_significand { Sign::Minus } else { Sign::Plus };
                let significand = BigInt::from_biguint(sign, BigUint::from_bytes_le(&bytes));
                Ok(Dia::Dec(Some(Decimal::new(significand, scale))))
            }

            Kind::Dur => {
                if header.null {
                    return Ok(Dia::Dur(None));
                }
                if !header.custom {
                    return Ok(Dia::Dur(Some(0)));
                }

                let at = self.cur.position();
                let bytes = chunks::get_chunked(&mut self.cur)?;
                if bytes.len() > 8 {
                    return Err(Error::framing(at, "duration payload too wide"));
                }
                let fill = if bytes.last().map_or(false, |b| b & 0x80 != 0) {
                    0xff
                } else {
                    0x00
                };
                let mut buf = [fill; 8];
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(Dia::Dur(Some(i64::from_le_bytes(buf))))
            }

            Kind::Stamp => {
                if header.null {
                    return Ok(Dia::Stamp(None));
                }
                if !header.custom {
                    return Ok(Dia::Stamp(Some(Timestamp::min())));
                }

                let field = self.cur.take_slice(8, "timestamp field")?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(field);
                let packed = u64::from_le_bytes(buf);
                let year = varbytes::get_int(&mut self.cur)?;

                let nanos = packed & ((1 << 47) - 1);
                let day = ((packed >> 47) & 0x1f) as u8 + 1;
                let month = ((packed >> 52) & 0x0f) as u8 + 1;

                let ext = header.extension.first().copied().unwrap_or(0);
                let mag = (u16::from(ext >> 1 & 0b11) << 8) | (packed >> 56) as u16;
                let offset_minutes = if ext & 1 != 0 {
                    -(mag as i16)
                } else {
                    mag as i16
                };

                if month > 12 || day > 31 || nanos >= NANOS_PER_DAY {
                    return Err(Error::framing(start, "timestamp field out of range"));
                }
                debug_assert!(mag <= MAX_OFFSET_MINUTES as u16);

                Ok(Dia::Stamp(Some(Timestamp::new(
                    year,
                    month,
                    day,
                    nanos,
                    offset_minutes,
                ))))
            }

            Kind::Str => Ok(Dia::Str(self.text_payload(header)?)),
            Kind::Sym => Ok(Dia::Sym(self.text_payload(header)?)),

            Kind::Blob => {
                if header.null {
                    return Ok(Dia::Blob(None));
                }
                if !header.custom {
                    return Ok(Dia::Blob(Some(Bytes::new())));
                }
                let bytes = chunks::get_chunked(&mut self.cur)?;
                Ok(Dia::Blob(Some(Bytes::from(bytes))))
            }

            Kind::Attr => {
                let key = self.text_chunk()?;
                let attr = if header.custom {
                    let value = self.text_chunk()?;
                    Attr::new(key, value)
                } else {
                    Attr::flag(key)
                };
                Ok(Dia::Attr(attr))
            }

            Kind::Seq | Kind::Rec | Kind::Ref => {
                unreachable!("containers and references are handled before scalar dispatch")
            }
        }
    }

    /// Decodes a sequence or record. The node is allocated and registered
    /// at the container's own offset before any child is read, so child
    /// references to an enclosing container resolve mid-flight.
    fn container(&mut self, start: u64, header: Header) -> Result<NodeId, Error> {
        let placeholder = match header.kind {
            Kind::Seq => Dia::Seq(None),
            _ => Dia::Rec(None),
        };
        let id = self.graph.add_node(Node::new(placeholder));
        self.table.register(start, id);

        let attrs = if header.annotated {
            self.attr_block()?
        } else {
            AttrSet::new()
        };

        let val = match (header.kind, header.null, header.custom) {
            (Kind::Seq, true, _) => Dia::Seq(None),
            (Kind::Rec, true, _) => Dia::Rec(None),
            (Kind::Seq, false, false) => Dia::Seq(Some(Vec::new())),
            (Kind::Rec, false, false) => Dia::Rec(Some(Vec::new())),
            (Kind::Seq, false, true) => {
                let count = varbytes::get_uint(&mut self.cur)?;
                let mut items = Vec::with_capacity(count.min(4096) as usize);
                for _ in 0..count {
                    items.push(self.value()?);
                }
                Dia::Seq(Some(items))
            }
            (Kind::Rec, false, true) => {
                let count = varbytes::get_uint(&mut self.cur)?;
                let mut props = Vec::with_capacity(count.min(4096) as usize);
                for _ in 0..count {
                    let (name, name_attrs) = self.prop_name()?;
                    let value = self.value()?;
                    props.push(Prop {
                        name,
                        name_attrs,
                        value,
                    });
                }
                Dia::Rec(Some(props))
            }
            _ => unreachable!("only containers reach here"),
        };

        let node = &mut self.graph[id];
        node.attrs = attrs;
        node.val = val;
        Ok(id)
    }

    fn prop_name(&mut self) -> Result<(String, AttrSet), Error> {
        let start = self.cur.position();
        let header = Header::read(&mut self.cur)?;

        if header.kind != Kind::Str {
            return Err(Error::framing(start, "record property name is not a string"));
        }
        if header.null {
            return Err(Error::framing(start, "record property name is null"));
        }

        let attrs = if header.annotated {
            self.attr_block()?
        } else {
            AttrSet::new()
        };
        let name = if header.custom {
            self.text_chunk()?
        } else {
            String::new()
        };
        Ok((name, attrs))
    }

    fn reference(&mut self, start: u64) -> Result<NodeId, Error> {
        let bytes = chunks::get_chunked(&mut self.cur)?;
        let target = BigInt::from_signed_bytes_le(&bytes)
            .to_u64()
            .ok_or(Error::framing(start, "reference offset out of range"))?;

        self.table
            .resolve(target)
            .ok_or(Error::UnresolvedReference {
                target,
                offset: start,
            })
    }

    fn attr_block(&mut self) -> Result<AttrSet, Error> {
        let count = varbytes::get_uint(&mut self.cur)?;
        let mut set = AttrSet::new();
        for _ in 0..count {
            let start = self.cur.position();
            let header = Header::read(&mut self.cur)?;
            if header.kind != Kind::Attr {
                return Err(Error::framing(start, "attribute block entry is not an attribute"));
            }

            let key = self.text_chunk()?;
            let attr = if header.custom {
                Attr::new(key, self.text_chunk()?)
            } else {
                Attr::flag(key)
            };
            set.insert(attr);
        }
        Ok(set)
    }

    fn text_payload(&mut self, header: &Header) -> Result<Option<String>, Error> {
        if header.null {
            return Ok(None);
        }
        if !header.custom {
            return Ok(Some(String::new()));
        }
        self.text_chunk().map(Some)
    }

    /// Reads one ByteChunks frame of UTF-16LE text.
    fn text_chunk(&mut self) -> Result<String, Error> {
        let at = self.cur.position();
        let bytes = chunks::get_chunked(&mut self.cur)?;

        if bytes.len() % 2 != 0 {
            return Err(Error::framing(at, "utf-16 payload has odd byte length"));
        }
        let units: Vec<u16> = bytes
            .chunks(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).map_err(|_| Error::framing(at, "text is not valid utf-16"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_reads_and_fails_in_place() {
        let mut cur = Cursor::new(&[1, 2, 3]);
        assert_eq!(cur.take_u8("x").unwrap(), 1);
        assert_eq!(cur.take_slice(2, "x").unwrap(), &[2, 3]);
        assert_eq!(cur.remaining(), 0);

        let err = cur.take_u8("y").unwrap_err();
        assert_eq!(err, Error::framing(3, "y"));
        assert_eq!(cur.position(), 3);
    }

    #[test]
    fn cursor_u16_is_little_endian() {
        let mut cur = Cursor::new(&[0x34, 0x12]);
        assert_eq!(cur.take_u16_le("x").unwrap(), 0x1234);
    }
}
