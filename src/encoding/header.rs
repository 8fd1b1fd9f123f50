//! The one-byte type header and its optional extension tail.

use super::{de::Cursor, ser::Serializer, varbytes};
use crate::{errors::Error, Kind};
use smallvec::SmallVec;

/// Mask selecting the type tag from a header byte.
pub(crate) const MASK_TYPE: u8 = 0x0f;
/// An attribute block follows the header.
pub(crate) const FLAG_ANNOTATED: u8 = 0x10;
/// The value is null; no payload follows.
pub(crate) const FLAG_NULL: u8 = 0x20;
/// Type-specific flag; for most types it marks a non-default payload.
pub(crate) const FLAG_CUSTOM: u8 = 0x40;
/// A VarBytes extension tail follows the header byte.
pub(crate) const FLAG_OVERFLOW: u8 = 0x80;

pub(crate) const TYPE_ATTR: u8 = 1;
pub(crate) const TYPE_BOOL: u8 = 2;
pub(crate) const TYPE_INT: u8 = 3;
pub(crate) const TYPE_DEC: u8 = 4;
pub(crate) const TYPE_DUR: u8 = 5;
pub(crate) const TYPE_STAMP: u8 = 6;
pub(crate) const TYPE_STR: u8 = 7;
pub(crate) const TYPE_SYM: u8 = 8;
pub(crate) const TYPE_BLOB: u8 = 9;
pub(crate) const TYPE_SEQ: u8 = 10;
pub(crate) const TYPE_REC: u8 = 11;
pub(crate) const TYPE_REF: u8 = 15;

pub(crate) fn tag_of(kind: Kind) -> u8 {
    match kind {
        Kind::Attr => TYPE_ATTR,
        Kind::Bool => TYPE_BOOL,
        Kind::Int => TYPE_INT,
        Kind::Dec => TYPE_DEC,
        Kind::Dur => TYPE_DUR,
        Kind::Stamp => TYPE_STAMP,
        Kind::Str => TYPE_STR,
        Kind::Sym => TYPE_SYM,
        Kind::Blob => TYPE_BLOB,
        Kind::Seq => TYPE_SEQ,
        Kind::Rec => TYPE_REC,
        Kind::Ref => TYPE_REF,
    }
}

pub(crate) fn kind_of(tag: u8) -> Option<Kind> {
    let kind = match tag {
        TYPE_ATTR => Kind::Attr,
        TYPE_BOOL => Kind::Bool,
        TYPE_INT => Kind::Int,
        TYPE_DEC => Kind::Dec,
        TYPE_DUR => Kind::Dur,
        TYPE_STAMP => Kind::Stamp,
        TYPE_STR => Kind::Str,
        TYPE_SYM => Kind::Sym,
        TYPE_BLOB => Kind::Blob,
        TYPE_SEQ => Kind::Seq,
        TYPE_REC => Kind::Rec,
        TYPE_REF => Kind::Ref,
        _ => return None,
    };
    Some(kind)
}

/// A decoded header: type tag, the three flag bits, and the extension
/// tail (empty when the overflow bit is clear).
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub kind: Kind,
    pub null: bool,
    pub annotated: bool,
    pub custom: bool,
    pub extension: SmallVec<[u8; 4]>,
}

impl Header {
    pub fn of(
        kind: Kind,
        null: bool,
        annotated: bool,
        custom: bool,
        extension: SmallVec<[u8; 4]>,
    ) -> Header {
        Header {
            kind,
            null,
            annotated,
            custom,
            extension,
        }
    }

    pub fn plain(kind: Kind) -> Header {
        Header::of(kind, false, false, false, SmallVec::new())
    }

    pub fn write<S: Serializer>(&self, out: &mut S) {
        let mut byte = tag_of(self.kind);
        if self.annotated {
            byte |= FLAG_ANNOTATED;
        }
        if self.null {
            byte |= FLAG_NULL;
        }
        if self.custom {
            byte |= FLAG_CUSTOM;
        }
        if !self.extension.is_empty() {
            byte |= FLAG_OVERFLOW;
        }
        out.put_u8(byte);
        varbytes::put_extension(&self.extension, out);
    }

    pub fn read(cur: &mut Cursor) -> Result<Header, Error> {
        let offset = cur.position();
        let byte = cur.take_u8("type header")?;

        let tag = byte & MASK_TYPE;
        let kind = kind_of(tag).ok_or(Error::UnknownType { tag, offset })?;

        let extension = if byte & FLAG_OVERFLOW != 0 {
            varbytes::get_extension(cur)?
        } else {
            SmallVec::new()
        };

        Ok(Header {
            kind,
            null: byte & FLAG_NULL != 0,
            annotated: byte & FLAG_ANNOTATED != 0,
            custom: byte & FLAG_CUSTOM != 0,
            extension,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_roundtrip() {
        let hdr = Header::of(Kind::Str, false, true, true, SmallVec::new());
        let mut enc = Vec::new();
        hdr.write(&mut enc);
        assert_eq!(enc, vec![TYPE_STR | FLAG_ANNOTATED | FLAG_CUSTOM]);

        assert_eq!(Header::read(&mut Cursor::new(&enc)).unwrap(), hdr);
    }

    #[test]
    fn extension_sets_overflow() {
        let mut ext = SmallVec::new();
        ext.push(0b11);
        let hdr = Header::of(Kind::Dec, false, false, true, ext);

        let mut enc = Vec::new();
        hdr.write(&mut enc);
        assert_eq!(enc, vec![TYPE_DEC | FLAG_CUSTOM | FLAG_OVERFLOW, 0b11]);

        assert_eq!(Header::read(&mut Cursor::new(&enc)).unwrap(), hdr);
    }

    #[test]
    fn unknown_tags_rejected() {
        for &tag in &[0u8, 12, 13, 14] {
            match Header::read(&mut Cursor::new(&[tag])) {
                Err(Error::UnknownType { tag: t, offset: 0 }) => assert_eq!(t, tag),
                other => panic!("tag {}: {:?}", tag, other),
            }
        }
    }
}
