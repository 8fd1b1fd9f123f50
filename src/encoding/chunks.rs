//! ByteChunks: length-prefixed payload framing.
//!
//! A payload of arbitrary length is cut into sections of at most
//! [`SECTION_MAX`] bytes. Each section starts with a little-endian `u16`:
//! the sentinel [`OVERFLOW_MARK`] means "a full [`SECTION_MAX`]-byte
//! section follows, and more sections after it"; any other value is the
//! exact length of the final section. An empty payload is the two bytes
//! `[0x00, 0x00]`.

use super::{de::Cursor, ser::Serializer};
use crate::errors::Error;

/// Largest number of payload bytes one section can carry.
pub const SECTION_MAX: usize = 65_534;

/// Length-prefix sentinel marking a full section with more to follow.
pub const OVERFLOW_MARK: u16 = 0xffff;

/// Writes `raw` as a ByteChunks frame.
pub fn put_chunked<S: Serializer>(raw: &[u8], out: &mut S) {
    let mut rest = raw;
    while rest.len() > SECTION_MAX {
        out.put_slice(&OVERFLOW_MARK.to_le_bytes());
        out.put_slice(&rest[..SECTION_MAX]);
        rest = &rest[SECTION_MAX..];
    }
    out.put_slice(&(rest.len() as u16).to_le_bytes());
    out.put_slice(rest);
}

/// Reads one ByteChunks frame into a contiguous buffer.
pub fn get_chunked(cur: &mut Cursor) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    for section in sections(cur) {
        out.extend_from_slice(section?);
    }
    Ok(out)
}

/// Iterates over the sections of one ByteChunks frame without copying,
/// advancing the cursor as it goes.
pub fn sections<'c, 'a>(cur: &'c mut Cursor<'a>) -> Sections<'c, 'a> {
    Sections { cur, done: false }
}

/// See [`sections`].
#[derive(Debug)]
pub struct Sections<'c, 'a: 'c> {
    cur: &'c mut Cursor<'a>,
    done: bool,
}

impl<'c, 'a: 'c> Iterator for Sections<'c, 'a> {
    type Item = Result<&'a [u8], Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let step = self.cur.take_u16_le("chunk length").and_then(|len| {
            if len == OVERFLOW_MARK {
                self.cur.take_slice(SECTION_MAX, "chunk section")
            } else {
                self.done = true;
                self.cur.take_slice(usize::from(len), "chunk section")
            }
        });

        if step.is_err() {
            self.done = true;
        }
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunked(raw: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        put_chunked(raw, &mut out);
        out
    }

    #[test]
    fn empty_frame() {
        assert_eq!(chunked(&[]), vec![0, 0]);
    }

    #[test]
    fn short_frame() {
        assert_eq!(chunked(&[7, 8, 9]), vec![3, 0, 7, 8, 9]);
    }

    #[test]
    fn full_section_is_still_final() {
        let raw = vec![0xab; SECTION_MAX];
        let enc = chunked(&raw);

        assert_eq!(enc.len(), 2 + SECTION_MAX);
        assert_eq!(&enc[..2], &[0xfe, 0xff]);
        assert_eq!(get_chunked(&mut Cursor::new(&enc)).unwrap(), raw);
    }

    #[test]
    fn one_past_full_overflows() {
        let raw = vec![0xcd; SECTION_MAX + 1];
        let enc = chunked(&raw);

        assert_eq!(enc.len(), 2 + SECTION_MAX + 2 + 1);
        assert_eq!(&enc[..2], &[0xff, 0xff]);
        assert_eq!(&enc[2 + SECTION_MAX..2 + SECTION_MAX + 2], &[1, 0]);
        assert_eq!(get_chunked(&mut Cursor::new(&enc)).unwrap(), raw);
    }

    #[test]
    fn two_full_sections() {
        let raw = vec![1u8; SECTION_MAX * 2];
        let enc = chunked(&raw);

        // overflow, full, exact-final, full
        assert_eq!(enc.len(), 2 + SECTION_MAX + 2 + SECTION_MAX);
        assert_eq!(get_chunked(&mut Cursor::new(&enc)).unwrap(), raw);
    }

    #[test]
    fn truncated_section_fails() {
        let enc = [5u8, 0, 1, 2];
        assert!(get_chunked(&mut Cursor::new(&enc)).is_err());

        let enc = [0xffu8, 0xff, 1, 2, 3];
        assert!(get_chunked(&mut Cursor::new(&enc)).is_err());
    }

    #[test]
    fn sections_stop_after_final() {
        // two frames back to back; the iterator must not eat the second
        let mut enc = chunked(&[1, 2]);
        enc.extend_from_slice(&chunked(&[3]));

        let mut cur = Cursor::new(&enc);
        let first: Vec<u8> = sections(&mut cur)
            .collect::<Result<Vec<&[u8]>, Error>>()
            .unwrap()
            .concat();
        assert_eq!(first, vec![1, 2]);
        assert_eq!(cur.position(), 4);
    }
}
