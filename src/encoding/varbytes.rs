//! VarBytes: continuation-bit variable-length encodings.
//!
//! Each encoded byte carries 7 payload bits (least-significant first) and
//! a continuation bit in bit 7: set when another byte follows, clear on
//! the last byte. Three users share the scheme:
//!
//! - unsigned magnitudes ([`put_uint`]/[`get_uint`]) for counts and the
//!   decimal scale;
//! - signed two's-complement values ([`put_int`]/[`get_int`]) for the
//!   timestamp year, with the widening rule: a non-negative value whose
//!   top used bit is set gets one extra zero group so it is not misread
//!   as negative;
//! - the raw header extension tail (`put_extension`/`get_extension`),
//!   where the 7-bit groups are opaque payload rather than an integer.
//!
//! A stream that ends on a byte with the continuation bit set is
//! malformed.

use super::{de::Cursor, ser::Serializer};
use crate::errors::Error;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};
use smallvec::SmallVec;

/// Continuation bit: another byte follows.
pub const CONTINUE: u8 = 0x80;
/// Payload bits of one group.
pub const GROUP_MASK: u8 = 0x7f;
/// Sign bit of the final group in the signed interpretation.
pub const SIGN_BIT: u8 = 0x40;

/// Writes an unsigned magnitude. Always emits at least one byte; zero is
/// the single byte `0x00`.
pub fn put_uint<S: Serializer>(mut n: u64, out: &mut S) {
    loop {
        let group = (n & u64::from(GROUP_MASK)) as u8;
        n >>= 7;
        if n == 0 {
            out.put_u8(group);
            return;
        }
        out.put_u8(group | CONTINUE);
    }
}

/// Reads an unsigned magnitude written by [`put_uint`].
pub fn get_uint(cur: &mut Cursor) -> Result<u64, Error> {
    let mut n: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let at = cur.position();
        let byte = cur.take_u8("varbytes magnitude")?;
        let group = u64::from(byte & GROUP_MASK);
        if shift > 63 || (shift == 63 && group > 1) {
            return Err(Error::framing(at, "varbytes magnitude too wide"));
        }
        n |= group << shift;
        if byte & CONTINUE == 0 {
            return Ok(n);
        }
        shift += 7;
    }
}

/// Writes a signed value as two's complement over 7-bit groups.
pub fn put_int<S: Serializer>(i: &BigInt, out: &mut S) {
    match i.sign() {
        Sign::NoSign => out.put_u8(0),
        Sign::Plus => {
            let (_, bytes) = i.to_bytes_le();
            let mut groups = groups_le(&bytes);
            if groups.last().map_or(false, |g| g & SIGN_BIT != 0) {
                // widen so the top bit is not read as a sign
                groups.push(0);
            }
            put_groups(&groups, out);
        }
        Sign::Minus => {
            let m = BigUint::from_bytes_le(&i.to_bytes_le().1);
            // smallest group count whose sign bit can absorb the magnitude
            let mut k = (m.bits() + 6) / 7;
            if m > (BigUint::one() << (7 * k - 1)) {
                k += 1;
            }
            let complement = (BigUint::one() << (7 * k)) - &m;
            let groups = groups_le(&complement.to_bytes_le());
            debug_assert_eq!(groups.len(), k);
            put_groups(&groups, out);
        }
    }
}

/// Reads a signed value written by [`put_int`].
pub fn get_int(cur: &mut Cursor) -> Result<BigInt, Error> {
    let mut groups: SmallVec<[u8; 16]> = SmallVec::new();
    loop {
        let byte = cur.take_u8("varbytes magnitude")?;
        groups.push(byte & GROUP_MASK);
        if byte & CONTINUE == 0 {
            break;
        }
    }

    let mut m = BigUint::zero();
    for &g in groups.iter().rev() {
        m = (m << 7) + BigUint::from(u32::from(g));
    }

    if groups.last().map_or(false, |g| g & SIGN_BIT != 0) {
        Ok(BigInt::from(m) - (BigInt::one() << (7 * groups.len())))
    } else {
        Ok(BigInt::from(m))
    }
}

/// Writes a header extension tail: opaque 7-bit groups, empty input emits
/// nothing at all.
pub(crate) fn put_extension<S: Serializer>(tail: &[u8], out: &mut S) {
    debug_assert!(tail.iter().all(|b| b & CONTINUE == 0));
    for (i, &group) in tail.iter().enumerate() {
        if i + 1 == tail.len() {
            out.put_u8(group);
        } else {
            out.put_u8(group | CONTINUE);
        }
    }
}

/// Reads a non-empty header extension tail.
pub(crate) fn get_extension(cur: &mut Cursor) -> Result<SmallVec<[u8; 4]>, Error> {
    let mut tail = SmallVec::new();
    loop {
        let byte = cur.take_u8("header extension")?;
        tail.push(byte & GROUP_MASK);
        if byte & CONTINUE == 0 {
            return Ok(tail);
        }
    }
}

/// Repacks little-endian bytes into 7-bit groups, least significant
/// first, dropping trailing zero groups.
fn groups_le(bytes: &[u8]) -> SmallVec<[u8; 16]> {
    let mut groups = SmallVec::new();
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for &b in bytes {
        acc |= u32::from(b) << bits;
        bits += 8;
        while bits >= 7 {
            groups.push((acc & u32::from(GROUP_MASK)) as u8);
            acc >>= 7;
            bits -= 7;
        }
    }
    if bits > 0 {
        groups.push((acc & u32::from(GROUP_MASK)) as u8);
    }
    while groups.last() == Some(&0) {
        groups.pop();
    }
    groups
}

fn put_groups<S: Serializer>(groups: &[u8], out: &mut S) {
    for (i, &group) in groups.iter().enumerate() {
        if i + 1 == groups.len() {
            out.put_u8(group);
        } else {
            out.put_u8(group | CONTINUE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uint_bytes(n: u64) -> Vec<u8> {
        let mut out = Vec::new();
        put_uint(n, &mut out);
        out
    }

    fn int_bytes(i: i64) -> Vec<u8> {
        let mut out = Vec::new();
        put_int(&BigInt::from(i), &mut out);
        out
    }

    #[test]
    fn uint_fixed_points() {
        assert_eq!(uint_bytes(0), vec![0]);
        assert_eq!(uint_bytes(1), vec![1]);
        assert_eq!(uint_bytes(127), vec![127]);
        assert_eq!(uint_bytes(128), vec![0x80, 0x01]);
        assert_eq!(uint_bytes(300), vec![0xac, 0x02]);
    }

    #[test]
    fn uint_roundtrip() {
        for &n in &[0, 1, 127, 128, 16_383, 16_384, u64::max_value()] {
            let enc = uint_bytes(n);
            assert!(enc.last().unwrap() & CONTINUE == 0);
            assert_eq!(get_uint(&mut Cursor::new(&enc)).unwrap(), n);
        }
    }

    #[test]
    fn uint_truncated() {
        // continuation bit set on the last byte present
        let err = get_uint(&mut Cursor::new(&[0x80])).unwrap_err();
        match err {
            Error::Framing { offset, .. } => assert_eq!(offset, 1),
            other => panic!("wrong error: {:?}", other),
        }
    }

    #[test]
    fn uint_too_wide() {
        let enc = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        assert!(get_uint(&mut Cursor::new(&enc)).is_err());
    }

    #[test]
    fn int_fixed_points() {
        assert_eq!(int_bytes(0), vec![0x00]);
        assert_eq!(int_bytes(1), vec![0x01]);
        assert_eq!(int_bytes(-1), vec![0x7f]);
        assert_eq!(int_bytes(63), vec![0x3f]);
        // widening: top bit of the single group would read as a sign
        assert_eq!(int_bytes(64), vec![0xc0, 0x00]);
        assert_eq!(int_bytes(-64), vec![0x40]);
        assert_eq!(int_bytes(-65), vec![0xbf, 0x7f]);
        assert_eq!(int_bytes(-128), vec![0x80, 0x7f]);
    }

    #[test]
    fn int_roundtrip() {
        let mut cases: Vec<BigInt> = (-70..=70).map(BigInt::from).collect();
        cases.push(BigInt::from(i64::max_value()));
        cases.push(BigInt::from(i64::min_value()));
        cases.push(BigInt::one() << 200);
        cases.push(-(BigInt::one() << 200));
        cases.push((BigInt::one() << 201) - 1);

        for i in cases {
            let mut enc = Vec::new();
            put_int(&i, &mut enc);
            assert_eq!(get_int(&mut Cursor::new(&enc)).unwrap(), i, "value {}", i);
        }
    }

    #[test]
    fn extension_roundtrip() {
        let mut out = Vec::new();
        put_extension(&[3, 0x7f, 0], &mut out);
        assert_eq!(out, vec![0x83, 0xff, 0x00]);

        let tail = get_extension(&mut Cursor::new(&out)).unwrap();
        assert_eq!(&tail[..], &[3, 0x7f, 0]);
    }
}
