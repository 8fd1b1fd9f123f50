//! Error taxonomy for the Bion codec.
//!
//! Every decode failure is fatal to the call that produced it and carries
//! the byte offset at which it was detected. Encoding can only fail on
//! precondition violations; a well-formed graph always encodes.

use failure::Fail;

/// Errors produced by [`encode`](crate::encoding::encode) and
/// [`decode_full`](crate::encoding::decode_full).
#[derive(Clone, Debug, Fail, PartialEq, Eq)]
pub enum Error {
    /// A truncated or inconsistent VarBytes/ByteChunks sequence, or a
    /// payload field whose value is out of range for its kind.
    #[fail(display = "malformed framing at byte {}: {}", offset, what)]
    Framing {
        /// Byte offset at which the malformation was detected.
        offset: u64,
        /// What was being read.
        what: &'static str,
    },
    /// A type tag outside the defined set.
    #[fail(display = "unknown type tag {:#04x} at byte {}", tag, offset)]
    UnknownType {
        /// The offending tag nibble.
        tag: u8,
        /// Byte offset of the header.
        offset: u64,
    },
    /// A reference token naming an offset no container was registered at.
    #[fail(
        display = "reference to unregistered offset {} at byte {}",
        target, offset
    )]
    UnresolvedReference {
        /// The offset the reference pointed at.
        target: u64,
        /// Byte offset of the reference token.
        offset: u64,
    },
    /// The caller handed the codec something unusable, e.g. a `NodeId`
    /// that does not belong to the graph being encoded.
    #[fail(display = "precondition violated: {}", what)]
    Precondition {
        /// Which precondition failed.
        what: &'static str,
    },
}

impl Error {
    pub(crate) fn framing(offset: u64, what: &'static str) -> Error {
        Error::Framing { offset, what }
    }
}
