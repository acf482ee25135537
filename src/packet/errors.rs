use thiserror::Error;

/// Failure to decode (or encode) a header.
///
/// `Malformed` and `BadLength` cover truncated buffers and structurally invalid
/// length fields. `ChecksumMismatch` is never produced by a plain `decode`; it
/// only comes out of the explicit `verify_checksum` queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("Malformed {layer} packet: expected at least {expected} bytes, found {found} bytes")]
    Malformed {
        layer: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Malformed {layer} packet: invalid {field} ({value})")]
    BadLength {
        layer: &'static str,
        field: &'static str,
        value: usize,
    },

    #[error("Unsupported {layer} {field}: {value}")]
    Unsupported {
        layer: &'static str,
        field: &'static str,
        value: u32,
    },

    #[error("Bad {layer} checksum: expected {expected:#06x}, found {found:#06x}")]
    ChecksumMismatch {
        layer: &'static str,
        expected: u16,
        found: u16,
    },
}

impl PacketError {
    /// True for every variant that means "this buffer is not a valid packet".
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            PacketError::Malformed { .. } | PacketError::BadLength { .. } | PacketError::Unsupported { .. }
        )
    }

    /// Shorthand for the "buffer too short" case shared by every codec.
    pub(crate) fn truncated(layer: &'static str, expected: usize, found: usize) -> Self {
        PacketError::Malformed { layer, expected, found }
    }
}
