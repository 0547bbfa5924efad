/// OSC address patterns understood by the mixer.
///
///   /-snap/load        — recall a snapshot (one int argument)
///   /-snap/NN/name     — query a slot name; the reply uses the same address
///                        and carries the name as a string argument

use thiserror::Error;

use crate::snapshot::SnapshotIndex;

pub const LOAD_ADDRESS: &str = "/-snap/load";

const SNAP_SEGMENT: &str = "-snap";
const NAME_SEGMENT: &str = "name";

/// Characters with pattern-matching meaning in OSC; never valid in a
/// concrete address.
const RESERVED: &[char] = &['#', '*', ',', '?', '[', ']', '{', '}'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must start with '/': {0:?}")]
    MissingSlash(String),
    #[error("address has an empty segment: {0:?}")]
    EmptySegment(String),
    #[error("address contains {ch:?}: {addr:?}")]
    InvalidChar { addr: String, ch: char },
    #[error("expected {expected} segments, got {got}: {addr:?}")]
    SegmentCount {
        addr: String,
        expected: usize,
        got: usize,
    },
    #[error("unexpected segment {segment:?} in {addr:?}")]
    UnexpectedSegment { addr: String, segment: String },
    #[error("slot segment {0:?} is not numeric")]
    NonNumericSlot(String),
}

/// Check that `addr` is a concrete hierarchical OSC address.
pub fn validate(addr: &str) -> Result<(), AddressError> {
    let Some(rest) = addr.strip_prefix('/') else {
        return Err(AddressError::MissingSlash(addr.to_string()));
    };

    if let Some(ch) = addr
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || RESERVED.contains(c))
    {
        return Err(AddressError::InvalidChar {
            addr: addr.to_string(),
            ch,
        });
    }

    if rest.split('/').any(str::is_empty) {
        return Err(AddressError::EmptySegment(addr.to_string()));
    }

    Ok(())
}

/// `/-snap/NN/name` for the given slot, NN zero-padded to two digits.
pub fn name_address(index: SnapshotIndex) -> String {
    format!("/{SNAP_SEGMENT}/{:02}/{NAME_SEGMENT}", index.get())
}

/// Extract the raw slot number from a `/-snap/NN/name` address.
///
/// Only the shape is checked here; whether the number lies in the
/// snapshot domain is up to the caller.
pub fn parse_name_slot(addr: &str) -> Result<u32, AddressError> {
    validate(addr)?;

    let segments: Vec<&str> = addr[1..].split('/').collect();
    if segments.len() != 3 {
        return Err(AddressError::SegmentCount {
            addr: addr.to_string(),
            expected: 3,
            got: segments.len(),
        });
    }

    for (segment, expected) in [(segments[0], SNAP_SEGMENT), (segments[2], NAME_SEGMENT)] {
        if segment != expected {
            return Err(AddressError::UnexpectedSegment {
                addr: addr.to_string(),
                segment: segment.to_string(),
            });
        }
    }

    let slot = segments[1];
    if !slot.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AddressError::NonNumericSlot(slot.to_string()));
    }
    slot.parse::<u32>()
        .map_err(|_| AddressError::NonNumericSlot(slot.to_string()))
}
