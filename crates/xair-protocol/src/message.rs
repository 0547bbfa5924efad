use rosc::{OscMessage, OscPacket, OscType};
use thiserror::Error;

use crate::address::{self, AddressError, LOAD_ADDRESS};
use crate::snapshot::{IndexBase, SnapshotIndex};

// -- Typed messages --

/// Argument types the mixer uses on the snapshot surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Int(i32),
    Float(f32),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub addr: String,
    pub args: Vec<Arg>,
}

impl Message {
    pub fn new(addr: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            addr: addr.into(),
            args,
        }
    }

    /// First string argument, if any.
    pub fn first_str(&self) -> Option<&str> {
        self.args.iter().find_map(|arg| match arg {
            Arg::Str(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        encode(&self.addr, &self.args)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
    #[error("OSC encoding failed: {0}")]
    Osc(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed packet: {0}")]
    Malformed(String),
    #[error("OSC bundles are not supported")]
    Bundle,
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
    #[error("unsupported argument type: {0}")]
    UnsupportedArgument(&'static str),
}

// -- Codec --

/// Encode one OSC message into a datagram payload.
pub fn encode(addr: &str, args: &[Arg]) -> Result<Vec<u8>, EncodeError> {
    address::validate(addr)?;

    let packet = OscPacket::Message(OscMessage {
        addr: addr.to_string(),
        args: args.iter().map(to_osc).collect(),
    });

    rosc::encoder::encode(&packet).map_err(|e| EncodeError::Osc(format!("{:?}", e)))
}

/// Decode a datagram payload into a single message.
///
/// Every failure is per-packet: callers on a shared link are expected to
/// log and drop, not abort.
pub fn decode(data: &[u8]) -> Result<Message, DecodeError> {
    // OSC packet sizes are always a non-zero multiple of 4
    if data.is_empty() || data.len() % 4 != 0 {
        return Err(DecodeError::Malformed(format!("invalid packet length {}", data.len())));
    }

    let (_, packet) =
        rosc::decoder::decode_udp(data).map_err(|e| DecodeError::Malformed(format!("{:?}", e)))?;

    let msg = match packet {
        OscPacket::Message(msg) => msg,
        OscPacket::Bundle(_) => return Err(DecodeError::Bundle),
    };

    address::validate(&msg.addr)?;

    let args = msg
        .args
        .into_iter()
        .map(from_osc)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Message {
        addr: msg.addr,
        args,
    })
}

fn to_osc(arg: &Arg) -> OscType {
    match arg {
        Arg::Int(v) => OscType::Int(*v),
        Arg::Float(v) => OscType::Float(*v),
        Arg::Str(v) => OscType::String(v.clone()),
    }
}

fn from_osc(arg: OscType) -> Result<Arg, DecodeError> {
    match arg {
        OscType::Int(v) => Ok(Arg::Int(v)),
        OscType::Float(v) => Ok(Arg::Float(v)),
        OscType::String(v) => Ok(Arg::Str(v)),
        other => Err(DecodeError::UnsupportedArgument(type_name(&other))),
    }
}

fn type_name(arg: &OscType) -> &'static str {
    match arg {
        OscType::Int(_) => "int",
        OscType::Float(_) => "float",
        OscType::String(_) => "string",
        OscType::Blob(_) => "blob",
        OscType::Time(_) => "timetag",
        OscType::Long(_) => "long",
        OscType::Double(_) => "double",
        OscType::Char(_) => "char",
        OscType::Color(_) => "color",
        OscType::Midi(_) => "midi",
        OscType::Bool(_) => "bool",
        OscType::Nil => "nil",
        OscType::Inf => "inf",
        _ => "other",
    }
}

// -- Snapshot commands --

/// `/-snap/load <wire index>`
pub fn load_command(index: SnapshotIndex, base: IndexBase) -> Message {
    Message::new(LOAD_ADDRESS, vec![Arg::Int(base.to_wire(index))])
}

/// Inverse of [`load_command`]. Returns `None` for anything that is not a
/// well-formed load of an in-range slot.
pub fn parse_load_command(msg: &Message, base: IndexBase) -> Option<SnapshotIndex> {
    if msg.addr != LOAD_ADDRESS {
        return None;
    }
    match msg.args.as_slice() {
        [Arg::Int(wire)] => base.from_wire(*wire).ok(),
        _ => None,
    }
}

/// Argument-less query; the mixer answers on the same address.
pub fn name_query(index: SnapshotIndex) -> Message {
    Message::new(address::name_address(index), Vec::new())
}

/// The reply the mixer sends for a name query.
pub fn name_reply(index: SnapshotIndex, name: &str) -> Message {
    Message::new(
        address::name_address(index),
        vec![Arg::Str(name.to_string())],
    )
}
