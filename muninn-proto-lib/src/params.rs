use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use bitflags::bitflags;

/// Operation a message is sent or received with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpId {
    TagSend = 0,
    TagSendSync = 1,
    AmSend = 2,
    Put = 3,
    Get = 4,
}

impl OpId {
    pub const ALL: [OpId; 5] = [
        OpId::TagSend,
        OpId::TagSendSync,
        OpId::AmSend,
        OpId::Put,
        OpId::Get,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OpId::TagSend => "tag_send",
            OpId::TagSendSync => "tag_send_sync",
            OpId::AmSend => "am_send",
            OpId::Put => "put",
            OpId::Get => "get",
        }
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        OpId::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown operation: {s}"))
    }
}

/// Shape of the user datatype the operation carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DtClass {
    Contig = 0,
    Iov = 1,
    Generic = 2,
}

impl DtClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DtClass::Contig => "contig",
            DtClass::Iov => "iov",
            DtClass::Generic => "generic",
        }
    }
}

impl fmt::Display for DtClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DtClass {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "contig" => Ok(DtClass::Contig),
            "iov" => Ok(DtClass::Iov),
            "generic" => Ok(DtClass::Generic),
            _ => Err(format!("unknown datatype class: {s}")),
        }
    }
}

/// Memory domain the message buffer lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MemType {
    Host = 0,
    Cuda = 1,
    CudaManaged = 2,
    Rocm = 3,
}

impl MemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemType::Host => "host",
            MemType::Cuda => "cuda",
            MemType::CudaManaged => "cuda-managed",
            MemType::Rocm => "rocm",
        }
    }
}

impl fmt::Display for MemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "host" => Ok(MemType::Host),
            "cuda" => Ok(MemType::Cuda),
            "cuda-managed" => Ok(MemType::CudaManaged),
            "rocm" => Ok(MemType::Rocm),
            _ => Err(format!("unknown memory type: {s}")),
        }
    }
}

bitflags! {
    /// Operation attributes that influence protocol choice. Attributes that
    /// do not change the cost trade-off must not be part of the key.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpAttr: u8 {
        /// The caller wants the send buffer released as early as possible.
        const FAST_CMPL = 1 << 0;
        /// The operation is part of a multi-destination batch.
        const MULTI_SEND = 1 << 1;
    }
}

/// Everything that keys a protocol selection: one operation shape, byte-packed
/// into a 64-bit word so equality and hashing are over the raw bit pattern.
///
/// Message length is deliberately absent; the selection result covers all
/// lengths through its threshold table.
#[derive(Debug, Clone, Copy)]
pub struct SelectParam {
    pub op_id: OpId,
    pub op_attr: OpAttr,
    pub dt_class: DtClass,
    pub mem_type: MemType,
    /// Scatter-gather entry count, saturated to fit the packed key.
    pub sg_count: u8,
}

impl SelectParam {
    pub fn new(
        op_id: OpId,
        op_attr: OpAttr,
        dt_class: DtClass,
        mem_type: MemType,
        sg_count: usize,
    ) -> Self {
        Self {
            op_id,
            op_attr,
            dt_class,
            mem_type,
            sg_count: sg_count.min(u8::MAX as usize) as u8,
        }
    }

    /// The packed cache key.
    pub fn key(&self) -> u64 {
        u64::from_le_bytes([
            self.op_id as u8,
            self.op_attr.bits(),
            self.dt_class as u8,
            self.mem_type as u8,
            self.sg_count,
            0,
            0,
            0,
        ])
    }
}

impl PartialEq for SelectParam {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SelectParam {}

impl Hash for SelectParam {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.key());
    }
}

impl fmt::Display for SelectParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{},sg:{}",
            self.op_id, self.dt_class, self.mem_type, self.sg_count
        )?;
        if self.op_attr.contains(OpAttr::FAST_CMPL) {
            f.write_str(",fast-cmpl")?;
        }
        if self.op_attr.contains(OpAttr::MULTI_SEND) {
            f.write_str(",multi-send")?;
        }
        f.write_str(")")
    }
}
