//! Box tree decoding and lookup.
//!
//! An ISO-BMFF buffer is decoded into a forest of [`BoxNode`] values. Whether
//! a box has children is decided by its type (see [`BoxType::layout`]); leaf
//! payloads are kept as zero-copy [`Bytes`] slices of the input and decoded
//! on demand by the atom parsers.

use super::atoms::{BoxType, ChildLayout};
use crate::{Error, Result};
use bytes::Bytes;

/// Nesting limit; real files stay well below this.
const MAX_DEPTH: usize = 32;

/// Decoded box header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    /// Box type code.
    pub box_type: BoxType,
    /// Total box size including the header; 0 means "extends to end of input".
    pub size: u64,
    /// Header length (8, or 16 with a 64-bit size).
    pub header_size: u8,
}

impl BoxHeader {
    /// Bytes needed to decode any header.
    pub const MAX_LEN: usize = 16;

    /// Decode a header from the start of `buf`.
    ///
    /// Returns `Ok(None)` when `buf` is too short to hold the header.
    pub fn parse(buf: &[u8]) -> Result<Option<Self>> {
        if buf.len() < 8 {
            return Ok(None);
        }

        let size = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as u64;
        let box_type = BoxType::from_bytes([buf[4], buf[5], buf[6], buf[7]]);

        let (size, header_size) = if size == 1 {
            if buf.len() < 16 {
                return Ok(None);
            }
            let mut large = [0u8; 8];
            large.copy_from_slice(&buf[8..16]);
            (u64::from_be_bytes(large), 16u8)
        } else {
            (size, 8u8)
        };

        if size != 0 && size < header_size as u64 {
            return Err(Error::malformed(format!(
                "{} box declares size {} smaller than its header",
                box_type, size
            )));
        }

        Ok(Some(Self {
            box_type,
            size,
            header_size,
        }))
    }

    /// True when the box runs to the end of its enclosing input.
    pub fn extends_to_end(&self) -> bool {
        self.size == 0
    }
}

/// A decoded box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxNode {
    /// Box type code.
    pub box_type: BoxType,
    /// Extended type of a `uuid` box.
    pub user_type: Option<[u8; 16]>,
    /// Total size including the header.
    pub size: u64,
    /// Everything after the header (a `uuid` extended type stays in here).
    pub payload: Bytes,
    /// Child boxes, including sample entries of `stsd`.
    pub children: Vec<BoxNode>,
}

impl BoxNode {
    /// First descendant of the given type, depth-first in file order.
    pub fn find_first(&self, box_type: BoxType) -> Option<&BoxNode> {
        find_first_in(&self.children, box_type)
    }

    /// All descendants of the given type, depth-first in file order.
    pub fn find_all(&self, box_type: BoxType) -> Vec<&BoxNode> {
        find_all_in(&self.children, box_type)
    }

    /// First direct child of the given type.
    pub fn child(&self, box_type: BoxType) -> Option<&BoxNode> {
        self.children.iter().find(|c| c.box_type == box_type)
    }

    /// Direct children of the given type.
    pub fn children_of(&self, box_type: BoxType) -> impl Iterator<Item = &BoxNode> {
        self.children.iter().filter(move |c| c.box_type == box_type)
    }

    /// Payload fields after the `uuid` extended type, if any.
    pub fn content(&self) -> &[u8] {
        if self.user_type.is_some() {
            &self.payload[16..]
        } else {
            &self.payload
        }
    }

    fn decode(box_type: BoxType, size: u64, payload: Bytes, depth: usize) -> Result<Self> {
        let user_type = if box_type == BoxType::UUID {
            if payload.len() < 16 {
                return Err(Error::malformed("uuid box shorter than its extended type"));
            }
            let mut uuid = [0u8; 16];
            uuid.copy_from_slice(&payload[..16]);
            Some(uuid)
        } else {
            None
        };

        let children = match child_offset(box_type, &payload)? {
            Some(offset) => parse_level(payload.slice(offset..), depth + 1)?,
            None => Vec::new(),
        };

        Ok(Self {
            box_type,
            user_type,
            size,
            payload,
            children,
        })
    }
}

/// Offset at which child boxes start, or `None` for leaves.
fn child_offset(box_type: BoxType, payload: &[u8]) -> Result<Option<usize>> {
    let offset = match box_type.layout() {
        ChildLayout::Leaf => return Ok(None),
        ChildLayout::Container => 0,
        ChildLayout::Prefixed(len) => len,
        ChildLayout::AudioEntry => {
            // reserved(6) + data_reference_index(2), then the sound version
            let version = payload
                .get(8..10)
                .map(|v| u16::from_be_bytes([v[0], v[1]]))
                .unwrap_or(0);
            match version {
                1 => 44,
                2 => 64,
                _ => 28,
            }
        }
        ChildLayout::XmlSubtitleEntry => {
            // namespace, schema_location, auxiliary_mime_types
            let mut offset = 8usize;
            for _ in 0..3 {
                match payload.get(offset..).and_then(|rest| rest.iter().position(|&b| b == 0)) {
                    Some(nul) => offset += nul + 1,
                    None => return Ok(None),
                }
            }
            offset
        }
    };

    if payload.len() < offset {
        return Err(Error::malformed(format!(
            "{} box payload of {} bytes is shorter than its {} byte field block",
            box_type,
            payload.len(),
            offset
        )));
    }

    Ok(Some(offset))
}

/// Decode a buffer into a forest of boxes in file order.
///
/// Fails with [`Error::MalformedBox`] if the buffer ends mid-box or any box
/// declares a size that does not fit its parent.
pub fn parse_boxes(data: Bytes) -> Result<Vec<BoxNode>> {
    parse_level(data, 0)
}

fn parse_level(data: Bytes, depth: usize) -> Result<Vec<BoxNode>> {
    if depth > MAX_DEPTH {
        return Err(Error::malformed("box nesting too deep"));
    }

    let mut nodes = Vec::new();
    let mut pos = 0usize;

    while pos < data.len() {
        let remaining = &data[pos..];

        // QuickTime writers may close a child list with a zero terminator
        if depth > 0 && remaining.len() < 8 && remaining.iter().all(|&b| b == 0) {
            break;
        }

        let header = BoxHeader::parse(remaining)?.ok_or_else(|| {
            Error::malformed(format!(
                "truncated box header at offset {} ({} bytes left)",
                pos,
                remaining.len()
            ))
        })?;

        let size = if header.extends_to_end() {
            remaining.len() as u64
        } else {
            header.size
        };

        if size > remaining.len() as u64 {
            return Err(Error::malformed(format!(
                "{} box declares {} bytes but only {} remain",
                header.box_type,
                size,
                remaining.len()
            )));
        }

        let end = pos + size as usize;
        let payload = data.slice(pos + header.header_size as usize..end);
        nodes.push(BoxNode::decode(header.box_type, size, payload, depth)?);
        pos = end;
    }

    Ok(nodes)
}

/// First box of the given type in a forest, depth-first in file order.
pub fn find_first_in(nodes: &[BoxNode], box_type: BoxType) -> Option<&BoxNode> {
    for node in nodes {
        if node.box_type == box_type {
            return Some(node);
        }
        if let Some(found) = node.find_first(box_type) {
            return Some(found);
        }
    }
    None
}

/// All boxes of the given type in a forest, depth-first in file order.
pub fn find_all_in(nodes: &[BoxNode], box_type: BoxType) -> Vec<&BoxNode> {
    let mut found = Vec::new();
    collect(nodes, box_type, &mut found);
    found
}

fn collect<'a>(nodes: &'a [BoxNode], box_type: BoxType, found: &mut Vec<&'a BoxNode>) {
    for node in nodes {
        if node.box_type == box_type {
            found.push(node);
        }
        collect(&node.children, box_type, found);
    }
}
