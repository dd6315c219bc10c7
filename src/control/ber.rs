//! BER tree decoding
//!
//! Decodes one definite-length BER element into a `BerNode` tree and
//! provides the pre-order field lookup the lag aggregator relies on.
//! Construction and traversal both run on explicit work stacks, so nesting
//! depth is bounded by `MAX_DEPTH` rather than the call stack.

use super::errors::{ControlError, ControlResult};

/// Nesting depth beyond which input is rejected as malformed.
const MAX_DEPTH: usize = 128;

/// One node of a decoded BER tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BerNode {
    /// Leaf content octets.
    Primitive(Vec<u8>),
    /// Constructed element with child nodes in encoding order.
    Constructed(Vec<BerNode>),
}

struct Header {
    constructed: bool,
    content_start: usize,
    content_end: usize,
}

fn read_header(input: &[u8], start: usize) -> ControlResult<Header> {
    let malformed = |detail: &str| ControlError::Malformed(format!("at offset {}: {}", start, detail));
    let mut pos = start;
    let first = *input.get(pos).ok_or_else(|| malformed("truncated identifier"))?;
    let constructed = first & 0x20 != 0;
    pos += 1;
    if first & 0x1f == 0x1f {
        // High tag numbers: subsequent octets with the continuation bit set.
        let mut octets = 0;
        loop {
            let b = *input.get(pos).ok_or_else(|| malformed("truncated tag number"))?;
            pos += 1;
            octets += 1;
            if octets > 4 {
                return Err(malformed("tag number too long"));
            }
            if b & 0x80 == 0 {
                break;
            }
        }
    }
    let len_byte = *input.get(pos).ok_or_else(|| malformed("truncated length"))?;
    pos += 1;
    let length = if len_byte < 0x80 {
        len_byte as usize
    } else if len_byte == 0x80 {
        return Err(malformed("indefinite length not supported"));
    } else {
        let count = (len_byte & 0x7f) as usize;
        if count > 8 {
            return Err(malformed("length field too long"));
        }
        let mut length: u64 = 0;
        for _ in 0..count {
            let b = *input.get(pos).ok_or_else(|| malformed("truncated length"))?;
            pos += 1;
            length = (length << 8) | u64::from(b);
        }
        usize::try_from(length).map_err(|_| malformed("length overflow"))?
    };
    let content_end = pos
        .checked_add(length)
        .filter(|end| *end <= input.len())
        .ok_or_else(|| malformed("content extends past end of input"))?;
    Ok(Header {
        constructed,
        content_start: pos,
        content_end,
    })
}

/// Decode the first BER element of `input` into a tree.
///
/// Trailing bytes after the first top-level element are ignored.
pub fn parse(input: &[u8]) -> ControlResult<BerNode> {
    struct Frame {
        children: Vec<BerNode>,
        end: usize,
    }

    if input.is_empty() {
        return Err(ControlError::Malformed("empty input".to_string()));
    }

    let mut stack: Vec<Frame> = Vec::new();
    let mut pos = 0;
    loop {
        // Close every frame whose content is fully consumed.
        while stack.last().is_some_and(|frame| pos >= frame.end) {
            let frame = stack.pop().filter(|frame| pos == frame.end).ok_or_else(|| {
                ControlError::Malformed("child element overruns its parent".to_string())
            })?;
            let node = BerNode::Constructed(frame.children);
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => return Ok(node),
            }
        }

        let header = read_header(input, pos)?;
        if let Some(parent) = stack.last() {
            if header.content_end > parent.end {
                return Err(ControlError::Malformed(
                    "child element overruns its parent".to_string(),
                ));
            }
        }
        if header.constructed {
            if stack.len() >= MAX_DEPTH {
                return Err(ControlError::Malformed("nesting too deep".to_string()));
            }
            stack.push(Frame {
                children: Vec::new(),
                end: header.content_end,
            });
            pos = header.content_start;
        } else {
            let node = BerNode::Primitive(input[header.content_start..header.content_end].to_vec());
            pos = header.content_end;
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => return Ok(node),
            }
        }
    }
}

/// Find the value of the named field in a decoded tree.
///
/// Pre-order walk; the first `Primitive` whose content equals `name` wins,
/// and its value is the next primitive in pre-order (descending into a
/// constructed wrapper when the value is nested, as with an attribute's
/// SET of values). Absence is `None`, never an error.
pub fn find_field(root: &BerNode, name: &[u8]) -> Option<String> {
    let mut stack: Vec<&BerNode> = vec![root];
    let mut matched = false;
    while let Some(node) = stack.pop() {
        match node {
            BerNode::Primitive(content) => {
                if matched {
                    return Some(String::from_utf8_lossy(content).into_owned());
                }
                if content == name {
                    matched = true;
                }
            }
            BerNode::Constructed(children) => {
                for child in children.iter().rev() {
                    stack.push(child);
                }
            }
        }
    }
    None
}
