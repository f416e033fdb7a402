use std::path::PathBuf;

use crate::error::{Error, Result};

// Only the fixed header, the target ID list (skipped) and LinkInfo are read.

const HEADER_SIZE: usize = 0x4C;
const LINK_CLSID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

const HAS_LINK_TARGET_ID_LIST: u32 = 0x0000_0001;
const HAS_LINK_INFO: u32 = 0x0000_0002;

const VOLUME_ID_AND_LOCAL_BASE_PATH: u32 = 0x0000_0001;
const COMMON_NETWORK_RELATIVE_LINK_AND_PATH_SUFFIX: u32 = 0x0000_0002;

// LinkInfo headers at least this large carry the Unicode offsets.
const UNICODE_LINK_INFO_HEADER: u32 = 0x24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellLink {
    target: String,
}

impl ShellLink {
    pub fn target_path(&self) -> PathBuf {
        PathBuf::from(&self.target)
    }
}

/// Parse the raw bytes of a `.lnk` file.
///
/// # Errors
/// Returns [`Error::Shortcut`] when the data is truncated, carries the wrong
/// header, or has no `LinkInfo` target.
pub fn parse(bytes: &[u8]) -> Result<ShellLink> {
    let header = bytes
        .get(..HEADER_SIZE)
        .ok_or(Error::Shortcut("truncated header"))?;
    if read_u32(header, 0)? as usize != HEADER_SIZE || header[4..20] != LINK_CLSID {
        return Err(Error::Shortcut("not a shell link header"));
    }
    let flags = read_u32(header, 0x14)?;

    let mut offset = HEADER_SIZE;
    if flags & HAS_LINK_TARGET_ID_LIST != 0 {
        offset += 2 + usize::from(read_u16(bytes, offset)?);
    }
    if flags & HAS_LINK_INFO == 0 {
        return Err(Error::Shortcut("no link info"));
    }

    let info_size = read_u32(bytes, offset)? as usize;
    let info = offset
        .checked_add(info_size)
        .and_then(|end| bytes.get(offset..end))
        .ok_or(Error::Shortcut("truncated link info"))?;

    Ok(ShellLink {
        target: link_info_target(info)?,
    })
}

fn link_info_target(info: &[u8]) -> Result<String> {
    let header_size = read_u32(info, 4)?;
    let info_flags = read_u32(info, 8)?;
    let unicode = header_size >= UNICODE_LINK_INFO_HEADER;

    let suffix = string_field(info, 24, unicode.then_some(32))?;

    if info_flags & VOLUME_ID_AND_LOCAL_BASE_PATH != 0 {
        let base = string_field(info, 16, unicode.then_some(28))?;
        return Ok(join(&base, &suffix));
    }
    if info_flags & COMMON_NETWORK_RELATIVE_LINK_AND_PATH_SUFFIX != 0 {
        let net_offset = read_u32(info, 20)? as usize;
        let net = info
            .get(net_offset..)
            .ok_or(Error::Shortcut("network link out of range"))?;
        let net_name = ansi_z(net, read_u32(net, 8)? as usize)?;
        return Ok(join(&net_name, &suffix));
    }
    Err(Error::Shortcut("link info names no target"))
}

/// Reads a string whose offset is stored at `ansi_at`, preferring the
/// Unicode copy at `unicode_at` when the header has one.
fn string_field(info: &[u8], ansi_at: usize, unicode_at: Option<usize>) -> Result<String> {
    if let Some(at) = unicode_at {
        let offset = read_u32(info, at)? as usize;
        if offset != 0 {
            return utf16_z(info, offset);
        }
    }
    match read_u32(info, ansi_at)? as usize {
        0 => Ok(String::new()),
        offset => ansi_z(info, offset),
    }
}

fn join(base: &str, suffix: &str) -> String {
    if suffix.is_empty() || base.ends_with(['\\', '/']) {
        format!("{base}{suffix}")
    } else {
        format!("{base}\\{suffix}")
    }
}

fn ansi_z(buf: &[u8], offset: usize) -> Result<String> {
    let tail = buf
        .get(offset..)
        .ok_or(Error::Shortcut("string out of range"))?;
    let end = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or(Error::Shortcut("unterminated string"))?;
    // Code page is unknown; Latin-1 maps every byte and keeps ASCII intact.
    Ok(tail[..end].iter().copied().map(char::from).collect())
}

fn utf16_z(buf: &[u8], offset: usize) -> Result<String> {
    let tail = buf
        .get(offset..)
        .ok_or(Error::Shortcut("string out of range"))?;
    let mut units = Vec::new();
    for pair in tail.chunks_exact(2) {
        match u16::from_le_bytes([pair[0], pair[1]]) {
            0 => return Ok(String::from_utf16_lossy(&units)),
            unit => units.push(unit),
        }
    }
    Err(Error::Shortcut("unterminated string"))
}

fn read_u16(buf: &[u8], at: usize) -> Result<u16> {
    buf.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(Error::Shortcut("truncated field"))
}

fn read_u32(buf: &[u8], at: usize) -> Result<u32> {
    buf.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(Error::Shortcut("truncated field"))
}
