//! Portable container for finished instruction buffers.
//!
//! Layout (little-endian): magic `VGIR`, `u32` version, `u32` buffer count, then for each buffer
//! a `u32` byte length followed by the bytes.

use crate::foundation::error::{VgirError, VgirResult};
use anyhow::Context as _;
use std::io::{Read, Write};

pub const DUMP_MAGIC: [u8; 4] = *b"VGIR";
pub const DUMP_VERSION: u32 = 1;

// Guards against allocating from a corrupted length prefix.
const MAX_BUFFER_LEN: usize = 64 * 1024 * 1024;
const MAX_BUFFERS: usize = 1 << 16;

pub fn write_dump<W: Write>(buffers: &[&[u8]], mut w: W) -> VgirResult<()> {
    let count = u32::try_from(buffers.len())
        .map_err(|_| VgirError::argument("too many buffers for a dump"))?;
    w.write_all(&DUMP_MAGIC).context("write dump header")?;
    w.write_all(&DUMP_VERSION.to_le_bytes())
        .context("write dump header")?;
    w.write_all(&count.to_le_bytes())
        .context("write dump header")?;
    for (i, buf) in buffers.iter().enumerate() {
        let len = u32::try_from(buf.len())
            .map_err(|_| VgirError::argument(format!("buffer #{i} is too large for a dump")))?;
        w.write_all(&len.to_le_bytes())
            .with_context(|| format!("write buffer #{i}"))?;
        w.write_all(buf)
            .with_context(|| format!("write buffer #{i}"))?;
    }
    w.flush().context("flush dump")?;
    Ok(())
}

fn read_u32<R: Read>(r: &mut R, what: &str) -> VgirResult<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)
        .map_err(|e| VgirError::decode(format!("read {what}: {e}")))?;
    Ok(u32::from_le_bytes(b))
}

pub fn read_dump<R: Read>(mut r: R) -> VgirResult<Vec<Vec<u8>>> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)
        .map_err(|e| VgirError::decode(format!("read dump magic: {e}")))?;
    if magic != DUMP_MAGIC {
        return Err(VgirError::decode("not a vgir dump (bad magic)"));
    }
    let version = read_u32(&mut r, "dump version")?;
    if version != DUMP_VERSION {
        return Err(VgirError::decode(format!(
            "unsupported dump version {version}"
        )));
    }

    let count = read_u32(&mut r, "buffer count")? as usize;
    if count > MAX_BUFFERS {
        return Err(VgirError::decode(format!("implausible buffer count {count}")));
    }
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let len = read_u32(&mut r, "buffer length")? as usize;
        if len > MAX_BUFFER_LEN {
            return Err(VgirError::decode(format!(
                "implausible length {len} for buffer #{i}"
            )));
        }
        let mut buf = vec![0u8; len];
        r.read_exact(&mut buf)
            .map_err(|e| VgirError::decode(format!("read buffer #{i}: {e}")))?;
        out.push(buf);
    }
    Ok(out)
}
