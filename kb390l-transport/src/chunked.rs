//! Report-sized chunking of raw transfers
//!
//! The device only accepts raw data in output-report-sized pieces, each
//! prefixed by a report id, and hands back input reports one at a time.
//! These helpers run the loops over any single-report primitive so that
//! every backend (and the tests) share one implementation.

use crate::error::TransportError;

/// Write `data` as `[report_id] + up to out_len bytes` chunks.
///
/// `write_one` sends one chunk and returns the bytes accepted, report id
/// included. Each round advances by `written - 1`. A round that accepts
/// nothing aborts the whole write.
///
/// Returns the number of payload bytes written.
pub fn write_chunked<F>(
    report_id: u8,
    data: &[u8],
    out_len: usize,
    mut write_one: F,
) -> Result<usize, TransportError>
where
    F: FnMut(&[u8]) -> Result<usize, TransportError>,
{
    if out_len == 0 {
        return Err(TransportError::Internal("output report length is zero".into()));
    }

    let mut chunk = Vec::with_capacity(out_len + 1);
    let mut offset = 0;

    while offset < data.len() {
        let len = (data.len() - offset).min(out_len);
        chunk.clear();
        chunk.push(report_id);
        chunk.extend_from_slice(&data[offset..offset + len]);

        let written = write_one(&chunk)?;
        if written <= 1 {
            return Err(TransportError::ShortTransfer {
                expected: data.len(),
                actual: offset,
            });
        }
        offset += (written - 1).min(len);
    }

    Ok(offset)
}

/// Fill `buf` from successive reads.
///
/// `read_one` reads at most one input report into the slice it is given and
/// returns the byte count. A read returning nothing is a timeout, which ends
/// the transfer short.
///
/// Returns the number of bytes read.
pub fn read_chunked<F>(buf: &mut [u8], mut read_one: F) -> Result<usize, TransportError>
where
    F: FnMut(&mut [u8]) -> Result<usize, TransportError>,
{
    let mut offset = 0;

    while offset < buf.len() {
        let read = read_one(&mut buf[offset..])?;
        if read == 0 {
            break;
        }
        offset += read;
    }

    Ok(offset)
}
