//! Whole-configuration backup and restore
//!
//! A backup is the BUTTONS page followed by all 32 macro pages, with no
//! header: 512 + 32 * 192 = 6656 bytes.

use std::io::{Read, Write};

use kb390l_transport::protocol::limits;
use kb390l_transport::{cmd, Transport, PAGE_SIZE};
use tracing::{info, warn};

use crate::macros::MACRO_PAGE_LEN;
use crate::{Keyboard, KeyboardError, PageKey};

/// Size of the BUTTONS page
pub const BUTTONS_PAGE_LEN: usize = 8 * PAGE_SIZE;

/// Exact size of a backup
pub const BACKUP_LEN: usize = BUTTONS_PAGE_LEN + limits::MACRO_COUNT * MACRO_PAGE_LEN;

/// Pages in backup order
fn layout() -> impl Iterator<Item = (u8, u8, usize)> {
    std::iter::once((cmd::BUTTONS, 0, BUTTONS_PAGE_LEN)).chain(
        (limits::MIN_MACRO..=limits::MAX_MACRO).map(|index| (cmd::MACRO, index, MACRO_PAGE_LEN)),
    )
}

impl<T: Transport> Keyboard<T> {
    /// Write the buttons page and every macro page to `sink`.
    ///
    /// Pages come from the cache where present, so staged edits are included.
    pub fn backup_config<W: Write>(&mut self, mut sink: W) -> Result<(), KeyboardError> {
        let mut total = 0;
        for (page, index, len) in layout() {
            let bytes = self.read_page(page, index)?;
            if bytes.len() != len {
                warn!("backup: {:?} is {} bytes", PageKey::new(page, index), bytes.len());
                return Err(KeyboardError::UnexpectedResponse(format!(
                    "{:?} is {} bytes, expected {len}",
                    PageKey::new(page, index),
                    bytes.len()
                )));
            }
            sink.write_all(&bytes)?;
            total += bytes.len();
        }
        sink.flush()?;

        if total != BACKUP_LEN {
            return Err(KeyboardError::BackupSize {
                expected: BACKUP_LEN,
                actual: total,
            });
        }
        info!("Backed up {} bytes", total);
        Ok(())
    }

    /// Write a backup straight to the device, bypassing staged edits.
    ///
    /// The source must hold exactly [`BACKUP_LEN`] bytes. Stops at the first
    /// page that fails to write.
    pub fn restore_config<R: Read>(&mut self, mut source: R) -> Result<(), KeyboardError> {
        let mut data = Vec::with_capacity(BACKUP_LEN + 1);
        // One byte past the limit is enough to tell an oversize source apart
        (&mut source)
            .take(BACKUP_LEN as u64 + 1)
            .read_to_end(&mut data)?;
        if data.len() != BACKUP_LEN {
            warn!("restore: backup is {} bytes", data.len());
            return Err(KeyboardError::BackupSize {
                expected: BACKUP_LEN,
                actual: data.len(),
            });
        }

        let mut offset = 0;
        for (page, index, len) in layout() {
            let chunk = data[offset..offset + len].to_vec();
            self.write_page(&chunk, page, index)?;
            // The device now holds exactly these bytes
            self.cache.insert_clean(PageKey::new(page, index), chunk);
            offset += len;
        }

        info!("Restored {} bytes", offset);
        Ok(())
    }
}
