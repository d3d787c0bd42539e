//! Report length discovery from a HID report descriptor
//!
//! Only the items that size a report are tracked: report size, report count
//! and report id (with push/pop of the global state). Every Input or Output
//! main item adds `size * count` bits to the report it belongs to.

use std::collections::BTreeMap;

/// Largest input and output report of an interface, in bytes, without the
/// report id prefix. Zero means the interface has no report of that kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportLengths {
    pub input: usize,
    pub output: usize,
}

// Item prefixes with the size bits masked off
const MAIN_INPUT: u8 = 0x80;
const MAIN_OUTPUT: u8 = 0x90;
const GLOBAL_REPORT_SIZE: u8 = 0x74;
const GLOBAL_REPORT_ID: u8 = 0x84;
const GLOBAL_REPORT_COUNT: u8 = 0x94;
const GLOBAL_PUSH: u8 = 0xA4;
const GLOBAL_POP: u8 = 0xB4;
const LONG_ITEM: u8 = 0xFE;

#[derive(Clone, Copy, Default)]
struct Globals {
    size: u32,
    count: u32,
    id: u8,
}

/// Parse `descriptor` and return the largest report of each direction.
///
/// Returns `None` for a truncated descriptor or one without any input or
/// output report.
pub fn report_lengths(descriptor: &[u8]) -> Option<ReportLengths> {
    let mut globals = Globals::default();
    let mut stack = Vec::new();
    let mut input_bits: BTreeMap<u8, u32> = BTreeMap::new();
    let mut output_bits: BTreeMap<u8, u32> = BTreeMap::new();

    let mut pos = 0;
    while pos < descriptor.len() {
        let prefix = descriptor[pos];

        if prefix == LONG_ITEM {
            let size = *descriptor.get(pos + 1)? as usize;
            pos += 3 + size;
            continue;
        }

        let size = match prefix & 0x03 {
            3 => 4,
            n => n as usize,
        };
        let data = descriptor.get(pos + 1..pos + 1 + size)?;
        let value = data
            .iter()
            .rev()
            .fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
        pos += 1 + size;

        match prefix & 0xFC {
            GLOBAL_REPORT_SIZE => globals.size = value,
            GLOBAL_REPORT_COUNT => globals.count = value,
            GLOBAL_REPORT_ID => globals.id = value as u8,
            GLOBAL_PUSH => stack.push(globals),
            GLOBAL_POP => globals = stack.pop()?,
            MAIN_INPUT => {
                *input_bits.entry(globals.id).or_default() +=
                    globals.size.saturating_mul(globals.count)
            }
            MAIN_OUTPUT => {
                *output_bits.entry(globals.id).or_default() +=
                    globals.size.saturating_mul(globals.count)
            }
            _ => {}
        }
    }

    let bytes = |bits: &BTreeMap<u8, u32>| {
        bits.values()
            .map(|b| (*b as usize).div_ceil(8))
            .max()
            .unwrap_or(0)
    };
    let lengths = ReportLengths {
        input: bytes(&input_bits),
        output: bytes(&output_bits),
    };
    (lengths != ReportLengths::default()).then_some(lengths)
}
