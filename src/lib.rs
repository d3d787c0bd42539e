// HV-KB390L configuration tool - shared library
// Config file handling and the macro sequence syntax used by the CLI

pub mod config;
pub mod macro_seq;

pub use config::{Config, EventsConfig};
pub use macro_seq::{MacroSeq, MacroStep, ParseMacroSeqError};
