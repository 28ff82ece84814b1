//! Network importers.

mod inp;

pub use inp::{import_inp_file, import_inp_str, ImportResult};
