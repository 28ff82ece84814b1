//! Network exporters.

mod inp;

pub use inp::{export_inp_file, export_inp_str};
