//! # wdn-io: Network File Import and Export
//!
//! Reads and writes the sectioned INP text format: `[JUNCTIONS]`,
//! `[RESERVOIRS]`, `[TANKS]`, `[PIPES]`, `[PUMPS]`, `[VALVES]`,
//! `[COORDINATES]`, `[OPTIONS]`. Import produces a [`wdn_core::Network`]
//! plus [`wdn_core::Diagnostics`] describing anything suspicious; export
//! reproduces a file that imports back to the same model.
//!
//! Units on the wire: elevations, heads, lengths and diameters in meters,
//! demands in liters per second.

pub mod exporters;
pub mod importers;

pub use exporters::{export_inp_file, export_inp_str};
pub use importers::{import_inp_file, import_inp_str, ImportResult};
