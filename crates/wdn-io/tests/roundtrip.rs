//! Import/export round-trip checks.

use wdn_io::{export_inp_file, export_inp_str, import_inp_file, import_inp_str};

const NETWORK: &str = "\
[TITLE]
Round-trip network

[JUNCTIONS]
J1 10.0 25.0
J2 12.5 40.0
J3 8.25 0.0

[RESERVOIRS]
R1 100.0

[TANKS]
T1 80.0 5.5

[PIPES]
P1 R1 J1 1000.0 0.3048 130 0 Open
P2 J1 J2 800.5 0.254 130 0 Open
P3 J2 J3 650.0 0.2032 120 0.5 Closed
P4 T1 J3 600.0 0.1524 110 0 Open

[PUMPS]
PU1 R1 J2 HEAD CURVE1

[VALVES]
V1 J1 J3 0.2 PRV 30

[COORDINATES]
J1 10.0 20.0
J2 30.0 20.0
J3 30.0 5.0

[END]
";

#[test]
fn test_roundtrip_preserves_model() {
    let first = import_inp_str(NETWORK).unwrap().network;
    let text = export_inp_str(&first);
    let second = import_inp_str(&text).unwrap().network;

    assert_eq!(first.title, second.title);
    assert_eq!(first.pipe_names(), second.pipe_names());
    // diameters survive the trip bit-for-bit
    assert_eq!(first.pipe_diameters(), second.pipe_diameters());
    assert_eq!(first.coordinates, second.coordinates);

    let j_first: Vec<_> = first.junctions();
    let j_second: Vec<_> = second.junctions();
    assert_eq!(j_first.len(), j_second.len());
    for (a, b) in j_first.iter().zip(j_second.iter()) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.elevation_m, b.elevation_m);
        assert!((a.base_demand_m3s - b.base_demand_m3s).abs() < 1e-15);
    }

    let p_first = first.pipes();
    let p_second = second.pipes();
    for (a, b) in p_first.iter().zip(p_second.iter()) {
        assert_eq!(a.length_m, b.length_m);
        assert_eq!(a.roughness, b.roughness);
        assert_eq!(a.minor_loss, b.minor_loss);
        assert_eq!(a.status, b.status);
        assert_eq!((a.from_node.as_str(), a.to_node.as_str()), (
            b.from_node.as_str(),
            b.to_node.as_str()
        ));
    }

    // pumps and valves pass their parameter text through untouched
    let text_again = export_inp_str(&second);
    assert_eq!(text, text_again);
}

#[test]
fn test_roundtrip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("network.inp");

    let first = import_inp_str(NETWORK).unwrap().network;
    export_inp_file(&first, &path).unwrap();
    let second = import_inp_file(&path).unwrap().network;

    assert_eq!(first.pipe_diameters(), second.pipe_diameters());
    assert_eq!(first.stats().num_pumps, second.stats().num_pumps);
    assert_eq!(first.stats().num_valves, second.stats().num_valves);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = import_inp_file(std::path::Path::new("/nonexistent/net.inp")).unwrap_err();
    assert!(matches!(err, wdn_core::WdnError::Io(_)));
}
