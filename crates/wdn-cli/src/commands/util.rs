use anyhow::{anyhow, bail, Result};
use rayon::ThreadPoolBuilder;
use tracing::warn;
use wdn_core::Network;
use wdn_io::ImportResult;
use wdn_sim::DemandModel;

pub fn configure_threads(spec: &str) {
    let count = if spec.eq_ignore_ascii_case("auto") {
        num_cpus::get()
    } else {
        spec.parse().unwrap_or_else(|_| num_cpus::get())
    };
    let _ = ThreadPoolBuilder::new().num_threads(count).build_global();
}

/// Unpack an import, surfacing warnings and refusing broken networks.
pub fn check_import(result: ImportResult) -> Result<Network> {
    for warning in result.diagnostics.warnings() {
        warn!(category = warning.category.as_str(), "{}", warning.message);
    }
    if result.diagnostics.has_errors() {
        for error in result.diagnostics.errors() {
            tracing::error!(category = error.category.as_str(), "{}", error.message);
        }
        bail!("network failed validation; see errors above");
    }
    Ok(result.network)
}

pub fn parse_demand_model(spec: &str) -> Result<DemandModel> {
    match spec.to_ascii_lowercase().as_str() {
        "pdd" | "pressure" => Ok(DemandModel::PressureDependent),
        "dd" | "demand" => Ok(DemandModel::DemandDriven),
        other => Err(anyhow!("unknown demand model '{other}' (expected pdd or dd)")),
    }
}

/// Split a comma-separated pipe list; empty input means "all pipes".
pub fn parse_pipe_list(spec: Option<&String>) -> Option<Vec<String>> {
    let names: Vec<String> = spec
        .map_or("", String::as_str)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_demand_model() {
        assert_eq!(
            parse_demand_model("PDD").unwrap(),
            DemandModel::PressureDependent
        );
        assert_eq!(parse_demand_model("dd").unwrap(), DemandModel::DemandDriven);
        assert!(parse_demand_model("bogus").is_err());
    }

    #[test]
    fn test_parse_pipe_list() {
        assert_eq!(parse_pipe_list(None), None);
        assert_eq!(parse_pipe_list(Some(&" ".to_string())), None);
        assert_eq!(
            parse_pipe_list(Some(&"P1, P2 ,P3".to_string())),
            Some(vec!["P1".into(), "P2".into(), "P3".into()])
        );
    }
}
