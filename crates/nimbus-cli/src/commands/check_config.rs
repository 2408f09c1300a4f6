//! Configuration validation command

use std::fmt::Write;

use nimbus_aws::{builtin_catalogs, known_namespaces};
use nimbus_core::config::{load_config, resolve_plan};
use nimbus_core::{Config, NamespaceCatalog};

use super::catalog::write_metric;

pub fn check(config_file: &str) -> anyhow::Result<()> {
    let config = load_config(config_file, &known_namespaces())?;
    println!("Configuration {config_file} is valid");
    print!("{}", render(&config, &builtin_catalogs()));
    Ok(())
}

/// Summary of the loaded settings followed by the metric plan
pub fn render(config: &Config, catalogs: &[NamespaceCatalog]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "listen:        {}", config.listen);
    let _ = writeln!(out, "regions:       {}", config.regions.join(", "));
    let _ = writeln!(out, "poll interval: {}s", config.poll_interval);
    let _ = writeln!(out, "concurrency:   {}", config.max_concurrency);
    let filter = config.tag_filter();
    if filter.is_empty() {
        let _ = writeln!(out, "tag filter:    (none)");
    } else {
        let pairs: Vec<String> = filter
            .required()
            .iter()
            .map(|t| format!("{}={}", t.key, t.value))
            .collect();
        let _ = writeln!(out, "tag filter:    {}", pairs.join(", "));
    }
    out.push('\n');

    let plan = resolve_plan(catalogs, config);
    let series: usize = plan
        .iter()
        .flat_map(|(_, metrics)| metrics.iter())
        .map(|m| m.statistics.len())
        .sum();
    for (catalog, metrics) in &plan {
        let _ = writeln!(out, "{} ({} metrics)", catalog.namespace, metrics.len());
        for metric in metrics {
            write_metric(&mut out, metric);
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} namespaces, {} series per region",
        plan.len(),
        series
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    const CONFIG: &str = r#"
api_key: AKIDEXAMPLE
api_secret: secret
regions: [eu-west-1]
tags:
  - name: env
    value: prod
namespaces: [AWS/SQS]
metrics:
  AWS/SQS:
    metrics:
      NumberOfMessagesSent:
        statistics: [Sum]
        output_name: sqs_sent
"#;

    fn write_config(body: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_plan_honours_overrides() {
        let file = write_config(CONFIG);
        let config = load_config(file.path().to_str().unwrap(), &known_namespaces()).unwrap();
        let text = render(&config, &builtin_catalogs());

        assert!(text.contains("tag filter:    env=prod"));
        assert!(text.contains("AWS/SQS"));
        assert!(!text.contains("AWS/EC2"));
        assert!(text.contains("sqs_sent_sum"));
        assert!(text.contains("1 namespaces"));
    }

    #[test]
    fn test_unknown_namespace_is_rejected() {
        let file = write_config(&CONFIG.replace("namespaces: [AWS/SQS]", "namespaces: [AWS/Nope]"));
        assert!(check(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(check(path.to_str().unwrap()).is_err());
    }
}
