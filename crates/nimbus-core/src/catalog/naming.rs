//! Output series naming rules

use std::sync::LazyLock;

use regex::Regex;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static naming pattern"));

// "CPUCredit" -> "CPU_Credit"
static ACRONYM_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("static naming pattern"));

// "CreditBalance" -> "Credit_Balance"
static LOWER_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static naming pattern"));

/// Lower-case, collapse non-alphanumeric runs to one `_`, trim `_` at the ends.
pub fn sanitize_metric_name(name: &str) -> String {
    let lower = name.to_lowercase();
    NON_ALNUM
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}

/// Split CamelCase words and sanitize
pub fn snake_case(name: &str) -> String {
    let split = ACRONYM_WORD.replace_all(name, "${1}_${2}");
    let split = LOWER_UPPER.replace_all(&split, "${1}_${2}");
    sanitize_metric_name(&split)
}

/// Short prefix for a provider namespace
pub fn namespace_prefix(namespace: &str) -> String {
    let bare = namespace.strip_prefix("AWS/").unwrap_or(namespace);
    match bare {
        "ApplicationELB" => "alb".to_string(),
        "NetworkELB" => "nlb".to_string(),
        "ELB" => "elb".to_string(),
        "NATGateway" => "nat_gateway".to_string(),
        "ElastiCache" => "elasticache".to_string(),
        other => snake_case(other),
    }
}

/// `{prefix}_{snake(metric)}`
pub fn default_output_name(namespace: &str, metric_name: &str) -> String {
    format!("{}_{}", namespace_prefix(namespace), snake_case(metric_name))
}
