//! Environment variable parsing with warn-level logging for invalid values.

/// Parse a variable from `lookup` with a default fallback.
///
/// `lookup` is `std::env::var` in production and a fixed table in tests.
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns `default`.
pub fn lookup_parse_with_default<T, F>(lookup: F, var: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(v) => match v.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| (*v).to_owned())
    }

    #[test]
    fn test_parse_valid_value() {
        let lookup = lookup_from(&[("PASSES", "42")]);
        let result: u32 = lookup_parse_with_default(lookup, "PASSES", 10);
        assert_eq!(result, 42);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let lookup = lookup_from(&[("PASSES", " 7 ")]);
        let result: u32 = lookup_parse_with_default(lookup, "PASSES", 10);
        assert_eq!(result, 7);
    }

    #[test]
    fn test_parse_invalid_value() {
        let lookup = lookup_from(&[("PASSES", "banana")]);
        let result: u32 = lookup_parse_with_default(lookup, "PASSES", 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn test_parse_missing_var() {
        let lookup = lookup_from(&[]);
        let result: u32 = lookup_parse_with_default(lookup, "PASSES", 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn test_parse_empty_value() {
        let lookup = lookup_from(&[("PASSES", "")]);
        let result: u32 = lookup_parse_with_default(lookup, "PASSES", 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn test_process_env_lookup_missing_var() {
        let result: u64 = lookup_parse_with_default(
            |key| std::env::var(key).ok(),
            "REWARDS_DEDUP_TEST_UNSET_58213",
            5,
        );
        assert_eq!(result, 5);
    }
}
