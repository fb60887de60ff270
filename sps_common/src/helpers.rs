/// Interprets an environment variable value as a boolean flag, returning `default` when the variable is unset or
/// unrecognizable. "1", "true", "yes", "y" and "on" are truthy; "0", "false", "no", "n" and "off" are falsy.
/// Matching is case-insensitive.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let Some(value) = value else {
        return default;
    };
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => true,
        "0" | "false" | "no" | "n" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod test {
    use super::parse_boolean_flag;

    #[test]
    fn boolean_flags() {
        assert!(parse_boolean_flag(Some("1".into()), false));
        assert!(parse_boolean_flag(Some("TRUE".into()), false));
        assert!(parse_boolean_flag(Some(" yes ".into()), false));
        assert!(!parse_boolean_flag(Some("off".into()), true));
        assert!(!parse_boolean_flag(Some("0".into()), true));
        assert!(parse_boolean_flag(None, true));
        assert!(!parse_boolean_flag(Some("banana".into()), false));
    }
}
