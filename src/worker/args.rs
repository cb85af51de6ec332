//! Worker argument vectors.

/// Split a whitespace-delimited argument string.
pub fn split_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Guarantee a non-empty argument vector.
///
/// An empty vector is replaced by `[program]`.
pub fn with_default_program(args: Vec<String>, program: &str) -> Vec<String> {
    if args.is_empty() {
        vec![program.to_string()]
    } else {
        args
    }
}

/// Pick the service arguments: start-request arguments win when there is
/// more than just the program name, otherwise the configured defaults.
pub fn service_args(start_args: Vec<String>, defaults: &[String]) -> Vec<String> {
    if start_args.len() > 1 {
        start_args
    } else {
        defaults.to_vec()
    }
}
