//! Shared utilities for argument processing.

/// What: Determine the log level based on command-line arguments.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Log level string (trace, debug, info, warn, error).
///
/// Details:
/// - Debug and verbose flags override the `log_level` argument.
pub fn determine_log_level(args: &crate::args::Args) -> String {
    if args.debug || args.verbose {
        "debug".to_string()
    } else {
        args.log_level.clone()
    }
}
