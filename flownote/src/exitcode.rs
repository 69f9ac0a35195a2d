//! Process exit codes

/// Successful termination
pub const OK: i32 = 0;

/// Local failure (I/O, HTTP transport, archive, configuration)
pub const FAILURE: i32 = 1;

/// Usage error, rejected input, remote API error or unsupported value
pub const USAGE: i32 = 2;

/// Highest exit code passed through from a failing external process.
/// Anything above is in the signal range and collapses to [`FAILURE`].
pub const MAX_PASSTHROUGH: i32 = 127;

/// Exit code for a failed external process.
pub fn from_process(code: Option<i32>) -> i32 {
    match code {
        Some(c) if (1..=MAX_PASSTHROUGH).contains(&c) => c,
        _ => FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_process_codes_when_mapped_then_signal_range_collapses() {
        assert_eq!(from_process(Some(1)), 1);
        assert_eq!(from_process(Some(127)), 127);
        assert_eq!(from_process(Some(128)), FAILURE);
        assert_eq!(from_process(Some(255)), FAILURE);
        assert_eq!(from_process(Some(-1)), FAILURE);
        assert_eq!(from_process(None), FAILURE);
    }
}
