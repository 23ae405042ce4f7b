//! Exit code constants for circbench.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Campaign finished (or nothing left to do) |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 9 | `LOCK_HELD` | Another process holds the ledger lock |
//! | 70 | `SOLVER_UNAVAILABLE` | The solver could not be started repeatedly |
//! | 74 | `LEDGER_IO` | The ledger could not be read or written |
//! | 130 | `INTERRUPTED` | Stopped by Ctrl-C / SIGTERM |

/// Exit codes matching the documented exit code table.
///
/// The numeric values are part of the public API so that batch scripts can
/// tell "interrupted, resume me" apart from "broken, look at me".
///
/// ```rust
/// use circbench_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::from_i32(130), ExitCode::INTERRUPTED);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - campaign completed or was already complete
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments or configuration invalid
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Lock held - another campaign owns the ledger directory
    pub const LOCK_HELD: ExitCode = ExitCode(9);

    /// The solver binary repeatedly failed to spawn
    pub const SOLVER_UNAVAILABLE: ExitCode = ExitCode(70);

    /// Ledger unwritable (sysexits `EX_IOERR`)
    pub const LEDGER_IO: ExitCode = ExitCode(74);

    /// Interrupted by a signal (128 + SIGINT)
    pub const INTERRUPTED: ExitCode = ExitCode(130);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
