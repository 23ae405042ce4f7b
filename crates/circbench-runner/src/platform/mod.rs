//! Process isolation and group signalling.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub(crate) use unix::{cpu_limit, isolate, signal_group};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupSignal {
    Terminate,
    Kill,
}

/// Without process groups only the direct child can be killed, which the
/// supervisor does through `Child::start_kill`.
#[cfg(not(unix))]
pub(crate) fn isolate(_command: &mut tokio::process::Command, _cpus: Option<&[usize]>) {}

#[cfg(not(unix))]
pub(crate) fn signal_group(_pid: u32, _signal: GroupSignal) {}

#[cfg(not(unix))]
pub(crate) fn cpu_limit() -> Option<usize> {
    None
}
