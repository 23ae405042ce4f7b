use std::io;
use tokio::process::Command;
use tracing::debug;

use super::GroupSignal;

/// Put the child in its own process group and, on Linux, pin it to `cpus`.
///
/// Both happen between fork and exec, so only the solver (and whatever it
/// forks) is affected; the harness keeps its own affinity.
pub(crate) fn isolate(command: &mut Command, cpus: Option<&[usize]>) {
    #[cfg(target_os = "linux")]
    let cpu_set = cpus.map(build_cpu_set);
    #[cfg(not(target_os = "linux"))]
    let _ = cpus;

    // SAFETY: the closure only calls async-signal-safe libc functions and
    // does not allocate.
    unsafe {
        command.pre_exec(move || {
            if libc::setpgid(0, 0) != 0 {
                return Err(io::Error::last_os_error());
            }
            #[cfg(target_os = "linux")]
            if let Some(set) = cpu_set.as_ref() {
                if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
            Ok(())
        });
    }
}

#[cfg(target_os = "linux")]
fn build_cpu_set(cpus: &[usize]) -> libc::cpu_set_t {
    // SAFETY: cpu_set_t is a plain bitmask; all-zero is the empty set.
    let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    for &cpu in cpus {
        // SAFETY: callers validate cpu < CPU_SETSIZE.
        unsafe { libc::CPU_SET(cpu, &mut set) };
    }
    set
}

/// Largest CPU index + 1 accepted for pinning.
pub(crate) fn cpu_limit() -> Option<usize> {
    #[cfg(target_os = "linux")]
    {
        Some(libc::CPU_SETSIZE as usize)
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Signal every process in the group led by `pid`. ESRCH (group already
/// gone) is expected and ignored.
pub(crate) fn signal_group(pid: u32, signal: GroupSignal) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    let pgid = Pid::from_raw(raw);
    let sig = match signal {
        GroupSignal::Terminate => Signal::SIGTERM,
        GroupSignal::Kill => Signal::SIGKILL,
    };

    if let Err(errno) = killpg(pgid, sig) {
        if errno != nix::errno::Errno::ESRCH {
            debug!(pid, signal = ?sig, error = %errno, "killpg failed");
        }
    }
}
