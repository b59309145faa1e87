//! Process CPU clock plus a stopwatch that reads it alongside wall time.

use std::time::{Duration, Instant};

/// CPU time consumed by this process so far (all threads, user + system).
#[cfg(unix)]
pub fn process_cpu_time() -> Duration {
    // SAFETY: an all-zero timespec is a valid value, and `ts` stays writable
    // for the duration of the call.
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
    if rc != 0 {
        return Duration::ZERO;
    }
    Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32)
}

/// Without a process CPU clock, fall back to wall time since first use.
#[cfg(not(unix))]
pub fn process_cpu_time() -> Duration {
    use std::sync::OnceLock;
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Elapsed {
    pub cpu: Duration,
    pub wall: Duration,
}

impl Elapsed {
    /// Per-repetition average.
    pub fn per(&self, repetitions: u32) -> Elapsed {
        let n = repetitions.max(1);
        Elapsed {
            cpu: self.cpu / n,
            wall: self.wall / n,
        }
    }
}

pub struct Stopwatch {
    wall: Instant,
    cpu: Duration,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            cpu: process_cpu_time(),
            wall: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Elapsed {
        Elapsed {
            cpu: process_cpu_time().saturating_sub(self.cpu),
            wall: self.wall.elapsed(),
        }
    }
}
