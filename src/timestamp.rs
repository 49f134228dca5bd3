const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Returns the current `CLOCK_MONOTONIC` time in nanoseconds since an
/// arbitrary epoch, or zero if the clock is unavailable.
///
/// Every record in a jitdump file carries one of these timestamps, and the
/// consuming profiler correlates them with the timestamps in its own sample
/// stream. Zero at startup is treated as fatal by the listener because the
/// protocol requires comparable timestamps across records.
pub fn monotonic_timestamp() -> u64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let ret = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
    if ret != 0 {
        return 0;
    }
    ts.tv_sec as u64 * NANOS_PER_SEC + ts.tv_nsec as u64
}
