//! Non-blocking report sources.

use head_types::REPORT_SIZE;

/// Upper bound on reads per [`drain_latest`] call.
///
/// A source that never reports "empty" would otherwise stall the loop.
pub const MAX_DRAIN: usize = 256;

/// A non-blocking source of raw sensor reports.
///
/// `read_report` copies at most one report into `buf` and returns the
/// number of bytes written. Zero means nothing is queued right now, which
/// is not an error.
///
/// Closures of the right shape are sources too:
///
/// ```
/// use head_fusion::ReportSource;
///
/// let mut empty = |_buf: &mut [u8]| 0usize;
/// let mut buf = [0u8; 64];
/// assert_eq!(empty.read_report(&mut buf), 0);
/// ```
pub trait ReportSource {
    /// Reads one queued report into `buf`, returning its length.
    fn read_report(&mut self, buf: &mut [u8]) -> usize;
}

impl<F> ReportSource for F
where
    F: FnMut(&mut [u8]) -> usize,
{
    fn read_report(&mut self, buf: &mut [u8]) -> usize {
        self(buf)
    }
}

/// Reads every queued report and keeps only the newest.
///
/// Orientation is a continuous signal, so stale reports carry no value.
/// Returns the length of the newest report copied into `out`, or zero if
/// nothing was queued.
pub fn drain_latest<S: ReportSource + ?Sized>(source: &mut S, out: &mut [u8; REPORT_SIZE]) -> usize {
    let mut scratch = [0u8; REPORT_SIZE];
    let mut latest = 0;
    for _ in 0..MAX_DRAIN {
        let n = source.read_report(&mut scratch).min(REPORT_SIZE);
        if n == 0 {
            break;
        }
        out[..n].copy_from_slice(&scratch[..n]);
        latest = n;
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn queue(reports: &[u8]) -> impl FnMut(&mut [u8]) -> usize {
        let mut q: VecDeque<u8> = reports.iter().copied().collect();
        move |buf: &mut [u8]| match q.pop_front() {
            Some(tag) => {
                buf[..REPORT_SIZE].fill(tag);
                REPORT_SIZE
            }
            None => 0,
        }
    }

    #[test]
    fn keeps_newest_report() {
        let mut source = queue(&[1, 2, 3]);
        let mut out = [0u8; REPORT_SIZE];
        assert_eq!(drain_latest(&mut source, &mut out), REPORT_SIZE);
        assert!(out.iter().all(|&b| b == 3));
        assert_eq!(drain_latest(&mut source, &mut out), 0);
    }

    #[test]
    fn empty_source_leaves_buffer() {
        let mut source = queue(&[]);
        let mut out = [9u8; REPORT_SIZE];
        assert_eq!(drain_latest(&mut source, &mut out), 0);
        assert_eq!(out[0], 9);
    }

    #[test]
    fn endless_source_is_bounded() {
        let mut calls = 0usize;
        let mut source = |buf: &mut [u8]| {
            calls += 1;
            buf[0] = 1;
            20
        };
        let mut out = [0u8; REPORT_SIZE];
        assert_eq!(drain_latest(&mut source, &mut out), 20);
        assert_eq!(calls, MAX_DRAIN);
    }
}
