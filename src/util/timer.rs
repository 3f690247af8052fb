use std::fmt::Debug;
use std::fmt::Error;
use std::fmt::Formatter;
use std::time::Duration;
use std::time::Instant;

/// Wall-clock timer for phase and benchmark reporting.
#[derive(Clone, Copy, Debug)]
pub struct GcTimer {
    instant: Instant,
}

#[derive(Clone, Copy)]
pub struct GcDuration {
    duration: Duration,
}

impl GcTimer {
    pub fn now() -> Self {
        Self { instant: Instant::now() }
    }

    pub fn elapsed(&self) -> GcDuration {
        GcDuration { duration: self.instant.elapsed() }
    }
}

impl GcDuration {
    pub fn to_millis_string(&self) -> String {
        const MICRO_PER_MILLI: u128 = 1_000;
        format!(
            "{}.{:03} ms",
            self.duration.as_micros() / MICRO_PER_MILLI,
            self.duration.as_micros() % MICRO_PER_MILLI
        )
    }

    pub fn to_seconds_string(&self) -> String {
        format!("{}.{:06} s", self.duration.as_secs(), self.duration.subsec_micros())
    }

    /// Seconds as a float with nanosecond resolution. Throughput figures
    /// divide by this value, never by a mixed-unit count.
    pub fn as_seconds_f64(&self) -> f64 {
        self.duration.as_nanos() as f64 / 1_000_000_000.0
    }
}

impl Debug for GcDuration {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{:?}", self.duration)
    }
}

#[cfg(test)]
mod tests {
    use crate::util::timer::GcDuration;
    use std::time::Duration;

    #[test]
    fn string_format() {
        let inputs = vec![
            (0, 7_106_780, "0.007106 s", "7.106 ms"),
            (152, 628_093_000, "152.628093 s", "152628.093 ms"),
        ];
        for (sec, nano, sec_str, milli_str) in inputs {
            let duration = GcDuration { duration: Duration::new(sec, nano) };
            assert_eq!(duration.to_seconds_string(), sec_str);
            assert_eq!(duration.to_millis_string(), milli_str);
        }
    }

    #[test]
    fn seconds_f64_uses_nanoseconds() {
        let duration = GcDuration { duration: Duration::new(2, 500_000_000) };
        assert!((duration.as_seconds_f64() - 2.5).abs() < 1e-12);
    }
}
