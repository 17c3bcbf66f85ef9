use std::fmt;
use std::time::Duration;

/// A socket timeout: either disabled or a number of milliseconds.
///
/// Zero milliseconds is the same as disabled, which mirrors what the socket
/// layer does with a zero read timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timeout {
    millis: u64,
}

impl Timeout {
    pub const DISABLED: Timeout = Timeout { millis: 0 };

    pub const fn of_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Sub-millisecond parts are rounded up so a tiny duration never turns
    /// into "disabled".
    pub fn of(duration: Duration) -> Self {
        let mut millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        if duration.subsec_nanos() % 1_000_000 != 0 {
            millis = millis.saturating_add(1);
        }
        Self { millis }
    }

    pub const fn is_disabled(&self) -> bool {
        self.millis == 0
    }

    pub const fn as_millis(&self) -> u64 {
        self.millis
    }

    /// The socket-level form, `None` meaning block without limit.
    pub fn as_duration(&self) -> Option<Duration> {
        (!self.is_disabled()).then(|| Duration::from_millis(self.millis))
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(duration: Option<Duration>) -> Self {
        duration.map_or(Timeout::DISABLED, Timeout::of)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_disabled() { f.write_str("DISABLED") } else { write!(f, "{} MILLISECONDS", self.millis) }
    }
}
