//! Log behaviour flags.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// One cross-cutting log toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogFlag {
    /// Log an info line with the URI before the first attempt.
    Request,
    /// Log an info line with the URI after a successful call.
    Response,
    /// Do not log failures at all.
    NoError,
    /// Log failures at info level instead of error level.
    ErrorToInfo,
    /// Do not log a bad status when it is `401`.
    NoUnauthorized,
    /// Do not log a bad status when it is `403`.
    NoForbidden,
    /// Do not log bad statuses.
    NoBadStatus,
}

impl LogFlag {
    /// All flags, in declaration order.
    pub const ALL: [LogFlag; 7] = [
        LogFlag::Request,
        LogFlag::Response,
        LogFlag::NoError,
        LogFlag::ErrorToInfo,
        LogFlag::NoUnauthorized,
        LogFlag::NoForbidden,
        LogFlag::NoBadStatus,
    ];

    const fn bit(self) -> u8 {
        match self {
            LogFlag::Request => 1,
            LogFlag::Response => 1 << 1,
            LogFlag::NoError => 1 << 2,
            LogFlag::ErrorToInfo => 1 << 3,
            LogFlag::NoUnauthorized => 1 << 4,
            LogFlag::NoForbidden => 1 << 5,
            LogFlag::NoBadStatus => 1 << 6,
        }
    }

    /// Configuration name of the flag.
    pub fn name(self) -> &'static str {
        match self {
            LogFlag::Request => "request",
            LogFlag::Response => "response",
            LogFlag::NoError => "no_error",
            LogFlag::ErrorToInfo => "error_to_info",
            LogFlag::NoUnauthorized => "no_unauthorized",
            LogFlag::NoForbidden => "no_forbidden",
            LogFlag::NoBadStatus => "no_bad_status",
        }
    }

    /// Parse a flag from its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Set of [`LogFlag`]s.
///
/// ```
/// use courier_http_client::{LogFlag, LogFlags};
///
/// let flags = LogFlag::Request | LogFlag::Response;
/// assert!(flags.contains(LogFlag::Request));
/// assert!(!flags.contains(LogFlag::NoError));
/// assert!(LogFlags::empty().is_empty());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LogFlags(u8);

impl LogFlags {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check if the flag is in the set.
    pub const fn contains(self, flag: LogFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Return the set with `flag` added.
    pub const fn with(self, flag: LogFlag) -> Self {
        Self(self.0 | flag.bit())
    }

    /// Check if no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the flags in the set.
    pub fn iter(self) -> impl Iterator<Item = LogFlag> {
        LogFlag::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl fmt::Debug for LogFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl From<LogFlag> for LogFlags {
    fn from(flag: LogFlag) -> Self {
        Self::empty().with(flag)
    }
}

impl FromIterator<LogFlag> for LogFlags {
    fn from_iter<I: IntoIterator<Item = LogFlag>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), LogFlags::with)
    }
}

impl BitOr for LogFlag {
    type Output = LogFlags;

    fn bitor(self, rhs: LogFlag) -> LogFlags {
        LogFlags::from(self).with(rhs)
    }
}

impl BitOr<LogFlag> for LogFlags {
    type Output = LogFlags;

    fn bitor(self, rhs: LogFlag) -> LogFlags {
        self.with(rhs)
    }
}

impl BitOr for LogFlags {
    type Output = LogFlags;

    fn bitor(self, rhs: LogFlags) -> LogFlags {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign<LogFlag> for LogFlags {
    fn bitor_assign(&mut self, rhs: LogFlag) {
        *self = self.with(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_combine() {
        let mut flags = LogFlag::NoUnauthorized | LogFlag::NoForbidden;
        flags |= LogFlag::ErrorToInfo;

        assert!(flags.contains(LogFlag::NoUnauthorized));
        assert!(flags.contains(LogFlag::NoForbidden));
        assert!(flags.contains(LogFlag::ErrorToInfo));
        assert!(!flags.contains(LogFlag::Request));
        assert_eq!(flags.iter().count(), 3);
    }

    #[test]
    fn test_flags_are_independent() {
        for flag in LogFlag::ALL {
            let set = LogFlags::from(flag);
            for other in LogFlag::ALL {
                assert_eq!(set.contains(other), flag == other);
            }
        }
    }

    #[test]
    fn test_flag_names_round_trip() {
        assert_eq!(LogFlag::from_name("no-bad-status"), Some(LogFlag::NoBadStatus));
        assert_eq!(LogFlag::from_name(" Request "), Some(LogFlag::Request));
        assert_eq!(LogFlag::from_name("verbose"), None);
    }

    #[test]
    fn test_collect_flags() {
        let flags: LogFlags = [LogFlag::Request, LogFlag::Response].into_iter().collect();
        assert_eq!(flags, LogFlag::Request | LogFlag::Response);
        assert_eq!(format!("{:?}", flags), "{Request, Response}");
    }
}
