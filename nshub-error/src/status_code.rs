use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde_repr")]
use serde_repr::{Deserialize_repr, Serialize_repr};
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Status codes used to categorize hub errors.
///
/// # Ranges:
/// - 1xxx: General errors
/// - 3xxx: Tree topology
/// - 5xxx: Listener delivery
/// - 6xxx: Configuration
///
/// # Implementation:
/// - `num_enum::TryFromPrimitive` provides `TryFrom<u32>`.
/// - optional: `strum` for `AsRefStr`/`EnumIter` (feature = "strum").
/// - optional: `serde_repr` to serialize as the numeric value
///   (feature = "serde_repr").
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[cfg_attr(feature = "serde_repr", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 1xxx: General ===
    Internal = 1000,
    InvalidArgs = 1001,

    // === 3xxx: Tree topology ===
    CycleDetected = 3000,
    DepthLimit = 3001,

    // === 5xxx: Listener delivery ===
    ListenerFailed = 5000,
    HookFailed = 5001,

    // === 6xxx: Configuration ===
    ConfigInvalid = 6000,
    ConfigLoadFailed = 6001,
}

/// Level at which an unhandled error is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl StatusCode {
    /// Numeric representation of the status code.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Recommended log level for the code.
    ///
    /// Caller mistakes stay at `info`; failures inside listeners, hooks or
    /// the tree itself are errors.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::InvalidArgs => LogLevel::Info,
            Self::DepthLimit | Self::ConfigInvalid | Self::ConfigLoadFailed => LogLevel::Warn,
            Self::Internal | Self::CycleDetected | Self::ListenerFailed | Self::HookFailed => {
                LogLevel::Error
            }
        }
    }
}

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        #[cfg(feature = "strum")]
        {
            write!(f, "{} ({})", self.as_ref(), self.code())
        }
        #[cfg(not(feature = "strum"))]
        {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}
