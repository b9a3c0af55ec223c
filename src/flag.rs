//! Follow-up flag translation
//!
//! Exchange stores follow-up state as raw MAPI integers (the follow-up
//! icon and the flag status), while the EWS item model exposes its own
//! status enum. These conversions are total: an unknown value maps to
//! a safe default instead of failing, since flags are advisory and must
//! never stop a migration.

use std::fmt;

/// MAPI property tag holding the follow-up icon code.
pub const PID_TAG_FOLLOWUP_ICON: u32 = 0x1095;

/// MAPI property tag holding the follow-up flag status code.
pub const PID_TAG_FLAG_STATUS: u32 = 0x1090;

/// An Outlook 2003 style follow-up flag colour.
///
/// # Examples
///
/// ```
/// use ews_discovery::FlagIcon;
///
/// assert_eq!(FlagIcon::from_code(3), FlagIcon::Green);
/// assert_eq!(FlagIcon::Green.code(), 3);
/// assert_eq!(FlagIcon::from_code(42), FlagIcon::Red);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagIcon {
    Purple,
    Orange,
    Green,
    Yellow,
    Blue,
    /// Also the fallback for unknown codes.
    Red,
}

impl FlagIcon {
    /// Decode a `PidTagFollowupIcon` value.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Purple,
            2 => Self::Orange,
            3 => Self::Green,
            4 => Self::Yellow,
            5 => Self::Blue,
            _ => Self::Red,
        }
    }

    /// Encode as a `PidTagFollowupIcon` value.
    ///
    /// Red has no explicit code and lands one past the last one (6).
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Purple => 1,
            Self::Orange => 2,
            Self::Green => 3,
            Self::Yellow => 4,
            Self::Blue => 5,
            Self::Red => 6,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for FlagIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follow-up status as written on the migration side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FollowUpStatus {
    Complete,
    Flagged,
    #[default]
    NotFlagged,
}

impl FollowUpStatus {
    /// Decode a raw `PidTagFlagStatus` value.
    #[must_use]
    pub const fn from_mapi(value: i32) -> Self {
        match value {
            1 => Self::Complete,
            2 => Self::Flagged,
            _ => Self::NotFlagged,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Flagged => "flagged",
            Self::NotFlagged => "not-flagged",
        }
    }
}

impl fmt::Display for FollowUpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follow-up status as exposed by the EWS item model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemFlagStatus {
    Complete,
    Flagged,
    #[default]
    NotFlagged,
}

impl ItemFlagStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "Complete",
            Self::Flagged => "Flagged",
            Self::NotFlagged => "NotFlagged",
        }
    }
}

impl fmt::Display for ItemFlagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FollowUpStatus> for ItemFlagStatus {
    fn from(status: FollowUpStatus) -> Self {
        match status {
            FollowUpStatus::Complete => Self::Complete,
            FollowUpStatus::Flagged => Self::Flagged,
            FollowUpStatus::NotFlagged => Self::NotFlagged,
        }
    }
}

impl From<ItemFlagStatus> for FollowUpStatus {
    fn from(status: ItemFlagStatus) -> Self {
        match status {
            ItemFlagStatus::Complete => Self::Complete,
            ItemFlagStatus::Flagged => Self::Flagged,
            ItemFlagStatus::NotFlagged => Self::NotFlagged,
        }
    }
}
