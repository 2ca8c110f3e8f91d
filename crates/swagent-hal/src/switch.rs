//! The switch as a whole: the aggregate hardware interface, asynchronous
//! switch events, and the fatal-exit hook.

use std::fmt;

use crate::api::{CosqApi, StatsApi, TxApi};

/// Everything the agent consumes from one switch ASIC.
pub trait SwitchHal: TxApi + StatsApi + CosqApi {
    /// Returns the hardware unit number, used in log messages.
    fn unit(&self) -> u32 {
        0
    }
}

/// Hook run after a fatal error is logged and before the process aborts.
///
/// Implementations typically dump hardware and software state for post-mortem
/// debugging. The process is terminated after `exit_fatal` returns.
pub trait FatalHandler: Send + Sync {
    fn exit_fatal(&self);
}

/// Asynchronous events raised by the switch ASIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchEventKind {
    ParityError,
    StableFull,
    StableError,
    UncontrolledShutdown,
    WarmBootDowngrade,
    MmuBstTrigger,
    Unknown(u32),
}

impl SwitchEventKind {
    /// Maps a raw event id reported by the SDK.
    pub fn from_raw(id: u32) -> Self {
        match id {
            1 => Self::ParityError,
            2 => Self::StableFull,
            3 => Self::StableError,
            4 => Self::UncontrolledShutdown,
            5 => Self::WarmBootDowngrade,
            6 => Self::MmuBstTrigger,
            other => Self::Unknown(other),
        }
    }

    /// Returns the alarm name used for counters and logs.
    pub fn alarm_name(&self) -> String {
        let name = match self {
            Self::ParityError => "PARITY_ERROR",
            Self::StableFull => "STABLE_FULL",
            Self::StableError => "STABLE_ERROR",
            Self::UncontrolledShutdown => "UNCONTROLLED_SHUTDOWN",
            Self::WarmBootDowngrade => "WARM_BOOT_DOWNGRADE",
            Self::MmuBstTrigger => "MMU_BST_TRIGGER",
            Self::Unknown(id) => return format!("UNKNOWN_EVENT_{}", id),
        };
        name.to_string()
    }
}

impl fmt::Display for SwitchEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.alarm_name())
    }
}

/// One event as delivered by the hardware event callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchEvent {
    pub unit: u32,
    pub kind: SwitchEventKind,
    pub args: [u32; 3],
}

impl SwitchEvent {
    pub fn new(unit: u32, kind: SwitchEventKind, args: [u32; 3]) -> Self {
        Self { unit, kind, args }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_from_raw() {
        assert_eq!(SwitchEventKind::from_raw(1), SwitchEventKind::ParityError);
        assert_eq!(SwitchEventKind::from_raw(42), SwitchEventKind::Unknown(42));
    }

    #[test]
    fn test_alarm_names() {
        assert_eq!(SwitchEventKind::StableFull.alarm_name(), "STABLE_FULL");
        assert_eq!(SwitchEventKind::Unknown(9).to_string(), "UNKNOWN_EVENT_9");
    }
}
