//! Hardware status codes and error taxonomy.
//!
//! Every call into the hardware layer reports a raw status. This module turns
//! those statuses into [`HwError`], which classifies them the way the agent
//! reacts to them:
//!
//! - [`HwError::ResourceExhausted`]: buffers or queues are full; the caller may retry.
//! - [`HwError::Unsupported`]: the platform cannot do what was asked.
//! - [`HwError::Transient`]: any other failure; logged and counted, never fatal.
//! - [`HwError::Fatal`]: the hardware declared itself unrecoverable.

use std::fmt;

use log::error;
use thiserror::Error;

/// Hardware status codes as reported by the switch SDK.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwStatus {
    Success = 0,
    Failure = -1,
    NotSupported = -2,
    NoMemory = -3,
    InsufficientResources = -4,
    InvalidParameter = -5,
    ItemAlreadyExists = -6,
    ItemNotFound = -7,
    Busy = -8,
    Timeout = -9,
    QueueFull = -10,
    Uninitialized = -12,
    TableFull = -13,
    NotImplemented = -15,
    InternalError = -20,
    HwTableFull = -22,
    NotExecuted = -23,
    /// The device reported an unrecoverable condition (parity storm, lost PCIe link...).
    Fatal = -100,
}

impl HwStatus {
    /// Creates a HwStatus from a raw i32 value.
    ///
    /// Unknown negative codes collapse to [`HwStatus::Failure`].
    pub fn from_raw(status: i32) -> Self {
        match status {
            0 => HwStatus::Success,
            -1 => HwStatus::Failure,
            -2 => HwStatus::NotSupported,
            -3 => HwStatus::NoMemory,
            -4 => HwStatus::InsufficientResources,
            -5 => HwStatus::InvalidParameter,
            -6 => HwStatus::ItemAlreadyExists,
            -7 => HwStatus::ItemNotFound,
            -8 => HwStatus::Busy,
            -9 => HwStatus::Timeout,
            -10 => HwStatus::QueueFull,
            -12 => HwStatus::Uninitialized,
            -13 => HwStatus::TableFull,
            -15 => HwStatus::NotImplemented,
            -20 => HwStatus::InternalError,
            -22 => HwStatus::HwTableFull,
            -23 => HwStatus::NotExecuted,
            -100 => HwStatus::Fatal,
            _ => HwStatus::Failure,
        }
    }

    /// Returns the raw status code.
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Returns true if the status indicates success.
    pub fn is_success(&self) -> bool {
        *self == HwStatus::Success
    }

    /// Returns true if the status indicates an error.
    pub fn is_error(&self) -> bool {
        *self != HwStatus::Success
    }

    /// Returns true for statuses meaning "out of buffers / queue space".
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(
            self,
            HwStatus::NoMemory | HwStatus::InsufficientResources | HwStatus::QueueFull
        )
    }

    /// Returns true if the hardware classified the condition as unrecoverable.
    pub fn is_fatal(&self) -> bool {
        *self == HwStatus::Fatal
    }

    /// Converts to a Result, returning Ok(()) for success.
    pub fn into_result(self) -> HwResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(HwError::from_status(self))
        }
    }
}

impl fmt::Display for HwStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HwStatus::Success => "HW_E_NONE",
            HwStatus::Failure => "HW_E_FAIL",
            HwStatus::NotSupported => "HW_E_UNAVAIL",
            HwStatus::NoMemory => "HW_E_MEMORY",
            HwStatus::InsufficientResources => "HW_E_RESOURCE",
            HwStatus::InvalidParameter => "HW_E_PARAM",
            HwStatus::ItemAlreadyExists => "HW_E_EXISTS",
            HwStatus::ItemNotFound => "HW_E_NOT_FOUND",
            HwStatus::Busy => "HW_E_BUSY",
            HwStatus::Timeout => "HW_E_TIMEOUT",
            HwStatus::QueueFull => "HW_E_QUEUE_FULL",
            HwStatus::Uninitialized => "HW_E_INIT",
            HwStatus::TableFull => "HW_E_FULL",
            HwStatus::NotImplemented => "HW_E_UNIMPL",
            HwStatus::InternalError => "HW_E_INTERNAL",
            HwStatus::HwTableFull => "HW_E_TABLE_FULL",
            HwStatus::NotExecuted => "HW_E_NOT_EXECUTED",
            HwStatus::Fatal => "HW_E_FATAL",
        };
        write!(f, "{}", s)
    }
}

/// Error type for hardware operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HwError {
    /// Hardware buffers or queues are exhausted. Retryable.
    #[error("{context}: hardware resources exhausted ({status})")]
    ResourceExhausted { status: HwStatus, context: String },

    /// The platform or port role does not support the operation.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// The requested item was not found.
    #[error("Item not found: {item}")]
    NotFound { item: String },

    /// Invalid parameter passed to the hardware layer.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Any other failure; the request failed but the process keeps running.
    #[error("{context}: {status} ({code})", code = status.as_raw())]
    Transient { status: HwStatus, context: String },

    /// The hardware reported an unrecoverable condition.
    #[error("{context}: fatal hardware error ({status})")]
    Fatal { status: HwStatus, context: String },
}

impl HwError {
    /// Classifies a failing status.
    pub fn from_status(status: HwStatus) -> Self {
        Self::from_status_with_context(status, "hardware operation failed")
    }

    /// Classifies a failing status, attaching a description of the failed call.
    pub fn from_status_with_context(status: HwStatus, context: impl Into<String>) -> Self {
        let context = context.into();
        match status {
            s if s.is_resource_exhausted() => HwError::ResourceExhausted { status, context },
            HwStatus::NotSupported | HwStatus::NotImplemented => {
                HwError::Unsupported { operation: context }
            }
            HwStatus::ItemNotFound => HwError::NotFound { item: context },
            HwStatus::InvalidParameter => HwError::InvalidParameter { message: context },
            HwStatus::Fatal => HwError::Fatal { status, context },
            _ => HwError::Transient { status, context },
        }
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        HwError::Unsupported {
            operation: operation.into(),
        }
    }

    /// Creates a not found error with an item description.
    pub fn not_found(item: impl Into<String>) -> Self {
        HwError::NotFound { item: item.into() }
    }

    /// Creates an invalid parameter error with a message.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        HwError::InvalidParameter {
            message: message.into(),
        }
    }

    /// Returns the underlying status when one is known.
    pub fn status(&self) -> Option<HwStatus> {
        match self {
            HwError::ResourceExhausted { status, .. }
            | HwError::Transient { status, .. }
            | HwError::Fatal { status, .. } => Some(*status),
            HwError::Unsupported { .. } => Some(HwStatus::NotSupported),
            HwError::NotFound { .. } => Some(HwStatus::ItemNotFound),
            HwError::InvalidParameter { .. } => Some(HwStatus::InvalidParameter),
        }
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HwError::ResourceExhausted { .. }
                | HwError::Transient {
                    status: HwStatus::Busy | HwStatus::Timeout | HwStatus::NotExecuted,
                    ..
                }
        )
    }

    /// Returns true if this error must bring the process down.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HwError::Fatal { .. })
    }
}

/// Result type for hardware operations.
pub type HwResult<T> = Result<T, HwError>;

/// Extension trait for converting raw status codes.
pub trait HwStatusExt {
    /// Converts a raw status code to a Result.
    fn to_result(self) -> HwResult<()>;
}

impl HwStatusExt for i32 {
    fn to_result(self) -> HwResult<()> {
        HwStatus::from_raw(self).into_result()
    }
}

/// Logs a failing status and converts it into a typed error.
pub fn check_error(status: HwStatus, context: &str) -> HwResult<()> {
    if status.is_error() {
        error!("{}: {}, {}", context, status, status.as_raw());
        return Err(HwError::from_status_with_context(status, context));
    }
    Ok(())
}

/// Logs a failing status without turning it into an error.
///
/// Returns true if the status was a failure.
pub fn log_error(status: HwStatus, context: &str) -> bool {
    if status.is_error() {
        error!("{}: {}, {}", context, status, status.as_raw());
        return true;
    }
    false
}
