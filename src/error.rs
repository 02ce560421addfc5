use std::time::Duration;
use thiserror::Error;

pub type ProbeResult<T> = Result<T, ProbeError>;

/// 单次探测可能出现的所有错误（均不重试）
#[derive(Debug, Error)]
pub enum ProbeError {
    /// 进程列表工具未在限定时间内结束
    #[error("Process discovery timed out: '{command}' did not finish within {timeout:?}")]
    DiscoveryTimeout { command: String, timeout: Duration },

    #[error("Target process not found: no listed process matches '{target}'")]
    ProcessNotFound { target: String },

    #[error("Malformed process line '{line}': {reason}")]
    MalformedProcessLine { line: String, reason: String },

    #[error("No management endpoint for pid {pid}: {reason}")]
    EndpointUnavailable { pid: u32, reason: String },

    #[error("Connection to management endpoint '{address}' failed: {reason}")]
    ConnectionFailure { address: String, reason: String },

    #[error("Invalid object name '{name}': {reason}")]
    ObjectNameInvalid { name: String, reason: String },

    #[error("Interrupted while waiting for '{command}'")]
    InterruptedWait { command: String },

    #[error("Management object '{name}' not found: {reason}")]
    ObjectNotFound { name: String, reason: String },

    #[error("Attribute '{attribute}' of '{name}' could not be read: {reason}")]
    AttributeUnreadable {
        name: String,
        attribute: String,
        reason: String,
    },

    #[error("Process listing '{command}' failed: {reason}")]
    ListingFailed { command: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    pub fn malformed_line(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedProcessLine {
            line: line.into(),
            reason: reason.into(),
        }
    }

    pub fn endpoint_unavailable(pid: u32, reason: impl Into<String>) -> Self {
        Self::EndpointUnavailable {
            pid,
            reason: reason.into(),
        }
    }

    pub fn connection_failure(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectionFailure {
            address: address.into(),
            reason: reason.into(),
        }
    }

    pub fn object_name_invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ObjectNameInvalid {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn attribute_unreadable(
        name: impl Into<String>,
        attribute: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::AttributeUnreadable {
            name: name.into(),
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }
}
