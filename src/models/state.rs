use std::fmt;

/// Broker 生命周期状态码
///
/// 探针只做透传：未知值（包括保留的 4 和 5）原样输出，不视为错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrokerStateCode(pub i32);

impl BrokerStateCode {
    pub const NOT_RUNNING: Self = Self(0);
    pub const STARTING: Self = Self(1);
    pub const RECOVERING_FROM_UNCLEAN_SHUTDOWN: Self = Self(2);
    pub const RUNNING: Self = Self(3);
    pub const PENDING_CONTROLLED_SHUTDOWN: Self = Self(6);
    pub const SHUTTING_DOWN: Self = Self(7);

    pub fn code(&self) -> i32 {
        self.0
    }

    /// 已知状态的名称，仅用于日志
    pub fn describe(&self) -> Option<&'static str> {
        match *self {
            Self::NOT_RUNNING => Some("NotRunning"),
            Self::STARTING => Some("Starting"),
            Self::RECOVERING_FROM_UNCLEAN_SHUTDOWN => Some("RecoveringFromUncleanShutdown"),
            Self::RUNNING => Some("RunningAsBroker"),
            Self::PENDING_CONTROLLED_SHUTDOWN => Some("PendingControlledShutdown"),
            Self::SHUTTING_DOWN => Some("BrokerShuttingDown"),
            _ => None,
        }
    }
}

impl fmt::Display for BrokerStateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
