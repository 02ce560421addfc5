use std::fmt;

/// 管理端点地址（不透明字符串，仅在目标进程存活期间、同一主机上有效）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementEndpointAddress(String);

impl ManagementEndpointAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ManagementEndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
