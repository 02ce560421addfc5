use std::fmt;
use std::str::FromStr;

use crate::error::ProbeError;

/// 进程列表中的一行：`<pid> <命令名>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    /// 进程 ID
    pub pid: u32,
    /// 命令名（pid 之后的剩余部分，可能为空）
    pub command: String,
}

impl FromStr for ProcessRecord {
    type Err = ProbeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let trimmed = line.trim();
        let (pid_token, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((pid, rest)) => (pid, rest.trim_start()),
            None => (trimmed, ""),
        };

        let pid = pid_token
            .parse::<u32>()
            .map_err(|e| ProbeError::malformed_line(line, format!("'{}' is not a pid: {}", pid_token, e)))?;
        if pid == 0 {
            return Err(ProbeError::malformed_line(line, "pid must be positive"));
        }

        Ok(Self {
            pid,
            command: rest.to_string(),
        })
    }
}

impl fmt::Display for ProcessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.pid, self.command)
    }
}
