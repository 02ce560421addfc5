use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, warn};
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{ProbeError, ProbeResult};
use crate::services::lister::{ProcessLister, ProcessListing};

/// 执行外部命令（默认 `jps -l`）获取进程列表
#[derive(Debug, Clone)]
pub struct CommandLister {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandLister {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    fn map_io_error(&self, e: std::io::Error) -> ProbeError {
        if e.kind() == ErrorKind::Interrupted {
            ProbeError::InterruptedWait {
                command: self.describe(),
            }
        } else {
            ProbeError::Io(e)
        }
    }
}

impl ProcessLister for CommandLister {
    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn list(&self) -> ProbeResult<ProcessListing> {
        let command = self.describe();
        debug!("Spawning process listing: {}", command);

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.map_io_error(e))?;

        // 超时后 future 被丢弃，kill_on_drop 负责结束子进程，部分输出不会被读取
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| self.map_io_error(e))?,
            Err(_) => {
                return Err(ProbeError::DiscoveryTimeout {
                    command,
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            warn!("'{}' exited with {}, scanning its output anyway", command, output.status);
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| ProbeError::ListingFailed {
            command: command.clone(),
            reason: format!("output is not valid UTF-8: {}", e),
        })?;

        Ok(ProcessListing::from_output(&stdout))
    }
}
