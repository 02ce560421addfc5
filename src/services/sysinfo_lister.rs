use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

use crate::error::ProbeResult;
use crate::services::lister::{ProcessLister, ProcessListing};

/// 通过 sysinfo 读取进程表，每个进程输出为 `<pid> <完整命令行>`
///
/// 命令行为空时（内核线程、无权限读取）退回到进程名。
#[derive(Debug, Default, Clone)]
pub struct SysinfoLister;

impl SysinfoLister {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessLister for SysinfoLister {
    fn describe(&self) -> String {
        "sysinfo process table".to_string()
    }

    async fn list(&self) -> ProbeResult<ProcessListing> {
        let mut sys = System::new();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cmd(UpdateKind::OnlyIfNotSet),
        );

        let mut processes: Vec<(u32, String)> = sys
            .processes()
            .iter()
            .map(|(pid, process)| {
                let process_cmd = process
                    .cmd()
                    .iter()
                    .map(|s| s.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(" ");
                let command = if process_cmd.is_empty() {
                    process.name().to_string_lossy().into_owned()
                } else {
                    process_cmd
                };
                (pid.as_u32(), command)
            })
            .collect();

        processes.sort_by_key(|(pid, _)| *pid);

        let lines = processes
            .into_iter()
            .map(|(pid, command)| format!("{} {}", pid, command))
            .collect();

        Ok(ProcessListing::from_lines(lines))
    }
}
