use log::{debug, info};

use crate::error::{ProbeError, ProbeResult};
use crate::models::ProcessRecord;
use crate::services::lister::{ProcessLister, ProcessListing};

/// 在进程列表中定位 broker 进程
pub struct ProcessLocator<L> {
    lister: L,
    target: String,
}

impl<L: ProcessLister> ProcessLocator<L> {
    pub fn new(lister: L, target: impl Into<String>) -> Self {
        Self {
            lister,
            target: target.into(),
        }
    }

    #[cfg(test)]
    pub fn lister(&self) -> &L {
        &self.lister
    }

    #[cfg(test)]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// 返回第一个命令名包含目标子串的进程 ID
    pub async fn locate(&self) -> ProbeResult<u32> {
        let listing = self.lister.list().await?;
        let record = find_first_match(listing, &self.target)?;
        info!("Found '{}' as pid {} via {}", self.target, record.pid, self.lister.describe());
        Ok(record.pid)
    }
}

/// 首个匹配行即返回，不再扫描后续行；匹配行的 pid 无法解析时直接报错
pub fn find_first_match(listing: ProcessListing, target: &str) -> ProbeResult<ProcessRecord> {
    for line in listing {
        debug!("Got line: {}", line);
        if line.contains(target) {
            return line.parse();
        }
    }

    Err(ProbeError::ProcessNotFound {
        target: target.to_string(),
    })
}
