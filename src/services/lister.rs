use crate::error::ProbeResult;

/// 进程列表的一次快照：按顺序逐行消费，消费后不可重来
#[derive(Debug)]
pub struct ProcessListing {
    lines: std::vec::IntoIter<String>,
}

impl ProcessListing {
    pub fn from_output(output: &str) -> Self {
        Self::from_lines(output.lines().map(str::to_string).collect())
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self {
            lines: lines.into_iter(),
        }
    }
}

impl Iterator for ProcessListing {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.lines.next()
    }
}

/// 进程发现能力：产出 `<pid> <命令名>` 格式的行
pub trait ProcessLister {
    /// 用于日志和错误信息的描述
    fn describe(&self) -> String;

    async fn list(&self) -> ProbeResult<ProcessListing>;
}
