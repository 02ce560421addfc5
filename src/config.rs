use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CommandArgs;

/// BrokerState gauge 的对象名，与 broker 的管理接口约定，不可配置
pub const BROKER_STATE_OBJECT_NAME: &str = "kafka.server:type=KafkaServer,name=BrokerState";
/// gauge 的数值属性
pub const GAUGE_VALUE_ATTRIBUTE: &str = "Value";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListerKind {
    /// 执行进程列表命令并解析其输出
    Jps,
    /// 通过 sysinfo 读取系统进程表
    Sysinfo,
}

/// 一次探测所需的全部配置，构造时显式传入各组件
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub target: String,
    pub list_program: String,
    pub list_args: Vec<String>,
    pub discovery_timeout: Duration,
    pub lister: ListerKind,
    pub perfdata_root: PathBuf,
    pub management_url: Option<String>,
    pub connect_timeout: Duration,
    pub object_name: String,
    pub attribute: String,
}

impl ProbeConfig {
    pub fn from_args(args: CommandArgs) -> Result<Self> {
        let mut words = args.list_command.split_whitespace().map(str::to_string);
        let Some(list_program) = words.next() else {
            bail!("process listing command must not be empty");
        };
        if args.target.is_empty() {
            bail!("target pattern must not be empty");
        }

        Ok(Self {
            target: args.target,
            list_program,
            list_args: words.collect(),
            discovery_timeout: Duration::from_secs(args.discovery_timeout),
            lister: args.lister,
            perfdata_root: args.perfdata_dir.unwrap_or_else(default_perfdata_root),
            management_url: args.management_url.filter(|url| !url.trim().is_empty()),
            connect_timeout: Duration::from_secs(args.connect_timeout),
            object_name: BROKER_STATE_OBJECT_NAME.to_string(),
            attribute: GAUGE_VALUE_ATTRIBUTE.to_string(),
        })
    }

    /// 完整的进程列表命令行，用于日志和错误信息
    pub fn list_command_line(&self) -> String {
        std::iter::once(self.list_program.as_str())
            .chain(self.list_args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// HotSpot 在 Unix 上固定使用 /tmp，而不是 TMPDIR
fn default_perfdata_root() -> PathBuf {
    if cfg!(unix) {
        PathBuf::from("/tmp")
    } else {
        std::env::temp_dir()
    }
}
