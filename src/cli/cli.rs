use clap::Parser;
use std::path::PathBuf;

use crate::config::ListerKind;

/// Kafka Health Probe - 读取本机 Kafka broker 的 BrokerState 并输出状态码
///
/// 无需任何参数；下列选项均有默认值，也可通过环境变量覆盖。
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// 用于识别 broker 进程的命令名子串
    #[arg(long, env = "PROBE_TARGET", default_value = "kafka.Kafka")]
    pub target: String,

    /// 列出进程的命令（输出格式：`<pid> <命令名>`）
    #[arg(long, env = "PROBE_LIST_COMMAND", default_value = "jps -l")]
    pub list_command: String,

    /// 等待进程列表命令结束的超时（秒）
    #[arg(long, env = "PROBE_DISCOVERY_TIMEOUT", default_value_t = 5)]
    pub discovery_timeout: u64,

    /// 进程发现方式
    #[arg(long, env = "PROBE_LISTER", value_enum, default_value_t = ListerKind::Jps)]
    pub lister: ListerKind,

    /// hsperfdata 目录所在的根目录（默认为系统临时目录）
    #[arg(long, env = "PROBE_PERFDATA_DIR")]
    pub perfdata_dir: Option<PathBuf>,

    /// 固定的管理端点地址，设置后跳过 hsperfdata 发现
    #[arg(long, env = "PROBE_MANAGEMENT_URL")]
    pub management_url: Option<String>,

    /// 连接管理端点的超时（秒）
    #[arg(long, env = "PROBE_CONNECT_TIMEOUT", default_value_t = 5)]
    pub connect_timeout: u64,
}
