use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{ProbeError, ProbeResult};
use crate::models::ManagementEndpointAddress;
use crate::services::perfdata::{PerfData, PerfValue};

/// JVM 发布本地 JMX 连接器地址所用的计数器
pub const CONNECTOR_ADDRESS_COUNTER: &str = "sun.management.JMXConnectorServer.address";
/// JVM 启动参数
pub const VM_ARGS_COUNTER: &str = "java.rt.vmArgs";
const VM_START_COUNTER: &str = "sun.rt.createVmBeginTime";

const JOLOKIA_DEFAULT_HOST: &str = "127.0.0.1";
const JOLOKIA_DEFAULT_PORT: u16 = 8778;
const JOLOKIA_DEFAULT_CONTEXT: &str = "/jolokia/";

/// 根据进程 ID 发现其管理端点地址
pub trait EndpointResolver {
    async fn resolve(&self, pid: u32) -> ProbeResult<ManagementEndpointAddress>;
}

/// 从启动参数中的 `-javaagent:<...jolokia...jar>[=k=v,...]` 推导 Jolokia 地址
///
/// 识别 `host`、`port`、`protocol`、`agentContext` 选项，其余选项忽略。
/// 监听通配地址时改用回环地址连接。
pub fn jolokia_agent_url(vm_args: &str) -> Option<String> {
    let agent = vm_args.split_whitespace().find_map(|arg| {
        let spec = arg.strip_prefix("-javaagent:")?;
        let (jar, options) = spec.split_once('=').unwrap_or((spec, ""));
        jar.to_ascii_lowercase().contains("jolokia").then_some(options)
    })?;

    let mut host = JOLOKIA_DEFAULT_HOST.to_string();
    let mut port = JOLOKIA_DEFAULT_PORT;
    let mut protocol = "http".to_string();
    let mut context = JOLOKIA_DEFAULT_CONTEXT.to_string();

    for option in agent.split(',').filter(|o| !o.is_empty()) {
        let Some((key, value)) = option.split_once('=') else {
            continue;
        };
        match key {
            "host" => {
                host = match value {
                    "" | "*" | "0.0.0.0" | "localhost" => JOLOKIA_DEFAULT_HOST.to_string(),
                    "::" | "[::]" => "[::1]".to_string(),
                    other => other.to_string(),
                }
            }
            "port" => port = value.parse().ok()?,
            "protocol" => protocol = value.to_string(),
            "agentContext" => {
                context = format!("/{}/", value.trim_matches('/'));
                if context == "//" {
                    context = "/".to_string();
                }
            }
            _ => {}
        }
    }

    Some(format!("{}://{}:{}{}", protocol, host, port, context))
}

/// 从目标 JVM 的 hsperfdata 文件发现管理端点
///
/// 优先使用启动参数中的 Jolokia agent，否则退回到 JMX 连接器地址计数器。
/// 只能发现同一主机、当前用户可读的进程。
#[derive(Debug, Clone)]
pub struct PerfDataResolver {
    root: PathBuf,
}

impl PerfDataResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 在所有 `hsperfdata_*` 目录中查找名为 pid 的文件
    async fn find_perfdata_file(&self, pid: u32) -> ProbeResult<Option<PathBuf>> {
        let unreadable = |e: std::io::Error| {
            ProbeError::endpoint_unavailable(
                pid,
                format!("cannot scan {}: {}", self.root.display(), e),
            )
        };

        let mut dirs = match tokio::fs::read_dir(&self.root).await {
            Ok(dirs) => dirs,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(unreadable(e)),
        };

        let file_name = pid.to_string();
        while let Some(entry) = dirs.next_entry().await.map_err(unreadable)? {
            if !entry.file_name().to_string_lossy().starts_with("hsperfdata_") {
                continue;
            }
            let candidate = entry.path().join(&file_name);
            if is_file(&candidate).await {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

impl EndpointResolver for PerfDataResolver {
    async fn resolve(&self, pid: u32) -> ProbeResult<ManagementEndpointAddress> {
        let path = self.find_perfdata_file(pid).await?.ok_or_else(|| {
            ProbeError::endpoint_unavailable(
                pid,
                format!("no hsperfdata file under {}", self.root.display()),
            )
        })?;
        debug!("Reading perfdata from {}", path.display());

        let buf = tokio::fs::read(&path).await.map_err(|e| {
            ProbeError::endpoint_unavailable(pid, format!("cannot read {}: {}", path.display(), e))
        })?;
        let perfdata = PerfData::parse(&buf).map_err(|e| {
            ProbeError::endpoint_unavailable(pid, format!("cannot decode {}: {}", path.display(), e))
        })?;

        debug!("Decoded {} perf counters from {}", perfdata.len(), path.display());
        if let Some(PerfValue::Long(started)) = perfdata.get(VM_START_COUNTER) {
            debug!("JVM {} created at {} ms since epoch", pid, started);
        }

        if let Some(url) = perfdata.text(VM_ARGS_COUNTER).and_then(jolokia_agent_url) {
            debug!("Found Jolokia agent address: {}", url);
            return Ok(ManagementEndpointAddress::new(url));
        }

        let address = perfdata.text(CONNECTOR_ADDRESS_COUNTER).ok_or_else(|| {
            ProbeError::endpoint_unavailable(
                pid,
                "process runs neither a Jolokia agent nor a local JMX connector",
            )
        })?;

        debug!("Found local management address: {}", address);
        Ok(ManagementEndpointAddress::new(address))
    }
}

/// 使用固定地址，忽略 pid
#[derive(Debug, Clone)]
pub struct StaticResolver {
    address: ManagementEndpointAddress,
}

impl StaticResolver {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: ManagementEndpointAddress::new(address),
        }
    }
}

impl EndpointResolver for StaticResolver {
    async fn resolve(&self, pid: u32) -> ProbeResult<ManagementEndpointAddress> {
        debug!("Using configured management address {} for pid {}", self.address, pid);
        Ok(self.address.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::perfdata::fixture::{build, Counter};
    use tempfile::TempDir;

    fn write_perfdata(root: &Path, user: &str, pid: u32, counters: &[Counter<'_>]) {
        let dir = root.join(format!("hsperfdata_{}", user));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(pid.to_string()), build(true, counters)).unwrap();
    }

    const RMI_ADDRESS: &str =
        "service:jmx:rmi://127.0.0.1/stub/rO0ABXNyAC5qYXZheC5tYW5hZ2VtZW50LnJlbW90ZS5ybWk";
    const KAFKA_VM_ARGS: &str = "-Xmx1G -Xms1G -XX:+UseG1GC -Dcom.sun.management.jmxremote \
        -javaagent:/opt/jolokia/jolokia-jvm-1.7.2-agent.jar=port=8779,host=0.0.0.0 \
        -Dkafka.logs.dir=/opt/kafka/logs";

    #[test]
    fn test_jolokia_url_from_agent_options() {
        assert_eq!(
            jolokia_agent_url(KAFKA_VM_ARGS).as_deref(),
            Some("http://127.0.0.1:8779/jolokia/")
        );
    }

    #[test]
    fn test_jolokia_url_defaults() {
        assert_eq!(
            jolokia_agent_url("-Xmx1G -javaagent:/opt/jolokia-agent.jar").as_deref(),
            Some("http://127.0.0.1:8778/jolokia/")
        );
        assert_eq!(
            jolokia_agent_url(
                "-javaagent:/x/jolokia.jar=host=10.0.0.5,protocol=https,agentContext=/j4p"
            )
            .as_deref(),
            Some("https://10.0.0.5:8778/j4p/")
        );
    }

    #[test]
    fn test_other_agents_are_ignored() {
        assert_eq!(
            jolokia_agent_url("-javaagent:/opt/prometheus/jmx_prometheus_javaagent.jar=7071:/etc/jmx.yml"),
            None
        );
        assert_eq!(jolokia_agent_url("-Xmx1G"), None);
        assert_eq!(jolokia_agent_url("-javaagent:/jolokia.jar=port=notaport"), None);
    }

    #[tokio::test]
    async fn test_jolokia_agent_preferred_over_rmi_connector() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("unrelated")).unwrap();
        write_perfdata(
            root.path(),
            "kafka",
            3522,
            &[
                Counter::Long("sun.rt.createVmBeginTime", 1_700_000_000_000),
                Counter::Text(VM_ARGS_COUNTER, KAFKA_VM_ARGS, 512),
                Counter::Text(CONNECTOR_ADDRESS_COUNTER, RMI_ADDRESS, 256),
            ],
        );

        let address = PerfDataResolver::new(root.path()).resolve(3522).await.unwrap();
        assert_eq!(address.as_str(), "http://127.0.0.1:8779/jolokia/");
    }

    #[tokio::test]
    async fn test_falls_back_to_connector_address() {
        let root = TempDir::new().unwrap();
        write_perfdata(
            root.path(),
            "kafka",
            3522,
            &[
                Counter::Text(VM_ARGS_COUNTER, "-Xmx1G -Dcom.sun.management.jmxremote", 128),
                Counter::Text(CONNECTOR_ADDRESS_COUNTER, RMI_ADDRESS, 256),
            ],
        );

        let address = PerfDataResolver::new(root.path()).resolve(3522).await.unwrap();
        assert_eq!(address.as_str(), RMI_ADDRESS);
    }

    #[tokio::test]
    async fn test_unknown_pid_is_endpoint_unavailable() {
        let root = TempDir::new().unwrap();
        write_perfdata(
            root.path(),
            "kafka",
            3522,
            &[Counter::Text(VM_ARGS_COUNTER, KAFKA_VM_ARGS, 512)],
        );

        let err = PerfDataResolver::new(root.path()).resolve(9999).await.unwrap_err();
        assert!(matches!(err, ProbeError::EndpointUnavailable { pid: 9999, .. }));
    }

    #[tokio::test]
    async fn test_process_without_agent_is_endpoint_unavailable() {
        let root = TempDir::new().unwrap();
        write_perfdata(
            root.path(),
            "kafka",
            3522,
            &[
                Counter::Long("sun.rt.ticks", 1),
                Counter::Text(VM_ARGS_COUNTER, "-Xmx1G", 64),
            ],
        );

        let err = PerfDataResolver::new(root.path()).resolve(3522).await.unwrap_err();
        assert!(matches!(err, ProbeError::EndpointUnavailable { pid: 3522, .. }));
    }

    #[tokio::test]
    async fn test_garbage_file_is_endpoint_unavailable() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("hsperfdata_kafka");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("3522"), b"not perfdata").unwrap();

        let err = PerfDataResolver::new(root.path()).resolve(3522).await.unwrap_err();
        assert!(matches!(err, ProbeError::EndpointUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_missing_root_is_endpoint_unavailable() {
        let root = TempDir::new().unwrap();
        let resolver = PerfDataResolver::new(root.path().join("does-not-exist"));
        assert!(matches!(
            resolver.resolve(1).await,
            Err(ProbeError::EndpointUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreadable_root_is_endpoint_unavailable() {
        // 根路径是普通文件时 read_dir 失败（NotADirectory）
        let root = TempDir::new().unwrap();
        let not_a_dir = root.path().join("plain-file");
        std::fs::write(&not_a_dir, b"x").unwrap();

        let err = PerfDataResolver::new(&not_a_dir).resolve(7).await.unwrap_err();
        assert!(matches!(err, ProbeError::EndpointUnavailable { pid: 7, .. }));
    }

    #[tokio::test]
    async fn test_static_resolver_ignores_pid() {
        let resolver = StaticResolver::new("http://localhost:8778/jolokia/");
        assert_eq!(
            resolver.resolve(1).await.unwrap(),
            resolver.resolve(2).await.unwrap()
        );
    }
}
