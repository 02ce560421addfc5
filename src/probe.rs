use std::io::Write;

use log::error;

use crate::config::{ListerKind, ProbeConfig};
use crate::error::ProbeResult;
use crate::models::{BrokerStateCode, ManagementEndpointAddress};
use crate::services::{
    BrokerStateReader, CommandLister, EndpointResolver, JolokiaConnector, PerfDataResolver,
    ProcessLister, ProcessListing, ProcessLocator, StaticResolver, SysinfoLister,
};
use crate::services::management::ManagementConnector;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILED: i32 = 1;

/// 按配置选择的进程发现方式
pub enum ConfiguredLister {
    Command(CommandLister),
    Sysinfo(SysinfoLister),
}

impl ProcessLister for ConfiguredLister {
    fn describe(&self) -> String {
        match self {
            Self::Command(lister) => lister.describe(),
            Self::Sysinfo(lister) => lister.describe(),
        }
    }

    async fn list(&self) -> ProbeResult<ProcessListing> {
        match self {
            Self::Command(lister) => lister.list().await,
            Self::Sysinfo(lister) => lister.list().await,
        }
    }
}

/// 按配置选择的端点发现方式
pub enum ConfiguredResolver {
    PerfData(PerfDataResolver),
    Static(StaticResolver),
}

impl EndpointResolver for ConfiguredResolver {
    async fn resolve(&self, pid: u32) -> ProbeResult<ManagementEndpointAddress> {
        match self {
            Self::PerfData(resolver) => resolver.resolve(pid).await,
            Self::Static(resolver) => resolver.resolve(pid).await,
        }
    }
}

/// 单次探测：定位进程 → 读取状态 → 输出
pub struct HealthProbe<L, R, C> {
    locator: ProcessLocator<L>,
    reader: BrokerStateReader<R, C>,
}

impl HealthProbe<ConfiguredLister, ConfiguredResolver, JolokiaConnector> {
    pub fn from_config(config: &ProbeConfig) -> Self {
        let lister = match config.lister {
            ListerKind::Jps => ConfiguredLister::Command(CommandLister::new(
                &config.list_program,
                config.list_args.clone(),
                config.discovery_timeout,
            )),
            ListerKind::Sysinfo => ConfiguredLister::Sysinfo(SysinfoLister::new()),
        };

        let resolver = match &config.management_url {
            Some(url) => ConfiguredResolver::Static(StaticResolver::new(url)),
            None => ConfiguredResolver::PerfData(PerfDataResolver::new(&config.perfdata_root)),
        };

        Self::new(
            ProcessLocator::new(lister, &config.target),
            BrokerStateReader::new(
                resolver,
                JolokiaConnector::new(config.connect_timeout),
                &config.object_name,
                &config.attribute,
            ),
        )
    }
}

impl<L, R, C> HealthProbe<L, R, C>
where
    L: ProcessLister,
    R: EndpointResolver,
    C: ManagementConnector,
{
    pub fn new(locator: ProcessLocator<L>, reader: BrokerStateReader<R, C>) -> Self {
        Self { locator, reader }
    }

    pub async fn probe(&self) -> ProbeResult<BrokerStateCode> {
        let pid = self.locator.locate().await?;
        self.reader.read_state(pid).await
    }

    /// 成功时向 `out` 写入状态码并返回 0；失败时只记录日志，不写任何输出，返回 1
    pub async fn report<W: Write>(&self, out: &mut W) -> i32 {
        let result = match self.probe().await {
            Ok(state) => writeln!(out, "{}", state).and_then(|_| out.flush()),
            Err(e) => {
                log_failure(&e);
                return EXIT_FAILED;
            }
        };

        match result {
            Ok(()) => EXIT_OK,
            Err(e) => {
                error!("Failed to write broker state: {}", e);
                EXIT_FAILED
            }
        }
    }
}

fn log_failure(e: &(dyn std::error::Error + 'static)) {
    error!("{}", e);
    let mut current = e.source();
    while let Some(err) = current {
        error!("  caused by: {}", err);
        current = err.source();
    }
}
