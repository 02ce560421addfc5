use log::{debug, info};

use crate::error::{ProbeError, ProbeResult};
use crate::models::{BrokerStateCode, ObjectName};
use crate::services::management::{Gauge, GaugeProxy, MBeanConnection, ManagementConnector};
use crate::services::resolver::EndpointResolver;

/// 读取指定进程的 BrokerState
///
/// 每次调用依次执行：端点发现 → 建立连接 → 查找对象 → 读取属性。
/// 连接只用于本次查询，无论成功失败都会释放。
pub struct BrokerStateReader<R, C> {
    resolver: R,
    connector: C,
    object_name: String,
    attribute: String,
}

impl<R: EndpointResolver, C: ManagementConnector> BrokerStateReader<R, C> {
    pub fn new(
        resolver: R,
        connector: C,
        object_name: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            connector,
            object_name: object_name.into(),
            attribute: attribute.into(),
        }
    }

    #[cfg(test)]
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub async fn read_state(&self, pid: u32) -> ProbeResult<BrokerStateCode> {
        let address = self.resolver.resolve(pid).await?;
        debug!("Found management address for pid {}: {}", pid, address);

        let connection = self.connector.connect(&address).await?;
        let result = self.query(&connection).await;
        connection.close().await;

        let state = result?;
        info!(
            "Broker state of pid {}: {} ({})",
            pid,
            state,
            state.describe().unwrap_or("unrecognized")
        );
        Ok(state)
    }

    async fn query(&self, connection: &C::Connection) -> ProbeResult<BrokerStateCode> {
        let name: ObjectName = self.object_name.parse()?;
        let gauge = GaugeProxy::new(connection, name, &self.attribute);
        let value = gauge.read_gauge_value().await?;

        let code = i32::try_from(value).map_err(|_| {
            ProbeError::attribute_unreadable(
                &self.object_name,
                &self.attribute,
                format!("{} does not fit a state code", value),
            )
        })?;
        Ok(BrokerStateCode(code))
    }
}
