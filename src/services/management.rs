use log::debug;
use serde_json::Value;

use crate::error::{ProbeError, ProbeResult};
use crate::models::{ManagementEndpointAddress, ObjectName};

/// 打开到管理端点的连接（本地连接不带认证信息）
pub trait ManagementConnector {
    type Connection: MBeanConnection;

    async fn connect(&self, address: &ManagementEndpointAddress) -> ProbeResult<Self::Connection>;
}

/// 已建立的管理连接：按对象名读取属性
pub trait MBeanConnection {
    async fn read_attribute(&self, name: &ObjectName, attribute: &str) -> ProbeResult<Value>;

    /// 释放连接；连接不复用
    async fn close(self)
    where
        Self: Sized;
}

/// 只读的 gauge 视图
pub trait Gauge {
    async fn read_gauge_value(&self) -> ProbeResult<i64>;
}

/// 基于 [`MBeanConnection`] 的类型化代理，把无类型的属性读取收窄为整数
pub struct GaugeProxy<'c, C> {
    connection: &'c C,
    name: ObjectName,
    attribute: String,
}

impl<'c, C: MBeanConnection> GaugeProxy<'c, C> {
    pub fn new(connection: &'c C, name: ObjectName, attribute: impl Into<String>) -> Self {
        Self {
            connection,
            name,
            attribute: attribute.into(),
        }
    }
}

impl<C: MBeanConnection> Gauge for GaugeProxy<'_, C> {
    async fn read_gauge_value(&self) -> ProbeResult<i64> {
        let value = self.connection.read_attribute(&self.name, &self.attribute).await?;
        debug!("{}/{} = {}", self.name, self.attribute, value);
        integer_value(&value).ok_or_else(|| {
            ProbeError::attribute_unreadable(
                self.name.as_str(),
                &self.attribute,
                format!("expected an integer, got {}", value),
            )
        })
    }
}

fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedConnection(Value);

    impl MBeanConnection for FixedConnection {
        async fn read_attribute(&self, _name: &ObjectName, _attribute: &str) -> ProbeResult<Value> {
            Ok(self.0.clone())
        }

        async fn close(self) {}
    }

    fn name() -> ObjectName {
        "kafka.server:type=KafkaServer,name=BrokerState".parse().unwrap()
    }

    #[tokio::test]
    async fn test_gauge_reads_integer() {
        let connection = FixedConnection(json!(3));
        let gauge = GaugeProxy::new(&connection, name(), "Value");
        assert_eq!(gauge.read_gauge_value().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_gauge_accepts_integral_float() {
        let connection = FixedConnection(json!(6.0));
        let gauge = GaugeProxy::new(&connection, name(), "Value");
        assert_eq!(gauge.read_gauge_value().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_gauge_rejects_non_integer() {
        for value in [json!("3"), json!(2.5), json!(null), json!({"state": 3})] {
            let connection = FixedConnection(value);
            let gauge = GaugeProxy::new(&connection, name(), "Value");
            assert!(matches!(
                gauge.read_gauge_value().await,
                Err(ProbeError::AttributeUnreadable { .. })
            ));
        }
    }
}
