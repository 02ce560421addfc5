//! 测试用的进程列表、端点发现与管理连接替身

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::{ProbeError, ProbeResult};
use crate::models::{ManagementEndpointAddress, ObjectName};
use crate::services::lister::{ProcessLister, ProcessListing};
use crate::services::management::{MBeanConnection, ManagementConnector};
use crate::services::resolver::EndpointResolver;

/// 返回固定输出的进程列表
pub struct StaticLister {
    output: String,
    calls: AtomicUsize,
}

impl StaticLister {
    pub fn new(output: &str) -> Self {
        Self {
            output: output.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProcessLister for StaticLister {
    fn describe(&self) -> String {
        "static listing".to_string()
    }

    async fn list(&self) -> ProbeResult<ProcessListing> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProcessListing::from_output(&self.output))
    }
}

/// pid → 地址的固定映射，未知 pid 视为没有管理端点
#[derive(Default)]
pub struct MapResolver {
    endpoints: HashMap<u32, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pid: u32, address: &str) -> Self {
        self.endpoints.insert(pid, address.to_string());
        self
    }
}

impl EndpointResolver for MapResolver {
    async fn resolve(&self, pid: u32) -> ProbeResult<ManagementEndpointAddress> {
        self.endpoints
            .get(&pid)
            .map(ManagementEndpointAddress::new)
            .ok_or_else(|| ProbeError::endpoint_unavailable(pid, "no endpoint mapping"))
    }
}

#[derive(Debug, Clone)]
pub enum MockEndpoint {
    Value(Value),
    Refuse,
    NoSuchObject,
}

#[derive(Default)]
struct Counters {
    connects: AtomicUsize,
    closes: AtomicUsize,
    last_query: Mutex<Option<(String, String)>>,
}

/// 连接计数，用于验证连接是否被释放
#[derive(Clone, Default)]
pub struct ConnectorStats(Arc<Counters>);

impl ConnectorStats {
    pub fn connects(&self) -> usize {
        self.0.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.0.closes.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<(String, String)> {
        self.0.last_query.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct MockConnector {
    endpoints: HashMap<String, MockEndpoint>,
    stats: ConnectorStats,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, address: &str, endpoint: MockEndpoint) -> Self {
        self.endpoints.insert(address.to_string(), endpoint);
        self
    }

    pub fn stats(&self) -> ConnectorStats {
        self.stats.clone()
    }
}

pub struct MockConnection {
    endpoint: MockEndpoint,
    stats: ConnectorStats,
}

impl ManagementConnector for MockConnector {
    type Connection = MockConnection;

    async fn connect(&self, address: &ManagementEndpointAddress) -> ProbeResult<MockConnection> {
        match self.endpoints.get(address.as_str()) {
            None | Some(MockEndpoint::Refuse) => {
                Err(ProbeError::connection_failure(address.as_str(), "connection refused"))
            }
            Some(endpoint) => {
                self.stats.0.connects.fetch_add(1, Ordering::SeqCst);
                Ok(MockConnection {
                    endpoint: endpoint.clone(),
                    stats: self.stats.clone(),
                })
            }
        }
    }
}

impl MBeanConnection for MockConnection {
    async fn read_attribute(&self, name: &ObjectName, attribute: &str) -> ProbeResult<Value> {
        *self.stats.0.last_query.lock().unwrap() = Some((name.to_string(), attribute.to_string()));
        match &self.endpoint {
            MockEndpoint::Value(value) => Ok(value.clone()),
            _ => Err(ProbeError::ObjectNotFound {
                name: name.to_string(),
                reason: "InstanceNotFoundException".to_string(),
            }),
        }
    }

    async fn close(self) {
        self.stats.0.closes.fetch_add(1, Ordering::SeqCst);
    }
}
