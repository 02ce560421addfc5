pub mod command_lister;
pub mod jolokia;
pub mod lister;
pub mod locator;
pub mod management;
pub mod perfdata;
pub mod reader;
pub mod resolver;
pub mod sysinfo_lister;
#[cfg(test)]
pub mod testing;

pub use command_lister::CommandLister;
pub use jolokia::JolokiaConnector;
pub use lister::{ProcessLister, ProcessListing};
pub use locator::ProcessLocator;
pub use reader::BrokerStateReader;
pub use resolver::{EndpointResolver, PerfDataResolver, StaticResolver};
pub use sysinfo_lister::SysinfoLister;
