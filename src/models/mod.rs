pub mod endpoint;
pub mod object_name;
pub mod process;
pub mod state;

pub use endpoint::ManagementEndpointAddress;
pub use object_name::ObjectName;
pub use process::ProcessRecord;
pub use state::BrokerStateCode;
