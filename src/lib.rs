//! Premium Gate Library
//!
//! 订阅权益对账与内容访问控制库

pub mod bootstrap;
pub mod hooks;

// 重新导出常用类型
pub use bootstrap::{load_config, wire_dependencies, HostPorts, PremiumGateApp};
pub use hooks::{AccessGateHandle, ReconciliationHandle};
