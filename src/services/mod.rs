//! 服务层：探测、定位、扫描编排、激活与状态解析

pub mod activation;
pub mod locator;
pub mod probe;
pub mod resolver;
pub mod scanner;

pub use activation::{Activation, ActivationEngine};
pub use locator::{ExecutableLocator, ScanDepth};
pub use probe::VersionProbe;
pub use resolver::{resolve_active, ActiveVersions};
pub use scanner::{DeepScanTask, InventoryBuilder, VersionScanner};
