// lib.rs - 暴露扫描与激活服务给宿主程序（CLI/GUI）使用
//
// 典型调用方式：宿主先 `scan_software_versions` 取得清单展示
// 给用户，用户选中某个版本后以其所在目录调用 `activate`，
// 随后用 `active_versions` 刷新各工具的激活状态。

pub mod core;
pub mod data;
pub mod models;
pub mod services;
pub mod utils;

pub use core::init_logger;
pub use data::{system_store, DataError, DurableStore, EnvFileStore, Result, ScanCache, SystemStore};
pub use models::{
    empty_inventory, supported_tools, Inventory, LogConfig, LogFormat, LogLevel, LogOutput,
    ProbeStream, ToolKind, ToolSpec, VersionMap,
};
pub use services::{
    resolve_active, Activation, ActivationEngine, ActiveVersions, DeepScanTask, ExecutableLocator,
    InventoryBuilder, ScanDepth, VersionProbe, VersionScanner,
};

use services::activation::split_search_path;
use std::path::Path;

/// 版本管理门面
///
/// 把扫描服务与激活引擎装配在一起，宿主程序只需要持有一个
/// 对象。存储默认为当前平台的系统级实现，测试可注入文件存储。
pub struct VersionManager<S: DurableStore = SystemStore> {
    scanner: VersionScanner,
    engine: ActivationEngine<S>,
}

impl VersionManager<SystemStore> {
    /// 默认装配：系统存储 + 临时目录缓存
    pub fn new() -> Self {
        Self::with_parts(VersionScanner::new(), data::system_store())
    }
}

impl Default for VersionManager<SystemStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DurableStore> VersionManager<S> {
    /// 自定义装配
    pub fn with_parts(scanner: VersionScanner, store: S) -> Self {
        Self {
            scanner,
            engine: ActivationEngine::new(store),
        }
    }

    /// 扫描系统中已安装的软件版本（缓存优先）
    pub fn scan_software_versions(&self) -> Inventory {
        self.scanner.scan_software_versions()
    }

    /// 把指定工具目录置于搜索路径首位
    pub fn activate(&self, tool_dir: &Path) -> Result<Activation> {
        self.engine.activate(tool_dir)
    }

    /// 重新扫描并重新判定激活版本
    ///
    /// 一次调用拿到最新清单与各工具的激活版本，对应宿主界面的
    /// 刷新操作。搜索路径以持久存储为准（其他进程的修改立即
    /// 可见），存储读取失败时退回当前进程的 PATH。
    pub fn refresh(&self) -> (Inventory, ActiveVersions) {
        let inventory = self.scan_software_versions();
        let value = match self.engine.store().read_search_path() {
            Ok(Some(value)) => value,
            Ok(None) => std::env::var(data::SEARCH_PATH_KEY).unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "读取持久搜索路径失败，改用进程环境");
                std::env::var(data::SEARCH_PATH_KEY).unwrap_or_default()
            }
        };
        let active = resolve_active(&inventory, &split_search_path(&value));
        (inventory, active)
    }

    /// 解析每个工具当前激活的版本
    pub fn active_versions(&self) -> ActiveVersions {
        self.refresh().1
    }

    /// 是否有后台深扫正在进行
    pub fn deep_scan_running(&self) -> bool {
        self.scanner.deep_scan_running()
    }
}

/// 扫描系统中已安装的软件版本
///
/// 使用默认缓存位置的便捷入口，等价于
/// `VersionScanner::new().scan_software_versions()`。
pub fn scan_software_versions() -> Inventory {
    VersionScanner::new().scan_software_versions()
}

/// 把指定工具目录置于系统搜索路径首位
pub fn activate(tool_dir: &Path) -> Result<Activation> {
    services::activation::activate(tool_dir)
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn fake_python(dir: &Path, version: &str) {
        let path = dir.join("python");
        fs::write(
            &path,
            format!("#!/bin/sh\necho \"Python {version}\" >&2\n"),
        )
        .unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
    }

    #[test]
    #[serial]
    fn test_scan_activate_resolve_roundtrip() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        fake_python(dir_a.path(), "3.11.4");
        fake_python(dir_b.path(), "3.12.1");

        let joined =
            std::env::join_paths([dir_a.path().to_path_buf(), dir_b.path().to_path_buf()])
                .unwrap();
        let saved = std::env::var_os("PATH");
        std::env::set_var("PATH", &joined);

        let state_dir = TempDir::new().unwrap();
        let scanner =
            VersionScanner::with_cache(ScanCache::with_path(state_dir.path().join("cache.json")))
                .without_deep_scan();
        let store = EnvFileStore::without_env_fallback(state_dir.path().join("path.env"));
        let manager = VersionManager::with_parts(scanner, store);

        // 两个版本都被发现
        let inventory = manager.scan_software_versions();
        assert_eq!(inventory.get("Python").unwrap().len(), 2);

        // 激活 3.12 所在目录后，解析结果指向它
        manager.activate(dir_b.path()).unwrap();
        let active = manager.active_versions();

        match saved {
            Some(value) => std::env::set_var("PATH", value),
            None => std::env::remove_var("PATH"),
        }

        assert_eq!(active.get("Python").unwrap().as_deref(), Some("3.12.1"));
        // 清单中没有候选的工具保持未设置
        assert_eq!(active.get("Git").unwrap(), &None);
    }
}
