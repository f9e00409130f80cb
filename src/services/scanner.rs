//! 清单构建与扫描编排
//!
//! 快速层（仅 PATH）同步完成并立即返回；深层（常见根目录
//! 乃至全盘）作为后台任务运行，结果通过缓存的 `merge` 补进
//! 既有快照。同一时刻至多一个深扫任务在运行。

use crate::data::ScanCache;
use crate::models::{empty_inventory, supported_tools, Inventory};
use crate::services::locator::{ExecutableLocator, ScanDepth};
use crate::services::probe::VersionProbe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// 清单构建器
///
/// 对所有受支持工具统一执行"定位候选、逐个探测、汇总"。
pub struct InventoryBuilder {
    locator: ExecutableLocator,
    probe: VersionProbe,
}

impl InventoryBuilder {
    pub fn new() -> Self {
        Self {
            locator: ExecutableLocator::new(),
            probe: VersionProbe::new(),
        }
    }

    /// 使用自定义探测器（测试或调短超时）
    pub fn with_probe(probe: VersionProbe) -> Self {
        Self {
            locator: ExecutableLocator::new(),
            probe,
        }
    }

    /// 快速层扫描（仅 PATH），同步完成
    pub fn build_fast(&self) -> Inventory {
        self.build(ScanDepth::PathOnly)
    }

    /// 深层扫描，耗时从数秒到数分钟不等
    pub fn build_deep(&self, depth: ScanDepth) -> Inventory {
        self.build(depth)
    }

    fn build(&self, depth: ScanDepth) -> Inventory {
        // 清单对所有工具全映射，零发现的工具保留空子映射
        let mut inventory = empty_inventory();

        for tool in supported_tools() {
            let candidates = self.locator.locate(tool.executable, depth);
            let versions = inventory
                .entry(tool.name.to_string())
                .or_default();

            for candidate in candidates {
                // 单个候选的失败只影响它自己
                if let Some(version) = self.probe.probe(&candidate, tool) {
                    versions.insert(version, candidate.to_string_lossy().to_string());
                }
            }

            tracing::debug!(
                tool = tool.name,
                versions = versions.len(),
                ?depth,
                "工具扫描完成"
            );
        }

        inventory
    }
}

impl Default for InventoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 深层扫描后台任务句柄
///
/// 以显式对象取代进程级全局标志。`spawn` 在已有任务运行时
/// 是空操作而非错误。
pub struct DeepScanTask {
    running: Arc<AtomicBool>,
}

/// 线程退出时恢复运行标志，panic 也不会卡死后续扫描
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl DeepScanTask {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 是否有深扫正在进行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 启动后台深扫
    ///
    /// 对外可见的唯一效果是完成时对缓存的一次 `merge`。
    /// 已有任务在运行时返回 `None`。
    pub fn spawn(
        &self,
        builder: Arc<InventoryBuilder>,
        cache: Arc<ScanCache>,
        depth: ScanDepth,
    ) -> Option<JoinHandle<()>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("深层扫描已在进行，忽略本次请求");
            return None;
        }

        let guard = RunningGuard(Arc::clone(&self.running));
        let handle = std::thread::spawn(move || {
            let _guard = guard;
            tracing::info!(?depth, "深层扫描开始");

            let results = builder.build_deep(depth);
            let discovered: usize = results.values().map(|v| v.len()).sum();

            if let Err(e) = cache.merge(&results) {
                tracing::warn!(error = %e, "合并深扫结果失败");
            }
            tracing::info!(discovered, "深层扫描结束");
        });
        Some(handle)
    }
}

impl Default for DeepScanTask {
    fn default() -> Self {
        Self::new()
    }
}

/// 扫描服务
///
/// 缓存优先；未命中时先同步完成快速层并返回，同时触发后台
/// 深扫补全缓存。
pub struct VersionScanner {
    builder: Arc<InventoryBuilder>,
    cache: Arc<ScanCache>,
    deep_task: DeepScanTask,
    deep_depth: Option<ScanDepth>,
}

impl VersionScanner {
    pub fn new() -> Self {
        Self::with_cache(ScanCache::new())
    }

    /// 指定缓存位置
    pub fn with_cache(cache: ScanCache) -> Self {
        Self {
            builder: Arc::new(InventoryBuilder::new()),
            cache: Arc::new(cache),
            deep_task: DeepScanTask::new(),
            deep_depth: Some(ScanDepth::KnownRoots),
        }
    }

    /// 设置后台深扫的深度（`AllDrives` 为显式开启的穷举模式）
    pub fn deep_depth(mut self, depth: ScanDepth) -> Self {
        self.deep_depth = Some(depth);
        self
    }

    /// 关闭后台深扫，只保留快速层
    pub fn without_deep_scan(mut self) -> Self {
        self.deep_depth = None;
        self
    }

    /// 扫描已安装的软件版本
    ///
    /// 缓存命中直接返回缓存数据，不触发任何扫描；未命中则同步
    /// 执行快速层扫描、写入缓存、触发后台深扫，并立即返回快扫
    /// 结果。此入口从不失败，最坏情况是所有工具映射到空版本集。
    pub fn scan_software_versions(&self) -> Inventory {
        if let Some(cached) = self.cache.read() {
            return cached;
        }

        let inventory = self.builder.build_fast();
        if let Err(e) = self.cache.write(&inventory) {
            tracing::warn!(error = %e, "写入扫描缓存失败");
        }

        self.start_deep_scan();
        inventory
    }

    /// 触发后台深扫，返回是否真正启动了新任务
    pub fn start_deep_scan(&self) -> bool {
        let Some(depth) = self.deep_depth else {
            return false;
        };
        self.deep_task
            .spawn(Arc::clone(&self.builder), Arc::clone(&self.cache), depth)
            .is_some()
    }

    /// 是否有深扫正在进行
    pub fn deep_scan_running(&self) -> bool {
        self.deep_task.is_running()
    }

    pub fn cache(&self) -> &ScanCache {
        &self.cache
    }
}

impl Default for VersionScanner {
    fn default() -> Self {
        Self::new()
    }
}
