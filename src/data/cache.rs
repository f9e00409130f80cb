//! 扫描结果缓存
//!
//! 将最近一次成功扫描的清单持久化到本地临时目录，避免在有效
//! 期内重复昂贵的扫描。文件形如：
//!
//! ```json
//! { "timestamp": 1717000000, "results": { "Python": { "3.11.4": "/usr/bin/python" } } }
//! ```
//!
//! 读取时校验有效期；损坏的缓存文件一律按未命中处理。写入
//! 全部走"临时文件 + 重命名"，保证任意时刻退出都不会留下
//! 残缺文件。合并持有 `fs2` 排它锁，与并发写者串行。

use crate::data::{DataError, Result};
use crate::models::Inventory;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 缓存有效期（1 小时）
pub const CACHE_DURATION: Duration = Duration::from_secs(3600);

/// 持久化的缓存快照
#[derive(Debug, Serialize, Deserialize)]
struct CacheSnapshot {
    /// 写入时刻的 Unix 时间戳（秒），缺失按 0 处理即必然过期
    #[serde(default)]
    timestamp: i64,
    /// 扫描结果，缺失视为快照损坏
    results: Inventory,
}

/// 扫描结果缓存
pub struct ScanCache {
    path: PathBuf,
    ttl: Duration,
}

impl ScanCache {
    /// 默认缓存位置（系统临时目录）
    pub fn new() -> Self {
        Self::with_path(std::env::temp_dir().join("software_scan_cache.json"))
    }

    /// 指定缓存文件路径
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            ttl: CACHE_DURATION,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取缓存
    ///
    /// 文件缺失、解析失败或已到有效期都按未命中处理。有效性
    /// 判定为严格小于：写入后恰好满 1 小时即视为过期。
    pub fn read(&self) -> Option<Inventory> {
        let snapshot = self.load_snapshot()?;
        let age = chrono::Utc::now().timestamp() - snapshot.timestamp;
        if age < self.ttl.as_secs() as i64 {
            tracing::debug!(path = %self.path.display(), age_secs = age, "缓存命中");
            Some(snapshot.results)
        } else {
            tracing::debug!(path = %self.path.display(), age_secs = age, "缓存已过期");
            None
        }
    }

    /// 整体覆盖缓存，使用当前时间作为新时间戳
    pub fn write(&self, results: &Inventory) -> Result<()> {
        let _lock = self.acquire_lock()?;
        self.persist(&CacheSnapshot {
            timestamp: chrono::Utc::now().timestamp(),
            results: results.clone(),
        })
    }

    /// 把部分扫描结果合并进既有快照
    ///
    /// 绕过有效期直接加载既有内容（过期快照中的旧发现仍然
    /// 保留），逐项插入或覆盖 `partial` 中的条目，再以新时间戳
    /// 持久化。结果只增不减。
    pub fn merge(&self, partial: &Inventory) -> Result<()> {
        let _lock = self.acquire_lock()?;

        let mut results = self
            .load_snapshot()
            .map(|snapshot| snapshot.results)
            .unwrap_or_default();

        for (tool, versions) in partial {
            let entry = results.entry(tool.clone()).or_default();
            for (version, path) in versions {
                entry.insert(version.clone(), path.clone());
            }
        }

        self.persist(&CacheSnapshot {
            timestamp: chrono::Utc::now().timestamp(),
            results,
        })
    }

    fn load_snapshot(&self) -> Option<CacheSnapshot> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "缓存文件损坏，按未命中处理");
                None
            }
        }
    }

    /// 获取缓存写锁
    ///
    /// 使用旁路锁文件而不是数据文件本身：数据文件会被重命名
    /// 替换，锁必须落在稳定的 inode 上。锁随返回的句柄释放。
    /// 锁文件与数据文件同目录，先保证目录存在。
    fn acquire_lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| DataError::io(parent, e))?;
        }

        let lock_path = self.path.with_extension("json.lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| DataError::io(&lock_path, e))?;
        file.lock_exclusive()
            .map_err(|e| DataError::Concurrency(format!("获取缓存锁失败: {e}")))?;
        Ok(file)
    }

    /// 原子持久化：写临时文件后重命名，调用方已持有写锁
    fn persist(&self, snapshot: &CacheSnapshot) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&tmp, content).map_err(|e| DataError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| DataError::io(&self.path, e))?;
        Ok(())
    }
}

impl Default for ScanCache {
    fn default() -> Self {
        Self::new()
    }
}
