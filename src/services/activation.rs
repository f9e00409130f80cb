//! 激活引擎
//!
//! 把选中版本所在的目录放到持久搜索路径的最前面。写入
//! 前总是重新读取持久副本（进程内存中的 PATH 可能已经
//! 落后于其他进程的修改），读改写之间与其他写者的竞争
//! 按配置层的后写者胜出处理，这是已知限制。
//!
//! 引擎只动自己的那一条目录：不重排其余条目、不丢条目，
//! 也不清理它没有制造的既有重复项。

use crate::data::{DurableStore, Result};
use crate::utils::platform::PATH_SEPARATOR;
use std::path::Path;

/// 一次激活的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// 目录已在首位，未做任何写入
    AlreadyActive,
    /// 目录原本在列表中，已移动到首位
    MovedToFront,
    /// 目录原本不在列表中，已插入首位
    Inserted,
}

/// 激活引擎
pub struct ActivationEngine<S: DurableStore> {
    store: S,
}

impl<S: DurableStore> ActivationEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 把工具目录置于搜索路径首位
    ///
    /// 幂等：目录已在首位时是空操作。持久化成功后广播环境
    /// 变更；广播失败记录日志但不影响激活结果。存储写入失败
    /// 时区分权限不足（需提权重试）与存储不可用（暂时性）。
    pub fn activate(&self, tool_dir: &Path) -> Result<Activation> {
        let dir = tool_dir.to_string_lossy().to_string();
        let current = self.store.read_search_path()?.unwrap_or_default();

        // 过滤空白段后重建，其余条目的相对顺序保持不变
        let mut entries: Vec<String> = current
            .split(PATH_SEPARATOR)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(String::from)
            .collect();

        let outcome = match entries.iter().position(|entry| *entry == dir) {
            Some(0) => {
                tracing::info!(dir = %dir, "目录已在搜索路径首位，无需操作");
                return Ok(Activation::AlreadyActive);
            }
            Some(index) => {
                // 只移除引擎命中的这一处，既有的其他重复项不动
                entries.remove(index);
                entries.insert(0, dir.clone());
                Activation::MovedToFront
            }
            None => {
                entries.insert(0, dir.clone());
                Activation::Inserted
            }
        };

        let new_value = entries.join(&PATH_SEPARATOR.to_string());
        self.store.write_search_path(&new_value)?;

        if let Err(e) = self.store.broadcast_change() {
            // 非致命：写入已经完成，不回滚
            tracing::warn!(error = %e, "广播环境变更失败");
        }

        tracing::info!(dir = %dir, ?outcome, "搜索路径已更新");
        Ok(outcome)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// 把持久搜索路径值拆成有序目录列表（过滤空白段）
pub fn split_search_path(value: &str) -> Vec<String> {
    value
        .split(PATH_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .collect()
}

/// 便捷封装：对系统存储执行激活
pub fn activate(tool_dir: &Path) -> Result<Activation> {
    ActivationEngine::new(crate::data::system_store()).activate(tool_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EnvFileStore;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn engine(dir: &TempDir) -> ActivationEngine<EnvFileStore> {
        ActivationEngine::new(EnvFileStore::without_env_fallback(
            dir.path().join("path.env"),
        ))
    }

    fn entries(engine: &ActivationEngine<EnvFileStore>) -> Vec<String> {
        split_search_path(&engine.store().read_search_path().unwrap().unwrap_or_default())
    }

    fn seed(engine: &ActivationEngine<EnvFileStore>, list: &[&str]) {
        let value = list.join(&PATH_SEPARATOR.to_string());
        engine.store().write_search_path(&value).unwrap();
    }

    #[test]
    fn test_insert_when_absent_preserves_order() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        seed(&engine, &["/a", "/b", "/c"]);

        let outcome = engine.activate(&PathBuf::from("/opt/python311")).unwrap();
        assert_eq!(outcome, Activation::Inserted);
        assert_eq!(entries(&engine), vec!["/opt/python311", "/a", "/b", "/c"]);
    }

    #[test]
    fn test_move_to_front() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        seed(&engine, &["/a", "/b", "/d", "/c"]);

        let outcome = engine.activate(&PathBuf::from("/d")).unwrap();
        assert_eq!(outcome, Activation::MovedToFront);
        assert_eq!(entries(&engine), vec!["/d", "/a", "/b", "/c"]);
    }

    #[test]
    fn test_already_first_is_noop() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        seed(&engine, &["/d", "/a"]);

        let outcome = engine.activate(&PathBuf::from("/d")).unwrap();
        assert_eq!(outcome, Activation::AlreadyActive);
        assert_eq!(entries(&engine), vec!["/d", "/a"]);
    }

    #[test]
    fn test_idempotent() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        seed(&engine, &["/a", "/b"]);

        engine.activate(&PathBuf::from("/d")).unwrap();
        let after_first = entries(&engine);
        engine.activate(&PathBuf::from("/d")).unwrap();
        let after_second = entries(&engine);

        assert_eq!(after_first, after_second);
        assert_eq!(
            after_second.iter().filter(|e| e.as_str() == "/d").count(),
            1
        );
        assert_eq!(after_second[0], "/d");
    }

    #[test]
    fn test_blank_segments_filtered() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let sep = PATH_SEPARATOR;
        engine
            .store()
            .write_search_path(&format!("{sep}/a{sep}{sep} {sep}/b"))
            .unwrap();

        engine.activate(&PathBuf::from("/d")).unwrap();
        assert_eq!(entries(&engine), vec!["/d", "/a", "/b"]);
    }

    #[test]
    fn test_empty_store_value() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);

        let outcome = engine.activate(&PathBuf::from("/d")).unwrap();
        assert_eq!(outcome, Activation::Inserted);
        assert_eq!(entries(&engine), vec!["/d"]);
    }

    #[test]
    fn test_preexisting_duplicates_untouched() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        // /x 的重复不是引擎制造的，不做清理
        seed(&engine, &["/a", "/x", "/b", "/x"]);

        engine.activate(&PathBuf::from("/d")).unwrap();
        assert_eq!(entries(&engine), vec!["/d", "/a", "/x", "/b", "/x"]);
    }

    #[test]
    fn test_move_removes_only_first_occurrence() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        seed(&engine, &["/a", "/d", "/b", "/d"]);

        engine.activate(&PathBuf::from("/d")).unwrap();
        // 第二处 /d 是既有重复，保留
        assert_eq!(entries(&engine), vec!["/d", "/a", "/b", "/d"]);
    }
}
