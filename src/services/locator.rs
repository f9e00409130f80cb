//! 可执行文件定位
//!
//! 为给定的可执行文件基础名收集候选路径。快速层只扫当前
//! PATH 的各段；深层在此之上递归遍历常见安装根目录，穷举
//! 模式再加上所有本地驱动器。遍历按目录名剪枝（隐藏目录
//! 与系统目录名单），不可读的目录直接跳过。结果是去重的
//! 集合，定位器不做任何版本解释。

use crate::utils::platform;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::PathBuf;
use walkdir::WalkDir;

/// 扫描深度策略
///
/// 穷举全盘扫描开销无上界，作为显式开启的选项存在，
/// 不是默认行为。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanDepth {
    /// 仅当前 PATH（快速层）
    #[default]
    PathOnly,
    /// PATH 加常见安装根目录
    KnownRoots,
    /// PATH 加常见根目录与所有本地驱动器（穷举）
    AllDrives,
}

/// 可执行文件定位器
pub struct ExecutableLocator;

impl ExecutableLocator {
    pub fn new() -> Self {
        Self
    }

    /// 收集候选可执行文件路径
    pub fn locate(&self, base_name: &str, depth: ScanDepth) -> BTreeSet<PathBuf> {
        let path_value = std::env::var_os(crate::data::SEARCH_PATH_KEY).unwrap_or_default();
        let mut found = scan_path_segments(&path_value, base_name);

        let mut roots = Vec::new();
        match depth {
            ScanDepth::PathOnly => {}
            ScanDepth::KnownRoots => {
                roots.extend(platform::known_install_roots());
            }
            ScanDepth::AllDrives => {
                roots.extend(platform::known_install_roots());
                roots.extend(platform::local_drive_roots());
            }
        }

        for root in roots {
            walk_root(&root, base_name, &mut found);
        }

        found
    }
}

impl Default for ExecutableLocator {
    fn default() -> Self {
        Self::new()
    }
}

/// 目标文件名（基础名与带平台扩展名的变体）
fn candidate_names(base_name: &str) -> Vec<String> {
    let mut names = vec![base_name.to_string()];
    if !platform::EXE_SUFFIX.is_empty() {
        names.push(format!("{base_name}{}", platform::EXE_SUFFIX));
    }
    names
}

/// 在 PATH 各段中查找候选文件
///
/// 空白段被跳过，只收集真实存在的普通文件。
fn scan_path_segments(path_value: &OsStr, base_name: &str) -> BTreeSet<PathBuf> {
    let names = candidate_names(base_name);
    let mut found = BTreeSet::new();

    for segment in std::env::split_paths(path_value) {
        if segment.as_os_str().is_empty() {
            continue;
        }
        for name in &names {
            let candidate = segment.join(name);
            if candidate.is_file() {
                found.insert(candidate);
            }
        }
    }

    found
}

/// 递归遍历一个根目录，收集名称匹配的文件
///
/// 根目录本身不参与剪枝判断，子目录按隐藏/系统名单剪枝。
/// 遍历错误（权限不足、已卸载）记录后跳过，不中断扫描。
fn walk_root(root: &std::path::Path, base_name: &str, found: &mut BTreeSet<PathBuf>) {
    if !root.is_dir() {
        tracing::debug!(root = %root.display(), "扫描根目录不存在，跳过");
        return;
    }

    let names = candidate_names(base_name);
    let walker = WalkDir::new(root).follow_links(false).into_iter();

    for entry in walker.filter_entry(|e| {
        e.depth() == 0
            || !e.file_type().is_dir()
            || !platform::is_excluded_dir(&e.file_name().to_string_lossy())
    }) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(root = %root.display(), error = %e, "遍历目录出错，跳过");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if names.iter().any(|n| *n == file_name) {
            found.insert(entry.path().to_path_buf());
        }
    }
}
