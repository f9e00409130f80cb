//! 当前激活版本解析
//!
//! 对每个工具，找出其各版本可执行文件所在的目录集合，然后
//! 按顺序遍历搜索路径：第一个命中的目录决定激活版本，这正
//! 是操作系统解析裸命令名时的行为。没有命中则该工具未设置
//! 激活版本，这不是错误。

use crate::models::Inventory;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// 激活状态：工具名 -> 激活版本（未设置为 None）
pub type ActiveVersions = BTreeMap<String, Option<String>>;

/// 解析每个工具当前激活的版本
///
/// `search_path` 是已拆分、有序的搜索路径条目。每次清单刷新
/// 或激活之后由调用方重新执行，保证状态一致。
pub fn resolve_active(inventory: &Inventory, search_path: &[String]) -> ActiveVersions {
    let mut active = ActiveVersions::new();

    for (tool, versions) in inventory {
        // 可执行文件目录 -> 版本号
        let mut dirs: HashMap<String, &str> = HashMap::new();
        for (version, path) in versions {
            if let Some(parent) = Path::new(path).parent() {
                dirs.insert(parent.to_string_lossy().to_string(), version);
            }
        }

        let hit = search_path.iter().find_map(|entry| {
            dirs.get(entry.trim()).map(|version| version.to_string())
        });
        active.insert(tool.clone(), hit);
    }

    active
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VersionMap;

    fn inventory_of(entries: &[(&str, &[(&str, &str)])]) -> Inventory {
        entries
            .iter()
            .map(|(tool, versions)| {
                let map: VersionMap = versions
                    .iter()
                    .map(|(v, p)| (v.to_string(), p.to_string()))
                    .collect();
                (tool.to_string(), map)
            })
            .collect()
    }

    fn path_list(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_match_wins() {
        let inventory = inventory_of(&[(
            "toolA",
            &[
                ("v1", "/opt/toolA/v1/exe"),
                ("v2", "/opt/toolA/v2/exe"),
            ],
        )]);
        let search = path_list(&["/opt/toolA/v2", "/opt/toolA/v1"]);

        let active = resolve_active(&inventory, &search);
        assert_eq!(active.get("toolA").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn test_no_match_is_unset() {
        let inventory = inventory_of(&[("Python", &[("3.11.4", "/opt/python/bin/python")])]);
        let search = path_list(&["/usr/bin", "/bin"]);

        let active = resolve_active(&inventory, &search);
        assert_eq!(active.get("Python").unwrap(), &None);
    }

    #[test]
    fn test_empty_submapping_is_unset() {
        let inventory = inventory_of(&[("Java", &[])]);
        let active = resolve_active(&inventory, &path_list(&["/usr/bin"]));
        assert_eq!(active.get("Java").unwrap(), &None);
    }

    #[test]
    fn test_entries_are_trimmed_before_comparison() {
        let inventory = inventory_of(&[("Git", &[("2.41.0", "/opt/git/bin/git")])]);
        let search = path_list(&["  /opt/git/bin  "]);

        let active = resolve_active(&inventory, &search);
        assert_eq!(active.get("Git").unwrap().as_deref(), Some("2.41.0"));
    }

    #[test]
    fn test_independent_per_tool() {
        let inventory = inventory_of(&[
            ("Python", &[("3.11.4", "/opt/py/bin/python")]),
            ("Node.js", &[("18.16.0", "/opt/node/bin/node")]),
        ]);
        let search = path_list(&["/opt/node/bin", "/usr/bin"]);

        let active = resolve_active(&inventory, &search);
        assert_eq!(active.get("Python").unwrap(), &None);
        assert_eq!(active.get("Node.js").unwrap().as_deref(), Some("18.16.0"));
    }
}
