//! 平台相关常量与查询
//!
//! 提供 PATH 分隔符、可执行文件扩展名、常见安装根目录、
//! 本地驱动器枚举以及全盘扫描时的目录排除名单。

use std::path::PathBuf;

/// PATH 环境变量的条目分隔符
pub const PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// 可执行文件扩展名（含点号，非 Windows 平台为空）
pub const EXE_SUFFIX: &str = if cfg!(windows) { ".exe" } else { "" };

/// 全盘扫描时按名称跳过的目录
///
/// Windows 系统目录加上 Unix 伪文件系统挂载点。
const EXCLUDED_DIR_NAMES: &[&str] = &[
    "Windows",
    "System32",
    "Program Files",
    "Program Files (x86)",
    "$Recycle.Bin",
    "proc",
    "sys",
    "dev",
    "run",
];

/// 判断目录名是否应在递归扫描中被剪枝
///
/// 隐藏目录（以 `.` 开头）和排除名单中的目录都会被跳过。
pub fn is_excluded_dir(name: &str) -> bool {
    name.starts_with('.') || EXCLUDED_DIR_NAMES.contains(&name)
}

/// 常见安装根目录
///
/// Windows：Program Files 系列与用户本地程序目录；
/// 其余平台：/usr/local、/opt 与 ~/.local。
/// 只返回当前确实存在的目录。
pub fn known_install_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if cfg!(windows) {
        for var in ["ProgramFiles", "ProgramFiles(x86)"] {
            if let Some(value) = std::env::var_os(var) {
                roots.push(PathBuf::from(value));
            }
        }
        if let Some(local) = dirs::data_local_dir() {
            roots.push(local.join("Programs"));
        }
    } else {
        roots.push(PathBuf::from("/usr/local"));
        roots.push(PathBuf::from("/opt"));
        if let Some(home) = dirs::home_dir() {
            roots.push(home.join(".local"));
        }
    }

    roots.retain(|p| p.is_dir());
    roots
}

/// 枚举本地驱动器根目录
#[cfg(windows)]
pub fn local_drive_roots() -> Vec<PathBuf> {
    use windows::Win32::Storage::FileSystem::GetLogicalDrives;

    let mask = unsafe { GetLogicalDrives() };
    ('A'..='Z')
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, letter)| PathBuf::from(format!("{letter}:\\")))
        .collect()
}

/// 枚举本地驱动器根目录（非 Windows 平台只有根文件系统）
#[cfg(not(windows))]
pub fn local_drive_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("/")]
}
