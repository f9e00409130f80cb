//! 持久搜索路径存储
//!
//! PATH 的持久副本由操作系统级配置设施持有，与任一进程的
//! 内存副本相互独立。本模块以 `DurableStore` trait 抽象这一
//! 设施：
//!
//! - Windows：注册表 `HKLM\SYSTEM\CurrentControlSet\Control\
//!   Session Manager\Environment` 下的 `Path` 值，写入后向所有
//!   顶层窗口广播 `WM_SETTINGCHANGE`，让运行中的程序无需重启
//!   即可重新解析。
//! - 其余平台：用户配置目录下的 key=value 配置文件（由 shell
//!   启动脚本 source），广播为空操作。
//!
//! 存储是机器级共享资源，可能被无关进程并发修改。本模块
//! 不假设独占所有权，写入总是整值替换，配置层为后写者胜出。

use crate::data::{DataError, Result};
use std::path::{Path, PathBuf};

/// 搜索路径在存储中的键名
pub const SEARCH_PATH_KEY: &str = "PATH";

/// 持久搜索路径存储
pub trait DurableStore: Send + Sync {
    /// 读取持久化的搜索路径值
    ///
    /// 键不存在返回 `Ok(None)`；读取失败按权限/可用性分类报错。
    fn read_search_path(&self) -> Result<Option<String>>;

    /// 整值写回搜索路径
    fn write_search_path(&self, value: &str) -> Result<()>;

    /// 通知其他运行中的进程环境已变更
    ///
    /// 失败不影响写入结果，由调用方决定是否忽略。
    fn broadcast_change(&self) -> Result<()>;
}

/// 基于 key=value 配置文件的存储实现
///
/// 文件中的注释与空行在改写时原样保留，只更新或追加目标键。
pub struct EnvFileStore {
    path: PathBuf,
    /// 键缺失时是否回退到当前进程的 PATH
    env_fallback: bool,
}

impl EnvFileStore {
    /// 默认位置：`<配置目录>/envswitch/path.env`
    pub fn default_location() -> Self {
        let base = dirs::config_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            path: base.join("envswitch").join("path.env"),
            env_fallback: true,
        }
    }

    /// 指定文件路径（键缺失时回退到进程 PATH）
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            env_fallback: true,
        }
    }

    /// 指定文件路径且不回退到进程环境（测试用的确定性行为）
    pub fn without_env_fallback(path: PathBuf) -> Self {
        Self {
            path,
            env_fallback: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_lines(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(DataError::from_store_io)?;
        Ok(content.lines().map(String::from).collect())
    }
}

/// 解析配置文件的一行，注释与空行返回 `None`
fn parse_env_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let (key, value) = trimmed.split_once('=')?;
    Some((key.trim().to_string(), value.trim().to_string()))
}

impl DurableStore for EnvFileStore {
    fn read_search_path(&self) -> Result<Option<String>> {
        for line in self.read_lines()? {
            if let Some((key, value)) = parse_env_line(&line) {
                if key == SEARCH_PATH_KEY {
                    return Ok(Some(value));
                }
            }
        }

        if self.env_fallback {
            // 文件尚无记录时以进程环境为初始值
            return Ok(std::env::var(SEARCH_PATH_KEY).ok().filter(|v| !v.is_empty()));
        }
        Ok(None)
    }

    fn write_search_path(&self, value: &str) -> Result<()> {
        let mut lines = self.read_lines()?;

        let mut found = false;
        for line in &mut lines {
            if let Some((key, _)) = parse_env_line(line) {
                if key == SEARCH_PATH_KEY {
                    *line = format!("{SEARCH_PATH_KEY}={value}");
                    found = true;
                    break;
                }
            }
        }
        if !found {
            lines.push(format!("{SEARCH_PATH_KEY}={value}"));
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(DataError::from_store_io)?;
        }
        let content = lines.join("\n") + "\n";
        std::fs::write(&self.path, content).map_err(DataError::from_store_io)?;
        Ok(())
    }

    fn broadcast_change(&self) -> Result<()> {
        // 文件存储没有进程间通知机制，shell 在下次启动时读取
        tracing::debug!(path = %self.path.display(), "搜索路径已写入配置文件");
        Ok(())
    }
}

/// Windows 注册表存储实现
#[cfg(windows)]
pub struct RegistryStore;

#[cfg(windows)]
impl RegistryStore {
    pub fn new() -> Self {
        Self
    }

    fn subkey() -> Vec<u16> {
        wide(r"SYSTEM\CurrentControlSet\Control\Session Manager\Environment")
    }
}

#[cfg(windows)]
impl Default for RegistryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(windows)]
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

#[cfg(windows)]
fn classify_win32(error: windows::Win32::Foundation::WIN32_ERROR, context: &str) -> DataError {
    use windows::Win32::Foundation::ERROR_ACCESS_DENIED;
    if error == ERROR_ACCESS_DENIED {
        DataError::PermissionDenied(format!("{context}: 需要管理员权限"))
    } else {
        DataError::StoreUnavailable(format!("{context}: Win32 错误 {}", error.0))
    }
}

#[cfg(windows)]
impl DurableStore for RegistryStore {
    fn read_search_path(&self) -> Result<Option<String>> {
        use windows::core::PCWSTR;
        use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_SUCCESS};
        use windows::Win32::System::Registry::{
            RegCloseKey, RegOpenKeyExW, RegQueryValueExW, HKEY, HKEY_LOCAL_MACHINE,
            KEY_QUERY_VALUE, KEY_WOW64_64KEY,
        };

        let subkey = Self::subkey();
        let value_name = wide(SEARCH_PATH_KEY);
        let mut hkey = HKEY::default();

        unsafe {
            let status = RegOpenKeyExW(
                HKEY_LOCAL_MACHINE,
                PCWSTR(subkey.as_ptr()),
                0,
                KEY_QUERY_VALUE | KEY_WOW64_64KEY,
                &mut hkey,
            );
            if status != ERROR_SUCCESS {
                return Err(classify_win32(status, "打开环境变量注册表项失败"));
            }

            let mut size: u32 = 0;
            let status = RegQueryValueExW(
                hkey,
                PCWSTR(value_name.as_ptr()),
                None,
                None,
                None,
                Some(&mut size),
            );
            if status == ERROR_FILE_NOT_FOUND {
                let _ = RegCloseKey(hkey);
                return Ok(None);
            }
            if status != ERROR_SUCCESS {
                let _ = RegCloseKey(hkey);
                return Err(classify_win32(status, "查询 PATH 值失败"));
            }

            let mut buf = vec![0u8; size as usize];
            let status = RegQueryValueExW(
                hkey,
                PCWSTR(value_name.as_ptr()),
                None,
                None,
                Some(buf.as_mut_ptr()),
                Some(&mut size),
            );
            let _ = RegCloseKey(hkey);
            if status != ERROR_SUCCESS {
                return Err(classify_win32(status, "读取 PATH 值失败"));
            }

            let chars: Vec<u16> = buf
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .take_while(|&c| c != 0)
                .collect();
            Ok(Some(String::from_utf16_lossy(&chars)))
        }
    }

    fn write_search_path(&self, value: &str) -> Result<()> {
        use windows::core::PCWSTR;
        use windows::Win32::Foundation::ERROR_SUCCESS;
        use windows::Win32::System::Registry::{
            RegCloseKey, RegOpenKeyExW, RegSetValueExW, HKEY, HKEY_LOCAL_MACHINE, KEY_SET_VALUE,
            KEY_WOW64_64KEY, REG_EXPAND_SZ,
        };

        let subkey = Self::subkey();
        let value_name = wide(SEARCH_PATH_KEY);
        let data = wide(value);
        let mut hkey = HKEY::default();

        unsafe {
            let status = RegOpenKeyExW(
                HKEY_LOCAL_MACHINE,
                PCWSTR(subkey.as_ptr()),
                0,
                KEY_SET_VALUE | KEY_WOW64_64KEY,
                &mut hkey,
            );
            if status != ERROR_SUCCESS {
                return Err(classify_win32(status, "打开环境变量注册表项失败"));
            }

            let bytes: &[u8] = std::slice::from_raw_parts(data.as_ptr() as *const u8, data.len() * 2);
            let status = RegSetValueExW(
                hkey,
                PCWSTR(value_name.as_ptr()),
                0,
                REG_EXPAND_SZ,
                Some(bytes),
            );
            let _ = RegCloseKey(hkey);
            if status != ERROR_SUCCESS {
                return Err(classify_win32(status, "写入 PATH 值失败"));
            }
        }
        Ok(())
    }

    fn broadcast_change(&self) -> Result<()> {
        use windows::Win32::Foundation::{LPARAM, WPARAM};
        use windows::Win32::UI::WindowsAndMessaging::{
            SendMessageTimeoutW, HWND_BROADCAST, SMTO_ABORTIFHUNG, WM_SETTINGCHANGE,
        };

        let section = wide("Environment");
        let result = unsafe {
            SendMessageTimeoutW(
                HWND_BROADCAST,
                WM_SETTINGCHANGE,
                WPARAM(0),
                LPARAM(section.as_ptr() as isize),
                SMTO_ABORTIFHUNG,
                5000,
                None,
            )
        };
        if result.0 == 0 {
            return Err(DataError::StoreUnavailable(
                "广播环境变更超时".to_string(),
            ));
        }
        Ok(())
    }
}

/// 当前平台的系统级存储类型
#[cfg(windows)]
pub type SystemStore = RegistryStore;

#[cfg(not(windows))]
pub type SystemStore = EnvFileStore;

/// 构造当前平台的系统级存储
#[cfg(windows)]
pub fn system_store() -> SystemStore {
    RegistryStore::new()
}

#[cfg(not(windows))]
pub fn system_store() -> SystemStore {
    EnvFileStore::default_location()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_env_line() {
        assert_eq!(
            parse_env_line("PATH=/usr/bin:/bin"),
            Some(("PATH".to_string(), "/usr/bin:/bin".to_string()))
        );
        assert_eq!(parse_env_line("# comment"), None);
        assert_eq!(parse_env_line(""), None);
    }

    #[test]
    fn test_missing_file_without_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let store = EnvFileStore::without_env_fallback(temp_dir.path().join("path.env"));
        assert_eq!(store.read_search_path().unwrap(), None);
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = EnvFileStore::without_env_fallback(temp_dir.path().join("path.env"));

        store.write_search_path("/opt/tool/bin:/usr/bin").unwrap();
        assert_eq!(
            store.read_search_path().unwrap(),
            Some("/opt/tool/bin:/usr/bin".to_string())
        );

        // 整值替换
        store.write_search_path("/usr/bin").unwrap();
        assert_eq!(store.read_search_path().unwrap(), Some("/usr/bin".to_string()));
    }

    #[test]
    fn test_write_preserves_other_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("path.env");
        std::fs::write(&path, "# 由 envswitch 维护\nEDITOR=vim\nPATH=/usr/bin\n").unwrap();

        let store = EnvFileStore::without_env_fallback(path.clone());
        store.write_search_path("/opt/bin:/usr/bin").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("# 由 envswitch 维护"));
        assert!(content.contains("EDITOR=vim"));
        assert!(content.contains("PATH=/opt/bin:/usr/bin"));
        assert!(!content.contains("PATH=/usr/bin\n"));
    }

    #[test]
    fn test_write_creates_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let store =
            EnvFileStore::without_env_fallback(temp_dir.path().join("nested/path.env"));
        store.write_search_path("/usr/bin").unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_broadcast_is_nonfatal_noop() {
        let temp_dir = TempDir::new().unwrap();
        let store = EnvFileStore::without_env_fallback(temp_dir.path().join("path.env"));
        assert!(store.broadcast_change().is_ok());
    }
}
