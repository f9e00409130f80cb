// 受支持工具的定义表
//
// 每个工具以数据形式携带探测参数、输出流与版本提取模式，
// 扫描器对所有工具统一迭代。新增工具只需加一个表项。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 版本号 -> 可执行文件绝对路径
///
/// 同一版本号只保留一个路径，合并时后写者胜出。
pub type VersionMap = BTreeMap<String, String>;

/// 工具名 -> 版本映射
///
/// 扫描结果对所有受支持工具是全映射：没有任何发现的工具
/// 也以空子映射出现，绝不缺键。
pub type Inventory = BTreeMap<String, VersionMap>;

/// 工具类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// 语言解释器（Python）
    Interpreter,
    /// JS 运行时（Node.js）
    Runtime,
    /// JVM 启动器（Java）
    Launcher,
    /// 版本控制客户端（Git）
    VcsClient,
}

/// 版本信息打印到哪个流
///
/// Python 与 Java 将版本写到 stderr，Node.js 与 Git 写到 stdout，
/// 这一差异是工具自身行为，必须保留。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStream {
    Stdout,
    Stderr,
}

/// 版本号提取模式
#[derive(Debug, Clone, Copy)]
pub enum VersionPattern {
    /// 正则捕获第一个分组
    Capture(&'static Lazy<Regex>),
    /// 原样输出，去掉前导 v 与空白
    RawStripV,
}

static PYTHON_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Python (\d+\.\d+\.\d+)").expect("invalid python version regex"));

static JAVA_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"version "(\d+\.\d+\.\d+[^"]*)""#).expect("invalid java version regex")
});

static GIT_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"git version (\d+\.\d+\.\d+\S*)").expect("invalid git version regex")
});

/// 单个工具的探测定义
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub kind: ToolKind,
    /// 清单中使用的工具名
    pub name: &'static str,
    /// 可执行文件基础名（不含平台扩展名）
    pub executable: &'static str,
    /// 版本查询参数
    pub probe_flag: &'static str,
    /// 版本输出所在的流
    pub stream: ProbeStream,
    /// 版本号提取模式
    pub pattern: VersionPattern,
}

/// 受支持工具的固定表
static SUPPORTED_TOOLS: [ToolSpec; 4] = [
    ToolSpec {
        kind: ToolKind::Interpreter,
        name: "Python",
        executable: "python",
        probe_flag: "--version",
        stream: ProbeStream::Stderr,
        pattern: VersionPattern::Capture(&PYTHON_VERSION),
    },
    ToolSpec {
        kind: ToolKind::Runtime,
        name: "Node.js",
        executable: "node",
        probe_flag: "--version",
        stream: ProbeStream::Stdout,
        pattern: VersionPattern::RawStripV,
    },
    ToolSpec {
        kind: ToolKind::Launcher,
        name: "Java",
        executable: "java",
        probe_flag: "-version",
        stream: ProbeStream::Stderr,
        pattern: VersionPattern::Capture(&JAVA_VERSION),
    },
    ToolSpec {
        kind: ToolKind::VcsClient,
        name: "Git",
        executable: "git",
        probe_flag: "--version",
        stream: ProbeStream::Stdout,
        pattern: VersionPattern::Capture(&GIT_VERSION),
    },
];

/// 获取全部受支持工具
pub fn supported_tools() -> &'static [ToolSpec] {
    &SUPPORTED_TOOLS
}

impl ToolSpec {
    /// 从探测输出中提取版本号
    ///
    /// 提取失败返回 `None`，由调用方跳过该候选。
    pub fn extract_version(&self, output: &str) -> Option<String> {
        match self.pattern {
            VersionPattern::Capture(re) => re
                .captures(output)?
                .get(1)
                .map(|m| m.as_str().to_string()),
            VersionPattern::RawStripV => {
                let version = output.trim().trim_start_matches('v').trim();
                if version.is_empty() {
                    None
                } else {
                    Some(version.to_string())
                }
            }
        }
    }
}

/// 构造对所有工具全映射的空清单
pub fn empty_inventory() -> Inventory {
    supported_tools()
        .iter()
        .map(|tool| (tool.name.to_string(), VersionMap::new()))
        .collect()
}
