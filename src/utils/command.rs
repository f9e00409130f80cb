//! 外部命令执行
//!
//! 提供统一的"隐藏窗口、捕获双流、有界等待"执行原语。
//! 版本探测对所有工具都走这一个入口，不在业务逻辑里
//! 做平台相关的管道处理。

use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

/// 默认探测超时
///
/// 版本查询应在毫秒级完成，超时意味着候选文件行为异常，
/// 按执行失败处理。
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// 命令执行结果
#[derive(Debug)]
pub struct CommandResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandResult {
    fn from_error(error: io::Error) -> Self {
        CommandResult {
            success: false,
            stdout: String::new(),
            stderr: error.to_string(),
            exit_code: None,
        }
    }

    fn timed_out() -> Self {
        CommandResult {
            success: false,
            stdout: String::new(),
            stderr: "执行超时".to_string(),
            exit_code: None,
        }
    }
}

/// 以隐藏窗口方式执行可执行文件并捕获输出
///
/// 子进程带单个参数启动，不提供任何交互输入，stdout 与 stderr
/// 分别捕获。在 `timeout` 内轮询等待；超时则杀死子进程并视为
/// 执行失败。任何失败都会通过 `CommandResult` 返回，绝不 panic。
pub fn run_version_command(executable: &Path, flag: &str, timeout: Duration) -> CommandResult {
    let mut cmd = Command::new(executable);
    cmd.arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(windows)]
    cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW

    match cmd.spawn() {
        Ok(child) => wait_with_timeout(child, timeout),
        Err(e) => {
            tracing::debug!(executable = %executable.display(), error = %e, "子进程启动失败");
            CommandResult::from_error(e)
        }
    }
}

/// 有界等待子进程退出
///
/// 轮询 `try_wait`，到达期限后杀死子进程。版本输出很小，
/// 不会填满管道缓冲区，退出后一次性读取即可。
fn wait_with_timeout(mut child: Child, timeout: Duration) -> CommandResult {
    let deadline = Instant::now() + timeout;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let stdout = read_pipe(child.stdout.take());
                let stderr = read_pipe(child.stderr.take());
                return CommandResult {
                    success: status.success(),
                    stdout,
                    stderr,
                    exit_code: status.code(),
                };
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return CommandResult::timed_out();
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return CommandResult::from_error(e);
            }
        }
    }
}

fn read_pipe<R: Read>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).trim().to_string()
}
