//! brew 子进程执行：捕获 stdout / stderr 并检查退出码

use super::parser::clean_terminal_output;
use std::process::Output;
use thiserror::Error;

/// 包管理器调用失败
#[derive(Debug, Error)]
pub enum BrewError {
    /// 二进制不存在或无法执行
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// 非零退出
    #[error("brew {subcommand} failed: {message}")]
    Failed { subcommand: String, message: String },
}

/// 单次命令的捕获结果
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandOutput {
    pub fn combined_output(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
            (false, true) => self.stdout.clone(),
            _ => self.stderr.clone(),
        }
    }

    fn from_process(output: Output) -> Self {
        Self {
            stdout: clean_terminal_output(&String::from_utf8_lossy(&output.stdout)),
            stderr: clean_terminal_output(&String::from_utf8_lossy(&output.stderr)),
            success: output.status.success(),
        }
    }
}

/// 运行命令并返回原始输出，不检查退出码（仅在无法启动时出错）
pub fn run_unchecked(program: &str, args: &[&str]) -> Result<CommandOutput, BrewError> {
    log::debug!("exec: {} {}", program, args.join(" "));

    // 环境变量避免 brew 在 TUI 运行期间自动更新或输出颜色
    let output = duct::cmd(program, args)
        .env("HOMEBREW_NO_AUTO_UPDATE", "1")
        .env("HOMEBREW_NO_COLOR", "1")
        .env("HOMEBREW_NO_EMOJI", "1")
        .stdin_null()
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .run()
        .map_err(|source| BrewError::Spawn {
            command: program.to_string(),
            source,
        })?;

    let output = CommandOutput::from_process(output);
    if !output.success {
        log::warn!("exec failed: {} {}", program, args.join(" "));
    }
    Ok(output)
}

/// 运行命令，非零退出时转换为 `BrewError::Failed`
pub fn run(program: &str, args: &[&str]) -> Result<String, BrewError> {
    let output = run_unchecked(program, args)?;
    if output.success {
        return Ok(output.stdout);
    }

    let subcommand = args.first().copied().unwrap_or_default().to_string();
    let message = match output.stderr.trim() {
        "" => "exited with non-zero status".to_string(),
        msg => msg.lines().last().unwrap_or(msg).to_string(),
    };
    Err(BrewError::Failed { subcommand, message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let err = run("brewdash-definitely-missing-binary", &["list"]).unwrap_err();
        assert!(matches!(err, BrewError::Spawn { .. }));
        assert!(err.to_string().starts_with("failed to run brewdash-definitely-missing-binary"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_carries_stderr() {
        let err = run("sh", &["-c", "echo 'Error: No available formula' >&2; exit 1"]).unwrap_err();
        match err {
            BrewError::Failed { subcommand, message } => {
                assert_eq!(subcommand, "-c");
                assert_eq!(message, "Error: No available formula");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unchecked_keeps_output_on_failure() {
        let out = run_unchecked("sh", &["-c", "echo report; echo warning >&2; exit 1"]).unwrap();
        assert!(!out.success);
        assert_eq!(out.combined_output(), "report\nwarning");
    }

    #[test]
    fn test_combined_output_single_stream() {
        let out = CommandOutput {
            stdout: String::new(),
            stderr: "only stderr".into(),
            success: false,
        };
        assert_eq!(out.combined_output(), "only stderr");
    }
}
