//! Engine CLI invocation builder.
//!
//! A [`CommandRunner`] accumulates the arguments of one engine invocation and
//! executes it against a target environment. Arguments are passed to the
//! engine verbatim, one token per argument, so values never need quoting.

use crate::container::{ContainerError, Result};
use crate::env;
use crate::environment::TargetEnvironment;
use crate::executor::{CommandExecutor, ExecutionCommand};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, info};

/// Engine CLI settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine binary, looked up on `PATH` if not absolute
    pub binary: String,
    /// Log every assembled command line before running it
    pub echo_commands: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: env::DEFAULT_ENGINE_BINARY.to_string(),
            echo_commands: false,
        }
    }
}

/// Builder for one engine invocation.
pub struct CommandRunner<'a> {
    executor: &'a dyn CommandExecutor,
    engine: &'a EngineConfig,
    environment: &'a TargetEnvironment,
    args: Vec<String>,
    echo: bool,
}

impl<'a> CommandRunner<'a> {
    /// Create an empty invocation scoped to `environment`.
    pub fn new(
        executor: &'a dyn CommandExecutor,
        engine: &'a EngineConfig,
        environment: &'a TargetEnvironment,
    ) -> Self {
        Self {
            executor,
            engine,
            environment,
            args: Vec::new(),
            echo: engine.echo_commands,
        }
    }

    /// Append one argument.
    pub fn arg(&mut self, token: impl Into<String>) -> &mut Self {
        self.args.push(token.into());
        self
    }

    /// Append several arguments in order.
    pub fn args<I, S>(&mut self, tokens: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(tokens.into_iter().map(Into::into));
        self
    }

    /// Surface the assembled command line before execution.
    pub fn echo_invocation(&mut self, enabled: bool) -> &mut Self {
        self.echo = enabled;
        self
    }

    /// Arguments accumulated so far.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Shell-escaped rendering of the full command line.
    pub fn command_line(&self) -> String {
        std::iter::once(self.engine.binary.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|token| shell_escape::escape(Cow::Borrowed(token)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the invocation and return its trimmed standard output.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::EngineExecution`] with the captured error
    /// output if the engine exits nonzero, or an executor error if it could
    /// not be run at all.
    pub async fn execute(&self) -> Result<String> {
        let command_line = self.command_line();
        if self.echo {
            info!("[{}] {}", self.environment.name, command_line);
        }

        let command = ExecutionCommand::new(self.engine.binary.clone(), self.args.clone())
            .with_envs(self.environment.connection.engine_env()?);

        let result = self.executor.execute(command).await?;
        debug!(
            "Engine command finished in {:?} with exit code {}",
            result.duration, result.exit_code
        );

        if !result.success() {
            return Err(ContainerError::EngineExecution {
                command: command_line,
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            });
        }

        Ok(result.stdout.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EngineConnection;
    use crate::executor::{ExecutionResult, ExecutorError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records the command and answers with a fixed result.
    struct FixedExecutor {
        exit_code: i32,
        stdout: &'static str,
        stderr: &'static str,
        seen: Mutex<Vec<ExecutionCommand>>,
    }

    impl FixedExecutor {
        fn new(exit_code: i32, stdout: &'static str, stderr: &'static str) -> Self {
            Self {
                exit_code,
                stdout,
                stderr,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandExecutor for FixedExecutor {
        async fn execute(
            &self,
            cmd: ExecutionCommand,
        ) -> std::result::Result<ExecutionResult, ExecutorError> {
            self.seen.lock().unwrap().push(cmd);
            Ok(ExecutionResult {
                stdout: self.stdout.to_string(),
                stderr: self.stderr.to_string(),
                exit_code: self.exit_code,
                duration: Duration::ZERO,
            })
        }

        fn executor_type(&self) -> &'static str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_execute_returns_trimmed_stdout() {
        let executor = FixedExecutor::new(0, "  4f66ad9a0b2e\n", "");
        let engine = EngineConfig::default();
        let env = TargetEnvironment::local("dev");

        let mut runner = CommandRunner::new(&executor, &engine, &env);
        runner.arg("run").args(["-d", "nginx"]);

        assert_eq!(runner.execute().await.unwrap(), "4f66ad9a0b2e");

        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen[0].program, "docker");
        assert_eq!(seen[0].args, vec!["run", "-d", "nginx"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_engine_execution_error() {
        let executor = FixedExecutor::new(125, "", "Error: conflict\n");
        let engine = EngineConfig::default();
        let env = TargetEnvironment::local("dev");

        let mut runner = CommandRunner::new(&executor, &engine, &env);
        runner.arg("rm").arg("--force").arg("abc");

        match runner.execute().await {
            Err(ContainerError::EngineExecution {
                command,
                exit_code,
                stderr,
            }) => {
                assert_eq!(command, "docker rm --force abc");
                assert_eq!(exit_code, 125);
                assert_eq!(stderr, "Error: conflict");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_is_passed_as_environment() {
        let executor = FixedExecutor::new(0, "", "");
        let engine = EngineConfig {
            binary: "/usr/local/bin/docker".to_string(),
            echo_commands: true,
        };
        let env = TargetEnvironment::local("prod").with_connection(EngineConnection {
            host: Some("tcp://10.0.0.5:2376".to_string()),
            ..Default::default()
        });

        let mut runner = CommandRunner::new(&executor, &engine, &env);
        runner.arg("ps");
        runner.execute().await.unwrap();

        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen[0].program, "/usr/local/bin/docker");
        assert_eq!(seen[0].env["DOCKER_HOST"], "tcp://10.0.0.5:2376");
    }

    #[tokio::test]
    async fn test_invalid_connection_fails_before_running() {
        let executor = FixedExecutor::new(0, "", "");
        let engine = EngineConfig::default();
        let env = TargetEnvironment::local("prod").with_connection(EngineConnection {
            host: Some("http://10.0.0.5".to_string()),
            ..Default::default()
        });

        let mut runner = CommandRunner::new(&executor, &engine, &env);
        runner.arg("ps");

        assert!(matches!(
            runner.execute().await,
            Err(ContainerError::Environment(_))
        ));
        assert!(executor.seen.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_line_is_shell_escaped() {
        let executor = FixedExecutor::new(0, "", "");
        let engine = EngineConfig::default();
        let env = TargetEnvironment::local("dev");

        let mut runner = CommandRunner::new(&executor, &engine, &env);
        runner
            .arg("--label")
            .arg("traefik.frontend.rule=Host: blog.internal")
            .echo_invocation(true);

        assert_eq!(
            runner.command_line(),
            "docker --label 'traefik.frontend.rule=Host: blog.internal'"
        );
    }
}
