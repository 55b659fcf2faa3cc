use std::process::Stdio;

/// Program plus arguments used to launch a tool server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Command line for display and logging.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Adapt a spec to the host platform.
///
/// On Windows, launchers like `npx` are batch shims and have to go through
/// `cmd /C`.
#[must_use]
pub fn platform_command(spec: &CommandSpec) -> CommandSpec {
    if cfg!(target_os = "windows") {
        let mut args = vec!["/C".to_string(), spec.program.clone()];
        args.extend(spec.args.iter().cloned());
        CommandSpec {
            program: "cmd".to_string(),
            args,
        }
    } else {
        spec.clone()
    }
}

/// Build a child process speaking over piped stdin/stdout.
///
/// Stderr is discarded so server banners do not interleave with the
/// terminal session; the child is killed when its handle is dropped.
#[must_use]
pub fn build_command(spec: &CommandSpec) -> tokio::process::Command {
    let spec = platform_command(spec);
    let mut cmd = tokio::process::Command::new(&spec.program);
    cmd.args(&spec.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_arguments() {
        let spec = CommandSpec::new(
            "npx",
            vec!["-y".to_string(), "@upstash/context7-mcp@latest".to_string()],
        );
        assert_eq!(spec.display(), "npx -y @upstash/context7-mcp@latest");
    }

    #[test]
    fn platform_command_shape() {
        let spec = CommandSpec::new("npx", vec!["-y".to_string()]);
        let resolved = platform_command(&spec);
        if cfg!(target_os = "windows") {
            assert_eq!(resolved.program, "cmd");
            assert_eq!(resolved.args, ["/C", "npx", "-y"]);
        } else {
            assert_eq!(resolved, spec);
        }
    }
}
