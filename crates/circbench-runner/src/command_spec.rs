use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use tokio::process::Command as TokioCommand;

/// One solver invocation, described as an argv list.
///
/// Arguments are `Vec<OsString>`, never a shell string: no `sh -c`, no
/// word splitting, so a variant called `Teste1; rm -rf ~` is just an odd
/// argument.
///
/// ```rust
/// use circbench_runner::CommandSpec;
/// use std::ffi::OsString;
///
/// let cmd = CommandSpec::new("oplrun")
///     .arg("-p")
///     .arg("/srv/model")
///     .arg("Teste1")
///     .cwd("/srv/model");
///
/// assert_eq!(cmd.program, OsString::from("oplrun"));
/// assert_eq!(cmd.args.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub env: Option<BTreeMap<OsString, OsString>>,
    /// File-name-safe name used for the debug output artifact.
    pub label: Option<String>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Build the tokio command. Stdio and process-group setup are applied by
    /// the supervisor.
    #[must_use]
    pub fn to_tokio_command(&self) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        if let Some(ref env) = self.env {
            for (key, value) in env {
                cmd.env(key, value);
            }
        }

        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_builder() {
        let cmd = CommandSpec::new("oplrun")
            .args(["-p", "/srv/model"])
            .arg("Teste3")
            .cwd("/srv/model")
            .label("n8_k1_Teste3_r1");
        assert_eq!(cmd.program, OsString::from("oplrun"));
        assert_eq!(cmd.args.len(), 3);
        assert_eq!(cmd.args[2], OsString::from("Teste3"));
        assert_eq!(cmd.cwd, Some(PathBuf::from("/srv/model")));
        assert_eq!(cmd.label.as_deref(), Some("n8_k1_Teste3_r1"));
        assert!(cmd.env.is_none());
    }

    #[test]
    fn test_command_spec_env() {
        let cmd = CommandSpec::new("oplrun")
            .env("OMP_NUM_THREADS", "1")
            .env("LANG", "C");
        let env = cmd.env.as_ref().unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env.get(&OsString::from("LANG")), Some(&OsString::from("C")));
    }

    #[test]
    fn test_shell_metacharacters_stay_one_argument() {
        let cmd = CommandSpec::new("oplrun").arg("Teste1; rm -rf ~");
        assert_eq!(cmd.args.len(), 1);
        assert_eq!(cmd.args[0], OsString::from("Teste1; rm -rf ~"));
    }

    #[test]
    fn test_display() {
        let cmd = CommandSpec::new("oplrun").args(["-p", ".", "Teste1"]);
        assert_eq!(cmd.to_string(), "oplrun -p . Teste1");
    }
}
