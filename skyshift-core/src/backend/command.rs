use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::CommandConfig;
use crate::error::{Result, SkyshiftError};

use super::WallpaperBackend;

const PATH_PLACEHOLDER: &str = "{path}";

/// Runs an external setter such as `swww img {path}` or
/// `feh --bg-fill {path}`.
pub struct CommandBackend {
    config: CommandConfig,
}

impl CommandBackend {
    pub fn new(config: CommandConfig) -> Self {
        Self { config }
    }

    fn build_command(&self, path: &Path) -> Command {
        let path_str = path.to_string_lossy();
        let mut cmd = Command::new(&self.config.program);
        let mut substituted = false;
        for arg in &self.config.args {
            if arg.contains(PATH_PLACEHOLDER) {
                substituted = true;
            }
            cmd.arg(arg.replace(PATH_PLACEHOLDER, &path_str));
        }
        // no placeholder: the path goes last
        if !substituted {
            cmd.arg(path);
        }
        cmd
    }
}

#[async_trait]
impl WallpaperBackend for CommandBackend {
    async fn set_wallpaper(&self, path: &Path) -> Result<()> {
        let program = &self.config.program;
        let output = self
            .build_command(path)
            .output()
            .await
            .map_err(|e| SkyshiftError::Backend(format!("failed to run {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SkyshiftError::Backend(format!("{program} failed: {stderr}")));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "command"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_placeholder_substitution() {
        let backend = CommandBackend::new(CommandConfig {
            program: "feh".into(),
            args: vec!["--bg-fill".into(), "{path}".into()],
        });
        let path = PathBuf::from("/data/wallpapers/wallpaper_1.jpg");

        let cmd = backend.build_command(&path);
        let prog = cmd.as_std().get_program().to_string_lossy().to_string();
        assert_eq!(prog, "feh");
        assert_eq!(args_of(&cmd), vec!["--bg-fill", "/data/wallpapers/wallpaper_1.jpg"]);
    }

    #[test]
    fn test_embedded_placeholder_and_default_position() {
        let path = PathBuf::from("/tmp/w.png");

        let backend = CommandBackend::new(CommandConfig {
            program: "gsettings".into(),
            args: vec![
                "set".into(),
                "org.gnome.desktop.background".into(),
                "picture-uri".into(),
                "file://{path}".into(),
            ],
        });
        assert_eq!(args_of(&backend.build_command(&path))[3], "file:///tmp/w.png");

        let backend = CommandBackend::new(CommandConfig {
            program: "setter".into(),
            args: vec!["--quiet".into()],
        });
        assert_eq!(args_of(&backend.build_command(&path)), vec!["--quiet", "/tmp/w.png"]);
    }

    #[tokio::test]
    async fn test_failing_program_is_backend_error() {
        let backend = CommandBackend::new(CommandConfig {
            program: "skyshift-no-such-setter".into(),
            args: vec!["{path}".into()],
        });
        let err = backend.set_wallpaper(Path::new("/tmp/x.jpg")).await.unwrap_err();
        assert!(matches!(err, SkyshiftError::Backend(_)));
    }
}
