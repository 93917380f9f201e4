//! Completion installation into the user's shell directories

use super::{render, Shell};
use crate::error::{CompletionError, CompletionResult};
use crate::model::ResolvedTree;
use directories::BaseDirs;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Where a script was installed and what the user still has to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub shell: Shell,
    /// Absolute path of the installed script
    pub path: PathBuf,
    pub hint: String,
}

/// Install location of `program`'s script for `shell` under `home`
pub fn install_path(shell: Shell, home: &Path, program: &str) -> PathBuf {
    match shell {
        Shell::Bash => home.join(".bash_completion.d").join(program),
        Shell::Zsh => home.join(".zsh").join("completions").join(format!("_{}", program)),
        Shell::Fish => home
            .join(".config")
            .join("fish")
            .join("completions")
            .join(format!("{}.fish", program)),
    }
}

fn hint(shell: Shell, path: &Path) -> String {
    match shell {
        Shell::Bash => format!("Add 'source {}' to ~/.bashrc", path.display()),
        Shell::Zsh => format!(
            "Add 'fpath=({} $fpath)' before compinit in ~/.zshrc",
            path.parent().unwrap_or(path).display()
        ),
        Shell::Fish => "Fish loads it automatically in new shells".to_string(),
    }
}

/// Install into the current user's home; the shell defaults to `$SHELL`
pub fn install_completion(shell: Option<Shell>, tree: &ResolvedTree) -> CompletionResult<InstallOutcome> {
    let shell = match shell {
        Some(shell) => shell,
        None => Shell::detect()?,
    };
    let dirs = BaseDirs::new().ok_or(CompletionError::NoHomeDirectory)?;
    install_completion_into(dirs.home_dir(), shell, tree)
}

/// Install under an explicit home directory
///
/// The directory is created when missing. The script is written to a temporary file
/// in the same directory and renamed over the destination, so an existing script is
/// either fully replaced or left alone.
pub fn install_completion_into(home: &Path, shell: Shell, tree: &ResolvedTree) -> CompletionResult<InstallOutcome> {
    let path = install_path(shell, home, &tree.name);
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| CompletionError::Io { path, source }
    };

    let dir = path.parent().unwrap_or(home);
    fs::create_dir_all(dir).map_err(io_error(dir))?;

    let mut file = NamedTempFile::new_in(dir).map_err(io_error(dir))?;
    file.write_all(render(tree, shell).as_bytes())
        .map_err(io_error(&path))?;
    file.persist(&path).map_err(|e| CompletionError::Io {
        path: path.clone(),
        source: e.error,
    })?;

    let path = fs::canonicalize(&path).unwrap_or(path);
    Ok(InstallOutcome {
        shell,
        hint: hint(shell, &path),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::super::tests::demo_tree;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_install_paths() {
        let home = Path::new("/home/u");
        assert_eq!(
            install_path(Shell::Bash, home, "demo"),
            PathBuf::from("/home/u/.bash_completion.d/demo")
        );
        assert_eq!(
            install_path(Shell::Zsh, home, "demo"),
            PathBuf::from("/home/u/.zsh/completions/_demo")
        );
        assert_eq!(
            install_path(Shell::Fish, home, "demo"),
            PathBuf::from("/home/u/.config/fish/completions/demo.fish")
        );
    }

    #[test]
    fn test_install_creates_directory_and_writes_script() {
        let home = TempDir::new().unwrap();
        let tree = demo_tree();
        let outcome = install_completion_into(home.path(), Shell::Fish, &tree).unwrap();

        assert!(outcome.path.is_absolute());
        assert!(outcome.path.ends_with(".config/fish/completions/demo.fish"));
        let written = fs::read_to_string(&outcome.path).unwrap();
        assert_eq!(written, render(&tree, Shell::Fish));
    }

    #[test]
    fn test_install_replaces_existing_script() {
        let home = TempDir::new().unwrap();
        let tree = demo_tree();
        let target = install_path(Shell::Bash, home.path(), "demo");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "old").unwrap();

        install_completion_into(home.path(), Shell::Bash, &tree).unwrap();
        assert!(fs::read_to_string(&target).unwrap().starts_with("# bash completion for demo"));
    }

    #[test]
    fn test_install_failure_is_reported() {
        let home = TempDir::new().unwrap();
        // `.zsh` is a file, so the completions directory cannot be created
        fs::write(home.path().join(".zsh"), "").unwrap();

        let err = install_completion_into(home.path(), Shell::Zsh, &demo_tree()).unwrap_err();
        assert!(matches!(err, CompletionError::Io { .. }));
    }
}
