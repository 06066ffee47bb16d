use std::env;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use crate::action::domain::action_target::{ActionTarget, ResolveError, TargetLocator};

/// Locates an executable and fires it once per opening transition.
///
/// A program name containing a path separator is checked as-is; a bare name
/// is searched for in the configured search path (`PATH` by default).
pub struct CommandLocator {
    program: String,
    args: Vec<String>,
    search_path: Vec<PathBuf>,
}

impl CommandLocator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let search_path = env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_default();
        Self {
            program: program.into(),
            args,
            search_path,
        }
    }

    pub fn with_search_path(mut self, search_path: Vec<PathBuf>) -> Self {
        self.search_path = search_path;
        self
    }

    fn find(&self) -> Option<PathBuf> {
        let direct = Path::new(&self.program);
        if direct.components().count() > 1 {
            return direct.is_file().then(|| direct.to_path_buf());
        }

        self.search_path.iter().find_map(|dir| {
            executable_names(&self.program)
                .into_iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
    }
}

#[cfg(windows)]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string(), format!("{program}.exe")]
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string()]
}

impl TargetLocator for CommandLocator {
    fn locate(&mut self) -> Result<Box<dyn ActionTarget>, ResolveError> {
        let path = self
            .find()
            .ok_or_else(|| ResolveError::NotFound(self.program.clone()))?;
        Ok(Box::new(CommandTarget {
            path,
            args: self.args.clone(),
            children: Vec::new(),
        }))
    }
}

/// A resolved program, spawned without waiting on each trigger.
pub struct CommandTarget {
    path: PathBuf,
    args: Vec<String>,
    children: Vec<Child>,
}

impl CommandTarget {
    /// Drops handles of children that have already exited.
    fn reap(&mut self) {
        self.children
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }
}

impl ActionTarget for CommandTarget {
    fn trigger(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.reap();
        let child = Command::new(&self.path).args(&self.args).spawn()?;
        self.children.push(child);
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl Drop for CommandTarget {
    fn drop(&mut self) {
        for child in &mut self.children {
            let _ = child.wait();
        }
    }
}
