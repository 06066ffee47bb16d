use crate::action::domain::action_target::{ActionTarget, ResolveError, TargetLocator};

/// Target that only logs each trigger. Always resolves.
///
/// Used when no external program is configured, so a session can run
/// end-to-end and report how often the action would have fired.
pub struct LogLocator {
    name: String,
}

impl LogLocator {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TargetLocator for LogLocator {
    fn locate(&mut self) -> Result<Box<dyn ActionTarget>, ResolveError> {
        Ok(Box::new(LogTarget {
            name: self.name.clone(),
            fired: 0,
        }))
    }
}

pub struct LogTarget {
    name: String,
    fired: usize,
}

impl ActionTarget for LogTarget {
    fn trigger(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.fired += 1;
        log::info!("[{}] fire #{}", self.name, self.fired);
        Ok(())
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
