//! Terminal detection

use is_terminal::IsTerminal;
use std::env;
use std::io::{stderr, stdout};

const CI_VARS: [&str; 7] = [
    "CI",
    "CONTINUOUS_INTEGRATION",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "JENKINS_URL",
    "BUILDKITE",
    "TF_BUILD",
];

/// What the attached streams can display, captured once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalCaps {
    pub stdout_tty: bool,
    pub stderr_tty: bool,
    /// `TERM` names something that understands escape codes
    pub ansi_term: bool,
    pub no_color: bool,
    pub ci: bool,
}

impl TerminalCaps {
    pub fn detect() -> Self {
        let term = env::var("TERM").unwrap_or_default();
        Self {
            stdout_tty: stdout().is_terminal(),
            stderr_tty: stderr().is_terminal(),
            ansi_term: !(term.is_empty() || term == "dumb"),
            no_color: env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty()),
            ci: CI_VARS.iter().any(|var| env::var_os(var).is_some()),
        }
    }

    /// Level colours in text reports
    pub fn color_stdout(&self) -> bool {
        self.stdout_tty && self.ansi_term && !self.no_color
    }

    /// Warm-up bars are drawn on stderr, and only for someone watching
    pub fn show_progress(&self) -> bool {
        self.stderr_tty && self.ansi_term && !self.ci
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interactive() -> TerminalCaps {
        TerminalCaps {
            stdout_tty: true,
            stderr_tty: true,
            ansi_term: true,
            no_color: false,
            ci: false,
        }
    }

    #[test]
    fn test_interactive_terminal_gets_everything() {
        let caps = interactive();
        assert!(caps.color_stdout());
        assert!(caps.show_progress());
    }

    #[test]
    fn test_piped_stdout_keeps_progress() {
        let caps = TerminalCaps {
            stdout_tty: false,
            ..interactive()
        };
        assert!(!caps.color_stdout());
        assert!(caps.show_progress());
    }

    #[test]
    fn test_no_color_and_ci() {
        let caps = TerminalCaps {
            no_color: true,
            ci: true,
            ..interactive()
        };
        assert!(!caps.color_stdout());
        assert!(!caps.show_progress());
    }

    #[test]
    fn test_dumb_terminal() {
        let caps = TerminalCaps {
            ansi_term: false,
            ..interactive()
        };
        assert!(!caps.color_stdout());
        assert!(!caps.show_progress());
    }
}
