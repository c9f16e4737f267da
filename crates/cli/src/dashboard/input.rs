//! Dashboard command line parsing.

/// A command typed into the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardCommand {
    /// Submit a scan. Missing arguments fall back to the form values.
    Scan {
        profile: Option<String>,
        output: Option<String>,
        title: Option<String>,
    },
    Profile(String),
    Output(String),
    /// Set the title; an empty string clears it.
    Title(String),
    Refresh,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<DashboardCommand>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match verb.to_ascii_lowercase().as_str() {
        "scan" | "s" => DashboardCommand::Scan {
            profile: rest.first().map(|s| s.to_string()),
            output: rest.get(1).map(|s| s.to_string()),
            title: (rest.len() > 2).then(|| rest[2..].join(" ")),
        },
        "profile" | "p" => match rest.as_slice() {
            [name] => DashboardCommand::Profile(name.to_string()),
            _ => return Err(CommandError::Usage("profile <name>")),
        },
        "output" | "o" => match rest.as_slice() {
            [target] => DashboardCommand::Output(target.to_string()),
            _ => return Err(CommandError::Usage("output <target>")),
        },
        "title" | "t" => DashboardCommand::Title(rest.join(" ")),
        "refresh" | "r" => DashboardCommand::Refresh,
        "quit" | "q" | "exit" => DashboardCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}
