//! Remembered user name
//!
//! The name is stored in a small JSON file so returning users are greeted
//! without being asked again.

use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::Result;

/// Contents of the memory file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMemory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl UserMemory {
    /// Load from `path`. A missing or unreadable file yields an empty memory.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring unreadable memory file");
            Self::default()
        })
    }

    /// Write to `path`, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// How the user name was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Greeting {
    /// First visit: the name was just learned
    New(String),
    /// The name came from the memory file
    Returning(String),
}

impl Greeting {
    pub fn user_name(&self) -> &str {
        match self {
            Greeting::New(name) | Greeting::Returning(name) => name,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Greeting::New(name) => format!("Nice to meet you, {}!", name),
            Greeting::Returning(name) => format!("Welcome back, {}!", name),
        }
    }
}

/// Resolve the user name: explicit flag, then the memory file, then ask.
///
/// Names given by flag or prompt are remembered for next time.
pub fn resolve_user_name(
    explicit: Option<&str>,
    memory_path: &Path,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<Greeting> {
    let mut memory = UserMemory::load(memory_path);

    if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
        let greeting = if memory.user_name.as_deref() == Some(name) {
            Greeting::Returning(name.to_string())
        } else {
            Greeting::New(name.to_string())
        };
        remember(&mut memory, name, memory_path);
        return Ok(greeting);
    }

    if let Some(name) = memory.user_name.clone().filter(|n| !n.trim().is_empty()) {
        info!(user_name = %name, "loaded user name");
        return Ok(Greeting::Returning(name));
    }

    let mut name = String::new();
    while name.trim().is_empty() {
        write!(output, "What's your name? ")?;
        output.flush()?;

        name.clear();
        if input.read_line(&mut name)? == 0 {
            name = "friend".to_string();
            break;
        }
    }

    let name = name.trim().to_string();
    remember(&mut memory, &name, memory_path);
    Ok(Greeting::New(name))
}

fn remember(memory: &mut UserMemory, name: &str, path: &Path) {
    memory.user_name = Some(name.to_string());
    match memory.save(path) {
        Ok(()) => info!(user_name = %name, "saved user name"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to save user name"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_asks_then_remembers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");

        let mut output = Vec::new();
        let greeting =
            resolve_user_name(None, &path, &mut Cursor::new("\nAda\n"), &mut output).unwrap();
        assert_eq!(greeting, Greeting::New("Ada".to_string()));
        assert_eq!(greeting.message(), "Nice to meet you, Ada!");
        assert_eq!(
            String::from_utf8(output).unwrap().matches("What's your name?").count(),
            2
        );

        let greeting =
            resolve_user_name(None, &path, &mut Cursor::new(""), &mut Vec::new()).unwrap();
        assert_eq!(greeting.message(), "Welcome back, Ada!");
    }

    #[test]
    fn test_explicit_name_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        UserMemory {
            user_name: Some("Ada".to_string()),
        }
        .save(&path)
        .unwrap();

        let greeting =
            resolve_user_name(Some("Grace"), &path, &mut Cursor::new(""), &mut Vec::new())
                .unwrap();
        assert_eq!(greeting, Greeting::New("Grace".to_string()));
        assert_eq!(UserMemory::load(&path).user_name.as_deref(), Some("Grace"));
    }

    #[test]
    fn test_corrupt_memory_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        fs::write(&path, "not json").unwrap();

        assert_eq!(UserMemory::load(&path), UserMemory::default());
    }
}
