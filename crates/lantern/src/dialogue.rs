//! Dialogue data: conversations parsed from RON files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use app::LOG_MAIN;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub lines: Vec<DialogueLine>,
}

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("failed to parse narrative data: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("conversation `{0}` is defined twice")]
    DuplicateId(String),
    #[error("failed to read narrative file: {0}")]
    Io(#[from] std::io::Error),
}

/// All known conversations, by id.
#[derive(Resource, Debug, Default)]
pub struct NarrativeLibrary {
    conversations: HashMap<String, Conversation>,
}

impl NarrativeLibrary {
    /// Parse a RON list of conversations and add them.
    ///
    /// Nothing is added if any id is already known or repeated in `source`.
    pub fn extend_from_ron(&mut self, source: &str) -> Result<usize, NarrativeError> {
        let parsed: Vec<Conversation> = ron::from_str(source)?;

        let mut seen = Vec::with_capacity(parsed.len());
        for conversation in &parsed {
            if self.conversations.contains_key(&conversation.id)
                || seen.contains(&&conversation.id)
            {
                return Err(NarrativeError::DuplicateId(conversation.id.clone()));
            }
            seen.push(&conversation.id);
        }

        let added = parsed.len();
        for conversation in parsed {
            self.conversations.insert(conversation.id.clone(), conversation);
        }
        Ok(added)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<usize, NarrativeError> {
        let source = fs::read_to_string(path)?;
        self.extend_from_ron(&source)
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

/// Walks through one conversation line by line.
#[derive(Resource, Debug, Clone)]
pub struct ConversationCursor {
    conversation: Conversation,
    index: usize,
}

impl ConversationCursor {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            index: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.conversation.id
    }

    /// The line to show, `None` once the conversation is over.
    pub fn current(&self) -> Option<&DialogueLine> {
        self.conversation.lines.get(self.index)
    }

    /// Move to the next line and return it.
    pub fn advance(&mut self) -> Option<&DialogueLine> {
        if self.index < self.conversation.lines.len() {
            self.index += 1;
        }
        self.current()
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.conversation.lines.len()
    }
}

/// Loads every `*.ron` file of the configured directories into the
/// [`NarrativeLibrary`] at startup. Broken files are logged and skipped.
#[derive(Default)]
pub struct NarrativePlugin {
    dirs: Vec<PathBuf>,
}

impl NarrativePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.push(dir.into());
        self
    }
}

impl Plugin for NarrativePlugin {
    fn build(&self, app: &mut App) {
        let mut library = NarrativeLibrary::default();
        for dir in &self.dirs {
            load_dir(&mut library, dir);
        }
        info!(target: LOG_MAIN, conversations = library.len(), "narrative library loaded");
        app.insert_resource(library);
    }
}

fn load_dir(library: &mut NarrativeLibrary, dir: &Path) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(target: LOG_MAIN, dir = %dir.display(), %err, "no narrative directory");
            return;
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();

    for file in files {
        if let Err(err) = library.load_file(&file) {
            warn!(target: LOG_MAIN, file = %file.display(), %err, "skipping narrative file");
        }
    }
}
