use std::fmt;

use crate::dictionary::store::DictionaryStore;

/// Line written after every command reply.
pub const SEPARATOR: &str = "---------------\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get(String),
    Set { word: String, desc: String },
    Clear,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The chunk held no tokens at all
    Missing,
    GetUsage,
    SetUsage,
    Unknown(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Missing => f.write_str("A command was expected."),
            CommandError::GetUsage => f.write_str("Expected format is: GET <word>."),
            CommandError::SetUsage => f.write_str("Expected format is: SET <word> <desc>"),
            CommandError::Unknown(_) => f.write_str("Command not found."),
        }
    }
}

impl std::error::Error for CommandError {}

/// Outcome of a command, rendered as an `ANSWER` or `ERROR` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Answer(String),
    Error(String),
}

impl Reply {
    /// Wire form: the reply line, plus the separator for parsed commands.
    pub fn to_wire(&self, with_separator: bool) -> String {
        let mut out = match self {
            Reply::Answer(text) => format!("ANSWER {}\r\n", text),
            Reply::Error(text) => format!("ERROR {}\r\n", text),
        };

        if with_separator {
            out.push_str(SEPARATOR);
        }

        out
    }
}

impl Command {
    /// Parses one chunk of client input. Tokens are separated by any whitespace;
    /// a description keeps its words joined by single spaces.
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let tokens: Vec<&str> = input.split_whitespace().collect();

        let (name, args) = tokens.split_first().ok_or(CommandError::Missing)?;

        match *name {
            "GET" => match args.first() {
                Some(word) => Ok(Command::Get(word.to_string())),
                None => Err(CommandError::GetUsage),
            },
            "SET" => match args.split_first() {
                Some((word, desc)) if !desc.is_empty() => Ok(Command::Set {
                    word: word.to_string(),
                    desc: desc.join(" "),
                }),
                _ => Err(CommandError::SetUsage),
            },
            "CLEAR" => Ok(Command::Clear),
            "ALL" => Ok(Command::All),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    pub async fn execute(self, store: &DictionaryStore) -> Reply {
        match self {
            Command::Get(word) => match store.get(&word).await {
                Some(desc) => Reply::Answer(desc),
                None => Reply::Error("Could not find the specified word.".to_string()),
            },
            Command::Set { word, desc } => {
                let reply = format!("Word {} has been set.", word);
                store.set(word, desc).await;
                Reply::Answer(reply)
            }
            Command::Clear => {
                store.clear().await;
                Reply::Answer("The dictionary has been cleared.".to_string())
            }
            Command::All => {
                let words = store.words().await;

                if words.is_empty() {
                    Reply::Error("There are no words saved.".to_string())
                } else {
                    Reply::Answer(format!("Available words: {}.", words.join(", ")))
                }
            }
        }
    }
}
