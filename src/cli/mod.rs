use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::models::Category;

pub mod display;
pub use display::TerminalDisplay;

/// Pictogram board and music player for the terminal
#[derive(Parser)]
#[command(name = "pictotalk")]
#[command(about = "Speak with pictograms and play your music by genre")]
#[command(version)]
pub struct CliApp {
    /// Use this config file instead of ~/.config/pictotalk/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum Commands {
    /// Pictogram management
    Pictos {
        #[command(subcommand)]
        action: PictoAction,
    },
    /// Speak a pictogram
    Tap {
        name: String,
    },
    /// Switch the delete affordance on or off
    Edit {
        #[arg(value_enum)]
        mode: Switch,
    },
    /// Genre management
    Genre {
        #[command(subcommand)]
        action: GenreAction,
    },
    /// Song management
    Song {
        #[command(subcommand)]
        action: SongAction,
    },
    /// Music playback
    Music {
        #[command(subcommand)]
        action: MusicAction,
    },
    /// Next song in the playlist
    Next,
    /// Previous song in the playlist
    #[command(alias = "previous")]
    Prev,
    /// Random song from the playlist
    Random,
    Pause,
    Resume,
    /// Play the current sound again from the start
    Restart,
    Stop,
    /// Show what is playing
    Status,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum PictoAction {
    /// List pictograms, optionally filtered by category
    List {
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },
    /// Create a pictogram from an image and a sound file
    Add {
        name: String,
        image: PathBuf,
        audio: PathBuf,
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },
    /// Delete a user pictogram
    Delete { name: String },
    /// Rescan the pictogram folders
    Refresh,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum GenreAction {
    List,
    Add { name: String },
    Delete { name: String },
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum SongAction {
    /// Import an audio file into a genre
    Add { genre: String, file: PathBuf },
    /// Delete a song by its number in `genre list` output (starting at 1)
    Delete {
        genre: String,
        #[arg(value_parser = parse_song_number)]
        number: usize,
    },
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum MusicAction {
    /// Play a genre, optionally from song number `number`
    Play {
        genre: String,
        #[arg(value_parser = parse_song_number)]
        number: Option<usize>,
        #[arg(long, conflicts_with = "no_shuffle")]
        shuffle: bool,
        /// Play in stored order even when shuffle is the configured default
        #[arg(long)]
        no_shuffle: bool,
    },
}

impl MusicAction {
    /// Shuffle setting for this play, falling back to `default` when neither flag is given
    pub fn resolve_shuffle(&self, default: bool) -> bool {
        match self {
            MusicAction::Play { shuffle: true, .. } => true,
            MusicAction::Play { no_shuffle: true, .. } => false,
            MusicAction::Play { .. } => default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(&self) -> bool {
        matches!(self, Switch::On)
    }
}

fn parse_category(input: &str) -> Result<Category, String> {
    Category::parse(input).ok_or_else(|| {
        let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        format!("unknown category '{}', expected one of {}", input, names.join(", "))
    })
}

impl CliApp {
    pub fn parse() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Expand tilde (~) in path to home directory
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            match dirs::home_dir() {
                Some(home_dir) => home_dir.join(rest),
                None => PathBuf::from(path),
            }
        } else if path == "~" {
            dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
        } else {
            PathBuf::from(path)
        }
    }

    /// Split an interactive line into words. Single or double quotes group
    /// words, so `tap "Buenos días"` has two tokens.
    pub fn tokenize(input: &str) -> Result<Vec<String>, ParseError> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut in_token = false;
        let mut quote: Option<char> = None;

        for ch in input.chars() {
            match quote {
                Some(q) if ch == q => quote = None,
                Some(_) => current.push(ch),
                None if ch == '"' || ch == '\'' => {
                    quote = Some(ch);
                    in_token = true;
                }
                None if ch.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                None => {
                    current.push(ch);
                    in_token = true;
                }
            }
        }

        if quote.is_some() {
            return Err(ParseError::UnterminatedQuote {
                input: input.trim().to_string(),
            });
        }
        if in_token {
            tokens.push(current);
        }
        Ok(tokens)
    }

    /// Parse command from string (for interactive mode)
    pub fn parse_command(input: &str) -> Result<Commands, ParseError> {
        let tokens = Self::tokenize(input)?;
        let args: Vec<&str> = tokens.iter().map(String::as_str).collect();
        if args.is_empty() {
            return Err(ParseError::EmptyCommand);
        }

        match args[0] {
            "pictos" => Self::parse_pictos(&args),
            "tap" => Ok(Commands::Tap {
                name: Self::rest(&args, 1, "tap", "name")?,
            }),
            "edit" => match args.get(1).copied() {
                Some("on") => Ok(Commands::Edit { mode: Switch::On }),
                Some("off") => Ok(Commands::Edit { mode: Switch::Off }),
                Some(other) => Err(ParseError::InvalidArgument {
                    argument: "mode".to_string(),
                    value: other.to_string(),
                    expected: "on or off".to_string(),
                }),
                None => Err(missing("edit", "mode")),
            },
            "genre" => Self::parse_genre(&args),
            "song" => Self::parse_song(&args),
            "music" => Self::parse_music(&args),
            "next" => Ok(Commands::Next),
            "prev" | "previous" => Ok(Commands::Prev),
            "random" => Ok(Commands::Random),
            "pause" => Ok(Commands::Pause),
            "resume" => Ok(Commands::Resume),
            "restart" => Ok(Commands::Restart),
            "stop" => Ok(Commands::Stop),
            "status" => Ok(Commands::Status),
            "help" => Err(ParseError::HelpRequested),
            _ => Err(ParseError::UnknownCommand {
                command: args[0].to_string(),
            }),
        }
    }

    fn parse_pictos(args: &[&str]) -> Result<Commands, ParseError> {
        let (positional, category) = Self::split_category(&args[1..])?;
        let action = match positional.first().copied() {
            Some("list") => PictoAction::List { category },
            Some("add") => {
                if positional.len() < 4 {
                    let argument = ["name", "image", "audio"][positional.len().saturating_sub(1).min(2)];
                    return Err(missing("pictos add", argument));
                }
                PictoAction::Add {
                    name: positional[1].to_string(),
                    image: Self::expand_path(positional[2]),
                    audio: Self::expand_path(positional[3]),
                    category,
                }
            }
            Some("delete") => PictoAction::Delete {
                name: Self::rest(&positional, 1, "pictos delete", "name")?,
            },
            Some("refresh") => PictoAction::Refresh,
            Some(other) => {
                return Err(ParseError::UnknownCommand {
                    command: format!("pictos {}", other),
                })
            }
            None => return Err(missing("pictos", "action")),
        };
        Ok(Commands::Pictos { action })
    }

    fn parse_genre(args: &[&str]) -> Result<Commands, ParseError> {
        let action = match args.get(1).copied() {
            Some("list") => GenreAction::List,
            Some("add") => GenreAction::Add {
                name: Self::rest(args, 2, "genre add", "name")?,
            },
            Some("delete") => GenreAction::Delete {
                name: Self::rest(args, 2, "genre delete", "name")?,
            },
            Some(other) => {
                return Err(ParseError::UnknownCommand {
                    command: format!("genre {}", other),
                })
            }
            None => return Err(missing("genre", "action")),
        };
        Ok(Commands::Genre { action })
    }

    fn parse_song(args: &[&str]) -> Result<Commands, ParseError> {
        let action = match args.get(1).copied() {
            Some("add") => {
                let genre = args.get(2).ok_or_else(|| missing("song add", "genre"))?;
                let file = Self::rest(args, 3, "song add", "file")?;
                SongAction::Add {
                    genre: genre.to_string(),
                    file: Self::expand_path(&file),
                }
            }
            Some("delete") => {
                let genre = args.get(2).ok_or_else(|| missing("song delete", "genre"))?;
                let number = args.get(3).ok_or_else(|| missing("song delete", "number"))?;
                SongAction::Delete {
                    genre: genre.to_string(),
                    number: parse_number(number)?,
                }
            }
            Some(other) => {
                return Err(ParseError::UnknownCommand {
                    command: format!("song {}", other),
                })
            }
            None => return Err(missing("song", "action")),
        };
        Ok(Commands::Song { action })
    }

    fn parse_music(args: &[&str]) -> Result<Commands, ParseError> {
        match args.get(1).copied() {
            Some("play") => {
                let shuffle = args.contains(&"--shuffle");
                let no_shuffle = args.contains(&"--no-shuffle");
                if shuffle && no_shuffle {
                    return Err(ParseError::InvalidArgument {
                        argument: "shuffle".to_string(),
                        value: "--shuffle --no-shuffle".to_string(),
                        expected: "at most one of --shuffle or --no-shuffle".to_string(),
                    });
                }
                let positional: Vec<&str> = args[2..]
                    .iter()
                    .copied()
                    .filter(|a| *a != "--shuffle" && *a != "--no-shuffle")
                    .collect();
                let genre = positional.first().ok_or_else(|| missing("music play", "genre"))?;
                let number = positional.get(1).map(|n| parse_number(n)).transpose()?;
                Ok(Commands::Music {
                    action: MusicAction::Play {
                        genre: genre.to_string(),
                        number,
                        shuffle,
                        no_shuffle,
                    },
                })
            }
            Some(other) => Err(ParseError::UnknownCommand {
                command: format!("music {}", other),
            }),
            None => Err(missing("music", "action")),
        }
    }

    /// Pull `--category C` (or `--category=C`) out of the arguments
    fn split_category<'a>(args: &[&'a str]) -> Result<(Vec<&'a str>, Option<Category>), ParseError> {
        let mut positional = Vec::new();
        let mut category = None;
        let mut iter = args.iter().copied();

        while let Some(arg) = iter.next() {
            let value = if arg == "--category" {
                Some(iter.next().ok_or_else(|| missing("--category", "category"))?)
            } else {
                arg.strip_prefix("--category=")
            };

            match value {
                Some(value) => {
                    category = Some(parse_category(value).map_err(|expected| ParseError::InvalidArgument {
                        argument: "category".to_string(),
                        value: value.to_string(),
                        expected,
                    })?);
                }
                None => positional.push(arg),
            }
        }
        Ok((positional, category))
    }

    /// Everything from `from` on, joined with spaces
    fn rest(args: &[&str], from: usize, command: &str, argument: &str) -> Result<String, ParseError> {
        if args.len() > from {
            Ok(args[from..].join(" "))
        } else {
            Err(missing(command, argument))
        }
    }
}

fn missing(command: &str, argument: &str) -> ParseError {
    ParseError::MissingArgument {
        command: command.to_string(),
        argument: argument.to_string(),
    }
}

fn parse_song_number(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err("a song number starting at 1".to_string()),
    }
}

fn parse_number(value: &str) -> Result<usize, ParseError> {
    parse_song_number(value).map_err(|expected| ParseError::InvalidArgument {
        argument: "number".to_string(),
        value: value.to_string(),
        expected,
    })
}

/// Command parsing errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("Empty command")]
    EmptyCommand,

    #[error("Unknown command: {command}")]
    UnknownCommand { command: String },

    #[error("Missing argument for {command}: {argument}")]
    MissingArgument { command: String, argument: String },

    #[error("Invalid argument {argument}: got '{value}', expected {expected}")]
    InvalidArgument {
        argument: String,
        value: String,
        expected: String,
    },

    #[error("Unterminated quote in: {input}")]
    UnterminatedQuote { input: String },

    #[error("Help requested")]
    HelpRequested,
}
