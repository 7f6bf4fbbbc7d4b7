use std::time::Duration;

use crate::models::{Category, Origin, Pictogram, SessionStatus, Song};
use crate::notice::{Notice, NoticeLevel};

/// Terminal formatting for boards, libraries and the audio session
pub struct TerminalDisplay;

impl TerminalDisplay {
    /// Pictogram board, one line per pictogram
    pub fn render_pictograms(pictograms: &[Pictogram], category: Category, edit_mode: bool) -> String {
        let mut out = format!("┌─ {} ({}) ", category, pictograms.len());
        out.push_str(&"─".repeat(40usize.saturating_sub(out.chars().count())));
        out.push_str("┐\n");

        if pictograms.is_empty() {
            out.push_str("│ No pictograms in this category\n");
        }
        for pictogram in pictograms {
            let marker = match (edit_mode, pictogram.origin()) {
                (true, Origin::UserCreated) => "✗",
                (_, Origin::BuiltIn) => "•",
                (false, Origin::UserCreated) => "◦",
            };
            out.push_str(&format!(
                "│ {} {:<28} {}\n",
                marker,
                Self::truncate(&pictogram.name, 28),
                pictogram.category
            ));
        }
        out.push_str(&format!("└{}┘", "─".repeat(39)));
        out
    }

    pub fn render_genres(genres: &[(String, usize)], max_genres: usize) -> String {
        let mut lines = vec![format!("Genres ({}/{}):", genres.len(), max_genres)];
        if genres.is_empty() {
            lines.push("  (none yet, use 'genre add <name>')".to_string());
        }
        for (name, count) in genres {
            let songs = if *count == 1 { "song" } else { "songs" };
            lines.push(format!("  {} ({} {})", name, count, songs));
        }
        lines.join("\n")
    }

    /// Songs in stored order, numbered from 1, with the playing one marked
    pub fn render_songs(genre: &str, songs: &[Song], now_playing: Option<&Song>) -> String {
        let mut lines = vec![format!("{}:", genre)];
        for (index, song) in songs.iter().enumerate() {
            let marker = if Some(song) == now_playing { "▶" } else { " " };
            lines.push(format!("{} {:>3}. {}", marker, index + 1, Self::truncate(&song.file_name, 50)));
        }
        if songs.is_empty() {
            lines.push("  (empty)".to_string());
        }
        lines.join("\n")
    }

    pub fn render_status(status: &SessionStatus) -> String {
        match &status.source {
            None => format!("{} | Nothing loaded", status.state),
            Some(source) => {
                let bar_width = 30;
                let filled = ((status.progress() * bar_width as f32) as usize).min(bar_width);
                format!(
                    "{} | {} | [{}{}] {}/{}",
                    status.state,
                    Self::truncate(&source.to_string(), 40),
                    "█".repeat(filled),
                    "░".repeat(bar_width - filled),
                    status.position_formatted(),
                    status.duration_formatted()
                )
            }
        }
    }

    pub fn display_pictograms(pictograms: &[Pictogram], category: Category, edit_mode: bool) {
        println!("{}", Self::render_pictograms(pictograms, category, edit_mode));
    }

    pub fn display_status(status: &SessionStatus) {
        println!("{}", Self::render_status(status));
    }

    /// Print a notice on the channel that fits its level
    pub fn display_notice(notice: &Notice) {
        match notice.level {
            NoticeLevel::Quiet => {}
            NoticeLevel::Inline => eprintln!("{}", notice),
            NoticeLevel::Warning => eprintln!("\x07{}", notice),
            NoticeLevel::Failure => eprintln!("✗ {}", notice),
        }
    }

    pub fn display_help() {
        println!("Pictotalk - Available Commands:");
        println!();
        println!("Pictograms:");
        println!("  pictos list [--category C]                  - Show the board");
        println!("  pictos add <name> <image> <audio> [--category C]");
        println!("                                              - Create a pictogram");
        println!("  pictos delete <name>                        - Delete (edit mode only)");
        println!("  pictos refresh                              - Rescan pictogram folders");
        println!("  tap <name>                                  - Speak a pictogram");
        println!("  edit on|off                                 - Toggle edit mode");
        println!();
        println!("Music:");
        println!("  genre list | genre add <name> | genre delete <name>");
        println!("  song add <genre> <file>                     - Import a song");
        println!("  song delete <genre> <number>                - Delete a song");
        println!("  music play <genre> [number] [--shuffle|--no-shuffle] - Play a genre");
        println!("  next | prev | random                        - Move in the playlist");
        println!();
        println!("Playback:");
        println!("  pause | resume | restart | stop | status");
        println!();
        println!("Categories: {}", Category::ALL.map(|c| c.as_str()).join(", "));
        println!("Quote names with spaces: tap \"Buenos días\"");
        println!();
        println!("  help            - Show this help message");
        println!("  exit, quit      - Exit");
    }

    /// Format duration as MM:SS or HH:MM:SS for longer clips
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{:02}:{:02}", minutes, seconds)
        }
    }

    /// Truncate on a character boundary
    pub fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", kept)
        }
    }
}
