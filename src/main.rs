use log::{error, info, warn};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pictotalk::audio::{AssetResolver, AudioSessionManager, NativeBackend, PlayOutcome};
use pictotalk::capture::{PathCapture, PictogramDraft};
use pictotalk::cli::{
    CliApp, Commands, GenreAction, MusicAction, ParseError, PictoAction, SongAction, TerminalDisplay,
};
use pictotalk::config::ConfigManager;
use pictotalk::error::AppError;
use pictotalk::kv::JsonFileStore;
use pictotalk::library::MusicLibrary;
use pictotalk::logging::AppLogger;
use pictotalk::models::{PlaybackState, Song};
use pictotalk::notice::NoticeReporter;
use pictotalk::pictograms::PictogramStore;
use pictotalk::screens::{MusicPlayer, NavigationParams, PictogramBoard};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

type Board = PictogramBoard<JsonFileStore, NativeBackend>;
type Player = MusicPlayer<JsonFileStore, NativeBackend>;

/// Which screen started the sound that is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaybackContext {
    Pictogram,
    Playlist,
}

/// Main application controller that wires both screens to one audio session
pub struct AppController {
    board: Board,
    player: Player,
    session: Rc<AudioSessionManager<NativeBackend>>,
    config_manager: ConfigManager,
    reporter: NoticeReporter,
    context: Option<PlaybackContext>,
}

impl AppController {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, AppError> {
        let config_manager = match config_path {
            Some(path) => ConfigManager::with_path(path)?,
            None => ConfigManager::new()?,
        };
        let config = config_manager.config().clone();
        let logger = AppLogger::new();

        let backend = NativeBackend::new(config.preferred_device.as_deref(), config.default_volume)?;
        let session = Rc::new(AudioSessionManager::new(
            backend,
            AssetResolver::new(&config.assets_dir),
            logger.clone(),
        ));

        let pictogram_kv = JsonFileStore::open(config.storage_dir())?;
        let library_kv = JsonFileStore::open(config.storage_dir())?;
        let store = PictogramStore::new(&config.data_dir, pictogram_kv, logger.clone())?;
        let library = MusicLibrary::open(library_kv, config.max_genres, logger.clone())?;

        let board = PictogramBoard::new(store, Rc::clone(&session));
        let player = MusicPlayer::new(library, Rc::clone(&session), config.shuffle_by_default);

        info!("Application controller initialized (data dir {})", config.data_dir.display());

        Ok(Self {
            board,
            player,
            session,
            config_manager,
            reporter: NoticeReporter::new(logger),
            context: None,
        })
    }

    /// Execute a single command
    pub async fn execute_command(&mut self, command: Commands) -> Result<(), AppError> {
        match command {
            Commands::Pictos { action } => self.execute_pictos(action)?,
            Commands::Tap { name } => {
                if self.board.tap(&name).await? == PlayOutcome::Started {
                    self.take_session(PlaybackContext::Pictogram);
                    println!("▶ {}", name);
                }
            }
            Commands::Edit { mode } => {
                self.board.on_focus(NavigationParams::edit_mode(mode.is_on()))?;
                println!("Edit mode {}", if mode.is_on() { "on" } else { "off" });
            }
            Commands::Genre { action } => self.execute_genre(action)?,
            Commands::Song { action } => self.execute_song(action)?,
            Commands::Music { action } => self.execute_music(action).await?,
            Commands::Next => {
                let song = self.player.next().await?;
                self.announce(song);
            }
            Commands::Prev => {
                let song = self.player.previous().await?;
                self.announce(song);
            }
            Commands::Random => {
                let song = self.player.random().await?;
                self.announce(song);
            }
            Commands::Pause => {
                self.session.pause()?;
                println!("OK: Paused");
            }
            Commands::Resume => {
                self.session.resume()?;
                println!("OK: Resumed");
            }
            Commands::Restart => {
                self.session.restart()?;
                println!("OK: Restarted");
            }
            Commands::Stop => {
                self.player.stop();
                self.context = None;
                println!("OK: Stopped");
            }
            Commands::Status => {
                TerminalDisplay::display_status(&self.session.status());
                if let (Some(PlaybackContext::Playlist), Some(song)) = (self.context, self.player.now_playing()) {
                    println!("Genre: {} | Song: {}", song.genre, song.file_name);
                }
            }
        }
        Ok(())
    }

    fn execute_pictos(&mut self, action: PictoAction) -> Result<(), AppError> {
        self.board.on_focus(NavigationParams::default())?;

        match action {
            PictoAction::List { category } => {
                if let Some(category) = category {
                    self.board.select_category(category);
                }
                TerminalDisplay::display_pictograms(&self.board.visible(), self.board.category(), self.board.edit_mode());
            }
            PictoAction::Add {
                name,
                image,
                audio,
                category,
            } => {
                let mut capture = PathCapture::new().with_image(image).with_audio(audio);
                let mut draft = PictogramDraft::new(name);
                draft.category = category;
                draft.pick_image(&mut capture)?;
                draft.pick_audio(&mut capture)?;

                let pictogram = self.board.create(&mut draft)?;
                println!("Created '{}' in {}", pictogram.name, pictogram.category);
            }
            PictoAction::Delete { name } => {
                if self.board.delete(&name)? {
                    println!("Deleted '{}'", name);
                } else {
                    println!("Turn on edit mode first ('edit on')");
                }
            }
            PictoAction::Refresh => {
                self.board.on_focus(NavigationParams::refresh())?;
                println!("{} user pictograms", self.board.store().user_pictograms().len());
            }
        }
        Ok(())
    }

    fn execute_genre(&mut self, action: GenreAction) -> Result<(), AppError> {
        match action {
            GenreAction::List => {
                let library = self.player.library();
                let genres: Vec<(String, usize)> = library
                    .genre_names()
                    .into_iter()
                    .map(|name| {
                        let count = library.songs(&name).map_or(0, |songs| songs.len());
                        (name, count)
                    })
                    .collect();
                println!("{}", TerminalDisplay::render_genres(&genres, library.max_genres()));

                if let Some(genre) = self.player.selected_genre() {
                    let songs = library.songs(genre).unwrap_or(&[]);
                    println!("{}", TerminalDisplay::render_songs(genre, songs, self.player.now_playing()));
                }
            }
            GenreAction::Add { name } => {
                let created = self.player.create_genre(&name)?;
                println!("Created genre '{}'", created);
            }
            GenreAction::Delete { name } => {
                let removed = self.player.delete_genre(&name)?;
                self.forget_finished_context();
                println!("Deleted genre '{}' ({} songs)", name, removed.len());
            }
        }
        Ok(())
    }

    fn execute_song(&mut self, action: SongAction) -> Result<(), AppError> {
        match action {
            SongAction::Add { genre, file } => {
                let mut capture = PathCapture::new().with_audio(file);
                let song = self.player.import_song(&mut capture, &genre)?;
                println!("Added '{}' to {}", song.file_name, genre);
            }
            SongAction::Delete { genre, number } => {
                let removed = self.player.delete_song(&genre, number - 1)?;
                self.forget_finished_context();
                println!("Deleted '{}' from {}", removed.file_name, genre);
            }
        }
        Ok(())
    }

    async fn execute_music(&mut self, action: MusicAction) -> Result<(), AppError> {
        let shuffle = action.resolve_shuffle(self.config_manager.config().shuffle_by_default);
        match action {
            MusicAction::Play { genre, number, .. } => {
                self.player.set_shuffle(shuffle)?;
                self.player.select_genre(&genre)?;

                // Numbers refer to stored order, which a shuffled playlist does not keep
                let index = match number {
                    Some(number) => {
                        let stored = self
                            .player
                            .library()
                            .songs(&genre)
                            .and_then(|songs| songs.get(number - 1))
                            .cloned();
                        stored
                            .and_then(|song| self.player.playlist().position_of(&song))
                            .unwrap_or(number - 1)
                    }
                    None => 0,
                };

                match self.player.play_index(index).await? {
                    Some(song) => self.announce(Some(song)),
                    None if self.player.playlist().is_empty() => println!("'{}' has no songs yet", genre),
                    None => {}
                }
            }
        }
        Ok(())
    }

    fn announce(&mut self, song: Option<Song>) {
        match song {
            Some(song) => {
                self.context = Some(PlaybackContext::Playlist);
                println!("Now playing: {} [{}]", song.file_name, song.genre);
            }
            None if self.player.playlist().is_empty() => {
                println!("Choose a genre first ('music play <genre>')");
            }
            None => {}
        }
    }

    fn take_session(&mut self, context: PlaybackContext) {
        if context == PlaybackContext::Pictogram && self.context == Some(PlaybackContext::Playlist) {
            self.player.release();
        }
        self.context = Some(context);
    }

    fn forget_finished_context(&mut self) {
        if self.session.state() == PlaybackState::Idle {
            self.context = None;
        }
    }

    /// Route a finished sound to the screen that started it
    async fn poll_playback(&mut self) {
        if self.session.poll_completion().is_none() {
            return;
        }

        match self.context {
            Some(PlaybackContext::Pictogram) => {
                self.board.on_playback_complete();
                self.context = None;
            }
            Some(PlaybackContext::Playlist) => match self.player.on_playback_complete().await {
                Ok(Some(song)) => println!("\nNow playing: {} [{}]", song.file_name, song.genre),
                Ok(None) => {}
                Err(e) => {
                    self.context = None;
                    self.report("advance playlist", &e);
                }
            },
            None => self.session.stop(),
        }
    }

    fn report(&self, operation: &str, error: &AppError) {
        let notice = self.reporter.report(operation, error);
        TerminalDisplay::display_notice(&notice);
    }

    /// Run one command; keep the process alive while its sound plays
    pub async fn run_single(&mut self, command: Commands, shutdown: Arc<AtomicBool>) -> Result<(), AppError> {
        // The command line is itself the deliberate action edit mode guards
        if matches!(command, Commands::Pictos { action: PictoAction::Delete { .. } }) {
            self.board.set_edit_mode(true);
        }

        self.execute_command(command).await?;

        if self.context.is_some() && self.session.state() != PlaybackState::Idle {
            if self.context == Some(PlaybackContext::Playlist) {
                println!("Press Ctrl-C to stop.");
            }
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            while self.context.is_some() && !shutdown.load(Ordering::Relaxed) {
                interval.tick().await;
                self.poll_playback().await;
            }
        }
        Ok(())
    }

    /// Run interactive mode
    pub async fn run_interactive(&mut self, shutdown: Arc<AtomicBool>) -> Result<(), AppError> {
        println!("Pictotalk v{}", env!("CARGO_PKG_VERSION"));
        println!("Type 'help' for available commands, 'exit' or 'quit' to quit.");
        println!();

        self.board.on_focus(NavigationParams::refresh())?;

        let mut interval = tokio::time::interval(POLL_INTERVAL);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if tx.send(line.trim().to_string()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let mut awaiting_input = false;
        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            if !awaiting_input {
                print!("> ");
                let _ = std::io::Write::flush(&mut std::io::stdout());
                awaiting_input = true;
            }

            tokio::select! {
                biased;

                line = rx.recv() => {
                    awaiting_input = false;
                    let Some(line) = line else {
                        println!();
                        break;
                    };
                    if line.is_empty() {
                        continue;
                    }
                    if line == "exit" || line == "quit" {
                        println!("Goodbye!");
                        break;
                    }
                    match CliApp::parse_command(&line) {
                        Ok(command) => {
                            let operation = command_name(&command);
                            if let Err(e) = self.execute_command(command).await {
                                self.report(operation, &e);
                            }
                        }
                        Err(ParseError::HelpRequested) => TerminalDisplay::display_help(),
                        Err(e) => {
                            eprintln!("Error: {}", e);
                            println!("Type 'help' for available commands.");
                        }
                    }
                }

                _ = interval.tick() => {
                    self.poll_playback().await;
                }
            }
        }
        Ok(())
    }

    /// Stop and unload the current sound
    pub fn shutdown(&mut self) {
        self.session.teardown();
        self.context = None;
        info!("Audio session torn down");
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Pictos { action } => match action {
            PictoAction::List { .. } => "list pictograms",
            PictoAction::Add { .. } => "create pictogram",
            PictoAction::Delete { .. } => "delete pictogram",
            PictoAction::Refresh => "refresh pictograms",
        },
        Commands::Tap { .. } => "play pictogram",
        Commands::Edit { .. } => "toggle edit mode",
        Commands::Genre { action } => match action {
            GenreAction::List => "list genres",
            GenreAction::Add { .. } => "create genre",
            GenreAction::Delete { .. } => "delete genre",
        },
        Commands::Song { action } => match action {
            SongAction::Add { .. } => "add song",
            SongAction::Delete { .. } => "delete song",
        },
        Commands::Music { .. } => "play music",
        Commands::Next | Commands::Prev | Commands::Random => "change song",
        Commands::Pause => "pause",
        Commands::Resume => "resume",
        Commands::Restart => "restart",
        Commands::Stop => "stop",
        Commands::Status => "status",
    }
}

fn install_shutdown_handler() -> Arc<AtomicBool> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);

    if let Err(e) = ctrlc::set_handler(move || {
        println!("\nReceived interrupt signal. Shutting down...");
        flag.store(true, Ordering::Relaxed);
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }
    shutdown
}

#[tokio::main]
async fn main() {
    if let Err(e) = AppLogger::init() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let cli = CliApp::parse();

    let mut app = match AppController::new(cli.config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            eprintln!("Failed to start: {}", e.user_message());
            std::process::exit(1);
        }
    };

    let shutdown = install_shutdown_handler();
    let result = match cli.command {
        Some(command) => {
            let operation = command_name(&command);
            app.run_single(command, shutdown).await.map_err(|e| (operation, e))
        }
        None => app.run_interactive(shutdown).await.map_err(|e| ("start", e)),
    };

    app.shutdown();

    if let Err((operation, e)) = result {
        app.report(operation, &e);
        std::process::exit(1);
    }
}
