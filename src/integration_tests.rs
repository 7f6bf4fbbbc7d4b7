//! Flows that cross screens, stores and the shared audio session.

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use crate::audio::testing::{MockBackend, MockFixture};
use crate::audio::{AudioSessionManager, PlayOutcome};
use crate::capture::{PathCapture, PictogramDraft};
use crate::config::ConfigManager;
use crate::error::{AppError, ErrorKind, LibraryError, PictogramError};
use crate::kv::{JsonFileStore, KeyValueStore};
use crate::library::{MusicLibrary, LEGACY_KEY, LIBRARY_KEY};
use crate::logging::{AppEventType, AppLogger};
use crate::models::{AssetRef, Category, PlaybackState, Song};
use crate::notice::{Notice, NoticeLevel};
use crate::pictograms::PictogramStore;
use crate::screens::{MusicPlayer, NavigationParams, PictogramBoard};

const SONGS: [&str; 2] = ["cumbia.mp3", "salsa.mp3"];

/// Both screens over one session, as the binary wires them
struct App {
    board: PictogramBoard<JsonFileStore, MockBackend>,
    player: MusicPlayer<JsonFileStore, MockBackend>,
    session: Rc<AudioSessionManager<MockBackend>>,
    fixture: MockFixture,
    logger: AppLogger,
    data_dir: PathBuf,
    _temp_dir: TempDir,
}

fn create_app() -> App {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    let logger = AppLogger::new();

    let fixture = MockFixture::new(&SONGS);
    let session = Rc::new(AudioSessionManager::new(
        fixture.backend.clone(),
        fixture.resolver(),
        logger.clone(),
    ));

    let store_kv = JsonFileStore::open(data_dir.join("storage")).unwrap();
    let library_kv = JsonFileStore::open(data_dir.join("storage")).unwrap();
    let store = PictogramStore::new(&data_dir, store_kv, logger.clone()).unwrap();
    let mut library = MusicLibrary::open(library_kv, 5, logger.clone()).unwrap();

    library.create_genre("Tropical").unwrap();
    for name in SONGS {
        library
            .add_song("Tropical", Song::from_path(&fixture.path(name), "Tropical"))
            .unwrap();
    }

    let board = PictogramBoard::new(store, Rc::clone(&session));
    let player = MusicPlayer::with_rng(library, Rc::clone(&session), false, StdRng::seed_from_u64(11));

    App {
        board,
        player,
        session,
        fixture,
        logger,
        data_dir,
        _temp_dir: temp_dir,
    }
}

fn add_pictogram(app: &mut App, name: &str, category: Option<Category>) -> Result<(), PictogramError> {
    let image = app.fixture.path(&format!("{}.src.jpg", name.len()));
    let audio = app.fixture.path(&format!("{}.src.m4a", name.len()));
    fs::write(&image, b"img").unwrap();
    fs::write(&audio, b"snd").unwrap();

    let mut capture = PathCapture::new().with_image(&image).with_audio(&audio);
    let mut draft = PictogramDraft::new(name);
    draft.category = category;
    draft.pick_image(&mut capture).unwrap();
    draft.pick_audio(&mut capture).unwrap();
    app.board.create(&mut draft).map(|_| ())
}

fn install_builtin_sound(app: &App, relative: &str) -> PathBuf {
    let path = app.fixture.dir().join("assets").join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"bundled").unwrap();
    path
}

#[tokio::test]
async fn test_pictogram_tap_interrupts_music() {
    let mut app = create_app();
    app.board.on_focus(NavigationParams::default()).unwrap();
    add_pictogram(&mut app, "Hola!", None).unwrap();

    app.player.select_genre("Tropical").unwrap();
    app.player.play_index(0).await.unwrap();
    assert_eq!(app.fixture.backend.playing(), vec![app.fixture.path("cumbia.mp3")]);

    let outcome = app.board.tap("Hola!").await.unwrap();
    assert_eq!(outcome, PlayOutcome::Started);
    app.player.release();

    // One sound at a time, and it is the pictogram's
    let sound = app.board.store().files().sound_path("Hola");
    assert_eq!(app.fixture.backend.live(), vec![sound.clone()]);
    assert_eq!(app.fixture.backend.playing(), vec![sound]);
    assert!(app.player.now_playing().is_none());
}

#[tokio::test]
async fn test_overlapping_screens_last_call_wins() {
    let mut app = create_app();
    app.board.on_focus(NavigationParams::default()).unwrap();
    add_pictogram(&mut app, "Agua", Some(Category::Acciones)).unwrap();
    app.player.select_genre("Tropical").unwrap();

    let (tap, song) = tokio::join!(app.board.tap("Agua"), app.player.play_index(1));

    assert_eq!(tap.unwrap(), PlayOutcome::Superseded);
    assert_eq!(song.unwrap().unwrap().file_name, "salsa.mp3");
    assert_eq!(app.fixture.backend.live(), vec![app.fixture.path("salsa.mp3")]);
    assert_eq!(app.logger.count_events(AppEventType::PlaybackSuperseded), 1);
}

#[tokio::test]
async fn test_builtin_pictogram_plays_from_assets() {
    let mut app = create_app();
    app.board.on_focus(NavigationParams::default()).unwrap();
    let bundled = install_builtin_sound(&app, "sounds/si.mp3");

    app.board.tap("Sí").await.unwrap();
    assert_eq!(app.fixture.backend.playing(), vec![bundled.clone()]);

    app.fixture.backend.finish(&bundled);
    assert!(app.session.poll_completion().is_some());
    app.board.on_playback_complete();
    assert_eq!(app.session.state(), PlaybackState::Idle);

    // Built-ins stay protected even in edit mode
    app.board.on_focus(NavigationParams::edit_mode(true)).unwrap();
    let error: AppError = app.board.delete("Sí").unwrap_err().into();
    assert_eq!(Notice::from_error(&error).level, NoticeLevel::Warning);
}

#[tokio::test]
async fn test_pictograms_survive_restart() {
    let mut app = create_app();
    app.board.on_focus(NavigationParams::default()).unwrap();
    add_pictogram(&mut app, "Buenos días", Some(Category::Emociones)).unwrap();

    let kv = JsonFileStore::open(app.data_dir.join("storage")).unwrap();
    let reopened = PictogramStore::open(&app.data_dir, kv, AppLogger::new()).unwrap();

    let pictogram = reopened.find("Buenos días").unwrap();
    assert_eq!(pictogram.category, Category::Emociones);
    assert!(matches!(pictogram.audio, AssetRef::External(_)));
    assert_eq!(reopened.list_by_category(Category::Emociones).len(), 5);
}

#[tokio::test]
async fn test_duplicate_and_validation_notices() {
    let mut app = create_app();
    app.board.on_focus(NavigationParams::default()).unwrap();
    add_pictogram(&mut app, "Casa", None).unwrap();

    let duplicate: AppError = add_pictogram(&mut app, "casa!", None).unwrap_err().into();
    assert_eq!(duplicate.kind(), ErrorKind::Duplicate);
    assert_eq!(Notice::from_error(&duplicate).level, NoticeLevel::Inline);

    let builtin: AppError = add_pictogram(&mut app, "comer", None).unwrap_err().into();
    assert_eq!(builtin.kind(), ErrorKind::Duplicate);

    let filter_only: AppError = add_pictogram(&mut app, "Perro", Some(Category::Todos)).unwrap_err().into();
    assert_eq!(filter_only.kind(), ErrorKind::Validation);

    let mut library_full = Ok(String::new());
    for name in ["A", "B", "C", "D", "E"] {
        library_full = app.player.create_genre(name);
    }
    let error: AppError = library_full.unwrap_err().into();
    assert_eq!(error.kind(), ErrorKind::LimitExceeded);
    assert_eq!(
        Notice::from_error(&error).message,
        "You cannot create more than 5 genres"
    );
}

#[tokio::test]
async fn test_playlist_advances_and_wraps_on_completion() {
    let mut app = create_app();
    app.player.select_genre("Tropical").unwrap();
    app.player.play_index(1).await.unwrap();

    app.fixture.backend.finish(&app.fixture.path("salsa.mp3"));
    assert!(app.session.poll_completion().is_some());
    let next = app.player.on_playback_complete().await.unwrap().unwrap();
    assert_eq!(next.file_name, "cumbia.mp3");

    // Reported once per load
    assert!(app.session.poll_completion().is_none());
    assert_eq!(app.logger.count_events(AppEventType::PlaybackCompleted), 1);
}

#[tokio::test]
async fn test_deleting_playing_genre_stops_session() {
    let mut app = create_app();
    app.player.select_genre("Tropical").unwrap();
    app.player.play_index(0).await.unwrap();

    app.player.delete_genre("Tropical").unwrap();
    assert_eq!(app.session.state(), PlaybackState::Idle);
    assert!(app.fixture.backend.live().is_empty());

    let missing = app.player.select_genre("Tropical");
    assert!(matches!(missing, Err(LibraryError::GenreNotFound { .. })));
}

#[test]
fn test_legacy_library_is_migrated_with_configured_limit() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = ConfigManager::with_path(temp_dir.path().join("config.toml")).unwrap();
    config.set_max_genres(2).unwrap();
    config.set_data_dir(temp_dir.path().join("data")).unwrap();

    let mut kv = JsonFileStore::open(config.config().storage_dir()).unwrap();
    kv.set(
        LEGACY_KEY,
        r#"{"Rock":[{"name":"a.mp3","uri":"file:///m/a.mp3"}],"Pop":[]}"#,
    )
    .unwrap();

    let mut library = MusicLibrary::open(kv.clone(), config.config().max_genres, AppLogger::new()).unwrap();
    assert_eq!(library.genre_names(), vec!["Pop", "Rock"]);
    assert_eq!(library.songs("Rock").unwrap()[0].genre, "Rock");
    assert!(kv.get(LEGACY_KEY).unwrap().is_none());
    assert!(kv.get(LIBRARY_KEY).unwrap().is_some());

    let limit = library.create_genre("Jazz");
    assert!(matches!(limit, Err(LibraryError::GenreLimit { max: 2 })));
}
