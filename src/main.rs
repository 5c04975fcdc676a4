use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use sous_voice::db::{self, FavoriteRepo, HistoryRepo, UserRepo};
use sous_voice::voice::{
    AudioPlayback, ConsoleNarration, MicStream, MicrophoneEngine, Narrator, SpeechSink,
    SpeechToText, SpokenNarration, TextToSpeech,
};
use sous_voice::{
    Assistant, AuthState, CatalogFilter, Config, CookingSession, IdentityProvider, LocalIdentity,
    Recipe, RecipeSearch, UiEvent, catalog, filter_catalog, interpret,
};

/// Sous - voice-guided cooking assistant
#[derive(Parser)]
#[command(name = "sous", version, about)]
struct Cli {
    /// Recipe title to cook (from the local catalog)
    #[arg(short, long, env = "SOUS_RECIPE")]
    recipe: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (for machines without audio hardware)
    #[arg(long, env = "SOUS_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List the local recipe catalog
    List {
        /// Filter: all, quick, easy, medium, hard
        #[arg(short, long, default_value = "all")]
        filter: String,

        /// Search term matched against titles, categories, and steps
        #[arg(short, long, default_value = "")]
        term: String,
    },
    /// Search recipes via the remote API
    Search {
        /// Search query
        query: String,
    },
    /// Run transcripts through the command interpreter without audio
    Say {
        /// Recipe title to cook
        #[arg(short, long)]
        recipe: String,

        /// One or more transcripts, processed in order
        #[arg(required = true)]
        transcripts: Vec<String>,
    },
    /// Toggle a recipe's favorite status
    Favorite {
        /// Recipe title
        title: String,
    },
    /// List favorite recipes
    Favorites,
    /// Show recently completed recipes
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! Let's get cooking.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,sous_voice=info",
        1 => "info,sous_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_with_options(cli.disable_voice)?;

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::List { filter, term } => cmd_list(&config, &filter, &term),
            Command::Search { query } => cmd_search(&config, &query).await,
            Command::Say {
                recipe,
                transcripts,
            } => cmd_say(&config, &recipe, &transcripts),
            Command::Favorite { title } => cmd_favorite(&config, &title),
            Command::Favorites => cmd_favorites(&config),
            Command::History { limit } => cmd_history(&config, limit),
            Command::TestMic { duration } => cmd_test_mic(duration).await,
            Command::TestSpeaker => cmd_test_speaker(),
            Command::TestTts { text } => cmd_test_tts(&config, &text).await,
        };
    }

    run_assistant(&config, cli.recipe.as_deref()).await
}

/// Run the voice-guided cooking loop
async fn run_assistant(config: &Config, recipe_title: Option<&str>) -> anyhow::Result<()> {
    if !config.voice.enabled {
        anyhow::bail!("voice is disabled; use `sous say` to drive the assistant without audio");
    }

    let pool = db::init(config.db_path())?;
    let recipes = catalog::load_catalog_or_empty(&config.catalog_path);

    let identity = Arc::new(LocalIdentity::new(initial_auth(config)));
    if let AuthState {
        authenticated: true,
        user_id: Some(user_id),
        display_name,
    } = identity.current()
    {
        UserRepo::new(pool.clone()).find_or_create(&user_id, display_name.as_deref())?;
    } else {
        tracing::info!("running as guest; set SOUS_USER to enable voice and saved sessions");
    }

    let (event_tx, event_rx) = mpsc::channel(16);
    let stt = build_stt(config)?;
    let engine = Arc::new(MicrophoneEngine::new(stt, event_tx));
    let narrator = Narrator::new(build_sink(config));

    let mut assistant = Assistant::new(
        pool,
        engine,
        event_rx,
        narrator,
        identity as Arc<dyn IdentityProvider>,
    );

    assistant.restore_session();

    if let Some(title) = recipe_title {
        let recipe = catalog::find_by_title(&recipes, title)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("recipe not found in catalog: {title}"))?;
        assistant.select_recipe(recipe);
    }

    if assistant.session().active_recipe().is_some() {
        assistant.start_voice().await;
    } else {
        tracing::info!("no recipe selected; run with --recipe <title>");
    }

    // Mirror state changes to the terminal
    let mut ui = assistant.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = ui.recv().await {
            print_ui_event(&event);
        }
    });

    tracing::info!("sous ready - say \"help\" for commands");

    tokio::select! {
        () = assistant.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
            assistant.stop_voice().await;
        }
    }

    Ok(())
}

fn print_ui_event(event: &UiEvent) {
    match event {
        UiEvent::RecipeSelected { title } => println!("Cooking: {title}"),
        UiEvent::TranscriptHeard(text) => println!("You said: {text}"),
        UiEvent::Status(status) => println!("Assistant: {status}"),
        UiEvent::StepChanged { index, text } => println!("Step {}: {text}", index + 1),
        UiEvent::ListeningChanged(listening) => {
            println!("{}", if *listening { "Listening..." } else { "Voice off" });
        }
        UiEvent::Completed { title } => println!("Finished cooking {title}!"),
    }
}

/// Signed-in state from local configuration
fn initial_auth(config: &Config) -> AuthState {
    config.user.user_id.as_ref().map_or_else(AuthState::guest, |user_id| {
        AuthState::signed_in(user_id.clone(), config.user.display_name.clone())
    })
}

/// Build the STT client from configured keys
fn build_stt(config: &Config) -> anyhow::Result<SpeechToText> {
    if let Some(key) = config.api_keys.openai.clone() {
        return Ok(SpeechToText::new_whisper(
            key,
            config.voice.stt_model.clone(),
            config.voice.language.clone(),
        )?);
    }

    if let Some(key) = config.api_keys.deepgram.clone() {
        return Ok(SpeechToText::new_deepgram(
            key,
            config.voice.stt_model.clone(),
            config.voice.language.clone(),
        )?);
    }

    anyhow::bail!("voice requires OPENAI_API_KEY or DEEPGRAM_API_KEY")
}

/// Spoken narration when TTS and speakers are available, console
/// output otherwise
fn build_sink(config: &Config) -> Arc<dyn SpeechSink> {
    if let Some(key) = config.api_keys.openai.clone() {
        let tts = TextToSpeech::new(
            key,
            config.voice.tts_voice.clone(),
            config.voice.tts_speed,
            config.voice.tts_model.clone(),
        );

        match (tts, AudioPlayback::new()) {
            (Ok(tts), Ok(playback)) => return Arc::new(SpokenNarration::new(tts, playback)),
            (_, Err(e)) => {
                tracing::warn!(error = %e, "no audio output, printing narration instead");
            }
            (Err(e), _) => {
                tracing::warn!(error = %e, "TTS unavailable, printing narration instead");
            }
        }
    }

    Arc::new(ConsoleNarration)
}

/// List the local catalog
fn cmd_list(config: &Config, filter: &str, term: &str) -> anyhow::Result<()> {
    let recipes = catalog::load_catalog_or_empty(&config.catalog_path);

    let filter = match filter {
        "all" => CatalogFilter::All,
        "quick" => CatalogFilter::Quick,
        other => sous_voice::Difficulty::parse(other)
            .map(CatalogFilter::Difficulty)
            .ok_or_else(|| anyhow::anyhow!("unknown filter: {other}"))?,
    };

    let hits = filter_catalog(&recipes, term, filter);
    if hits.is_empty() {
        println!("No recipes found.");
        return Ok(());
    }

    for recipe in hits {
        println!(
            "{} ({}, {}, {} steps)",
            recipe.title,
            recipe.time,
            recipe.difficulty,
            recipe.step_count()
        );
    }

    Ok(())
}

/// Search recipes: local catalog hits first, then remote results that
/// aren't already present
async fn cmd_search(config: &Config, query: &str) -> anyhow::Result<()> {
    let recipes = catalog::load_catalog_or_empty(&config.catalog_path);
    let mut results: Vec<Recipe> = filter_catalog(&recipes, query, CatalogFilter::All)
        .into_iter()
        .cloned()
        .collect();

    match RecipeSearch::new(&config.search, config.api_keys.spoonacular.clone()) {
        Ok(search) => {
            for remote in search.search(query).await {
                let seen = results
                    .iter()
                    .any(|r| r.title.eq_ignore_ascii_case(&remote.title));
                if !seen {
                    results.push(remote);
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "remote search unavailable, showing local results"),
    }

    if results.is_empty() {
        println!("No recipes found for \"{query}\".");
        return Ok(());
    }

    for recipe in results {
        println!(
            "{} ({}, {}, {} steps)",
            recipe.title,
            recipe.time,
            recipe.difficulty,
            recipe.step_count()
        );
    }

    Ok(())
}

/// Drive the interpreter directly from the command line
fn cmd_say(config: &Config, recipe_title: &str, transcripts: &[String]) -> anyhow::Result<()> {
    let recipes = catalog::load_catalog_or_empty(&config.catalog_path);
    let recipe = catalog::find_by_title(&recipes, recipe_title)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("recipe not found in catalog: {recipe_title}"))?;

    let mut session = CookingSession::new();
    let confirmation = session.select_recipe(recipe, true);
    println!("{confirmation}");
    session.start_voice();

    for transcript in transcripts {
        println!("> {transcript}");
        match interpret(transcript, &mut session) {
            Some(outcome) => {
                println!("  says: {}", outcome.utterance);
                println!("  status: {}", outcome.status);
            }
            None => println!("  (ignored, voice session not active)"),
        }
    }

    Ok(())
}

/// Toggle a favorite for the configured user
fn cmd_favorite(config: &Config, title: &str) -> anyhow::Result<()> {
    let (pool, user_id) = open_user_db(config)?;
    let recipes = catalog::load_catalog_or_empty(&config.catalog_path);
    let recipe = catalog::find_by_title(&recipes, title)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("recipe not found in catalog: {title}"))?;

    let favorited = FavoriteRepo::new(pool).toggle(&user_id, &recipe)?;
    println!(
        "{} {} favorites",
        recipe.title,
        if favorited { "added to" } else { "removed from" }
    );

    Ok(())
}

/// List favorites for the configured user
fn cmd_favorites(config: &Config) -> anyhow::Result<()> {
    let (pool, user_id) = open_user_db(config)?;
    let favorites = FavoriteRepo::new(pool).list(&user_id)?;

    if favorites.is_empty() {
        println!("No favorites yet.");
        return Ok(());
    }

    for recipe in favorites {
        println!("{} ({})", recipe.title, recipe.time);
    }

    Ok(())
}

/// Show recent cooking history for the configured user
fn cmd_history(config: &Config, limit: usize) -> anyhow::Result<()> {
    let (pool, user_id) = open_user_db(config)?;
    let entries = HistoryRepo::new(pool).recent(&user_id, limit)?;

    if entries.is_empty() {
        println!("Nothing cooked yet.");
        return Ok(());
    }

    for entry in entries {
        println!(
            "{} ({}) - {}",
            entry.title,
            entry.time,
            entry.completed_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

/// Open the database and resolve the configured user
fn open_user_db(config: &Config) -> anyhow::Result<(db::DbPool, String)> {
    let user_id = config
        .user
        .user_id
        .clone()
        .ok_or_else(|| anyhow::anyhow!("set SOUS_USER to use favorites and history"))?;

    let pool = db::init(config.db_path())?;
    UserRepo::new(pool.clone()).find_or_create(&user_id, config.user.display_name.as_deref())?;

    Ok((pool, user_id))
}

/// Test microphone input
async fn cmd_test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mic = MicStream::open()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let level = mic.level();

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (level * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {level:.4} | [{meter}]", i + 1);

        mic.drain();
    }

    println!("\nIf you saw movement in the meter, your mic is working.");
    Ok(())
}

/// Test speaker output with a sine wave
fn cmd_test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    let sample_rate = 24000_f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (sample_rate * 2.0) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.3
        })
        .collect();

    playback.play_blocking(samples, &Arc::new(AtomicBool::new(false)))?;

    println!("If you heard the tone, your speakers are working.");
    Ok(())
}

/// Test TTS output
async fn cmd_test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let key = config
        .api_keys
        .openai
        .clone()
        .ok_or_else(|| anyhow::anyhow!("TTS requires OPENAI_API_KEY"))?;

    let tts = TextToSpeech::new(
        key,
        config.voice.tts_voice.clone(),
        config.voice.tts_speed,
        config.voice.tts_model.clone(),
    )?;

    println!("Synthesizing speech...");
    let mp3 = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3.len());

    println!("Playing audio...");
    let playback = AudioPlayback::new()?;
    playback.play_mp3_blocking(&mp3, &Arc::new(AtomicBool::new(false)))?;

    println!("If you heard the speech, TTS is working.");
    Ok(())
}
