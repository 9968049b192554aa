/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossterm::event::KeyCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use sim::event::GameEvent;
use sim::level::start_level;
use sim::step::{self, TickStatus};
use sim::world::{Phase, WorldState};
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "tunnelman.log";

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

fn main() {
    init_tracing();
    let config = GameConfig::load();

    let seed = config.game.seed.unwrap_or_else(clock_seed);
    info!(seed, level = config.game.start_level, lives = config.game.lives, "starting");

    let mut world = WorldState::new(seed, config.game.start_level, config.game.lives);
    start_level(&mut world);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = if config.sound { SoundEngine::new() } else { None };
    if config.sound && sound.is_none() {
        warn!("no audio output, continuing without sound");
    }

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Tunnelman!");
    println!("Final Score: {}", world.score);
}

/// Log to a file; the terminal belongs to the renderer.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tunnelman=info"));
    let file = match File::create(LOG_FILE) {
        Ok(f) => f,
        Err(_) => return,
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    loop {
        kb.drain_events();
        if kb.ctrl_c_pressed() {
            break;
        }

        match world.phase {
            Phase::GameOver => {
                kb.clear_pending();
                if kb.any_pressed(KEYS_QUIT) {
                    break;
                }
                if kb.any_pressed(KEYS_CONFIRM) {
                    new_game(world, config);
                    last_tick = Instant::now();
                }
            }
            Phase::Playing => {
                if last_tick.elapsed() >= tick_rate {
                    last_tick = Instant::now();
                    let outcome = step::step(world, kb.next_command());
                    process_sound_events(sound, &outcome.events);
                    if outcome.status != TickStatus::Continue {
                        kb.clear_pending();
                        advance(world, outcome.status);
                    }
                }
            }
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// React to the end of a level attempt.
fn advance(world: &mut WorldState, status: TickStatus) {
    match status {
        TickStatus::PlayerDied if world.lives > 0 => start_level(world),
        TickStatus::PlayerDied => {
            world.phase = Phase::GameOver;
            info!(score = world.score, level = world.level, "game over");
        }
        TickStatus::LevelFinished => {
            world.level = world.level.saturating_add(1);
            start_level(world);
        }
        TickStatus::Continue => {}
    }
}

fn new_game(world: &mut WorldState, config: &GameConfig) {
    world.score = 0;
    world.lives = config.game.lives;
    world.level = config.game.start_level;
    start_level(world);
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::Dig => sfx.play_dig(),
            GameEvent::SquirtFired => sfx.play_squirt(),
            GameEvent::SonarUsed => sfx.play_sonar(),
            GameEvent::ItemCollected => sfx.play_pickup(),
            GameEvent::OilFound => sfx.play_oil(),
            GameEvent::BoulderFalling { .. } => sfx.play_fall(),
            GameEvent::PlayerGaveUp => sfx.play_die(),
            GameEvent::ProtesterAnnoyed { .. } => sfx.play_annoyed(),
            GameEvent::ProtesterGaveUp { .. } => sfx.play_gave_up(),
            GameEvent::ProtesterYelled { .. } => sfx.play_yell(),
            GameEvent::ProtesterFoundGold { .. } => sfx.play_bribe(),
            GameEvent::LevelFinished => sfx.play_clear(),
        }
    }
}
