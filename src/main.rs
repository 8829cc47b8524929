//! Cube Trail entry point
//!
//! Native builds run a headless autoplay: the cube rolls right, jumps now and
//! then, clicks through every dialogue and uses the door, following
//! `Navigate` commands through the built-in levels.
//!
//! Usage: `cube-trail [level name | level.json] [seed] [max frames]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Cube Trail (native, headless) starting...");

    if let Err(e) = headless::run(std::env::args().skip(1).collect()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is `web::start`, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use cube_trail::audio::{AudioDispatcher, LogSink};
    use cube_trail::consts::FRAME_MS;
    use cube_trail::sim::{Command, Controls, LevelSession, tick};
    use cube_trail::{ConfigError, LevelConfig, Settings};

    const SETTINGS_ENV: &str = "CUBE_TRAIL_SETTINGS";
    const DEFAULT_MAX_FRAMES: u64 = 60 * 60 * 10;

    fn load_level(arg: &str) -> Result<LevelConfig, ConfigError> {
        if arg.ends_with(".json") {
            LevelConfig::load(arg)
        } else {
            LevelConfig::builtin(arg)
        }
    }

    pub fn run(args: Vec<String>) -> Result<(), ConfigError> {
        let level = args.first().map_or("meadow", String::as_str);
        let seed = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(1);
        let max_frames = args
            .get(2)
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_FRAMES);

        let settings = match std::env::var(SETTINGS_ENV) {
            Ok(path) => Settings::load(path)?,
            Err(_) => Settings::default(),
        };

        let mut session = LevelSession::new(load_level(level)?, seed)?;
        session.set_char_ms(settings.char_ms_override());
        let mut audio = AudioDispatcher::new(settings);
        let mut sink = LogSink;

        let mut frames = 0u64;
        while frames < max_frames {
            let controls = Controls {
                move_right: true,
                jump: frames % 90 == 0,
                interact: true,
                ..Default::default()
            };
            tick(&mut session, &controls, FRAME_MS);
            frames += 1;

            if session.dialogue.is_active() && frames % 10 == 0 {
                session.advance_dialogue();
            }

            let commands = session.drain_commands();
            audio.dispatch_all(&commands, &mut sink);

            let next = commands.iter().find_map(|c| match c {
                Command::Navigate { level } => Some(level.clone()),
                _ => None,
            });
            if let Some(next) = next {
                log::info!(
                    "'{}' finished after {} frames ({} restarts)",
                    session.config().name,
                    session.frame,
                    session.restarts
                );
                match LevelConfig::builtin(&next) {
                    Ok(config) => {
                        session = LevelSession::new(config, seed)?;
                        session.set_char_ms(audio.settings().char_ms_override());
                    }
                    Err(_) => {
                        log::info!("Reached '{}', the end", next);
                        return Ok(());
                    }
                }
            }
        }

        log::warn!("Stopped after {} frames in '{}'", frames, session.config().name);
        Ok(())
    }
}
