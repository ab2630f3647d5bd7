//! Vector Voyage headless driver
//!
//! Loads a level catalog, then plays every unlocked level with a solver,
//! printing each submission. Useful for checking a catalog end to end.
//!
//! Usage:
//!   vector-voyage [CATALOG.json] [--save [PATH]] [--settings PATH] [--badges PATH]
//!
//! `--save` without a path writes `vector-voyage-storage.json` in the
//! working directory. A module that stays locked counts as a failure.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use glam::Vec3;
    use vector_voyage::badges::BadgeDef;
    use vector_voyage::persistence::FileStore;
    use vector_voyage::session::TickInput;
    use vector_voyage::sim::{LevelCatalog, ModuleLevel, VectorPatch, total_load};
    use vector_voyage::{GameModule, GameSession, Settings};

    const DEFAULT_CATALOG: &str = include_str!("../data/levels.json");
    const DEFAULT_BADGES: &str = include_str!("../data/badges.json");

    /// Frame step used while settling drone wind before a submit
    const FRAME_DT: f32 = 1.0 / 60.0;

    #[derive(Debug, Default)]
    struct Args {
        catalog: Option<PathBuf>,
        save: Option<PathBuf>,
        settings: Option<PathBuf>,
        badges: Option<PathBuf>,
    }

    fn parse_args() -> Args {
        let mut args = Args::default();
        let mut iter = std::env::args().skip(1).peekable();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--save" => {
                    let has_path = iter.peek().is_some_and(|next| !next.starts_with("--"));
                    args.save = if has_path {
                        iter.next().map(PathBuf::from)
                    } else {
                        Some(FileStore::default_path("."))
                    };
                }
                "--settings" => args.settings = iter.next().map(PathBuf::from),
                "--badges" => args.badges = iter.next().map(PathBuf::from),
                _ => args.catalog = Some(PathBuf::from(arg)),
            }
        }
        args
    }

    /// Joint angles reaching `target` with a one or two segment arm
    fn reach(lengths: &[f32], target: Vec3) -> Option<Vec<f32>> {
        match lengths {
            [_] => Some(vec![target.y.atan2(target.x)]),
            [l1, l2] => {
                let d2 = target.x * target.x + target.y * target.y;
                let cos_elbow = ((d2 - l1 * l1 - l2 * l2) / (2.0 * l1 * l2)).clamp(-1.0, 1.0);
                let elbow = cos_elbow.acos();
                let shoulder =
                    target.y.atan2(target.x) - (l2 * elbow.sin()).atan2(l1 + l2 * elbow.cos());
                Some(vec![shoulder, elbow])
            }
            _ => None,
        }
    }

    /// Split `total` evenly across the session's vectors
    fn spread(session: &mut GameSession, total: Vec3) {
        let ids: Vec<u32> = session.vectors().iter().map(|v| v.id).collect();
        let share = total / ids.len().max(1) as f32;
        for id in ids {
            session.update_vector(id, &VectorPatch::components(share));
        }
    }

    /// Set up a solution for the loaded level
    fn solve(session: &mut GameSession) {
        let Some(level) = session.current_level().cloned() else {
            return;
        };
        match &level.kind {
            ModuleLevel::Abstract => spread(session, level.target_vector),
            ModuleLevel::Drone(drone) => {
                session.tick(&TickInput::default(), FRAME_DT);
                let wind = session
                    .drone_state()
                    .map(|d| d.current_wind)
                    .unwrap_or(Vec3::ZERO);
                let target = drone
                    .delivery_targets
                    .first()
                    .copied()
                    .unwrap_or(level.target_vector);
                spread(session, target - wind);
            }
            ModuleLevel::Bridge(bridge) => spread(session, -total_load(&bridge.loads)),
            ModuleLevel::Robotics(robotics) => {
                let lengths: Vec<f32> = robotics.joints.iter().map(|j| j.length).collect();
                if let Some(angles) = reach(&lengths, robotics.target_for_step(0)) {
                    for (i, angle) in angles.into_iter().enumerate() {
                        session.update_joint_angle(i, angle);
                    }
                }
            }
        }
    }

    /// Outcome of autoplaying one module
    #[derive(Debug, Default, Clone, Copy)]
    struct ModuleRun {
        won: usize,
        played: usize,
        locked: bool,
    }

    fn play_module(session: &mut GameSession, module: GameModule) -> ModuleRun {
        if !session.set_active_module(module) {
            println!("[{}] locked", module);
            return ModuleRun {
                locked: true,
                ..ModuleRun::default()
            };
        }

        let (mut won, mut played) = (0, 0);
        for index in 0..session.level_count() {
            if !session.load_level(index) {
                continue;
            }
            let title = session
                .current_level()
                .map(|l| l.title.clone())
                .unwrap_or_default();
            solve(session);

            played += 1;
            match session.submit_result() {
                Some(result) if result.success => {
                    won += 1;
                    println!(
                        "  ✓ [{}] {:>2} {:<24} error {:.3}",
                        module, index, title, result.magnitude_error
                    );
                }
                Some(result) => println!(
                    "  ✗ [{}] {:>2} {:<24} error {:.3} {:?}",
                    module, index, title, result.magnitude_error, result.flags
                ),
                None => println!("  ? [{}] {:>2} {:<24} not playable", module, index, title),
            }
        }
        ModuleRun {
            won,
            played,
            locked: false,
        }
    }

    pub fn run() {
        env_logger::init();
        let args = parse_args();

        let catalog = match &args.catalog {
            Some(path) => LevelCatalog::load(path),
            None => LevelCatalog::from_json_str(DEFAULT_CATALOG),
        };
        let catalog = match catalog {
            Ok(catalog) => catalog,
            Err(e) => {
                eprintln!("Failed to load catalog: {}", e);
                std::process::exit(2);
            }
        };

        let badges_json = match &args.badges {
            Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
                log::warn!("Using built-in badges ({}): {}", path.display(), e);
                DEFAULT_BADGES.to_string()
            }),
            None => DEFAULT_BADGES.to_string(),
        };
        let badges: Vec<BadgeDef> = serde_json::from_str(&badges_json).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed badge catalog: {}", e);
            Vec::new()
        });

        let settings = args
            .settings
            .as_deref()
            .map(Settings::load)
            .unwrap_or_default();

        let session = match args.save {
            Some(path) => GameSession::with_storage(catalog, FileStore::new(path)),
            None => GameSession::new(catalog),
        };
        let mut session = session.with_settings(settings).with_badges(badges);

        println!(
            "=== Vector Voyage ({} controls) ===\n",
            session.settings().preset.as_str()
        );
        let (mut won, mut played) = (0, 0);
        let mut locked = Vec::new();
        for module in GameModule::ALL {
            let run = play_module(&mut session, module);
            won += run.won;
            played += run.played;
            if run.locked {
                locked.push(module.as_str());
            }
        }

        let career = session.career_progress();
        println!("\n{}/{} levels solved, {} stars", won, played, career.total_stars);
        for module in GameModule::ALL {
            let progress = career.module(module);
            println!(
                "  {:<9} {} completed, {} stars, unlocked to {}",
                module.as_str(),
                progress.levels_completed,
                progress.stars_earned,
                progress.unlocked_index
            );
        }
        if !career.earned_badges.is_empty() {
            println!("  badges: {}", career.earned_badges.join(", "));
        }

        if !locked.is_empty() {
            println!("  still locked: {}", locked.join(", "));
        }

        if won < played || !locked.is_empty() {
            std::process::exit(1);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly
}
