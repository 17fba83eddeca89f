use rand::{SeedableRng, rngs::StdRng};
use std::ops::RangeInclusive;

use tracing::{debug, info};
use wumpus_core::{
    Action, ActionOutcome, Agent, MoveEvent, Position, ShotEvent, World, WorldConfig, WorldError,
};

/// Frames per second of the render loop.
pub const FRAMES_PER_SECOND: u32 = 20;

/// Length of the arrow flight animation, in frames.
const ARROW_FLIGHT_FRAMES: u32 = FRAMES_PER_SECOND / 2;

/// Grid sizes reachable with the resize keys.
pub const PLAY_SIZES: RangeInclusive<usize> = 4..=8;

/// Where new worlds come from on start and restart.
pub enum Setup {
    Random { config: WorldConfig, rng: StdRng },
    Fixed(World),
}

impl Setup {
    pub fn random(config: WorldConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Setup::Random { config, rng }
    }

    fn build(&mut self) -> Result<World, WorldError> {
        match self {
            Setup::Random { config, rng } => World::generate(*config, rng),
            Setup::Fixed(world) => Ok(world.clone()),
        }
    }
}

/// A message shown under the map. `frames_left == None` keeps it up until replaced.
#[derive(Debug, Clone)]
pub struct Banner {
    pub text: String,
    frames_left: Option<u32>,
}

/// The arrow currently in flight, for animation only.
#[derive(Debug, Clone)]
pub struct ArrowFlight {
    trail: Vec<Position>,
    frames_left: u32,
}

impl ArrowFlight {
    /// Cells the arrow has reached so far.
    pub fn visible(&self) -> &[Position] {
        let elapsed = ARROW_FLIGHT_FRAMES - self.frames_left;
        let len = self.trail.len() as u32;
        let shown = (len * elapsed).div_ceil(ARROW_FLIGHT_FRAMES).max(1).min(len);
        &self.trail[..shown as usize]
    }
}

pub struct App {
    setup: Setup,
    /// The current game. Owns its world.
    pub agent: Agent,
    pub banner: Option<Banner>,
    pub arrow: Option<ArrowFlight>,
    pub show_help: bool,
    pub should_quit: bool,
    pub games_played: u32,
}

impl App {
    pub fn new(mut setup: Setup) -> Result<Self, WorldError> {
        let world = setup.build()?;
        Ok(App {
            setup,
            agent: Agent::new(world),
            banner: Some(Banner {
                text: "Find the gold and bring it back here. Press 'h' for help.".to_string(),
                frames_left: Some(4 * FRAMES_PER_SECOND),
            }),
            arrow: None,
            show_help: false,
            should_quit: false,
            games_played: 1,
        })
    }

    /// Throws the current game away and starts a fresh one.
    pub fn restart(&mut self) -> Result<(), WorldError> {
        let world = self.setup.build()?;
        self.agent = Agent::new(world);
        self.banner = None;
        self.arrow = None;
        self.games_played += 1;
        info!(game = self.games_played, "restarted");
        Ok(())
    }

    /// Changes the grid size by `delta` within [`PLAY_SIZES`] and starts a
    /// fresh game with one pit fewer than the size.
    ///
    /// Returns `Ok(false)` when nothing changed: fixed layouts keep their
    /// size, and a step past either end of the range is ignored.
    pub fn resize(&mut self, delta: isize) -> Result<bool, WorldError> {
        let Setup::Random { config, .. } = &mut self.setup else {
            debug!("fixed layout, resize ignored");
            return Ok(false);
        };
        let target = config
            .size
            .saturating_add_signed(delta)
            .clamp(*PLAY_SIZES.start(), *PLAY_SIZES.end());
        if target == config.size {
            return Ok(false);
        }
        *config = WorldConfig::new(target, target - 1);
        info!(size = target, pits = target - 1, "resized");
        self.restart()?;
        Ok(true)
    }

    /// Commands issued after the game ended change nothing, so the final
    /// banner stays up.
    pub fn apply(&mut self, action: Action) {
        if self.agent.is_over() {
            debug!(?action, "game already over");
            return;
        }
        let outcome = self.agent.act(action);
        let frames = banner_frames(&outcome);
        if let ActionOutcome::Shot(shot) = &outcome {
            if shot.fired && !shot.trail.is_empty() {
                self.arrow = Some(ArrowFlight {
                    trail: shot.trail.clone(),
                    frames_left: ARROW_FLIGHT_FRAMES,
                });
            }
        }

        let text = outcome.message();
        self.banner = if text.is_empty() {
            None
        } else {
            Some(Banner {
                text: text.to_string(),
                frames_left: frames,
            })
        };

        if self.agent.is_over() {
            info!(state = ?self.agent.state(), score = self.agent.score(), "game over");
        }
    }

    /// Advances display timers by one frame.
    pub fn tick(&mut self) {
        let banner_expired = match &mut self.banner {
            Some(Banner {
                frames_left: Some(frames),
                ..
            }) => {
                *frames = frames.saturating_sub(1);
                *frames == 0
            }
            _ => false,
        };
        if banner_expired {
            self.banner = None;
        }

        let landed = match &mut self.arrow {
            Some(flight) => {
                flight.frames_left = flight.frames_left.saturating_sub(1);
                flight.frames_left == 0
            }
            None => false,
        };
        if landed {
            self.arrow = None;
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Closes the help popup if it is open, otherwise quits.
    pub fn escape(&mut self) {
        if self.show_help {
            self.show_help = false;
        } else {
            self.quit();
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn banner_frames(outcome: &ActionOutcome) -> Option<u32> {
    let seconds = |s: u32| Some(s * FRAMES_PER_SECOND);
    match outcome {
        ActionOutcome::Moved(moved) => match moved.event {
            None
            | Some(MoveEvent::EatenByMonster | MoveEvent::FellIntoPit | MoveEvent::Escaped) => None,
            Some(MoveEvent::Blocked) => seconds(1),
            Some(MoveEvent::Sensed(_)) => Some(3 * FRAMES_PER_SECOND / 2),
            Some(MoveEvent::FoundArrow) => seconds(2),
            Some(MoveEvent::FoundGold | MoveEvent::SlewMonster) => seconds(3),
        },
        ActionOutcome::Shot(shot) => match shot.event {
            ShotEvent::Hit => seconds(3),
            ShotEvent::Missed | ShotEvent::Refused(_) => seconds(2),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wumpus_core::{Content, Direction, GameState};

    const LAYOUT: &str = "
        W . .
        A . .
        . G P
    ";

    fn app() -> App {
        App::new(Setup::Fixed(LAYOUT.parse().unwrap())).unwrap()
    }

    #[test]
    fn banners_expire() {
        let mut app = app();
        app.apply(Action::Move(Direction::Left));
        assert_eq!(app.banner.as_ref().unwrap().text, "Can't move there!");
        for _ in 0..FRAMES_PER_SECOND {
            app.tick();
        }
        assert!(app.banner.is_none());
    }

    #[test]
    fn arrow_flight_animates_then_clears() {
        let mut app = app();
        app.apply(Action::Move(Direction::Up));
        app.apply(Action::Shoot);
        assert_eq!(app.banner.as_ref().unwrap().text, "Your arrow hit the Wumpus! It's dead!");

        let flight = app.arrow.as_ref().unwrap();
        assert_eq!(flight.visible(), &[Position::new(0, 0)]);
        for _ in 0..ARROW_FLIGHT_FRAMES {
            app.tick();
        }
        assert!(app.arrow.is_none());
    }

    #[test]
    fn arrow_reveals_cells_progressively() {
        let flight = ArrowFlight {
            trail: vec![Position::new(0, 0), Position::new(0, 1), Position::new(0, 2)],
            frames_left: ARROW_FLIGHT_FRAMES,
        };
        assert_eq!(flight.visible().len(), 1);
        let landed = ArrowFlight {
            frames_left: 1,
            ..flight.clone()
        };
        assert_eq!(landed.visible().len(), 3);
    }

    #[test]
    fn terminal_banner_persists_and_restart_resets() {
        let mut app = app();
        app.apply(Action::Move(Direction::Right));
        app.apply(Action::Move(Direction::Right));
        assert_eq!(app.agent.state(), GameState::DeadByPit);
        for _ in 0..10 * FRAMES_PER_SECOND {
            app.tick();
        }
        assert!(app.banner.is_some());

        app.restart().unwrap();
        assert_eq!(app.agent.state(), GameState::Playing);
        assert_eq!(app.agent.score(), 0);
        assert!(app.banner.is_none());
        assert_eq!(app.games_played, 2);
    }

    #[test]
    fn commands_after_game_over_keep_the_final_banner() {
        let mut app = app();
        app.apply(Action::Move(Direction::Right));
        app.apply(Action::Move(Direction::Right));
        assert_eq!(app.agent.state(), GameState::DeadByPit);

        app.apply(Action::Shoot);
        app.apply(Action::Move(Direction::Left));
        assert!(app.arrow.is_none());
        assert_eq!(app.agent.score(), -2);
        for _ in 0..10 * FRAMES_PER_SECOND {
            app.tick();
        }
        assert_eq!(app.banner.as_ref().unwrap().text, "Fell into a pit! GAME OVER");
    }

    #[test]
    fn resize_rebuilds_random_worlds_within_range() {
        let mut app = App::new(Setup::random(WorldConfig::new(7, 2), Some(5))).unwrap();

        assert!(app.resize(1).unwrap());
        assert_eq!(app.agent.world().size(), 8);
        assert_eq!(app.agent.world().count(Content::Pit), 7);
        assert_eq!(app.games_played, 2);

        assert!(!app.resize(1).unwrap());
        assert_eq!(app.games_played, 2);

        for _ in 0..10 {
            app.resize(-1).unwrap();
        }
        assert_eq!(app.agent.world().size(), 4);
        assert_eq!(app.agent.world().count(Content::Pit), 3);
        assert_eq!(app.games_played, 6);
    }

    #[test]
    fn resize_leaves_fixed_layouts_alone() {
        let mut app = app();
        app.apply(Action::Move(Direction::Up));
        assert!(!app.resize(1).unwrap());
        assert_eq!(app.agent.world().size(), 3);
        assert_eq!(app.agent.position(), Position::new(1, 0));
        assert_eq!(app.games_played, 1);
    }

    #[test]
    fn escape_closes_help_before_quitting() {
        let mut app = app();
        app.toggle_help();
        app.escape();
        assert!(!app.show_help);
        assert!(!app.should_quit);

        app.escape();
        assert!(app.should_quit);
    }

    #[test]
    fn seeded_setups_repeat() {
        let config = WorldConfig::new(5, 4);
        let first = App::new(Setup::random(config, Some(99))).unwrap();
        let second = App::new(Setup::random(config, Some(99))).unwrap();
        assert_eq!(first.agent.world(), second.agent.world());
    }
}
