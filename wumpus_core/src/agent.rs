use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Direction, Percepts, Position,
    world::{Content, World},
};

/// Score deltas applied by the agent's actions.
pub mod scoring {
    pub const STEP_COST: i64 = -1;
    pub const SHOT_COST: i64 = -10;
    pub const KILL_REWARD: i64 = 500;
    pub const GOLD_REWARD: i64 = 1000;
    pub const ESCAPE_BONUS: i64 = 1000;
}

/// Life-cycle of a game. Every state except `Playing` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameState {
    #[default]
    Playing,
    Won,
    DeadByMonster,
    DeadByPit,
}

impl GameState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        self != GameState::Playing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub has_gold: bool,
    pub has_arrow: bool,
}

/// Logical commands a host can issue to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Move(Direction),
    Shoot,
}

/// What happened as the result of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveEvent {
    /// The destination was off the grid; only the facing changed.
    Blocked,
    /// Walked into the wumpus while holding the arrow.
    SlewMonster,
    EatenByMonster,
    FellIntoPit,
    FoundGold,
    FoundArrow,
    /// Arrived on an empty cell and sensed these percepts.
    Sensed(Percepts),
    /// Returned to the entry with the gold.
    Escaped,
}

impl fmt::Display for MoveEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveEvent::Blocked => f.write_str("Can't move there!"),
            MoveEvent::SlewMonster => f.write_str("You killed the Wumpus in combat!"),
            MoveEvent::EatenByMonster => f.write_str("Eaten by the Wumpus! GAME OVER"),
            MoveEvent::FellIntoPit => f.write_str("Fell into a pit! GAME OVER"),
            MoveEvent::FoundGold => f.write_str("You found the GOLD! Return to start!"),
            MoveEvent::FoundArrow => f.write_str("Picked up an arrow!"),
            MoveEvent::Sensed(percepts) => write!(f, "{percepts}"),
            MoveEvent::Escaped => f.write_str("YOU WIN! Escaped with the gold!"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub moved: bool,
    pub message: String,
    /// `None` only when the game was already over.
    pub event: Option<MoveEvent>,
}

impl MoveOutcome {
    fn from_event(moved: bool, event: MoveEvent) -> Self {
        MoveOutcome {
            moved,
            message: event.to_string(),
            event: Some(event),
        }
    }
}

/// Why a command was turned down without changing any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    GameOver,
    NoArrow,
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refusal::GameOver => f.write_str("The game is over."),
            Refusal::NoArrow => f.write_str("No arrow to shoot!"),
        }
    }
}

/// What happened as the result of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotEvent {
    Refused(Refusal),
    Hit,
    Missed,
}

impl fmt::Display for ShotEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShotEvent::Refused(reason) => write!(f, "{reason}"),
            ShotEvent::Hit => f.write_str("Your arrow hit the Wumpus! It's dead!"),
            ShotEvent::Missed => f.write_str("Arrow missed... it flew into darkness."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotOutcome {
    pub fired: bool,
    pub hit: bool,
    /// Cells the arrow flew through, in order. Ends on the wumpus when it hit.
    pub trail: Vec<Position>,
    pub message: String,
    pub event: ShotEvent,
}

impl ShotOutcome {
    fn refused(reason: Refusal) -> Self {
        let event = ShotEvent::Refused(reason);
        ShotOutcome {
            fired: false,
            hit: false,
            trail: Vec::new(),
            message: event.to_string(),
            event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Moved(MoveOutcome),
    Shot(ShotOutcome),
}

impl ActionOutcome {
    /// Whether the action took effect (a move happened or an arrow flew).
    pub fn succeeded(&self) -> bool {
        match self {
            ActionOutcome::Moved(outcome) => outcome.moved,
            ActionOutcome::Shot(outcome) => outcome.fired,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ActionOutcome::Moved(outcome) => &outcome.message,
            ActionOutcome::Shot(outcome) => &outcome.message,
        }
    }
}

/// The player: owns its world and all player-relative state.
#[derive(Debug, Clone)]
pub struct Agent {
    world: World,
    position: Position,
    facing: Direction,
    inventory: Inventory,
    explored: HashSet<Position>,
    state: GameState,
    score: i64,
    turns: u32,
}

impl Agent {
    /// Places a fresh agent on the world's entry cell.
    pub fn new(world: World) -> Self {
        let entry = world.entry();
        Agent {
            world,
            position: entry,
            facing: Direction::default(),
            inventory: Inventory::default(),
            explored: HashSet::from([entry]),
            state: GameState::Playing,
            score: 0,
            turns: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn inventory(&self) -> Inventory {
        self.inventory
    }

    /// Every cell the agent has stood on, including the entry.
    pub fn explored(&self) -> &HashSet<Position> {
        &self.explored
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_over(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    /// Successful moves plus arrows fired.
    pub fn turns(&self) -> u32 {
        self.turns
    }

    /// Percepts at the agent's current cell.
    pub fn percepts(&self) -> Percepts {
        self.world.percepts_at(self.position)
    }

    pub fn act(&mut self, action: Action) -> ActionOutcome {
        match action {
            Action::Move(direction) => ActionOutcome::Moved(self.move_to(direction)),
            Action::Shoot => ActionOutcome::Shot(self.shoot()),
        }
    }

    /// Turns towards `direction` and steps one cell that way.
    ///
    /// The facing changes even when the step is blocked by the grid edge.
    /// A blocked step leaves position, inventory, score and the explored set
    /// untouched.
    pub fn move_to(&mut self, direction: Direction) -> MoveOutcome {
        if self.is_over() {
            return MoveOutcome {
                moved: false,
                message: Refusal::GameOver.to_string(),
                event: None,
            };
        }

        self.facing = direction;
        let Some(target) = self.world.step(self.position, direction) else {
            debug!(?direction, position = %self.position, "move blocked by the grid edge");
            return MoveOutcome::from_event(false, MoveEvent::Blocked);
        };

        self.position = target;
        self.explored.insert(target);
        self.score += scoring::STEP_COST;
        self.turns += 1;
        debug!(?direction, position = %target, "agent moved");

        let mut event = self.resolve_arrival(target);

        // A death on this move has already ended the game and cannot be undone.
        if self.state == GameState::Playing
            && self.inventory.has_gold
            && target == self.world.entry()
        {
            self.state = GameState::Won;
            self.score += scoring::ESCAPE_BONUS;
            event = MoveEvent::Escaped;
            info!(score = self.score, turns = self.turns, "agent escaped with the gold");
        }

        MoveOutcome::from_event(true, event)
    }

    fn resolve_arrival(&mut self, target: Position) -> MoveEvent {
        match self.world.content_at(target) {
            Content::Wumpus if self.inventory.has_arrow => {
                self.inventory.has_arrow = false;
                self.world.slay_monster(target);
                self.score += scoring::KILL_REWARD;
                info!(position = %target, "wumpus killed in melee");
                MoveEvent::SlewMonster
            }
            Content::Wumpus => {
                self.state = GameState::DeadByMonster;
                info!(position = %target, score = self.score, "agent eaten by the wumpus");
                MoveEvent::EatenByMonster
            }
            Content::Pit => {
                self.state = GameState::DeadByPit;
                info!(position = %target, score = self.score, "agent fell into a pit");
                MoveEvent::FellIntoPit
            }
            Content::Gold => {
                self.world.take(target);
                self.inventory.has_gold = true;
                self.score += scoring::GOLD_REWARD;
                debug!(position = %target, "picked up the gold");
                MoveEvent::FoundGold
            }
            Content::Arrow => {
                self.world.take(target);
                self.inventory.has_arrow = true;
                debug!(position = %target, "picked up the arrow");
                MoveEvent::FoundArrow
            }
            Content::Empty => MoveEvent::Sensed(self.world.percepts_at(target)),
        }
    }

    /// Fires the arrow in the facing direction.
    ///
    /// The shot costs points whether or not it hits. The arrow flies until it
    /// leaves the grid or reaches the wumpus.
    pub fn shoot(&mut self) -> ShotOutcome {
        if self.is_over() {
            return ShotOutcome::refused(Refusal::GameOver);
        }
        if !self.inventory.has_arrow {
            debug!("shot attempted without an arrow");
            return ShotOutcome::refused(Refusal::NoArrow);
        }

        self.inventory.has_arrow = false;
        self.score += scoring::SHOT_COST;
        self.turns += 1;

        let (trail, target) = self.trace_arrow();
        let event = match target {
            Some(pos) => {
                self.world.slay_monster(pos);
                self.score += scoring::KILL_REWARD;
                info!(position = %pos, "arrow hit the wumpus");
                ShotEvent::Hit
            }
            None => {
                debug!(facing = ?self.facing, cells = trail.len(), "arrow missed");
                ShotEvent::Missed
            }
        };

        ShotOutcome {
            fired: true,
            hit: event == ShotEvent::Hit,
            trail,
            message: event.to_string(),
            event,
        }
    }

    /// Walks the arrow's path. Returns the traversed cells and, on a hit,
    /// the wumpus cell.
    fn trace_arrow(&self) -> (Vec<Position>, Option<Position>) {
        let mut trail = Vec::new();
        let mut cursor = self.position;
        while let Some(next) = self.world.step(cursor, self.facing) {
            trail.push(next);
            if self.world.content_at(next) == Content::Wumpus {
                return (trail, Some(next));
            }
            cursor = next;
        }
        (trail, None)
    }
}
