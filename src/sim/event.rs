/// Events emitted during a simulation step.
/// The presentation layer consumes these as audio cues.

use crate::domain::entity::ActorId;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    Dig,
    SquirtFired,
    SonarUsed,
    ItemCollected,
    BoulderFalling { id: ActorId },
    PlayerGaveUp,
    ProtesterAnnoyed { id: ActorId },
    ProtesterGaveUp { id: ActorId },
    ProtesterYelled { id: ActorId },
    ProtesterFoundGold { id: ActorId },
    OilFound,
    LevelFinished,
}
