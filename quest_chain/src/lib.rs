//! Ordered survival quest chain: proximity and confirm gates, event sink.
#![forbid(unsafe_code)]

use rapier3d::math::Vector;
use rapier3d::prelude::Real;

/// Proximity gate around a world anchor.
#[derive(Clone, Copy, Debug)]
pub struct Trigger {
    pub position: Vector<Real>,
    pub radius: Real,
}

impl Trigger {
    fn contains(&self, point: Vector<Real>) -> bool {
        (point - self.position).norm() <= self.radius
    }
}

#[derive(Clone, Copy, Debug)]
pub struct QuestConfig {
    pub survival_pack: Trigger,
    pub ghillie_suit: Trigger,
    pub hidden_map: Trigger,
    pub beacon_key: Trigger,
    pub beacon: Trigger,
    pub extraction: Trigger,
}

/// Props the renderer may need to show or hide as the chain advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestProp {
    SurvivalPack,
    GhillieSuit,
    HiddenMap,
    BeaconKey,
    Beacon,
    Helicopter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestEvent {
    ObjectiveCompleted { index: usize },
    KeyCollected,
    BeaconActivated,
    Escaped,
}

/// Observer for quest transitions. The shell logs them; tests record them.
pub trait EventSink {
    fn notify(&mut self, event: QuestEvent);
}

/// Sink that drops everything.
#[derive(Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&mut self, _event: QuestEvent) {}
}

#[derive(Clone, Copy, Debug)]
pub struct Objective {
    pub story: &'static str,
    pub objective: &'static str,
    pub completed: bool,
}

/// Transition edges produced by a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickEffects {
    /// The ghillie suit was found this tick; the predator latch must be
    /// applied before its next steering update.
    pub stealth_acquired: bool,
    pub beacon_activated: bool,
    pub escaped: bool,
}

const OBJECTIVE_SURVIVAL_PACK: usize = 0;
const OBJECTIVE_GHILLIE_SUIT: usize = 1;
const OBJECTIVE_HIDDEN_MAP: usize = 2;
const OBJECTIVE_BEACON: usize = 3;
const OBJECTIVE_ESCAPE: usize = 4;

fn initial_objectives() -> [Objective; 5] {
    [
        Objective {
            story: "After the crash, you stumble upon a survival pack near the wreckage. \
                    It contains essential supplies for your survival.",
            objective: "Find the survival pack near the wreckage of the plane.",
            completed: false,
        },
        Objective {
            story: "You find a letter inside the survival pack that mentions a ghillie suit \
                    hidden near a rock formation. This will help you avoid detection by the \
                    predator.",
            objective: "Find the ghillie suit near the rock formation.",
            completed: false,
        },
        Objective {
            story: "Inside the ghillie suit's pocket, you find a letter describing a hidden \
                    map that leads to a rescue beacon. The map was lost a long time ago. Go \
                    find it!",
            objective: "Find the hidden map.",
            completed: false,
        },
        Objective {
            story: "The map you found leads you to a beacon that needs to be activated to \
                    call for help. Go to the beacon and turn it on.",
            objective: "Find and activate the beacon to call for help.",
            completed: false,
        },
        Objective {
            story: "With the beacon activated, help is on the way! Reach the helicopter to \
                    escape the island safely.",
            objective: "Escape to safety by reaching the helicopter.",
            completed: false,
        },
    ]
}

pub struct QuestChain {
    config: QuestConfig,
    objectives: [Objective; 5],
    key_collected: bool,
    beacon_activated: bool,
    escaped: bool,
}

impl QuestChain {
    pub fn new(config: QuestConfig) -> Self {
        Self {
            config,
            objectives: initial_objectives(),
            key_collected: false,
            beacon_activated: false,
            escaped: false,
        }
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// First incomplete objective, if any. Purely derived.
    pub fn current_objective(&self) -> Option<&Objective> {
        self.objectives.iter().find(|objective| !objective.completed)
    }

    pub fn key_collected(&self) -> bool {
        self.key_collected
    }

    pub fn beacon_activated(&self) -> bool {
        self.beacon_activated
    }

    pub fn escaped(&self) -> bool {
        self.escaped
    }

    pub fn is_prop_visible(&self, prop: QuestProp) -> bool {
        match prop {
            QuestProp::SurvivalPack => !self.objectives[OBJECTIVE_SURVIVAL_PACK].completed,
            QuestProp::GhillieSuit => {
                self.objectives[OBJECTIVE_SURVIVAL_PACK].completed
                    && !self.objectives[OBJECTIVE_GHILLIE_SUIT].completed
            }
            QuestProp::HiddenMap => {
                self.objectives[OBJECTIVE_GHILLIE_SUIT].completed
                    && !self.objectives[OBJECTIVE_HIDDEN_MAP].completed
            }
            QuestProp::BeaconKey => {
                self.objectives[OBJECTIVE_HIDDEN_MAP].completed && !self.key_collected
            }
            QuestProp::Beacon => true,
            QuestProp::Helicopter => self.beacon_activated,
        }
    }

    /// Evaluates every unlocked gate in order. Gates fail safe: an unmet
    /// condition changes nothing. Terminal after escape.
    pub fn tick(
        &mut self,
        player: Vector<Real>,
        confirm_pressed: bool,
        sink: &mut dyn EventSink,
    ) -> TickEffects {
        let mut effects = TickEffects::default();
        if self.escaped {
            return effects;
        }

        if !self.objectives[OBJECTIVE_SURVIVAL_PACK].completed
            && self.config.survival_pack.contains(player)
        {
            self.complete(OBJECTIVE_SURVIVAL_PACK, sink);
        }

        if self.objectives[OBJECTIVE_SURVIVAL_PACK].completed
            && !self.objectives[OBJECTIVE_GHILLIE_SUIT].completed
            && self.config.ghillie_suit.contains(player)
        {
            self.complete(OBJECTIVE_GHILLIE_SUIT, sink);
            effects.stealth_acquired = true;
        }

        if self.objectives[OBJECTIVE_GHILLIE_SUIT].completed
            && !self.objectives[OBJECTIVE_HIDDEN_MAP].completed
            && self.config.hidden_map.contains(player)
        {
            self.complete(OBJECTIVE_HIDDEN_MAP, sink);
        }

        // Key pickup is automatic on proximity; the confirm key only gates
        // the beacon itself.
        if self.objectives[OBJECTIVE_HIDDEN_MAP].completed
            && !self.key_collected
            && self.config.beacon_key.contains(player)
        {
            self.key_collected = true;
            sink.notify(QuestEvent::KeyCollected);
        }

        if self.key_collected
            && !self.beacon_activated
            && confirm_pressed
            && self.config.beacon.contains(player)
        {
            self.beacon_activated = true;
            self.complete(OBJECTIVE_BEACON, sink);
            sink.notify(QuestEvent::BeaconActivated);
            effects.beacon_activated = true;
        }

        if self.beacon_activated
            && !self.escaped
            && confirm_pressed
            && self.config.extraction.contains(player)
        {
            self.escaped = true;
            self.complete(OBJECTIVE_ESCAPE, sink);
            sink.notify(QuestEvent::Escaped);
            effects.escaped = true;
        }

        effects
    }

    fn complete(&mut self, index: usize, sink: &mut dyn EventSink) {
        self.objectives[index].completed = true;
        sink.notify(QuestEvent::ObjectiveCompleted { index });
    }
}
