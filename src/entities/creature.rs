use crate::combat::conditions::ConditionSet;
use crate::combat::damage::{DamageType, Immunities};
use crate::world::position::{Direction, Position};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreatureId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatureKind {
    Player(PlayerData),
    Actor(ActorData),
    Npc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerData {
    /// Set after hostile activity; restricts zone transitions.
    pub zone_locked: bool,
    pub connected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorData {
    pub can_push_creatures: bool,
    pub can_push_items: bool,
    pub is_summon: bool,
    pub is_player_summon: bool,
    pub immunities: Immunities,
    pub conditions: ConditionSet,
}

impl ActorData {
    pub fn is_immune(&self, damage: DamageType) -> bool {
        self.immunities.contains(damage)
    }

    /// Whether the actor already suffers the condition this damage inflicts.
    pub fn has_condition_from(&self, damage: DamageType) -> bool {
        damage
            .condition()
            .map_or(false, |kind| self.conditions.contains(kind))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creature {
    pub id: CreatureId,
    pub name: String,
    pub kind: CreatureKind,
    /// The tile currently holding this creature.
    pub position: Option<Position>,
    pub direction: Direction,
    /// Hidden creatures are invisible to everyone but themselves.
    pub hidden: bool,
    pub pushable: bool,
}

impl Creature {
    pub fn player(id: CreatureId, name: impl Into<String>) -> Self {
        Self::new(
            id,
            name,
            CreatureKind::Player(PlayerData {
                zone_locked: false,
                connected: true,
            }),
        )
    }

    pub fn actor(id: CreatureId, name: impl Into<String>, data: ActorData) -> Self {
        let mut creature = Self::new(id, name, CreatureKind::Actor(data));
        creature.pushable = true;
        creature
    }

    pub fn npc(id: CreatureId, name: impl Into<String>) -> Self {
        Self::new(id, name, CreatureKind::Npc)
    }

    fn new(id: CreatureId, name: impl Into<String>, kind: CreatureKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            position: None,
            direction: Direction::South,
            hidden: false,
            pushable: false,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, CreatureKind::Player(_))
    }

    pub fn player_data(&self) -> Option<&PlayerData> {
        match &self.kind {
            CreatureKind::Player(data) => Some(data),
            CreatureKind::Actor(_) | CreatureKind::Npc => None,
        }
    }

    pub fn actor_data(&self) -> Option<&ActorData> {
        match &self.kind {
            CreatureKind::Actor(data) => Some(data),
            CreatureKind::Player(_) | CreatureKind::Npc => None,
        }
    }

    pub fn can_see(&self, other: &Creature) -> bool {
        self.id == other.id || !other.hidden
    }

    /// Players with a live client connection receive client events.
    pub fn is_connected_player(&self) -> bool {
        self.player_data().map_or(false, |data| data.connected)
    }
}

#[derive(Debug, Default, Clone)]
pub struct CreatureRegistry {
    creatures: HashMap<CreatureId, Creature>,
}

impl CreatureRegistry {
    pub fn get(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn get_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    pub fn insert(&mut self, creature: Creature) -> Result<(), String> {
        if self.creatures.contains_key(&creature.id) {
            return Err(format!("creature {:?} already exists", creature.id));
        }
        self.creatures.insert(creature.id, creature);
        Ok(())
    }

    pub fn remove(&mut self, id: CreatureId) -> Option<Creature> {
        self.creatures.remove(&id)
    }

    /// True for creatures that block others: unknown ids count as visible.
    pub fn is_visible(&self, id: CreatureId) -> bool {
        self.get(id).map_or(true, |creature| !creature.hidden)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }
}
