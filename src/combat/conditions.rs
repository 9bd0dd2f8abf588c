#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    Poison,
    Fire,
    Energy,
    Drown,
}

impl ConditionKind {
    fn bit(self) -> u8 {
        match self {
            Self::Poison => 1,
            Self::Fire => 2,
            Self::Energy => 4,
            Self::Drown => 8,
        }
    }
}

/// Status effects currently active on a creature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionSet(u8);

impl ConditionSet {
    pub fn insert(&mut self, kind: ConditionKind) {
        self.0 |= kind.bit();
    }

    pub fn remove(&mut self, kind: ConditionKind) {
        self.0 &= !kind.bit();
    }

    pub fn contains(&self, kind: ConditionKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}
