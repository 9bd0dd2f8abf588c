use crate::combat::conditions::ConditionKind;
use serde::Deserialize;

/// Damage kinds a magic field can deal to whoever steps on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Physical,
    Energy,
    Earth,
    Fire,
    LifeDrain,
    ManaDrain,
    Drown,
}

impl DamageType {
    pub const ALL: [DamageType; 7] = [
        DamageType::Physical,
        DamageType::Energy,
        DamageType::Earth,
        DamageType::Fire,
        DamageType::LifeDrain,
        DamageType::ManaDrain,
        DamageType::Drown,
    ];

    pub fn mask(self) -> u16 {
        match self {
            Self::Physical => 1,
            Self::Energy => 2,
            Self::Earth => 4,
            Self::Fire => 8,
            Self::LifeDrain => 32,
            Self::ManaDrain => 64,
            Self::Drown => 256,
        }
    }

    /// The lingering condition a creature picks up from this damage, if any.
    pub fn condition(self) -> Option<ConditionKind> {
        match self {
            Self::Energy => Some(ConditionKind::Energy),
            Self::Earth => Some(ConditionKind::Poison),
            Self::Fire => Some(ConditionKind::Fire),
            Self::Drown => Some(ConditionKind::Drown),
            Self::Physical | Self::LifeDrain | Self::ManaDrain => None,
        }
    }
}

/// Set of damage kinds a creature ignores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Immunities(u16);

impl Immunities {
    pub const NONE: Self = Self(0);

    pub fn with(self, damage: DamageType) -> Self {
        Self(self.0 | damage.mask())
    }

    pub fn contains(self, damage: DamageType) -> bool {
        self.0 & damage.mask() != 0
    }
}

impl FromIterator<DamageType> for Immunities {
    fn from_iter<I: IntoIterator<Item = DamageType>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_are_distinct_bits() {
        let mut seen = 0u16;
        for damage in DamageType::ALL {
            let mask = damage.mask();
            assert_eq!(mask.count_ones(), 1);
            assert_eq!(seen & mask, 0);
            seen |= mask;
        }
    }

    #[test]
    fn immunities_collect_from_iterator() {
        let immune: Immunities = [DamageType::Fire, DamageType::Earth].into_iter().collect();
        assert!(immune.contains(DamageType::Fire));
        assert!(immune.contains(DamageType::Earth));
        assert!(!immune.contains(DamageType::Energy));
        assert!(!Immunities::NONE.contains(DamageType::Fire));
    }

    #[test]
    fn only_elemental_damage_leaves_a_condition() {
        assert_eq!(DamageType::Fire.condition(), Some(ConditionKind::Fire));
        assert_eq!(DamageType::Earth.condition(), Some(ConditionKind::Poison));
        assert_eq!(DamageType::Physical.condition(), None);
        assert_eq!(DamageType::LifeDrain.condition(), None);
    }
}
