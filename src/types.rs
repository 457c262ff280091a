//! Selector values: which generation to load and which type to show.

use std::fmt;
use std::str::FromStr;

/// A PokeAPI generation number, limited to the range the selector offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u8);

impl Generation {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 8;

    pub fn new(n: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&n).then_some(Self(n))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn next(self) -> Self {
        if self.0 == Self::MAX {
            Self(Self::MIN)
        } else {
            Self(self.0 + 1)
        }
    }

    pub fn previous(self) -> Self {
        if self.0 == Self::MIN {
            Self(Self::MAX)
        } else {
            Self(self.0 - 1)
        }
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Generation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a generation number"))?;
        Self::new(n).ok_or_else(|| {
            format!(
                "generation must be between {} and {}",
                Self::MIN,
                Self::MAX
            )
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PokemonType {
    Normal,
    Fire,
    Water,
    Grass,
    Electric,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl PokemonType {
    pub const ALL: [PokemonType; 18] = [
        PokemonType::Normal,
        PokemonType::Fire,
        PokemonType::Water,
        PokemonType::Grass,
        PokemonType::Electric,
        PokemonType::Ice,
        PokemonType::Fighting,
        PokemonType::Poison,
        PokemonType::Ground,
        PokemonType::Flying,
        PokemonType::Psychic,
        PokemonType::Bug,
        PokemonType::Rock,
        PokemonType::Ghost,
        PokemonType::Dragon,
        PokemonType::Dark,
        PokemonType::Steel,
        PokemonType::Fairy,
    ];

    /// The tag PokeAPI uses in `types[].type.name`.
    pub fn as_str(self) -> &'static str {
        match self {
            PokemonType::Normal => "normal",
            PokemonType::Fire => "fire",
            PokemonType::Water => "water",
            PokemonType::Grass => "grass",
            PokemonType::Electric => "electric",
            PokemonType::Ice => "ice",
            PokemonType::Fighting => "fighting",
            PokemonType::Poison => "poison",
            PokemonType::Ground => "ground",
            PokemonType::Flying => "flying",
            PokemonType::Psychic => "psychic",
            PokemonType::Bug => "bug",
            PokemonType::Rock => "rock",
            PokemonType::Ghost => "ghost",
            PokemonType::Dragon => "dragon",
            PokemonType::Dark => "dark",
            PokemonType::Steel => "steel",
            PokemonType::Fairy => "fairy",
        }
    }

    /// Badge colour used by the detail pane.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            PokemonType::Normal => (168, 168, 120),
            PokemonType::Fire => (240, 128, 48),
            PokemonType::Water => (104, 144, 240),
            PokemonType::Grass => (120, 200, 80),
            PokemonType::Electric => (248, 208, 48),
            PokemonType::Ice => (152, 216, 216),
            PokemonType::Fighting => (192, 48, 40),
            PokemonType::Poison => (160, 64, 160),
            PokemonType::Ground => (224, 192, 104),
            PokemonType::Flying => (168, 144, 240),
            PokemonType::Psychic => (248, 88, 136),
            PokemonType::Bug => (168, 184, 32),
            PokemonType::Rock => (184, 160, 56),
            PokemonType::Ghost => (112, 88, 152),
            PokemonType::Dragon => (112, 56, 248),
            PokemonType::Dark => (112, 88, 72),
            PokemonType::Steel => (184, 184, 208),
            PokemonType::Fairy => (238, 153, 172),
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }
}

impl FromStr for PokemonType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| format!("unknown pokemon type '{s}'"))
    }
}

impl fmt::Display for PokemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The type selector: every record, or only those carrying one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(PokemonType),
}

impl TypeFilter {
    pub fn tag(self) -> &'static str {
        match self {
            TypeFilter::All => "all",
            TypeFilter::Only(t) => t.as_str(),
        }
    }

    /// Cycles `all -> normal -> ... -> fairy -> all`.
    pub fn next(self) -> Self {
        match self {
            TypeFilter::All => TypeFilter::Only(PokemonType::ALL[0]),
            TypeFilter::Only(t) => match PokemonType::ALL.get(t.position() + 1) {
                Some(next) => TypeFilter::Only(*next),
                None => TypeFilter::All,
            },
        }
    }

    pub fn previous(self) -> Self {
        match self {
            TypeFilter::All => TypeFilter::Only(PokemonType::ALL[PokemonType::ALL.len() - 1]),
            TypeFilter::Only(t) => match t.position() {
                0 => TypeFilter::All,
                i => TypeFilter::Only(PokemonType::ALL[i - 1]),
            },
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(TypeFilter::All);
        }
        s.parse().map(TypeFilter::Only)
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_bounds() {
        assert!(Generation::new(0).is_none());
        assert!(Generation::new(9).is_none());
        assert_eq!(Generation::new(8).map(Generation::get), Some(8));
        assert!("9".parse::<Generation>().is_err());
        assert!("three".parse::<Generation>().is_err());
        assert_eq!("3".parse::<Generation>(), Ok(Generation(3)));
    }

    #[test]
    fn generation_selector_wraps() {
        let first = Generation::default();
        assert_eq!(first.previous().get(), 8);
        assert_eq!(first.previous().next(), first);
        assert_eq!(Generation(4).next().get(), 5);
    }

    #[test]
    fn type_filter_parsing() {
        assert_eq!("all".parse::<TypeFilter>(), Ok(TypeFilter::All));
        assert_eq!("ALL".parse::<TypeFilter>(), Ok(TypeFilter::All));
        assert_eq!(
            "Flying".parse::<TypeFilter>(),
            Ok(TypeFilter::Only(PokemonType::Flying))
        );
        assert!("shadow".parse::<TypeFilter>().is_err());
        assert!("".parse::<TypeFilter>().is_err());
    }

    #[test]
    fn type_filter_cycle_visits_every_tag_once() {
        let mut filter = TypeFilter::All;
        let mut seen = Vec::new();
        loop {
            filter = filter.next();
            if filter == TypeFilter::All {
                break;
            }
            seen.push(filter.tag());
        }
        assert_eq!(seen.len(), 18);
        assert_eq!(seen.first(), Some(&"normal"));
        assert_eq!(seen.last(), Some(&"fairy"));

        assert_eq!(
            TypeFilter::All.previous(),
            TypeFilter::Only(PokemonType::Fairy)
        );
        assert_eq!(TypeFilter::Only(PokemonType::Normal).previous(), TypeFilter::All);
        assert_eq!(
            TypeFilter::Only(PokemonType::Fire).previous(),
            TypeFilter::Only(PokemonType::Normal)
        );
    }
}
