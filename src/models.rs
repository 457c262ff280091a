use serde::{Deserialize, Serialize};

/// One normalized Pokémon as shown in the list and detail pane.
///
/// Fields PokeAPI left out stay `None` instead of turning into a zero.
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    pub height: Option<u32>,
    pub weight: Option<u32>,
    pub abilities: Vec<String>,
    pub types: Vec<String>,
    pub stats: Vec<Stat>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Stat {
    pub name: String,
    pub base_stat: Option<u32>,
}

impl Pokemon {
    pub fn has_type(&self, tag: &str) -> bool {
        self.types.iter().any(|t| t == tag)
    }
}

/// Lightweight `{name, url}` reference returned by the generation endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct SpeciesRef {
    pub name: String,
    pub url: String,
}

impl SpeciesRef {
    /// Numeric id taken from the last non-empty path segment of `url`.
    ///
    /// `https://pokeapi.co/api/v2/pokemon-species/25/` -> `Some(25)`
    pub fn id(&self) -> Option<u32> {
        self.url
            .split('/')
            .filter(|segment| !segment.is_empty())
            .last()
            .and_then(|segment| segment.parse().ok())
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiGeneration {
    pub pokemon_species: Vec<SpeciesRef>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPokemon {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub weight: Option<u32>,
    #[serde(default)]
    pub abilities: Vec<ApiAbilitySlot>,
    #[serde(default)]
    pub types: Vec<ApiTypeSlot>,
    #[serde(default)]
    pub stats: Vec<ApiStat>,
    #[serde(default)]
    pub sprites: Option<ApiSprites>,
}

#[derive(Debug, Deserialize)]
pub struct NamedResource {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiAbilitySlot {
    pub ability: NamedResource,
}

#[derive(Debug, Deserialize)]
pub struct ApiTypeSlot {
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Deserialize)]
pub struct ApiStat {
    pub stat: NamedResource,
    #[serde(default)]
    pub base_stat: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ApiSprites {
    #[serde(default)]
    pub front_default: Option<String>,
}

impl From<ApiPokemon> for Pokemon {
    fn from(value: ApiPokemon) -> Self {
        Self {
            id: value.id,
            name: value.name,
            height: value.height,
            weight: value.weight,
            abilities: value
                .abilities
                .into_iter()
                .map(|slot| slot.ability.name)
                .collect(),
            types: value.types.into_iter().map(|slot| slot.kind.name).collect(),
            stats: value
                .stats
                .into_iter()
                .map(|stat| Stat {
                    name: stat.stat.name,
                    base_stat: stat.base_stat,
                })
                .collect(),
            image: value.sprites.and_then(|s| s.front_default),
        }
    }
}
