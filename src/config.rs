use crate::fetch::DEFAULT_API_BASE;
use crate::types::{Generation, TypeFilter};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Terminal Pokédex backed by PokeAPI.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Settings {
    /// Generation loaded on startup (1-8).
    #[arg(long, env = "POKEDEX_GENERATION", default_value = "1")]
    pub generation: Generation,

    /// Type filter applied on startup: `all` or a type such as `fire`.
    #[arg(long = "type", env = "POKEDEX_TYPE", default_value = "all")]
    pub type_filter: TypeFilter,

    /// Maximum number of detail requests in flight per generation.
    #[arg(long, env = "POKEDEX_CONCURRENCY", default_value_t = 16,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    #[arg(long, env = "POKEAPI_BASE_URL", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "POKEDEX_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Log destination while the terminal UI is running.
    #[arg(long, env = "POKEDEX_LOG", default_value = "pokedex.log")]
    pub log_file: PathBuf,

    /// Fetch once, print the filtered records as JSON and exit.
    #[arg(long)]
    pub json: bool,
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PokemonType;

    #[test]
    fn defaults() {
        let settings = Settings::try_parse_from(["pokedex"]).unwrap();
        assert_eq!(settings.generation.get(), 1);
        assert_eq!(settings.type_filter, TypeFilter::All);
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert_eq!(settings.timeout(), Duration::from_secs(10));
        assert!(!settings.json);
    }

    #[test]
    fn flags_override_defaults() {
        let settings = Settings::try_parse_from([
            "pokedex",
            "--generation",
            "4",
            "--type",
            "dragon",
            "--concurrency",
            "2",
            "--api-base",
            "http://127.0.0.1:9000",
            "--json",
        ])
        .unwrap();
        assert_eq!(settings.generation.get(), 4);
        assert_eq!(settings.type_filter, TypeFilter::Only(PokemonType::Dragon));
        assert_eq!(settings.concurrency, 2);
        assert_eq!(settings.api_base, "http://127.0.0.1:9000");
        assert!(settings.json);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Settings::try_parse_from(["pokedex", "--generation", "9"]).is_err());
        assert!(Settings::try_parse_from(["pokedex", "--type", "shadow"]).is_err());
        assert!(Settings::try_parse_from(["pokedex", "--concurrency", "0"]).is_err());
    }
}
