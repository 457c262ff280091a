use crate::error::FetchError;
use crate::models::{ApiGeneration, ApiPokemon, Pokemon, SpeciesRef};
use crate::types::Generation;
use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";

/// Settled/expected detail requests of the batch in flight.
#[derive(Debug, Default)]
pub struct FetchProgress {
    fetched: AtomicUsize,
    total: AtomicUsize,
}

impl FetchProgress {
    fn reset(&self, total: usize) {
        self.fetched.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    fn settle(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    /// `(fetched, total)`
    pub fn snapshot(&self) -> (usize, usize) {
        (
            self.fetched.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }

    pub fn ratio(&self) -> f64 {
        match self.snapshot() {
            (_, 0) => 0.0,
            (fetched, total) => (fetched as f64 / total as f64).clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PokeApi {
    client: reqwest::Client,
    base_url: String,
    concurrency: usize,
}

impl PokeApi {
    pub fn new(
        base_url: impl Into<String>,
        concurrency: usize,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            concurrency: concurrency.max(1),
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let res = self.client.get(url).send().await?.error_for_status()?;
        Ok(res.json::<T>().await?)
    }

    pub async fn fetch_species(
        &self,
        generation: Generation,
    ) -> Result<Vec<SpeciesRef>, FetchError> {
        let url = format!("{}/generation/{}/", self.base_url, generation);
        let list: ApiGeneration = self.get_json(&url).await?;
        Ok(list.pokemon_species)
    }

    pub async fn fetch_detail(&self, id: u32) -> Result<Pokemon, FetchError> {
        let url = format!("{}/pokemon/{}", self.base_url, id);
        let api: ApiPokemon = self.get_json(&url).await?;
        if api.id != id {
            return Err(FetchError::IdMismatch {
                requested: id,
                received: api.id,
            });
        }
        Ok(Pokemon::from(api))
    }

    async fn fetch_entry(&self, species: &SpeciesRef) -> Result<Pokemon, FetchError> {
        let id = species
            .id()
            .ok_or_else(|| FetchError::MalformedSpeciesUrl(species.url.clone()))?;
        self.fetch_detail(id).await
    }

    /// Species list for `generation`, enriched with one detail request per
    /// species and sorted by id.
    ///
    /// Only a failing list request fails the call. A failing detail request
    /// drops that entry and is logged with its id.
    pub async fn fetch_generation(
        &self,
        generation: Generation,
        progress: Option<&FetchProgress>,
    ) -> Result<Vec<Pokemon>, FetchError> {
        let species = self.fetch_species(generation).await?;
        tracing::debug!(
            generation = generation.get(),
            species = species.len(),
            concurrency = self.concurrency,
            "fetching details"
        );
        if let Some(p) = progress {
            p.reset(species.len());
        }

        let mut pokemons: Vec<Pokemon> = stream::iter(species)
            .map(|s| async move {
                let res = self.fetch_entry(&s).await;
                if let Some(p) = progress {
                    p.settle();
                }
                match res {
                    Ok(pokemon) => Some(pokemon),
                    Err(e) => {
                        tracing::warn!(
                            species = %s.name,
                            id = ?s.id(),
                            error = %e,
                            "failed to fetch pokemon details"
                        );
                        None
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|p| async move { p })
            .collect()
            .await;

        pokemons.sort_by_key(|p| p.id);
        pokemons.dedup_by_key(|p| p.id);
        Ok(pokemons)
    }
}

/// Runs one batch. A failed species list is logged and yields no records.
pub async fn load_generation(
    api: &PokeApi,
    generation: Generation,
    progress: Option<&FetchProgress>,
) -> Vec<Pokemon> {
    match api.fetch_generation(generation, progress).await {
        Ok(pokemons) => {
            tracing::info!(
                generation = generation.get(),
                count = pokemons.len(),
                "generation loaded"
            );
            pokemons
        }
        Err(e) => {
            tracing::error!(generation = generation.get(), error = %e, "failed to fetch pokemon list");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    #[derive(Clone, Default)]
    struct MockApi {
        species: Vec<u32>,
        extra_species: Vec<Value>,
        failing: Vec<u32>,
        mismatched: Vec<u32>,
        list_status: Option<StatusCode>,
        list_body: Option<Value>,
        delay_ms: u64,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    fn detail(id: u32) -> Value {
        let types = if id % 2 == 0 {
            json!([{ "slot": 1, "type": { "name": "water" } }])
        } else {
            json!([
                { "slot": 1, "type": { "name": "grass" } },
                { "slot": 2, "type": { "name": "poison" } }
            ])
        };
        json!({
            "id": id,
            "name": format!("mon-{id}"),
            "height": id * 2,
            "weight": id * 10,
            "abilities": [{ "ability": { "name": "overgrow" }, "is_hidden": false, "slot": 1 }],
            "types": types,
            "stats": [{ "base_stat": 45, "effort": 0, "stat": { "name": "hp" } }],
            "sprites": { "front_default": format!("https://img.test/{id}.png") }
        })
    }

    async fn generation_handler(
        State(api): State<MockApi>,
        Path(generation): Path<u8>,
    ) -> Response {
        if let Some(status) = api.list_status {
            return status.into_response();
        }
        if let Some(body) = api.list_body {
            return Json(body).into_response();
        }
        let mut species: Vec<Value> = api
            .species
            .iter()
            .map(|id| {
                json!({
                    "name": format!("mon-{id}"),
                    "url": format!("https://pokeapi.co/api/v2/pokemon-species/{id}/"),
                })
            })
            .collect();
        species.extend(api.extra_species.iter().cloned());
        Json(json!({ "id": generation, "pokemon_species": species })).into_response()
    }

    async fn pokemon_handler(State(api): State<MockApi>, Path(id): Path<u32>) -> Response {
        let now = api.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        api.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(api.delay_ms)).await;
        api.in_flight.fetch_sub(1, Ordering::SeqCst);

        if api.failing.contains(&id) {
            return StatusCode::NOT_FOUND.into_response();
        }
        if api.mismatched.contains(&id) {
            return Json(detail(id + 1000)).into_response();
        }
        Json(detail(id)).into_response()
    }

    async fn spawn_api(api: MockApi) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let app = Router::new()
            .route("/generation/:generation/", get(generation_handler))
            .route("/pokemon/:id", get(pokemon_handler))
            .with_state(api);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}/")
    }

    fn client(base: String, concurrency: usize) -> PokeApi {
        PokeApi::new(base, concurrency, Duration::from_secs(5)).expect("client")
    }

    fn ids(pokemons: &[Pokemon]) -> Vec<u32> {
        pokemons.iter().map(|p| p.id).collect()
    }

    fn nth(n: u8) -> Generation {
        Generation::new(n).expect("valid generation")
    }

    #[tokio::test]
    async fn results_are_sorted_and_unique() {
        let base = spawn_api(MockApi {
            species: vec![7, 1, 152, 4, 1],
            ..Default::default()
        })
        .await;
        let api = client(base, 4);

        for n in Generation::MIN..=Generation::MAX {
            let pokemons = api.fetch_generation(nth(n), None).await.unwrap();
            assert_eq!(ids(&pokemons), vec![1, 4, 7, 152]);
        }
    }

    #[tokio::test]
    async fn failed_detail_is_dropped() {
        let base = spawn_api(MockApi {
            species: vec![1, 4, 7],
            failing: vec![4],
            ..Default::default()
        })
        .await;
        let api = client(base, 8);

        let pokemons = api.fetch_generation(nth(1), None).await.unwrap();
        assert_eq!(ids(&pokemons), vec![1, 7]);

        let bulbasaur = &pokemons[0];
        assert_eq!(bulbasaur.name, "mon-1");
        assert_eq!(bulbasaur.types, vec!["grass", "poison"]);
        assert_eq!(bulbasaur.image.as_deref(), Some("https://img.test/1.png"));
    }

    #[tokio::test]
    async fn failed_list_fails_batch() {
        let base = spawn_api(MockApi {
            species: vec![1, 2, 3],
            list_status: Some(StatusCode::SERVICE_UNAVAILABLE),
            ..Default::default()
        })
        .await;
        let api = client(base, 4);

        let res = api.fetch_generation(nth(2), None).await;
        assert!(matches!(res, Err(FetchError::Request(_))));
        assert!(load_generation(&api, nth(2), None).await.is_empty());
    }

    #[tokio::test]
    async fn list_without_species_fails_batch() {
        let base = spawn_api(MockApi {
            species: vec![1, 2, 3],
            list_body: Some(json!({ "id": 1, "name": "generation-i" })),
            ..Default::default()
        })
        .await;
        let api = client(base, 4);

        let res = api.fetch_generation(nth(1), None).await;
        assert!(matches!(res, Err(FetchError::Request(_))));
        assert!(load_generation(&api, nth(1), None).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_api_yields_empty_batch() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(format!("http://{addr}"), 4);
        assert!(load_generation(&api, nth(1), None).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_and_mismatched_entries_are_dropped() {
        let base = spawn_api(MockApi {
            species: vec![3, 2, 1],
            mismatched: vec![2],
            extra_species: vec![json!({
                "name": "missingno",
                "url": "https://pokeapi.co/api/v2/pokemon-species/missingno/"
            })],
            ..Default::default()
        })
        .await;
        let api = client(base, 2);

        let pokemons = api.fetch_generation(nth(1), None).await.unwrap();
        assert_eq!(ids(&pokemons), vec![1, 3]);
        assert!(matches!(
            api.fetch_detail(2).await,
            Err(FetchError::IdMismatch {
                requested: 2,
                received: 1002
            })
        ));
    }

    #[tokio::test]
    async fn fan_out_respects_concurrency_limit() {
        let mock = MockApi {
            species: (1..=20).collect(),
            delay_ms: 25,
            ..Default::default()
        };
        let peak = mock.peak.clone();
        let base = spawn_api(mock).await;
        let api = client(base, 3);
        let progress = FetchProgress::default();

        let pokemons = api.fetch_generation(nth(1), Some(&progress)).await.unwrap();

        assert_eq!(pokemons.len(), 20);
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency was {peak}");
        assert!(peak >= 2, "details were fetched one at a time");
        assert_eq!(progress.snapshot(), (20, 20));
        assert_eq!(progress.ratio(), 1.0);
    }

    #[tokio::test]
    async fn details_are_fetched_concurrently() {
        let mock = MockApi {
            species: (1..=10).collect(),
            delay_ms: 100,
            ..Default::default()
        };
        let peak = mock.peak.clone();
        let base = spawn_api(mock).await;
        let api = client(base, 64);

        let pokemons = api.fetch_generation(nth(1), None).await.unwrap();

        assert_eq!(pokemons.len(), 10);
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak > 1, "peak concurrency was {peak}");
        assert!(peak <= 10);
    }

    #[test]
    fn empty_progress_ratio_is_zero() {
        let progress = FetchProgress::default();
        assert_eq!(progress.ratio(), 0.0);
        progress.reset(4);
        progress.settle();
        assert_eq!(progress.snapshot(), (1, 4));
        assert_eq!(progress.ratio(), 0.25);
    }
}
