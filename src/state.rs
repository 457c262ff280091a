use crate::models::Pokemon;
use crate::types::Generation;

/// Identifies the batch a fetch task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub generation: Generation,
    epoch: u64,
}

/// The records produced by one completed fetch cycle.
#[derive(Debug, Clone)]
pub struct Batch {
    pub generation: Generation,
    pub records: Vec<Pokemon>,
}

#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading(Ticket),
    Ready(Batch),
}

/// Owns the currently displayed batch.
///
/// Every `begin` supersedes the cycles started before it; their completions
/// are discarded so a slow batch cannot overwrite a newer one.
#[derive(Debug, Default)]
pub struct Pokedex {
    state: LoadState,
    epoch: u64,
}

impl Pokedex {
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading(_))
    }

    pub fn begin(&mut self, generation: Generation) -> Ticket {
        self.epoch += 1;
        let ticket = Ticket {
            generation,
            epoch: self.epoch,
        };
        self.state = LoadState::Loading(ticket);
        ticket
    }

    /// Moves to `Ready` if `ticket` is the latest cycle. Returns whether the
    /// records were accepted.
    pub fn complete(&mut self, ticket: Ticket, records: Vec<Pokemon>) -> bool {
        match self.state {
            LoadState::Loading(current) if current == ticket => {
                self.state = LoadState::Ready(Batch {
                    generation: ticket.generation,
                    records,
                });
                true
            }
            _ => {
                tracing::debug!(
                    generation = ticket.generation.get(),
                    epoch = ticket.epoch,
                    latest = self.epoch,
                    "discarding stale batch"
                );
                false
            }
        }
    }

    /// Records of the ready batch; empty while idle or loading.
    pub fn records(&self) -> &[Pokemon] {
        match &self.state {
            LoadState::Ready(batch) => &batch.records,
            _ => &[],
        }
    }

    pub fn generation(&self) -> Option<Generation> {
        match &self.state {
            LoadState::Idle => None,
            LoadState::Loading(ticket) => Some(ticket.generation),
            LoadState::Ready(batch) => Some(batch.generation),
        }
    }
}
