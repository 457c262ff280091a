use crate::models::Pokemon;
use crate::types::TypeFilter;

impl TypeFilter {
    pub fn matches(self, pokemon: &Pokemon) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(t) => pokemon.has_type(t.as_str()),
        }
    }
}

/// Order-preserving subset of `records` matching `filter`.
///
/// `TypeFilter::All` returns the input as is. Applying the same filter twice
/// gives the same result as applying it once.
pub fn filter_by_type(records: &[Pokemon], filter: TypeFilter) -> Vec<Pokemon> {
    records
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect()
}

/// Same predicate as [`filter_by_type`], as indices into `records`.
pub fn visible_indices(records: &[Pokemon], filter: TypeFilter) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter_map(|(i, p)| filter.matches(p).then_some(i))
        .collect()
}
