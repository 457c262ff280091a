//! Formatting helpers shared by the list and detail pane.

/// Format a Pokémon `name` into a human-friendly form.
///
/// Examples: `mr-mime` -> `Mr Mime`, `ho_oh` -> `Ho Oh`.
pub fn format_name(name: &str) -> String {
    let replaced = name.replace(['-', '_'], " ");
    let parts: Vec<String> = replaced
        .split_whitespace()
        .map(|w| {
            let mut chs = w.chars();
            match chs.next() {
                None => String::new(),
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chs.as_str().to_lowercase()
                }
            }
        })
        .collect();
    parts.join(" ")
}

/// Short label for a base stat.
pub fn stat_label(name: &str) -> String {
    match name {
        "hp" => "HP".to_string(),
        "attack" => "ATK".to_string(),
        "defense" => "DEF".to_string(),
        "special-attack" => "SpA".to_string(),
        "special-defense" => "SpD".to_string(),
        "speed" => "SPD".to_string(),
        other => format_name(other),
    }
}

/// Height in decimetres and weight in hectograms, as PokeAPI reports them.
pub fn format_measurements(height: Option<u32>, weight: Option<u32>) -> String {
    format!(
        "Height: {}  Weight: {}",
        tenths(height, "m"),
        tenths(weight, "kg")
    )
}

fn tenths(value: Option<u32>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1} {}", v as f32 / 10.0, unit),
        None => "?".to_string(),
    }
}
