use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Color {
    pub name: String,
    pub code: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Category {
    pub name: String,
}

pub fn default_colors() -> Vec<Color> {
    [
        ("BEIGE", "#bfb32e"),
        ("PAARS", "#47818a"),
        ("ROOD", "#bfb32e"),
        ("BLAUW", "#47818a"),
        ("ORANJE", "#617363"),
        ("GROEN", "#6e751e"),
        ("GEEL", "#bfb32e"),
        ("TURKOOIS", "#47818a"),
    ]
    .into_iter()
    .map(|(name, code)| Color {
        name: name.to_string(),
        code: code.to_string(),
    })
    .collect()
}

pub fn default_categories() -> Vec<Category> {
    [
        "Kernwaarde",
        "Waarden",
        "Positieve Overtuigingen",
        "Kwaliteiten",
        "Vaardigheden",
        "Typisch Gedrag",
        "Angsten",
        "Beperkende Overtuigingen",
        "Strenge Leefregels",
        "Valkuilgedrag",
        "Allergieën",
        "Coping Gedrag",
        "Uitdaging",
    ]
    .into_iter()
    .map(|name| Category {
        name: name.to_string(),
    })
    .collect()
}
