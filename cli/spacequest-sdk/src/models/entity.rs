//! Typed catalog records and the summaries shown for them.
//!
//! Every field defaults when absent or null so a sparse record still reads.
//! The catalog serves most numbers as strings and they are kept as such, but
//! a field that arrives as a bare number is read as its text. Fields without
//! a typed counterpart are kept in `extra`, so searching and `--json` see the
//! whole record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use spacequest_catalog::Resource;

use super::filter::Searchable;

/// Placeholder for blank values.
pub const MISSING: &str = "—";

/// `value`, trimmed, or [`MISSING`] if blank.
pub fn safe_text(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() { MISSING } else { trimmed }
}

/// Read a text field, accepting numbers and booleans as their text and
/// `null` as blank.
fn lenient_text<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Value::deserialize(d)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    };
    Ok(text)
}

/// Read an episode number given as a number or numeric text; anything else
/// reads as 0.
fn lenient_number<'de, D>(d: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Value::deserialize(d)? {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    Ok(number.unwrap_or_default())
}

/// What a list shows for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSummary {
    pub title: String,
    pub subtitle: String,
    pub badges: Vec<String>,
}

/// One labelled value of a detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSection {
    pub label: &'static str,
    pub value: String,
}

impl DetailSection {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// What the detail view shows for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDetail {
    pub title: String,
    pub description: String,
    pub sections: Vec<DetailSection>,
}

/// A record of one catalog resource.
pub trait Entity: Searchable + for<'de> Deserialize<'de> + Clone + Send + Sync + 'static {
    const RESOURCE: Resource;

    /// The name (or title) the record is known by.
    fn display_name(&self) -> &str;

    fn card(&self) -> CardSummary;

    fn detail(&self) -> EntityDetail;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub height: String,
    #[serde(deserialize_with = "lenient_text")]
    pub mass: String,
    #[serde(deserialize_with = "lenient_text")]
    pub hair_color: String,
    #[serde(deserialize_with = "lenient_text")]
    pub skin_color: String,
    #[serde(deserialize_with = "lenient_text")]
    pub eye_color: String,
    #[serde(deserialize_with = "lenient_text")]
    pub birth_year: String,
    #[serde(deserialize_with = "lenient_text")]
    pub gender: String,
    /// Fields without a typed counterpart, e.g. `url` or `films`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Searchable for Person {
    fn display_fields(&self) -> Vec<&str> {
        vec![&self.name]
    }
}

impl Entity for Person {
    const RESOURCE: Resource = Resource::People;

    fn display_name(&self) -> &str {
        &self.name
    }

    fn card(&self) -> CardSummary {
        CardSummary {
            title: safe_text(&self.name).to_string(),
            subtitle: format!("Birth Year: {}", safe_text(&self.birth_year)),
            badges: vec![
                safe_text(&self.gender).to_string(),
                format!("{}cm", safe_text(&self.height)),
                safe_text(&self.eye_color).to_string(),
            ],
        }
    }

    fn detail(&self) -> EntityDetail {
        EntityDetail {
            title: self.name.clone(),
            description: format!("Born {}", safe_text(&self.birth_year)),
            sections: vec![
                DetailSection::new("Height", format!("{} cm", safe_text(&self.height))),
                DetailSection::new("Mass", format!("{} kg", safe_text(&self.mass))),
                DetailSection::new("Hair Color", safe_text(&self.hair_color)),
                DetailSection::new("Skin Color", safe_text(&self.skin_color)),
                DetailSection::new("Eye Color", safe_text(&self.eye_color)),
                DetailSection::new("Birth Year", safe_text(&self.birth_year)),
                DetailSection::new("Gender", safe_text(&self.gender)),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Starship {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub model: String,
    #[serde(deserialize_with = "lenient_text")]
    pub starship_class: String,
    #[serde(deserialize_with = "lenient_text")]
    pub manufacturer: String,
    #[serde(deserialize_with = "lenient_text")]
    pub cost_in_credits: String,
    #[serde(deserialize_with = "lenient_text")]
    pub length: String,
    #[serde(deserialize_with = "lenient_text")]
    pub crew: String,
    #[serde(deserialize_with = "lenient_text")]
    pub passengers: String,
    #[serde(deserialize_with = "lenient_text")]
    pub max_atmosphering_speed: String,
    #[serde(deserialize_with = "lenient_text")]
    pub hyperdrive_rating: String,
    #[serde(rename = "MGLT", deserialize_with = "lenient_text")]
    pub mglt: String,
    #[serde(deserialize_with = "lenient_text")]
    pub cargo_capacity: String,
    #[serde(deserialize_with = "lenient_text")]
    pub consumables: String,
    /// Fields without a typed counterpart, e.g. `url` or `films`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Searchable for Starship {
    fn display_fields(&self) -> Vec<&str> {
        vec![&self.name]
    }
}

impl Entity for Starship {
    const RESOURCE: Resource = Resource::Starships;

    fn display_name(&self) -> &str {
        &self.name
    }

    fn card(&self) -> CardSummary {
        CardSummary {
            title: safe_text(&self.name).to_string(),
            subtitle: format!(
                "{} • {}",
                safe_text(&self.starship_class),
                safe_text(&self.model)
            ),
            badges: vec![
                format!("Crew: {}", safe_text(&self.crew)),
                format!("Passengers: {}", safe_text(&self.passengers)),
                format!("Hyper: {}", safe_text(&self.hyperdrive_rating)),
            ],
        }
    }

    fn detail(&self) -> EntityDetail {
        EntityDetail {
            title: self.name.clone(),
            description: format!(
                "{} • {}",
                safe_text(&self.starship_class),
                safe_text(&self.manufacturer)
            ),
            sections: vec![
                DetailSection::new("Model", safe_text(&self.model)),
                DetailSection::new("Class", safe_text(&self.starship_class)),
                DetailSection::new("Manufacturer", safe_text(&self.manufacturer)),
                DetailSection::new(
                    "Cost",
                    format!("{} credits", safe_text(&self.cost_in_credits)),
                ),
                DetailSection::new("Length", format!("{} m", safe_text(&self.length))),
                DetailSection::new("Crew", safe_text(&self.crew)),
                DetailSection::new("Passengers", safe_text(&self.passengers)),
                DetailSection::new("Max Speed", safe_text(&self.max_atmosphering_speed)),
                DetailSection::new("Hyperdrive Rating", safe_text(&self.hyperdrive_rating)),
                DetailSection::new("MGLT", safe_text(&self.mglt)),
                DetailSection::new("Cargo Capacity", safe_text(&self.cargo_capacity)),
                DetailSection::new("Consumables", safe_text(&self.consumables)),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Planet {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub climate: String,
    #[serde(deserialize_with = "lenient_text")]
    pub terrain: String,
    #[serde(deserialize_with = "lenient_text")]
    pub population: String,
    #[serde(deserialize_with = "lenient_text")]
    pub diameter: String,
    #[serde(deserialize_with = "lenient_text")]
    pub gravity: String,
    #[serde(deserialize_with = "lenient_text")]
    pub rotation_period: String,
    #[serde(deserialize_with = "lenient_text")]
    pub orbital_period: String,
    #[serde(deserialize_with = "lenient_text")]
    pub surface_water: String,
    /// Fields without a typed counterpart, e.g. `url` or `films`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Searchable for Planet {
    fn display_fields(&self) -> Vec<&str> {
        vec![&self.name]
    }
}

impl Entity for Planet {
    const RESOURCE: Resource = Resource::Planets;

    fn display_name(&self) -> &str {
        &self.name
    }

    fn card(&self) -> CardSummary {
        CardSummary {
            title: safe_text(&self.name).to_string(),
            subtitle: format!(
                "{} • {}",
                safe_text(&self.climate),
                safe_text(&self.terrain)
            ),
            badges: vec![
                format!("Pop: {}", safe_text(&self.population)),
                format!("Diameter: {}km", safe_text(&self.diameter)),
                format!("Gravity: {}", safe_text(&self.gravity)),
            ],
        }
    }

    fn detail(&self) -> EntityDetail {
        EntityDetail {
            title: self.name.clone(),
            description: format!(
                "{} • Population: {}",
                safe_text(&self.climate),
                safe_text(&self.population)
            ),
            sections: vec![
                DetailSection::new("Climate", safe_text(&self.climate)),
                DetailSection::new("Terrain", safe_text(&self.terrain)),
                DetailSection::new("Population", safe_text(&self.population)),
                DetailSection::new("Diameter", format!("{} km", safe_text(&self.diameter))),
                DetailSection::new("Gravity", safe_text(&self.gravity)),
                DetailSection::new(
                    "Rotation Period",
                    format!("{} hours", safe_text(&self.rotation_period)),
                ),
                DetailSection::new(
                    "Orbital Period",
                    format!("{} days", safe_text(&self.orbital_period)),
                ),
                DetailSection::new(
                    "Surface Water",
                    format!("{}%", safe_text(&self.surface_water)),
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Species {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub classification: String,
    #[serde(deserialize_with = "lenient_text")]
    pub designation: String,
    #[serde(deserialize_with = "lenient_text")]
    pub average_height: String,
    #[serde(deserialize_with = "lenient_text")]
    pub average_lifespan: String,
    #[serde(deserialize_with = "lenient_text")]
    pub language: String,
    #[serde(deserialize_with = "lenient_text")]
    pub skin_colors: String,
    #[serde(deserialize_with = "lenient_text")]
    pub hair_colors: String,
    #[serde(deserialize_with = "lenient_text")]
    pub eye_colors: String,
    /// Fields without a typed counterpart, e.g. `url` or `films`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Searchable for Species {
    fn display_fields(&self) -> Vec<&str> {
        vec![&self.name]
    }
}

impl Entity for Species {
    const RESOURCE: Resource = Resource::Species;

    fn display_name(&self) -> &str {
        &self.name
    }

    fn card(&self) -> CardSummary {
        CardSummary {
            title: safe_text(&self.name).to_string(),
            subtitle: format!(
                "{} • {}",
                safe_text(&self.classification),
                safe_text(&self.designation)
            ),
            badges: vec![
                format!("Lang: {}", safe_text(&self.language)),
                format!("Life: {}", safe_text(&self.average_lifespan)),
                format!("Height: {}cm", safe_text(&self.average_height)),
            ],
        }
    }

    fn detail(&self) -> EntityDetail {
        EntityDetail {
            title: self.name.clone(),
            description: format!(
                "{} • Language: {}",
                safe_text(&self.classification),
                safe_text(&self.language)
            ),
            sections: vec![
                DetailSection::new("Classification", safe_text(&self.classification)),
                DetailSection::new("Designation", safe_text(&self.designation)),
                DetailSection::new(
                    "Average Height",
                    format!("{} cm", safe_text(&self.average_height)),
                ),
                DetailSection::new("Average Lifespan", safe_text(&self.average_lifespan)),
                DetailSection::new("Language", safe_text(&self.language)),
                DetailSection::new("Skin Colors", safe_text(&self.skin_colors)),
                DetailSection::new("Hair Colors", safe_text(&self.hair_colors)),
                DetailSection::new("Eye Colors", safe_text(&self.eye_colors)),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vehicle {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub model: String,
    #[serde(deserialize_with = "lenient_text")]
    pub vehicle_class: String,
    #[serde(deserialize_with = "lenient_text")]
    pub manufacturer: String,
    #[serde(deserialize_with = "lenient_text")]
    pub cost_in_credits: String,
    #[serde(deserialize_with = "lenient_text")]
    pub length: String,
    #[serde(deserialize_with = "lenient_text")]
    pub crew: String,
    #[serde(deserialize_with = "lenient_text")]
    pub passengers: String,
    #[serde(deserialize_with = "lenient_text")]
    pub max_atmosphering_speed: String,
    #[serde(deserialize_with = "lenient_text")]
    pub cargo_capacity: String,
    #[serde(deserialize_with = "lenient_text")]
    pub consumables: String,
    /// Fields without a typed counterpart, e.g. `url` or `films`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Searchable for Vehicle {
    fn display_fields(&self) -> Vec<&str> {
        vec![&self.name]
    }
}

impl Entity for Vehicle {
    const RESOURCE: Resource = Resource::Vehicles;

    fn display_name(&self) -> &str {
        &self.name
    }

    fn card(&self) -> CardSummary {
        CardSummary {
            title: safe_text(&self.name).to_string(),
            subtitle: format!(
                "{} • {}",
                safe_text(&self.vehicle_class),
                safe_text(&self.model)
            ),
            badges: vec![
                format!("Crew: {}", safe_text(&self.crew)),
                format!("Passengers: {}", safe_text(&self.passengers)),
                format!("Speed: {}", safe_text(&self.max_atmosphering_speed)),
            ],
        }
    }

    fn detail(&self) -> EntityDetail {
        EntityDetail {
            title: self.name.clone(),
            description: format!(
                "{} • {}",
                safe_text(&self.vehicle_class),
                safe_text(&self.manufacturer)
            ),
            sections: vec![
                DetailSection::new("Model", safe_text(&self.model)),
                DetailSection::new("Class", safe_text(&self.vehicle_class)),
                DetailSection::new("Manufacturer", safe_text(&self.manufacturer)),
                DetailSection::new(
                    "Cost",
                    format!("{} credits", safe_text(&self.cost_in_credits)),
                ),
                DetailSection::new("Length", format!("{} m", safe_text(&self.length))),
                DetailSection::new("Crew", safe_text(&self.crew)),
                DetailSection::new("Passengers", safe_text(&self.passengers)),
                DetailSection::new("Max Speed", safe_text(&self.max_atmosphering_speed)),
                DetailSection::new("Cargo Capacity", safe_text(&self.cargo_capacity)),
                DetailSection::new("Consumables", safe_text(&self.consumables)),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Film {
    #[serde(deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(deserialize_with = "lenient_number")]
    pub episode_id: u32,
    #[serde(deserialize_with = "lenient_text")]
    pub director: String,
    #[serde(deserialize_with = "lenient_text")]
    pub producer: String,
    #[serde(deserialize_with = "lenient_text")]
    pub release_date: String,
    #[serde(deserialize_with = "lenient_text")]
    pub opening_crawl: String,
    /// Fields without a typed counterpart, e.g. `url` or `characters`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Searchable for Film {
    fn display_fields(&self) -> Vec<&str> {
        vec![&self.title]
    }
}

impl Entity for Film {
    const RESOURCE: Resource = Resource::Films;

    fn display_name(&self) -> &str {
        &self.title
    }

    fn card(&self) -> CardSummary {
        let lead_producer = self
            .producer
            .split(',')
            .next()
            .map(safe_text)
            .unwrap_or(MISSING);
        CardSummary {
            title: safe_text(&self.title).to_string(),
            subtitle: format!(
                "Episode {} • {}",
                self.episode_id,
                safe_text(&self.release_date)
            ),
            badges: vec![
                format!("Dir: {}", safe_text(&self.director)),
                format!("Prod: {lead_producer}"),
                format!("Ep {}", self.episode_id),
            ],
        }
    }

    fn detail(&self) -> EntityDetail {
        EntityDetail {
            title: self.title.clone(),
            description: format!(
                "Episode {} • {}",
                self.episode_id,
                safe_text(&self.release_date)
            ),
            sections: vec![
                DetailSection::new("Episode", self.episode_id.to_string()),
                DetailSection::new("Director", safe_text(&self.director)),
                DetailSection::new("Producer", safe_text(&self.producer)),
                DetailSection::new("Release Date", safe_text(&self.release_date)),
                DetailSection::new("Opening Crawl", safe_text(&self.opening_crawl)),
            ],
        }
    }
}
