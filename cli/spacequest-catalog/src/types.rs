//! Catalog interaction types.

use std::str::FromStr;

use derive_more::Display;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::CatalogClientError;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// One named entity collection in the catalog.
///
/// Renders as the path segment of its list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    #[display("people")]
    People,
    #[display("starships")]
    Starships,
    #[display("planets")]
    Planets,
    #[display("species")]
    Species,
    #[display("vehicles")]
    Vehicles,
    #[display("films")]
    Films,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::People,
        Resource::Starships,
        Resource::Planets,
        Resource::Species,
        Resource::Vehicles,
        Resource::Films,
    ];

    pub fn path_segment(&self) -> &'static str {
        match self {
            Resource::People => "people",
            Resource::Starships => "starships",
            Resource::Planets => "planets",
            Resource::Species => "species",
            Resource::Vehicles => "vehicles",
            Resource::Films => "films",
        }
    }

    /// Human facing name of the collection.
    pub fn label(&self) -> &'static str {
        match self {
            Resource::People => "Characters",
            Resource::Starships => "Starships",
            Resource::Planets => "Planets",
            Resource::Species => "Species",
            Resource::Vehicles => "Vehicles",
            Resource::Films => "Films",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error(
    "unknown resource '{0}', expected one of: characters, people, starships, planets, species, vehicles, films"
)]
pub struct UnknownResource(pub String);

impl FromStr for Resource {
    type Err = UnknownResource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let resource = match normalized.as_str() {
            "people" | "characters" => Resource::People,
            "starships" => Resource::Starships,
            "planets" => Resource::Planets,
            "species" => Resource::Species,
            "vehicles" => Resource::Vehicles,
            "films" => Resource::Films,
            _ => return Err(UnknownResource(s.to_string())),
        };
        Ok(resource)
    }
}

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

/// Optional parameters passed along with a list request.
///
/// These are hints only: the catalog is free to ignore them and callers must
/// not rely on them for correctness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchHints {
    pub page: Option<u32>,
    pub search: Option<String>,
}

impl FetchHints {
    /// The search hint, trimmed, or `None` if it is blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// Canonical shape of one list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogResponse<T> {
    /// Total size of the collection as the catalog sees it.
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> CatalogResponse<T> {
    /// Whether this single response holds the entire collection.
    pub fn is_complete(&self) -> bool {
        self.next.is_none() && self.count <= self.results.len() as u64
    }
}

impl<T: DeserializeOwned> CatalogResponse<T> {
    /// Normalise a decoded response body.
    ///
    /// Accepts either an object carrying a `results` array or a bare array.
    pub fn from_json(body: Value) -> Result<Self, CatalogClientError> {
        match body {
            Value::Object(mut envelope) if envelope.contains_key("results") => {
                let results = match envelope.remove("results") {
                    Some(Value::Array(items)) => parse_items(items)?,
                    other => {
                        return Err(CatalogClientError::Shape(format!(
                            "'results' is {}, expected an array",
                            json_kind(&other.unwrap_or(Value::Null))
                        )));
                    },
                };
                let count = match envelope.get("count") {
                    Some(Value::Number(n)) => n.as_u64().ok_or_else(|| {
                        CatalogClientError::Shape(format!("'count' is not a valid size: {n}"))
                    })?,
                    None | Some(Value::Null) => results.len() as u64,
                    Some(other) => {
                        return Err(CatalogClientError::Shape(format!(
                            "'count' is {}, expected a number",
                            json_kind(other)
                        )));
                    },
                };
                Ok(CatalogResponse {
                    count,
                    next: cursor(envelope.get("next")),
                    previous: cursor(envelope.get("previous")),
                    results,
                })
            },
            Value::Array(items) => {
                let results = parse_items(items)?;
                Ok(CatalogResponse {
                    count: results.len() as u64,
                    next: None,
                    previous: None,
                    results,
                })
            },
            other => Err(CatalogClientError::Shape(format!(
                "got {}, expected an object with 'results' or an array",
                json_kind(&other)
            ))),
        }
    }
}

fn parse_items<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>, CatalogClientError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|err| {
                CatalogClientError::Shape(format!("item {index} could not be read: {err}"))
            })
        })
        .collect()
}

fn cursor(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|cursor| !cursor.is_empty())
        .map(ToString::to_string)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn resource_parses_path_segments_and_aliases() {
        for resource in Resource::ALL {
            assert_eq!(resource.path_segment().parse::<Resource>(), Ok(resource));
            assert_eq!(resource.to_string(), resource.path_segment());
        }
        assert_eq!(" Characters ".parse::<Resource>(), Ok(Resource::People));
        assert_eq!(
            "droids".parse::<Resource>(),
            Err(UnknownResource("droids".to_string()))
        );
    }

    #[test]
    fn envelope_is_taken_as_is() {
        let body = json!({
            "count": 82,
            "next": "https://swapi.dev/api/people/?page=2",
            "previous": null,
            "results": [{"name": "Luke Skywalker"}],
        });
        let response = CatalogResponse::<Value>::from_json(body).unwrap();
        assert_eq!(response.count, 82);
        assert_eq!(
            response.next.as_deref(),
            Some("https://swapi.dev/api/people/?page=2")
        );
        assert_eq!(response.previous, None);
        assert_eq!(response.results, vec![json!({"name": "Luke Skywalker"})]);
        assert!(!response.is_complete());
    }

    #[test]
    fn envelope_without_count_counts_results() {
        let body = json!({"results": [{"title": "A New Hope"}, {"title": "Return of the Jedi"}]});
        let response = CatalogResponse::<Value>::from_json(body).unwrap();
        assert_eq!(response.count, 2);
        assert!(response.is_complete());
    }

    #[test]
    fn bare_array_is_wrapped() {
        let body = json!([{"name": "Tatooine"}, {"name": "Alderaan"}, {"name": "Yavin IV"}]);
        let response = CatalogResponse::<Value>::from_json(body).unwrap();
        assert_eq!(response, CatalogResponse {
            count: 3,
            next: None,
            previous: None,
            results: vec![
                json!({"name": "Tatooine"}),
                json!({"name": "Alderaan"}),
                json!({"name": "Yavin IV"}),
            ],
        });
    }

    #[test]
    fn unrecognised_shapes_are_shape_errors() {
        for body in [
            json!({"detail": "Not found"}),
            json!("people"),
            json!(null),
            json!({"results": {"name": "Luke"}}),
            json!({"count": "many", "results": []}),
        ] {
            let err = CatalogResponse::<Value>::from_json(body.clone()).unwrap_err();
            assert!(
                matches!(err, CatalogClientError::Shape(_)),
                "{body} gave {err:?}"
            );
        }
    }

    #[test]
    fn items_that_do_not_match_the_record_type_are_shape_errors() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Named {
            name: String,
        }

        let err = CatalogResponse::<Named>::from_json(json!([{"name": "Luke"}, {"title": "x"}]))
            .unwrap_err();
        assert!(err.to_string().contains("item 1"), "{err}");
    }

    #[test]
    fn blank_search_hint_is_ignored() {
        let hints = FetchHints {
            page: Some(1),
            search: Some("   ".to_string()),
        };
        assert_eq!(hints.search_term(), None);

        let hints = FetchHints {
            page: None,
            search: Some(" luke ".to_string()),
        };
        assert_eq!(hints.search_term(), Some("luke"));
    }
}
