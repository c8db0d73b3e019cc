use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::RangeInclusive;

use crate::error::AppError;

use super::MovieDetails;

/// Size contract a model response must satisfy
///
/// The lower bound of `Lenient` is never reached in practice: a list with no
/// films is rejected unless the model refused, so a successful response always
/// carries at least one recommendation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPolicy {
    /// Between zero and five recommendations
    Lenient,
    /// Between five and ten recommendations
    #[default]
    Strict,
}

impl RecommendationPolicy {
    /// Accepted number of recommendations, inclusive on both ends
    pub fn bounds(self) -> RangeInclusive<usize> {
        match self {
            RecommendationPolicy::Lenient => 0..=5,
            RecommendationPolicy::Strict => 5..=10,
        }
    }

    /// How many films the prompt asks for
    pub fn describe(self) -> String {
        let bounds = self.bounds();
        if *bounds.start() == 0 {
            format!("jusqu'à {} films", bounds.end())
        } else {
            format!("entre {} et {} films", bounds.start(), bounds.end())
        }
    }
}

/// One film suggested by the language model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationItem {
    pub title: String,
    pub year: String,
    pub reason: String,
}

/// Marker carried by a guard refusal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Refusal {
    pub error: bool,
    pub message: String,
}

/// An ordered recommendation list plus its overall theme and mood
///
/// A refusal flattens `error` and `message` into the same object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationSet<T> {
    pub recommendations: Vec<T>,
    pub theme: String,
    pub mood: String,
    #[serde(flatten)]
    pub refusal: Option<Refusal>,
}

impl<T> RecommendationSet<T> {
    pub fn is_refusal(&self) -> bool {
        self.refusal.is_some()
    }
}

/// Validated language model output
pub type RecommendationResponse = RecommendationSet<RecommendationItem>;

/// What the recommendation endpoint returns
pub type EnrichedRecommendations = RecommendationSet<EnrichedRecommendationItem>;

/// A recommendation joined with its movie database metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedRecommendationItem {
    #[serde(flatten)]
    pub item: RecommendationItem,
    /// `None` when no match was found or the lookup failed
    pub details: Option<MovieDetails>,
}

/// Inbound body of `POST /api/movies/recommendations`
///
/// Fields are kept loosely typed so that a missing or non-string city is
/// reported as a client error rather than a JSON rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub city: Option<Value>,
    #[serde(default, rename = "userContext")]
    pub user_context: Option<Value>,
}

impl RecommendationRequest {
    pub fn new(city: impl Into<String>, user_context: Option<&str>) -> Self {
        Self {
            city: Some(Value::String(city.into())),
            user_context: user_context.map(|c| Value::String(c.to_string())),
        }
    }
}

/// A request whose fields passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationQuery {
    pub city: String,
    pub user_context: Option<String>,
}

impl TryFrom<RecommendationRequest> for RecommendationQuery {
    type Error = AppError;

    fn try_from(request: RecommendationRequest) -> Result<Self, Self::Error> {
        let city = match request.city {
            Some(Value::String(city)) if !city.trim().is_empty() => city,
            _ => return Err(AppError::InvalidInput("A valid city is required".to_string())),
        };

        let user_context = match request.user_context {
            None | Some(Value::Null) => None,
            Some(Value::String(context)) => Some(context),
            Some(_) => {
                return Err(AppError::InvalidInput(
                    "userContext must be a string".to_string(),
                ))
            }
        };

        Ok(Self { city, user_context })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_policy_bounds() {
        assert_eq!(RecommendationPolicy::Lenient.bounds(), 0..=5);
        assert_eq!(RecommendationPolicy::Strict.bounds(), 5..=10);
        assert_eq!(RecommendationPolicy::default(), RecommendationPolicy::Strict);
    }

    #[test]
    fn test_policy_describe() {
        assert_eq!(RecommendationPolicy::Lenient.describe(), "jusqu'à 5 films");
        assert_eq!(RecommendationPolicy::Strict.describe(), "entre 5 et 10 films");
    }

    #[test]
    fn test_policy_deserializes_snake_case() {
        let policy: RecommendationPolicy = serde_json::from_str("\"lenient\"").unwrap();
        assert_eq!(policy, RecommendationPolicy::Lenient);
    }

    #[test]
    fn test_enriched_item_flattens_and_keeps_null_details() {
        let item = EnrichedRecommendationItem {
            item: RecommendationItem {
                title: "Amélie".to_string(),
                year: "2001".to_string(),
                reason: "Une douceur pour un soir de pluie".to_string(),
            },
            details: None,
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            json!({
                "title": "Amélie",
                "year": "2001",
                "reason": "Une douceur pour un soir de pluie",
                "details": null
            })
        );
    }

    #[test]
    fn test_refusal_flattens_error_and_message() {
        let set: EnrichedRecommendations = RecommendationSet {
            recommendations: vec![],
            theme: "t".to_string(),
            mood: "m".to_string(),
            refusal: Some(Refusal {
                error: true,
                message: "non".to_string(),
            }),
        };

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["error"], true);
        assert_eq!(json["message"], "non");

        let back: EnrichedRecommendations = serde_json::from_value(json).unwrap();
        assert!(back.is_refusal());
    }

    #[test]
    fn test_success_payload_has_no_error_field() {
        let set: RecommendationResponse = RecommendationSet {
            recommendations: vec![],
            theme: "t".to_string(),
            mood: "m".to_string(),
            refusal: None,
        };

        let json = serde_json::to_value(&set).unwrap();
        assert!(json.get("error").is_none());

        let back: RecommendationResponse = serde_json::from_value(json).unwrap();
        assert!(!back.is_refusal());
    }

    #[test]
    fn test_query_requires_non_blank_string_city() {
        let missing: RecommendationRequest = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            RecommendationQuery::try_from(missing),
            Err(AppError::InvalidInput(_))
        ));

        let blank = RecommendationRequest::new("   ", None);
        assert!(RecommendationQuery::try_from(blank).is_err());

        let number: RecommendationRequest =
            serde_json::from_value(json!({ "city": 75 })).unwrap();
        assert!(RecommendationQuery::try_from(number).is_err());
    }

    #[test]
    fn test_query_accepts_null_context_and_rejects_non_string_context() {
        let request: RecommendationRequest =
            serde_json::from_value(json!({ "city": "Paris", "userContext": null })).unwrap();
        let query = RecommendationQuery::try_from(request).unwrap();
        assert_eq!(query.city, "Paris");
        assert_eq!(query.user_context, None);

        let request: RecommendationRequest =
            serde_json::from_value(json!({ "city": "Paris", "userContext": ["x"] })).unwrap();
        assert!(RecommendationQuery::try_from(request).is_err());
    }
}
