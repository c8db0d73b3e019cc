pub mod movie;
pub mod recommendation;
pub mod weather;

pub use movie::{MovieDetails, TmdbMovie, TmdbSearchResponse};
pub use recommendation::{
    EnrichedRecommendationItem, EnrichedRecommendations, RecommendationItem,
    RecommendationPolicy, RecommendationQuery, RecommendationRequest, RecommendationResponse,
    RecommendationSet, Refusal,
};
pub use weather::{OpenWeatherResponse, WeatherSnapshot};
