use serde::{Deserialize, Serialize};

/// Display-ready movie metadata attached to a recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    pub overview: String,
    /// Empty when the provider has no poster
    pub poster_url: String,
    pub release_year: String,
    pub rating: f64,
}

impl MovieDetails {
    /// Formats a raw TMDB record, resolving the poster against `image_base_url`
    pub fn from_tmdb(movie: TmdbMovie, image_base_url: &str) -> Self {
        let poster_url = match movie.poster_path.as_deref() {
            Some(path) if !path.is_empty() => format!("{}{}", image_base_url, path),
            _ => String::new(),
        };

        let release_year = movie
            .release_date
            .as_deref()
            .and_then(|date| date.split('-').next())
            .unwrap_or_default()
            .to_string();

        MovieDetails {
            id: movie.id,
            title: movie.title,
            overview: movie.overview.unwrap_or_default(),
            poster_url,
            release_year,
            rating: movie.vote_average.unwrap_or_default(),
        }
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw response from TMDB `GET /search/movie`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
}

/// One raw movie record from TMDB search
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TmdbMovie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

    fn amelie() -> TmdbMovie {
        TmdbMovie {
            id: 194,
            title: "Amélie".to_string(),
            overview: Some("At a tiny Parisian café...".to_string()),
            poster_path: Some("/nSxDa3M9aMvGVLoItzWTepQ5h5d.jpg".to_string()),
            release_date: Some("2001-04-25".to_string()),
            vote_average: Some(7.9),
        }
    }

    #[test]
    fn test_from_tmdb_builds_poster_url_and_year() {
        let details = MovieDetails::from_tmdb(amelie(), IMAGE_BASE);

        assert_eq!(details.id, 194);
        assert_eq!(
            details.poster_url,
            "https://image.tmdb.org/t/p/w500/nSxDa3M9aMvGVLoItzWTepQ5h5d.jpg"
        );
        assert_eq!(details.release_year, "2001");
        assert_eq!(details.rating, 7.9);
    }

    #[test]
    fn test_from_tmdb_without_poster_or_date() {
        let movie = TmdbMovie {
            poster_path: None,
            release_date: Some(String::new()),
            ..amelie()
        };

        let details = MovieDetails::from_tmdb(movie, IMAGE_BASE);
        assert_eq!(details.poster_url, "");
        assert_eq!(details.release_year, "");
    }

    #[test]
    fn test_tmdb_search_deserialization_with_nulls() {
        let json = r#"{
            "page": 1,
            "results": [{
                "id": 27205,
                "title": "Inception",
                "overview": "Cobb, a skilled thief...",
                "poster_path": null,
                "release_date": "2010-07-15",
                "vote_average": 8.4
            }],
            "total_results": 1
        }"#;

        let response: TmdbSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].poster_path, None);
    }

    #[test]
    fn test_movie_details_serializes_camel_case() {
        let details = MovieDetails::from_tmdb(amelie(), IMAGE_BASE);
        let json = serde_json::to_value(&details).unwrap();

        assert_eq!(json["releaseYear"], "2001");
        assert!(json["posterUrl"].as_str().unwrap().starts_with(IMAGE_BASE));
    }
}
