pub mod enrichment;
pub mod generator;
pub mod guard;
pub mod providers;
pub mod recommendations;

pub use enrichment::MovieEnricher;
pub use generator::RecommendationGenerator;
pub use recommendations::RecommendationService;
