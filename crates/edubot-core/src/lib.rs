/// Message resolution pipeline for EduBot.
///
/// Turns one inbound text into exactly one reply:
/// - **Catalog**: Snapshot store plus MySQL and YAML sources
/// - **Matcher**: Lexical classification (greeting, course, FAQ, no match)
/// - **Format**: Pure renderers for every reply shape
/// - **Fallback**: Bounded call to a generative text service
/// - **Resolver**: Total composition of the above
/// - **LLM**: Groq and Ollama providers with a fallback router
pub mod catalog;
pub mod fallback;
pub mod format;
pub mod llm;
pub mod matcher;
pub mod resolver;

pub use catalog::{CatalogStore, FileCatalog, MySqlCatalog};
pub use fallback::FallbackResponder;
pub use matcher::{classify, Classification};
pub use resolver::MessageResolver;

#[cfg(test)]
pub(crate) mod test_support {
    use edubot_types::{CatalogSnapshot, Course};
    use rust_decimal::Decimal;

    const SEED_CATALOG: &str = include_str!("../../../config/catalog.yaml");

    pub fn course(
        id: i64,
        title: &str,
        description: &str,
        price_cents: i64,
        weeks: u32,
        instructor: &str,
    ) -> Course {
        Course {
            id,
            title: title.to_string(),
            description: description.to_string(),
            price: Decimal::new(price_cents, 2),
            duration_weeks: weeks,
            instructor: instructor.to_string(),
        }
    }

    /// The shipped seed catalog: five courses and eleven FAQs.
    pub fn sample_catalog() -> CatalogSnapshot {
        serde_yaml::from_str(SEED_CATALOG).expect("seed catalog parses")
    }
}
