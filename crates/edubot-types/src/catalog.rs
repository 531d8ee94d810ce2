/// Catalog data types: courses, FAQs and the immutable snapshot the resolver reads.
///
/// A snapshot is loaded in bulk and never mutated afterwards. Refreshing the
/// catalog means building a new snapshot and swapping it in wholesale.
use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::BotError;

/// A course offered on the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Unique course identifier.
    pub id: i64,
    /// Display title (e.g., "Python Programming Fundamentals").
    pub title: String,
    /// Free-text description, also searched by the matcher.
    pub description: String,
    /// Price in the platform currency, kept exact so it renders verbatim.
    pub price: Decimal,
    /// Course length in weeks.
    pub duration_weeks: u32,
    /// Instructor's display name.
    pub instructor: String,
}

impl Course {
    /// Lowercased `title + " " + description`, the text the matcher scans.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }
}

/// A frequently asked question with its canned answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    /// Unique FAQ identifier.
    pub id: i64,
    /// The question as shown to the user.
    pub question: String,
    /// The answer as shown to the user.
    pub answer: String,
    /// Comma-separated tags that widen matching beyond question and answer,
    /// kept exactly as stored (e.g., `"python, price, cost"`).
    #[serde(default)]
    pub keywords: String,
    /// Related course, if any. Lookup only.
    #[serde(default)]
    pub course_id: Option<i64>,
}

impl Faq {
    /// Lowercased `question + " " + answer + " " + keywords`, the text the matcher scans.
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.question, self.answer, self.keywords).to_lowercase()
    }
}

/// An immutable, point-in-time copy of the course and FAQ catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Courses in catalog order.
    #[serde(default)]
    pub courses: Vec<Course>,
    /// FAQs in catalog order.
    #[serde(default)]
    pub faqs: Vec<Faq>,
}

impl CatalogSnapshot {
    /// Create a snapshot from already-loaded collections.
    pub fn new(courses: Vec<Course>, faqs: Vec<Faq>) -> Self {
        Self { courses, faqs }
    }

    /// The fully-empty snapshot used before the first successful load.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when neither courses nor FAQs are loaded.
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty() && self.faqs.is_empty()
    }

    /// Look up a course by id (used to follow an FAQ's back-reference).
    pub fn course(&self, id: i64) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    /// Check that course and FAQ ids are unique.
    ///
    /// FAQ back-references to unknown courses are tolerated; they are lookup
    /// hints, not ownership links.
    pub fn validate(&self) -> Result<(), BotError> {
        let mut course_ids = HashSet::new();
        for course in &self.courses {
            if !course_ids.insert(course.id) {
                return Err(BotError::Catalog(format!(
                    "duplicate course id {} ('{}')",
                    course.id, course.title
                )));
            }
        }

        let mut faq_ids = HashSet::new();
        for faq in &self.faqs {
            if !faq_ids.insert(faq.id) {
                return Err(BotError::Catalog(format!("duplicate FAQ id {}", faq.id)));
            }
        }

        Ok(())
    }
}
