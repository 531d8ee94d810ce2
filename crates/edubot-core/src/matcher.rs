//! Lexical matcher.
//!
//! Classifies an inbound message as a greeting, a course query, an FAQ query
//! or nothing at all. Matching is plain substring and token overlap against
//! static keyword tables; there is no scoring beyond the ordering rules below.
//!
//! Classification is an ordered chain of [`Rule`]s. The first rule that fires
//! wins:
//! 1. greeting
//! 2. course matches (non-empty)
//! 3. FAQ matches (non-empty)
//!
//! Anything else is [`Classification::NoMatch`].

use edubot_types::{CatalogSnapshot, Course, Faq};

/// Greeting vocabulary. Any entry occurring anywhere in the lowercased text
/// makes the message a greeting.
pub const GREETINGS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "start",
    "salam",
    "assalam",
    "good morning",
    "good evening",
    "namaste",
    "adaab",
];

/// Course categories and the substrings that trigger them, in scan order.
pub const COURSE_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "python",
        &["python", "programming", "script", "py", "data science", "pandas", "numpy"],
    ),
    ("java", &["java", "spring", "jvm", "enterprise", "bootcamp"]),
    ("javascript", &["javascript", "js", "node", "web"]),
    (
        "react",
        &["react", "jsx", "component", "frontend", "web development"],
    ),
    (
        "data",
        &["data", "science", "analytics", "machine learning", "ml", "ai", "analysis"],
    ),
    ("web", &["web", "development", "html", "css", "frontend", "responsive"]),
    ("mobile", &["mobile", "app", "android", "ios", "react native"]),
];

/// Maximum number of FAQs returned for one query.
pub const MAX_FAQ_MATCHES: usize = 3;

/// Result of classifying one message against a catalog snapshot.
///
/// Matches borrow from the snapshot; nothing is cloned until formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification<'a> {
    /// The message contains a greeting token.
    Greeting,
    /// Matching courses, title matches first.
    CourseMatches(Vec<&'a Course>),
    /// Up to [`MAX_FAQ_MATCHES`] relevant FAQs in catalog order.
    FaqMatches(Vec<&'a Faq>),
    /// No rule fired; the caller should fall back to generation.
    NoMatch,
}

/// One classification rule: returns `Some` when it claims the message.
pub type Rule = for<'a> fn(&str, &'a CatalogSnapshot) -> Option<Classification<'a>>;

/// The rule chain in priority order.
pub const RULES: &[Rule] = &[greeting_rule, course_rule, faq_rule];

/// Classify `text` by running [`RULES`] in order.
pub fn classify<'a>(text: &str, snapshot: &'a CatalogSnapshot) -> Classification<'a> {
    RULES
        .iter()
        .find_map(|rule| rule(text, snapshot))
        .unwrap_or(Classification::NoMatch)
}

fn greeting_rule<'a>(text: &str, _snapshot: &'a CatalogSnapshot) -> Option<Classification<'a>> {
    is_greeting(text).then_some(Classification::Greeting)
}

fn course_rule<'a>(text: &str, snapshot: &'a CatalogSnapshot) -> Option<Classification<'a>> {
    let courses = search_courses(text, snapshot);
    (!courses.is_empty()).then_some(Classification::CourseMatches(courses))
}

fn faq_rule<'a>(text: &str, snapshot: &'a CatalogSnapshot) -> Option<Classification<'a>> {
    let faqs = search_faqs(text, snapshot);
    (!faqs.is_empty()).then_some(Classification::FaqMatches(faqs))
}

/// Case-insensitive substring test against [`GREETINGS`].
pub fn is_greeting(text: &str) -> bool {
    let lower = text.to_lowercase();
    GREETINGS.iter().any(|greeting| lower.contains(greeting))
}

/// Whitespace-separated words longer than two characters.
fn significant_words(query_lower: &str) -> Vec<&str> {
    query_lower
        .split_whitespace()
        .filter(|word| word.chars().count() > 2)
        .collect()
}

/// Find courses relevant to `query`.
///
/// Runs the keyword-category phase first. Only when it finds nothing does the
/// general token-overlap phase run.
pub fn search_courses<'a>(query: &str, snapshot: &'a CatalogSnapshot) -> Vec<&'a Course> {
    let lowered = query.to_lowercase();
    let query_lower = lowered.trim();

    let indexed: Vec<(&Course, String)> = snapshot
        .courses
        .iter()
        .map(|course| (course, course.search_text()))
        .collect();

    let matched = keyword_matches(query_lower, &indexed);
    if !matched.is_empty() {
        return title_matches_first(query_lower, matched);
    }

    general_matches(query_lower, &indexed)
}

/// Keyword-category phase: every trigger present in the query selects the
/// courses whose text also contains it. First-seen order, no duplicates.
fn keyword_matches<'a>(query_lower: &str, indexed: &[(&'a Course, String)]) -> Vec<&'a Course> {
    let mut matched: Vec<&Course> = Vec::new();

    for (_category, triggers) in COURSE_KEYWORDS {
        for trigger in triggers.iter().filter(|t| query_lower.contains(*t)) {
            for (course, text) in indexed {
                if text.contains(trigger) && !matched.iter().any(|m| m.id == course.id) {
                    matched.push(*course);
                }
            }
        }
    }

    matched
}

/// Stable two-bucket sort: courses whose title contains any raw query word
/// come first, the rest follow. Discovery order is kept inside each bucket.
fn title_matches_first<'a>(query_lower: &str, matched: Vec<&'a Course>) -> Vec<&'a Course> {
    let (mut by_title, rest): (Vec<&Course>, Vec<&Course>) =
        matched.into_iter().partition(|course| {
            let title = course.title.to_lowercase();
            query_lower.split_whitespace().any(|word| title.contains(word))
        });
    by_title.extend(rest);
    by_title
}

/// General phase: any course sharing at least one significant query word.
fn general_matches<'a>(query_lower: &str, indexed: &[(&'a Course, String)]) -> Vec<&'a Course> {
    let words = significant_words(query_lower);
    if words.is_empty() {
        return Vec::new();
    }

    indexed
        .iter()
        .filter(|(_, text)| words.iter().any(|word| text.contains(word)))
        .map(|(course, _)| *course)
        .collect()
}

/// Find up to [`MAX_FAQ_MATCHES`] FAQs whose question, answer or keywords
/// contain a significant query word.
pub fn search_faqs<'a>(query: &str, snapshot: &'a CatalogSnapshot) -> Vec<&'a Faq> {
    let query_lower = query.to_lowercase();
    let words = significant_words(&query_lower);
    if words.is_empty() {
        return Vec::new();
    }

    snapshot
        .faqs
        .iter()
        .filter(|faq| {
            let text = faq.search_text();
            words.iter().any(|word| text.contains(word))
        })
        .take(MAX_FAQ_MATCHES)
        .collect()
}
