//! Reply renderers.
//!
//! Every function here is pure: snapshot data in, WhatsApp-flavoured
//! markdown out. Prices and durations are printed exactly as stored.

use std::fmt::Write;

use edubot_types::{CatalogSnapshot, Course, Faq};

/// Courses listed on the greeting card.
pub const GREETING_COURSE_LIMIT: usize = 5;

/// Welcome card listing the first few catalog courses.
pub fn format_greeting(snapshot: &CatalogSnapshot) -> String {
    let available = if snapshot.courses.is_empty() {
        "• Loading courses...".to_string()
    } else {
        snapshot
            .courses
            .iter()
            .take(GREETING_COURSE_LIMIT)
            .map(|course| format!("• {}", course.title))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "🎓 Welcome to our EdTech Learning Platform!\n\
         \n\
         📚 **Available Courses:**\n\
         {available}\n\
         \n\
         💡 **How can I help you today?**\n\
         Ask me about:\n\
         • Course details and curriculum\n\
         • Pricing and enrollment\n\
         • Prerequisites for any course\n\
         • Career guidance\n\
         \n\
         Just type your question, and I'll provide detailed information! 🚀"
    )
}

/// Render course matches for `query`.
///
/// One course gets a full detail card; several get a numbered summary list.
/// An empty slice renders the "not found" hint.
pub fn format_courses(courses: &[&Course], query: &str) -> String {
    match courses {
        [] => format!(
            "❌ No courses found for '{query}'. Try searching for: Python, Java, JavaScript, React, or Data Science."
        ),
        [course] => format_course_card(course),
        _ => format_course_list(courses, query),
    }
}

fn format_course_card(course: &Course) -> String {
    format!(
        "📚 **{title}**\n\
         💰 Price: ${price}\n\
         ⏱️ Duration: {weeks} weeks\n\
         👨‍🏫 Instructor: {instructor}\n\
         📝 {description}\n\
         \n\
         🎯 This looks like exactly what you're looking for!\n\
         💡 Ready to enroll? Just let me know!",
        title = course.title,
        price = course.price,
        weeks = course.duration_weeks,
        instructor = course.instructor,
        description = course.description,
    )
}

fn format_course_list(courses: &[&Course], query: &str) -> String {
    let mut out = format!(
        "🔍 Found {} courses related to '{query}':\n\n",
        courses.len()
    );
    for (i, course) in courses.iter().enumerate() {
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "{}. **{}** - ${} ({} weeks)\n   👨‍🏫 {}\n\n",
            i + 1,
            course.title,
            course.price,
            course.duration_weeks,
            course.instructor,
        );
    }
    out.push_str("💡 Would you like details about any specific course? Just ask!");
    out
}

/// Numbered question/answer list.
pub fn format_faqs(faqs: &[&Faq]) -> String {
    let mut out = String::from("❓ **Here's what I found:**\n\n");
    for (i, faq) in faqs.iter().enumerate() {
        let _ = write!(out, "{}. **{}**\n{}\n\n", i + 1, faq.question, faq.answer);
    }
    out.push_str("💡 Need more details? Feel free to ask!");
    out
}
