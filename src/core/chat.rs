//! Chatbot business logic - Course recommendations in reply to free-text questions.
//!
//! A message is classified into an [`Intent`] with keyword patterns. Course-related
//! intents are turned into a [`CourseFilter`] and matched against the catalogue; the
//! matches and the question are then handed to the language model. Replies are cached
//! per intent and normalized message. The cache is best-effort: failures are logged and
//! the request continues without it.

use crate::{
    core::course::{self, CourseFilter, CourseLevel, CourseSort},
    entities::course as course_entity,
    errors::{Error, Result},
    services::{CacheHandle, LlmHandle},
};
use regex::Regex;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::{fmt::Write as _, sync::LazyLock, time::Duration};
use tracing::{debug, info, instrument, warn};

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 1000;
/// Most courses suggested in one reply.
pub const MAX_SUGGESTIONS: u64 = 5;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| {
            #[allow(clippy::unwrap_used)]
            Regex::new($re).unwrap()
        });
    };
}

pattern!(
    GREETING,
    r"^(hi|hello|hey|hiya|howdy|greetings|good (morning|afternoon|evening))\b"
);
pattern!(
    COURSE_SEARCH,
    r"\b(courses?|learn\w*|teach\w*|recommend\w*|suggest\w*|tutorials?|class(es)?|study|lessons?|bootcamp)\b"
);
pattern!(
    PRICING,
    r"\b(prices?|pricing|costs?|cheap\w*|free|discounts?|coupons?|afford\w*|how much)\b|\$\d"
);
pattern!(
    ENROLLMENT,
    r"\b(enroll\w*|enrol\w*|progress|certificates?|my courses|sign ?up)\b"
);
pattern!(LEVEL, r"\b(beginner|intermediate|advanced)\b");
pattern!(FREE, r"\bfree\b");
pattern!(
    PRICE_CAP,
    r"\b(?:under|below|less than|cheaper than|max(?:imum)?|up to)\s*\$?\s*(\d+(?:\.\d+)?)"
);
pattern!(WORD, r"[a-z0-9+#]+");

const STOPWORDS: &[&str] = &[
    "about", "advanced", "afford", "affordable", "all", "and", "any", "are", "beginner",
    "below", "best", "can", "cheap", "cheaper", "cheapest", "class", "classes", "cost",
    "costs", "could", "course", "courses", "does", "find", "for", "free", "from", "get",
    "good", "have", "hello", "help", "hey", "how", "intermediate", "is", "learn",
    "learning", "less", "like", "looking", "max", "maximum", "me", "much", "need", "price",
    "prices", "pricing", "recommend", "recommendation", "recommendations", "show", "some",
    "something", "study", "suggest", "than", "that", "the", "there", "this", "tutorial",
    "tutorials", "under", "want", "what", "which", "with", "would", "you", "your",
];

/// What the user is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Hello and small talk
    Greeting,
    /// Looking for a course on a topic
    CourseSearch,
    /// Asking about prices or discounts
    Pricing,
    /// Asking how to enroll or access lessons
    Enrollment,
    /// Anything else
    General,
}

impl Intent {
    /// Name used in cache keys and responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::CourseSearch => "course_search",
            Self::Pricing => "pricing",
            Self::Enrollment => "enrollment",
            Self::General => "general",
        }
    }

    /// Whether answering needs a catalogue lookup.
    #[must_use]
    pub const fn searches_courses(self) -> bool {
        matches!(self, Self::CourseSearch | Self::Pricing)
    }
}

/// Lower-cases a message and collapses runs of whitespace.
#[must_use]
pub fn normalize_message(message: &str) -> String {
    message
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classifies a normalized message.
///
/// Enrollment questions win over pricing, pricing over course search; a greeting only
/// counts when nothing more specific was asked.
#[must_use]
pub fn classify(normalized: &str) -> Intent {
    if ENROLLMENT.is_match(normalized) {
        Intent::Enrollment
    } else if PRICING.is_match(normalized) {
        Intent::Pricing
    } else if COURSE_SEARCH.is_match(normalized) {
        Intent::CourseSearch
    } else if GREETING.is_match(normalized) {
        Intent::Greeting
    } else {
        Intent::General
    }
}

/// Cache key for a reply.
#[must_use]
pub fn cache_key(intent: Intent, normalized: &str) -> String {
    format!("chat:{}:{normalized}", intent.as_str())
}

/// Builds a catalogue filter from a normalized message.
///
/// `categories` are the known catalogue categories; the longest one found in the message
/// is used. Words that are not filters or stopwords become keywords.
#[must_use]
pub fn extract_filter(normalized: &str, categories: &[String]) -> CourseFilter {
    let level = LEVEL
        .captures(normalized)
        .and_then(|c| c.get(1))
        .and_then(|m| CourseLevel::parse(m.as_str()));
    let free_only = FREE.is_match(normalized);
    let max_price = PRICE_CAP
        .captures(normalized)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());
    let category = categories
        .iter()
        .filter(|c| !c.is_empty() && contains_phrase(normalized, &c.to_lowercase()))
        .max_by_key(|c| c.len())
        .cloned();

    let category_words: Vec<String> = category
        .as_deref()
        .map(|c| WORD.find_iter(&c.to_lowercase()).map(|m| m.as_str().to_string()).collect())
        .unwrap_or_default();
    let mut keywords: Vec<String> = Vec::new();
    for word in WORD.find_iter(normalized).map(|m| m.as_str()) {
        if word.len() < 2
            || word.chars().all(|c| c.is_ascii_digit())
            || STOPWORDS.contains(&word)
            || category_words.iter().any(|w| w == word)
            || keywords.iter().any(|k| k == word)
        {
            continue;
        }
        keywords.push(word.to_string());
    }

    CourseFilter {
        category,
        level,
        keywords,
        max_price,
        free_only,
        sort: CourseSort::Rating,
    }
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// A course mentioned in a chat reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSuggestion {
    /// Course id.
    pub id: i64,
    /// Course title.
    pub title: String,
    /// Course category.
    pub category: String,
    /// Course level.
    pub level: String,
    /// Price in dollars.
    pub price: f64,
    /// Average rating.
    pub rating: f64,
}

impl From<course_entity::Model> for CourseSuggestion {
    fn from(course: course_entity::Model) -> Self {
        Self {
            id: course.id,
            title: course.title,
            category: course.category,
            level: course.level,
            price: course.price,
            rating: course.rating,
        }
    }
}

/// Reply returned to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Text shown to the user.
    pub reply: String,
    /// Detected intent.
    pub intent: Intent,
    /// Courses matching the message.
    pub courses: Vec<CourseSuggestion>,
    /// Whether the reply was served from the cache
    #[serde(default)]
    pub cached: bool,
}

/// Finds courses for a filter. When keywords match nothing, the search is repeated with
/// the structured filters alone.
async fn suggest_courses(
    db: &DatabaseConnection,
    filter: CourseFilter,
) -> Result<Vec<CourseSuggestion>> {
    let mut found = course::list_published_courses(db, &filter, Some(MAX_SUGGESTIONS)).await?;
    if found.is_empty() && !filter.keywords.is_empty() {
        debug!("No keyword matches; retrying without keywords");
        let relaxed = CourseFilter {
            keywords: Vec::new(),
            ..filter
        };
        found = course::list_published_courses(db, &relaxed, Some(MAX_SUGGESTIONS)).await?;
    }
    Ok(found.into_iter().map(CourseSuggestion::from).collect())
}

fn format_price(price: f64) -> String {
    if price <= 0.0 {
        "free".to_string()
    } else {
        format!("${price:.2}")
    }
}

fn course_lines(courses: &[CourseSuggestion]) -> String {
    let mut lines = String::new();
    for c in courses {
        let _ = writeln!(
            lines,
            "- {} ({}, {}, {}, rated {:.1})",
            c.title,
            c.category,
            c.level,
            format_price(c.price),
            c.rating
        );
    }
    lines
}

/// Prompt sent to the language model.
#[must_use]
pub fn build_prompt(intent: Intent, message: &str, courses: &[CourseSuggestion]) -> String {
    let catalogue = if courses.is_empty() {
        "No matching courses were found in the catalogue.\n".to_string()
    } else {
        course_lines(courses)
    };
    format!(
        "You are the BrainiX learning assistant for an online course marketplace.\n\
         Answer in a friendly tone in at most four sentences. Only recommend courses from \
         the list below and never invent courses, prices or discounts.\n\n\
         Detected intent: {}\n\
         Matching courses:\n{catalogue}\n\
         Student message: {message}\n",
        intent.as_str()
    )
}

/// Reply used when the language model is unavailable.
#[must_use]
pub fn fallback_reply(intent: Intent, courses: &[CourseSuggestion]) -> String {
    let base = match intent {
        Intent::Greeting => {
            "Hi! I'm the BrainiX assistant. Ask me about courses, prices or your learning progress."
        }
        Intent::Enrollment => {
            "You can see every course you're enrolled in, along with your progress, on your learning dashboard. Purchased courses are added automatically after checkout."
        }
        Intent::Pricing if courses.is_empty() => {
            "I couldn't find courses in that price range. Try a higher budget or browse the catalogue."
        }
        Intent::CourseSearch if courses.is_empty() => {
            "I couldn't find a matching course. Try different keywords or browse the catalogue."
        }
        Intent::Pricing | Intent::CourseSearch => "Here are some courses you might like:",
        Intent::General => {
            "I can help you find courses, compare prices and check your enrollments. What would you like to learn?"
        }
    };
    if intent.searches_courses() && !courses.is_empty() {
        format!("{base}\n{}", course_lines(courses).trim_end())
    } else {
        base.to_string()
    }
}

/// Answers a chat message.
///
/// # Errors
/// Returns `Error::Validation` for an empty or oversized message, or a database error
/// from the course lookup. Cache and language model failures do not fail the request.
#[instrument(skip(db, cache, llm, message))]
pub async fn respond(
    db: &DatabaseConnection,
    cache: &CacheHandle,
    llm: &LlmHandle,
    ttl: Duration,
    message: &str,
) -> Result<ChatReply> {
    let message = message.trim();
    if message.is_empty() {
        return Err(Error::validation("Message cannot be empty"));
    }
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(Error::validation(format!(
            "Message cannot exceed {MAX_MESSAGE_LENGTH} characters"
        )));
    }

    let normalized = normalize_message(message);
    let intent = classify(&normalized);
    let key = cache_key(intent, &normalized);

    match cache.get(&key).await {
        Ok(Some(raw)) => match serde_json::from_str::<ChatReply>(&raw) {
            Ok(mut hit) => {
                debug!("Chat cache hit for {key}");
                hit.cached = true;
                return Ok(hit);
            }
            Err(e) => warn!("Ignoring unreadable cache entry {key}: {e}"),
        },
        Ok(None) => {}
        Err(e) => warn!("Chat cache read failed: {e}"),
    }

    let courses = if intent.searches_courses() {
        let categories = course::list_categories(db).await?;
        suggest_courses(db, extract_filter(&normalized, &categories)).await?
    } else {
        Vec::new()
    };

    let prompt = build_prompt(intent, message, &courses);
    let reply = match llm.generate(&prompt).await {
        Ok(text) => ChatReply {
            reply: text,
            intent,
            courses,
            cached: false,
        },
        Err(e) => {
            warn!("Language model unavailable, using fallback reply: {e}");
            return Ok(ChatReply {
                reply: fallback_reply(intent, &courses),
                intent,
                courses,
                cached: false,
            });
        }
    };

    match serde_json::to_string(&reply) {
        Ok(raw) => {
            if let Err(e) = cache.put(&key, &raw, ttl).await {
                warn!("Chat cache write failed: {e}");
            }
        }
        Err(e) => warn!("Could not serialize chat reply: {e}"),
    }
    info!(
        "Answered {} message with {} course suggestions",
        intent.as_str(),
        reply.courses.len()
    );
    Ok(reply)
}
