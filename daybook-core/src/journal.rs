//! Journal entries, keyed by calendar day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::date::date_key;

/// One day's journal. The entry's date key is its identity: saving again
/// for the same day replaces the content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub date: NaiveDate,
    /// Rich-text HTML as produced by the editor.
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn key(&self) -> String {
        date_key(self.date)
    }
}

/// Writing prompts surfaced above the day's entry.
pub const DAILY_PROMPTS: &[&str] = &[
    "What question have you been avoiding asking yourself?",
    "If silence had a shape, what would yours look like today?",
    "What do you know now that you wish you understood then?",
    "Where does your mind go when it's not being watched?",
    "What's the difference between what you want and what you need?",
    "If you could unlearn one thing, what would it be?",
    "What are you holding onto that's holding you back?",
    "When was the last time you changed your mind about something important?",
    "What would you do if you weren't afraid of what others think?",
    "What's the story you tell yourself that might not be true?",
    "If you could see yourself from someone else's perspective, what would surprise you?",
    "What's the question you're most afraid to answer?",
    "What do you know in your bones but can't prove?",
    "What would you do differently if you knew you couldn't fail?",
    "What's the gap between who you are and who you pretend to be?",
    "What are you waiting for permission to do?",
    "If you could give your younger self one piece of advice, what would you say?",
    "What's the truth you're not ready to admit?",
    "What would you do if you had nothing to lose?",
    "What's the thing you're most afraid of losing?",
    "What does your future self wish you knew now?",
    "What's the lie you tell yourself most often?",
    "What would you do if you weren't trying to prove anything?",
    "What's the question that keeps you up at night?",
    "What are you running from that's actually running toward you?",
    "What would you do if you trusted yourself completely?",
    "What's the thing you know you should do but keep putting off?",
    "What would change if you stopped waiting for the right moment?",
    "What's the difference between who you are and who you want to be?",
    "What would you do if you knew this was your last chance?",
];

/// The prompt for a date. Stable per date key, spread across the list by a
/// 32-bit string hash of the key.
pub fn prompt_for_date(date: NaiveDate) -> &'static str {
    let key = date_key(date);
    let mut hash: i32 = 0;
    for byte in key.bytes() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(byte));
    }
    DAILY_PROMPTS[hash.unsigned_abs() as usize % DAILY_PROMPTS.len()]
}
