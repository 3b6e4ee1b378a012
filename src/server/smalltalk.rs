//! Canned replies for greetings and acknowledgements, and the friendly
//! suffix appended to confident answers.
use rand::Rng;
use rand::seq::SliceRandom;

const GREETING_WORDS: &[&str] = &["hi", "hello", "hey", "yo", "hola"];
const THANKS_WORDS: &[&str] = &["ok", "okay", "k", "thanks", "thank you"];

pub const GREETING_REPLIES: &[&str] = &[
    "Hello! How can I assist you today?",
    "Hi there! 😊 What can I help you with?",
    "Hey! Ask me anything.",
];

pub const THANKS_REPLIES: &[&str] = &["You're welcome! 😊", "Glad I could help!", "Anytime!"];

pub const FLOURISHES: &[&str] = &["", " Let me know if you want to know more!", " Happy to help!"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmallTalk {
    Greeting,
    Thanks,
}

/// Whole-message match, case-insensitive.
pub fn classify(message: &str) -> Option<SmallTalk> {
    let lowered = message.to_lowercase();
    if GREETING_WORDS.contains(&lowered.as_str()) {
        Some(SmallTalk::Greeting)
    } else if THANKS_WORDS.contains(&lowered.as_str()) {
        Some(SmallTalk::Thanks)
    } else {
        None
    }
}

pub fn canned_reply<R: Rng + ?Sized>(kind: SmallTalk, rng: &mut R) -> &'static str {
    let pool = match kind {
        SmallTalk::Greeting => GREETING_REPLIES,
        SmallTalk::Thanks => THANKS_REPLIES,
    };
    pool.choose(rng).copied().unwrap_or_default()
}

/// Append a random friendly suffix unless the reply defers to a human.
pub fn add_flourish<R: Rng + ?Sized>(reply: &str, rng: &mut R) -> String {
    if reply.to_lowercase().contains("don't know") {
        return reply.to_string();
    }
    let suffix = FLOURISHES.choose(rng).copied().unwrap_or_default();
    format!("{reply}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_classify() {
        assert_eq!(classify("Hello"), Some(SmallTalk::Greeting));
        assert_eq!(classify("HOLA"), Some(SmallTalk::Greeting));
        assert_eq!(classify("thank you"), Some(SmallTalk::Thanks));
        assert_eq!(classify("k"), Some(SmallTalk::Thanks));
        assert_eq!(classify("hello, how do refunds work?"), None);
    }

    #[test]
    fn test_canned_reply_from_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert!(GREETING_REPLIES.contains(&canned_reply(SmallTalk::Greeting, &mut rng)));
            assert!(THANKS_REPLIES.contains(&canned_reply(SmallTalk::Thanks, &mut rng)));
        }
    }

    #[test]
    fn test_flourish_skips_fallback() {
        let mut rng = StdRng::seed_from_u64(7);
        let fallback = "I don't know. Please wait for the Human reply.";
        assert_eq!(add_flourish(fallback, &mut rng), fallback);
    }

    #[test]
    fn test_flourish_appends_known_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            let out = add_flourish("Refunds take 5 days.", &mut rng);
            let suffix = out.strip_prefix("Refunds take 5 days.").unwrap();
            assert!(FLOURISHES.contains(&suffix));
        }
    }
}
