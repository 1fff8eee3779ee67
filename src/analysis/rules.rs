//! Keyword, pattern and reference-corpus rules per threat category.

use regex::Regex;

use crate::models::ThreatCategory;

/// Static rule definition for one category
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: ThreatCategory,
    pub weight: f64,
    pub keywords: &'static [&'static str],
    pub patterns: &'static [(&'static str, &'static str)],
    pub reference_corpus: &'static [&'static str],
    pub recommendations: &'static [&'static str],
}

/// Rule with its patterns compiled
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub category: ThreatCategory,
    pub weight: f64,
    pub keywords: &'static [&'static str],
    pub patterns: Vec<(&'static str, Regex)>,
    pub recommendations: &'static [&'static str],
}

impl CompiledRule {
    pub fn compile(rule: &CategoryRule) -> Result<Self, regex::Error> {
        let patterns = rule
            .patterns
            .iter()
            .map(|(name, pattern)| Regex::new(pattern).map(|re| (*name, re)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            category: rule.category,
            weight: rule.weight,
            keywords: rule.keywords,
            patterns,
            recommendations: rule.recommendations,
        })
    }
}

/// Top-level domains frequently abused for throwaway phishing sites
pub const SUSPICIOUS_TLDS: &[&str] = &[
    "zip", "mov", "xyz", "top", "click", "tk", "ml", "ga", "cf", "gq", "work", "support", "country",
];

/// Link shorteners that hide the real destination
pub const URL_SHORTENERS: &[&str] = &[
    "bit.ly", "tinyurl.com", "t.co", "goo.gl", "ow.ly", "is.gd", "cutt.ly", "rb.gy",
];

/// Recommendations when nothing suspicious was found
pub const GENERAL_RECOMMENDATIONS: &[&str] = &[
    "No obvious threat detected, but stay cautious with unexpected messages.",
    "When in doubt, ask a trusted adult or your IT team before acting.",
];

pub static DEFAULT_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: ThreatCategory::Phishing,
        weight: 1.0,
        keywords: &[
            "verify", "password", "login", "urgent", "suspended", "credentials", "account locked",
            "verify your account", "confirm your identity", "click here", "security alert",
            "unusual activity", "update your payment", "reset your password", "sign in",
        ],
        patterns: &[
            ("ip_address_link", r"(?i)https?://\d{1,3}(?:\.\d{1,3}){3}"),
            (
                "urgency_deadline",
                r"(?i)\b(?:immediately|within \d+ (?:hours?|days?)|right away|asap|final notice)\b",
            ),
            (
                "account_threat",
                r"(?i)\byour (?:account|mailbox|card) (?:has been|will be|is) (?:suspended|locked|closed|disabled)",
            ),
            ("credential_request", r"(?i)\b(?:enter|confirm|provide|send) your (?:password|pin|ssn|login)"),
        ],
        reference_corpus: &[
            "verify your account password immediately or it will be suspended",
            "security alert unusual sign in activity detected confirm your identity",
            "your mailbox is full login to restore access",
            "update your payment details to avoid account closure",
            "we detected a problem with your bank account click here to verify",
        ],
        recommendations: &[
            "Do not click links or open attachments in this message.",
            "Visit the service directly by typing its address yourself.",
            "Never share passwords or one-time codes.",
            "Report the message as phishing to your email provider.",
        ],
    },
    CategoryRule {
        category: ThreatCategory::Malware,
        weight: 1.0,
        keywords: &[
            "download", "install", "attachment", "exe", "virus", "infected", "trojan", "ransomware",
            "crack", "keygen", "free download", "enable macros", "codec", "update required",
        ],
        patterns: &[
            ("executable_file", r"(?i)\b[\w-]+\.(?:exe|scr|bat|cmd|msi|vbs|js|jar|apk)\b"),
            ("macro_prompt", r"(?i)\benable (?:macros|content|editing)\b"),
            ("fake_infection", r"(?i)\byour (?:computer|device|phone) (?:is|has been) infected\b"),
        ],
        reference_corpus: &[
            "download the attached invoice exe to view your order",
            "your computer is infected install this cleaner now",
            "free cracked game download with keygen",
            "enable macros to view the protected document",
            "video codec update required to play this file",
        ],
        recommendations: &[
            "Do not download or run the file.",
            "Keep your operating system and antivirus up to date.",
            "Scan your device if you already opened the attachment.",
        ],
    },
    CategoryRule {
        category: ThreatCategory::Scam,
        weight: 0.9,
        keywords: &[
            "winner", "prize", "lottery", "inheritance", "investment", "guaranteed", "bitcoin",
            "crypto", "gift card", "wire transfer", "free money", "congratulations", "claim",
            "processing fee", "double your",
        ],
        patterns: &[
            ("money_amount", r"(?i)(?:[$€£]\s?\d[\d,]*(?:\.\d+)?|\b\d[\d,]*\s?(?:dollars|usd|btc)\b)"),
            ("payment_demand", r"(?i)\b(?:pay|send|transfer) (?:a |the )?(?:fee|deposit|gift cards?)\b"),
            ("too_good", r"(?i)\b(?:100% guaranteed|risk[- ]free|double your money|act now)\b"),
        ],
        reference_corpus: &[
            "congratulations you are the lottery winner claim your prize",
            "guaranteed investment double your bitcoin in one week",
            "pay a small processing fee to release your inheritance",
            "send gift cards to claim your free money",
            "wire transfer the deposit to secure this exclusive deal",
        ],
        recommendations: &[
            "Never pay a fee to receive a prize or refund.",
            "Do not send gift cards, crypto or wire transfers to strangers.",
            "Check the offer with a trusted person before acting.",
        ],
    },
    CategoryRule {
        category: ThreatCategory::Predator,
        weight: 1.2,
        keywords: &[
            "secret", "alone", "webcam", "age", "address", "don't tell", "our secret",
            "how old are you", "send a photo", "send pics", "where do you live", "meet up",
            "are you alone", "home alone", "meet in person", "private chat",
        ],
        patterns: &[
            ("secrecy_request", r"(?i)\b(?:don'?t|do not) tell (?:your )?(?:parents|mom|dad|anyone)\b"),
            ("photo_request", r"(?i)\bsend (?:me )?(?:a )?(?:photo|pic|picture|selfie)s?\b"),
            ("location_request", r"(?i)\bwhere (?:do you|d'you) (?:live|go to school)\b"),
            ("platform_switch", r"(?i)\b(?:add me|talk|chat) on (?:snapchat|whatsapp|telegram|kik|discord)\b"),
        ],
        reference_corpus: &[
            "this is our secret don't tell your parents",
            "are you home alone right now turn on your webcam",
            "how old are you and where do you live",
            "send me a photo of yourself we can meet up",
            "let's move to a private chat nobody else needs to know",
        ],
        recommendations: &[
            "Stop replying and do not share personal information or photos.",
            "Tell a parent, guardian or trusted adult right away.",
            "Block and report the account on the platform.",
            "Keep the messages as evidence.",
        ],
    },
    CategoryRule {
        category: ThreatCategory::Cyberbullying,
        weight: 0.8,
        keywords: &[
            "loser", "stupid", "ugly", "hate", "idiot", "worthless", "nobody likes you",
            "kill yourself", "everyone hates", "kys", "freak", "pathetic",
        ],
        patterns: &[
            ("self_harm_incitement", r"(?i)\b(?:kill yourself|kys|go die)\b"),
            ("exclusion", r"(?i)\b(?:nobody|no one) (?:likes|wants|cares about) you\b"),
            ("insult", r"(?i)\byou(?:'re| are) (?:so )?(?:stupid|ugly|worthless|pathetic|a loser)\b"),
        ],
        reference_corpus: &[
            "you are such a loser nobody likes you",
            "everyone hates you just leave the group",
            "you're so ugly and stupid",
            "worthless freak go away",
        ],
        recommendations: &[
            "Do not respond to the bully.",
            "Save screenshots as evidence.",
            "Block the sender and report the content.",
            "Talk to someone you trust about how you feel.",
        ],
    },
];
