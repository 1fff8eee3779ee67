//! Quiz question bank for the training games.

use serde::Serialize;

use super::game_session::{Difficulty, GameType};

/// A multiple-choice training question
#[derive(Debug, Clone, Serialize)]
pub struct QuizQuestion {
    pub id: &'static str,
    pub game_type: GameType,
    pub difficulty: Difficulty,
    pub prompt: &'static str,
    pub options: &'static [&'static str],
    #[serde(skip)]
    pub correct_option: usize,
    #[serde(skip)]
    pub explanation: &'static str,
    pub points: i64,
}

/// Catalog entry describing one game
#[derive(Debug, Clone, Serialize)]
pub struct GameCatalogEntry {
    pub game_type: GameType,
    pub name: &'static str,
    pub description: &'static str,
    pub questions_by_difficulty: Vec<(Difficulty, usize)>,
}

const fn q(
    id: &'static str,
    game_type: GameType,
    difficulty: Difficulty,
    prompt: &'static str,
    options: &'static [&'static str],
    correct_option: usize,
    explanation: &'static str,
) -> QuizQuestion {
    let points = match difficulty {
        Difficulty::Easy => 10,
        Difficulty::Medium => 20,
        Difficulty::Hard => 30,
    };
    QuizQuestion {
        id,
        game_type,
        difficulty,
        prompt,
        options,
        correct_option,
        explanation,
        points,
    }
}

use Difficulty::{Easy, Hard, Medium};
use GameType::{PasswordHero, PhishingSpotter, SafeChat, ScamBuster};

pub static QUESTION_BANK: &[QuizQuestion] = &[
    // Phishing Spotter
    q(
        "phish-01",
        PhishingSpotter,
        Easy,
        "An email says your bank account is locked and asks you to click a link to verify your password. What should you do?",
        &["Click the link and log in", "Reply with your password", "Go to the bank's site yourself or call them", "Forward it to friends"],
        2,
        "Banks never ask for your password by email. Reach them through a channel you already trust.",
    ),
    q(
        "phish-02",
        PhishingSpotter,
        Easy,
        "Which sender address is most likely fake?",
        &["support@paypal.com", "support@paypa1-security.com", "no-reply@github.com", "news@bbc.co.uk"],
        1,
        "Look-alike domains swap letters for digits, like '1' for 'l'.",
    ),
    q(
        "phish-03",
        PhishingSpotter,
        Medium,
        "A link reads 'https://amazon.com.account-check.xyz/login'. Which site does it really open?",
        &["amazon.com", "account-check.xyz", "amazon.com.account", "login"],
        1,
        "The real domain is the part right before the first single slash, read from the right.",
    ),
    q(
        "phish-04",
        PhishingSpotter,
        Hard,
        "Your manager emails asking you to buy gift cards urgently and keep it quiet. What is this most likely?",
        &["A normal request", "A business email compromise scam", "A software update", "A newsletter"],
        1,
        "Urgency, secrecy and gift cards together are classic signs of impersonation fraud.",
    ),
    // Password Hero
    q(
        "pass-01",
        PasswordHero,
        Easy,
        "Which password is the strongest?",
        &["password123", "Fluffy2010", "correct-horse-battery-staple-91", "qwerty"],
        2,
        "Long passphrases made of unrelated words are both strong and memorable.",
    ),
    q(
        "pass-02",
        PasswordHero,
        Easy,
        "Is it safe to use the same password on every site?",
        &["Yes, if it is long", "No, one leak exposes every account", "Only for games", "Only for email"],
        1,
        "Reused passwords let attackers try a leaked password everywhere else.",
    ),
    q(
        "pass-03",
        PasswordHero,
        Medium,
        "What does two-factor authentication add?",
        &["A second password", "A second proof such as a code from your phone", "A longer username", "Nothing useful"],
        1,
        "A second factor stops attackers who only know your password.",
    ),
    q(
        "pass-04",
        PasswordHero,
        Hard,
        "Someone calls claiming to be IT support and asks for your one-time login code. What do you do?",
        &["Read them the code", "Hang up and report it", "Text them the code instead", "Give them half of it"],
        1,
        "One-time codes are never shared. Real support staff will not ask for them.",
    ),
    // Scam Buster
    q(
        "scam-01",
        ScamBuster,
        Easy,
        "A message says you won a prize but must pay a fee to claim it. What is it?",
        &["A lucky day", "A scam", "A tax form", "A game update"],
        1,
        "Real prizes never require you to pay to receive them.",
    ),
    q(
        "scam-02",
        ScamBuster,
        Easy,
        "A stranger offers free in-game currency if you share your login. What should you do?",
        &["Share the login", "Refuse and block them", "Share only your password", "Ask a friend to share theirs"],
        1,
        "Free currency offers are a common way to steal game accounts.",
    ),
    q(
        "scam-03",
        ScamBuster,
        Medium,
        "An online seller only accepts payment by wire transfer or crypto and the price is far below market. What is the risk?",
        &["None", "It is likely a scam with no way to get your money back", "Shipping will be slow", "The item is used"],
        1,
        "Irreversible payment methods and prices that are too good are major red flags.",
    ),
    q(
        "scam-04",
        ScamBuster,
        Hard,
        "A pop-up claims your computer is infected and shows a support phone number. What is this?",
        &["A real antivirus alert", "A tech-support scam", "A Windows update", "A browser feature"],
        1,
        "Real security software does not ask you to call a phone number from a pop-up.",
    ),
    // Safe Chat
    q(
        "chat-01",
        SafeChat,
        Easy,
        "Someone you met in a game asks for your home address. What should you do?",
        &["Tell them", "Say no and tell a trusted adult", "Give your school's address", "Send a photo of your street"],
        1,
        "Never share where you live with people you only know online.",
    ),
    q(
        "chat-02",
        SafeChat,
        Easy,
        "An online friend says 'don't tell your parents about our chats'. What does this mean?",
        &["They are shy", "It is a warning sign; tell a trusted adult", "It is a game rule", "Nothing"],
        1,
        "Asking for secrecy is a common grooming tactic.",
    ),
    q(
        "chat-03",
        SafeChat,
        Medium,
        "Someone keeps posting mean comments about you in a group chat. What is the best first step?",
        &["Post mean comments back", "Save the messages, block them and tell someone you trust", "Delete your account", "Ignore it forever"],
        1,
        "Keep evidence, block the bully and get support from a trusted person.",
    ),
    q(
        "chat-04",
        SafeChat,
        Hard,
        "An online contact asks you to switch to a private app and send photos. What should you do?",
        &["Switch apps", "Send an old photo", "Refuse, stop chatting and report it", "Ask why first"],
        2,
        "Moving to private apps and asking for photos are serious warning signs. Report it.",
    ),
];

/// Questions dealt for a game at a difficulty; harder tiers include easier questions
pub fn questions_for(game_type: GameType, difficulty: Difficulty) -> Vec<&'static QuizQuestion> {
    QUESTION_BANK
        .iter()
        .filter(|q| q.game_type == game_type && q.difficulty <= difficulty)
        .collect()
}

pub fn find_question(id: &str) -> Option<&'static QuizQuestion> {
    QUESTION_BANK.iter().find(|q| q.id == id)
}

/// Describe every game and how many questions each tier deals
pub fn catalog() -> Vec<GameCatalogEntry> {
    use strum::IntoEnumIterator;

    GameType::iter()
        .map(|game_type| GameCatalogEntry {
            game_type,
            name: game_type.display_name(),
            description: game_type.description(),
            questions_by_difficulty: Difficulty::iter()
                .map(|d| (d, questions_for(game_type, d).len()))
                .collect(),
        })
        .collect()
}
