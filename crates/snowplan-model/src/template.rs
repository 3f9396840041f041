//! Built-in template catalog
//!
//! A template fixes a project's step set at creation time: the stable
//! keys, display titles, icons, and the writing prompt shown for each
//! step. Templates are static catalog data; projects copy what they need
//! and never reference the catalog again.

use crate::ids::StepKey;
use once_cell::sync::Lazy;

/// Template instantiation errors
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Template defines no steps
    #[error("template has no steps")]
    Empty,
}

/// One step definition inside a template
#[derive(Debug, Clone)]
pub struct TemplateStep {
    /// Stable key the step keeps for the project's lifetime
    pub key: StepKey,
    /// Display title
    pub title: String,
    /// Display icon
    pub icon: String,
    /// Writing prompt shown in the editor
    pub prompt: String,
}

/// A project template: metadata plus an ordered step list
#[derive(Debug, Clone)]
pub struct Template {
    /// Catalog identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description, copied onto created projects
    pub description: String,
    /// Display icon
    pub icon: String,
    /// Ordered step definitions
    pub steps: Vec<TemplateStep>,
}

const DEFAULT_PROMPT: &str = "Write your content here...";

impl Template {
    /// All built-in templates
    #[inline]
    #[must_use]
    pub fn catalog() -> &'static [Template] {
        &CATALOG
    }

    /// Look up a template by catalog id
    #[must_use]
    pub fn by_id(id: &str) -> Option<&'static Template> {
        CATALOG.iter().find(|t| t.id == id)
    }

    /// Look up by id, falling back to the basic template
    #[must_use]
    pub fn by_id_or_default(id: &str) -> &'static Template {
        Self::by_id(id).unwrap_or_else(Self::basic)
    }

    /// The default (basic snowflake) template
    #[inline]
    #[must_use]
    pub fn basic() -> &'static Template {
        &CATALOG[0]
    }

    /// Writing prompt for a step, with a generic fallback for unknown keys
    #[must_use]
    pub fn step_prompt(&self, key: &StepKey) -> &str {
        self.steps
            .iter()
            .find(|s| &s.key == key)
            .map(|s| s.prompt.as_str())
            .unwrap_or(DEFAULT_PROMPT)
    }
}

fn step(key: &str, title: &str, icon: &str, prompt: &str) -> TemplateStep {
    TemplateStep {
        key: StepKey::from(key),
        title: title.to_string(),
        icon: icon.to_string(),
        prompt: prompt.to_string(),
    }
}

fn template(id: &str, name: &str, description: &str, icon: &str, steps: Vec<TemplateStep>) -> Template {
    Template {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        steps,
    }
}

static CATALOG: Lazy<Vec<Template>> = Lazy::new(|| {
    vec![
        template(
            "basic-snowflake",
            "Basic Snowflake",
            "Standard Snowflake Method structure for any story",
            "❄️",
            vec![
                step(
                    "summary",
                    "One-Sentence Summary",
                    "💡",
                    "Write a one-sentence summary of your entire story. Focus on the core conflict and character goal.",
                ),
                step(
                    "characters",
                    "Main Characters",
                    "👤",
                    "Describe your main characters, their roles, motivations, and character arcs.",
                ),
                step(
                    "scenes",
                    "Key Scenes",
                    "🎬",
                    "Outline the key scenes that drive your plot forward. Focus on major turning points.",
                ),
                step(
                    "notes",
                    "Additional Notes",
                    "📝",
                    "Add any additional notes, themes, research, or ideas that don't fit in other categories.",
                ),
            ],
        ),
        template(
            "heros-journey",
            "Hero's Journey",
            "Classic monomyth structure with 12 stages",
            "🦸",
            vec![
                step(
                    "ordinary-world",
                    "Ordinary World",
                    "🏠",
                    "Introduce your hero in their ordinary world. What's missing from their life?",
                ),
                step(
                    "call-to-adventure",
                    "Call to Adventure",
                    "📯",
                    "What event calls your hero to adventure? What do they stand to gain or lose?",
                ),
                step(
                    "refusal",
                    "Refusal of the Call",
                    "🙅",
                    "Why does your hero initially refuse the call? What fears or obligations hold them back?",
                ),
                step(
                    "mentor",
                    "Meeting the Mentor",
                    "🧙",
                    "Who guides your hero? What wisdom or gifts do they provide?",
                ),
                step(
                    "crossing",
                    "Crossing the Threshold",
                    "🚪",
                    "What point of no return does your hero cross? How is their world different now?",
                ),
                step(
                    "tests",
                    "Tests, Allies, Enemies",
                    "⚔️",
                    "What challenges does your hero face? Who helps and who hinders them?",
                ),
                step(
                    "approach",
                    "Approach to the Inmost Cave",
                    "🏔️",
                    "How does your hero approach their greatest challenge? What preparations do they make?",
                ),
                step(
                    "ordeal",
                    "The Ordeal",
                    "🔥",
                    "What is the central crisis or ordeal? How does your hero face death (literal or metaphorical)?",
                ),
                step(
                    "reward",
                    "Reward",
                    "🏆",
                    "What does your hero gain from surviving the ordeal? (Knowledge, object, power, etc.)",
                ),
                step(
                    "road-back",
                    "The Road Back",
                    "🛣️",
                    "How does your hero begin their return journey? What new challenges emerge?",
                ),
                step(
                    "resurrection",
                    "Resurrection",
                    "🕊️",
                    "What final test purifies your hero? How are they transformed?",
                ),
                step(
                    "return",
                    "Return with the Elixir",
                    "🏡",
                    "How does your hero return home changed? What elixir (literal or metaphorical) do they bring?",
                ),
            ],
        ),
        template(
            "three-act",
            "Three-Act Structure",
            "Classic beginning, middle, and end structure",
            "🎭",
            vec![
                step(
                    "act1-setup",
                    "Act I: Setup",
                    "🎬",
                    "Introduce characters, setting, and the status quo. What's the world like before everything changes?",
                ),
                step(
                    "inciting-incident",
                    "Inciting Incident",
                    "⚡",
                    "What event disrupts the status quo and sets the story in motion?",
                ),
                step(
                    "act2-confrontation",
                    "Act II: Confrontation",
                    "⚔️",
                    "How does the protagonist struggle against obstacles? What do they learn?",
                ),
                step(
                    "midpoint",
                    "Midpoint",
                    "🎯",
                    "What major event changes the direction of the story? How are the stakes raised?",
                ),
                step(
                    "act3-resolution",
                    "Act III: Resolution",
                    "🎇",
                    "How is the main conflict resolved? What is the new status quo?",
                ),
                step(
                    "climax",
                    "Climax",
                    "🔥",
                    "What is the final, decisive confrontation? How does the protagonist prove their growth?",
                ),
                step(
                    "denouement",
                    "Denouement",
                    "🕊️",
                    "How are loose ends tied up? What is life like for the characters now?",
                ),
            ],
        ),
        template(
            "mystery",
            "Mystery/Thriller",
            "Structure for suspenseful stories with reveals",
            "🕵️",
            vec![
                step(
                    "crime",
                    "The Crime",
                    "🔍",
                    "What crime or mystery needs solving? What makes it compelling?",
                ),
                step(
                    "detective",
                    "The Detective",
                    "🕵️",
                    "Who is solving the mystery? What's their background and motivation?",
                ),
                step(
                    "clues",
                    "Clues & Red Herrings",
                    "🧩",
                    "What clues lead toward the truth? What red herrings misdirect?",
                ),
                step(
                    "suspects",
                    "Suspects",
                    "👥",
                    "Who are the suspects? What motives and alibis do they have?",
                ),
                step(
                    "breakthrough",
                    "Breakthrough",
                    "💡",
                    "What clue or insight breaks the case open?",
                ),
                step(
                    "confrontation",
                    "Confrontation",
                    "⚡",
                    "How does the detective confront the culprit? What's the final reveal?",
                ),
                step(
                    "resolution",
                    "Resolution",
                    "✅",
                    "How is justice served? What are the consequences?",
                ),
            ],
        ),
        template(
            "romance",
            "Romance",
            "Structure for love stories and relationships",
            "❤️",
            vec![
                step(
                    "meet-cute",
                    "Meet Cute",
                    "👋",
                    "How do the love interests meet? What's their first impression?",
                ),
                step(
                    "attraction",
                    "Attraction",
                    "💘",
                    "What draws them together? What chemistry do they share?",
                ),
                step(
                    "conflict",
                    "Conflict",
                    "💔",
                    "What keeps them apart? (External obstacles, internal fears, misunderstandings)",
                ),
                step(
                    "dark-moment",
                    "Dark Moment",
                    "🌑",
                    "What makes them believe all is lost? What separates them?",
                ),
                step(
                    "realization",
                    "Realization",
                    "💡",
                    "What do they realize about themselves and each other?",
                ),
                step(
                    "grand-gesture",
                    "Grand Gesture",
                    "🎁",
                    "How does one prove their love? What sacrifice or effort do they make?",
                ),
                step(
                    "happily-ever-after",
                    "Happily Ever After",
                    "👑",
                    "How do they come together? What does their future look like?",
                ),
            ],
        ),
    ]
});
