use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

pub type CardId = i64;

const WORD_MAX_CHARS: usize = 135;
const DESCRIPTION_MAX_CHARS: usize = 400;
const EXAMPLE_MIN_CHARS: usize = 5;
const EXAMPLE_MAX_CHARS: usize = 400;

/// Trim and case-fold text so that "  Run " and "run" compare equal.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCard {
    pub id: CardId,
    pub word: String,
    pub description: String,
    pub example: String,
    pub category: String,
    pub difficulty_rating: i64,
}

impl WordCard {
    pub const UNKNOWN_CATEGORY: &'static str = "unknown";

    pub fn normalized_word(&self) -> String {
        normalize(&self.word)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        validate_fields(&self.word, &self.description, &self.example)
    }
}

pub(crate) fn validate_fields(word: &str, description: &str, example: &str) -> Result<(), StoreError> {
    check_len("word", word, 1, WORD_MAX_CHARS)?;
    check_len("description", description, 1, DESCRIPTION_MAX_CHARS)?;
    check_len("example", example, EXAMPLE_MIN_CHARS, EXAMPLE_MAX_CHARS)?;
    Ok(())
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), StoreError> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(StoreError::Validation(format!(
            "{field} must be {min}..={max} characters, got {len}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    pub fn index(self) -> usize {
        match self {
            OptionKey::A => 0,
            OptionKey::B => 1,
            OptionKey::C => 2,
            OptionKey::D => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn letter(self) -> char {
        match self {
            OptionKey::A => 'a',
            OptionKey::B => 'b',
            OptionKey::C => 'c',
            OptionKey::D => 'd',
        }
    }

    /// Accepts `a`..`d` or `1`..`4`; expects already normalised input.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "a" | "1" => Some(OptionKey::A),
            "b" | "2" => Some(OptionKey::B),
            "c" | "3" => Some(OptionKey::C),
            "d" | "4" => Some(OptionKey::D),
            _ => None,
        }
    }
}

impl std::fmt::Display for OptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub card: WordCard,
    pub is_correct: bool,
    pub is_main: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    options: [AnswerOption; 4],
}

impl Task {
    pub(crate) fn new(options: [AnswerOption; 4]) -> Self {
        Self { options }
    }

    pub fn option(&self, key: OptionKey) -> &AnswerOption {
        &self.options[key.index()]
    }

    pub fn options(&self) -> impl Iterator<Item = (OptionKey, &AnswerOption)> {
        OptionKey::ALL.into_iter().zip(self.options.iter())
    }

    /// The designated card whose category drove distractor selection.
    pub fn main_card(&self) -> &WordCard {
        self.options
            .iter()
            .find(|option| option.is_main)
            .map(|option| &option.card)
            .unwrap_or(&self.options[0].card)
    }

    pub fn correct_keys(&self) -> Vec<OptionKey> {
        self.options()
            .filter(|(_, option)| option.is_correct)
            .map(|(key, _)| key)
            .collect()
    }

    pub fn wrong_keys(&self) -> Vec<OptionKey> {
        self.options()
            .filter(|(_, option)| !option.is_correct)
            .map(|(key, _)| key)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    tasks: Vec<Task>,
}

impl Lesson {
    pub(crate) fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptMode {
    /// Show the word, choose its description.
    ChooseDescription,
    /// Show the description, choose the word.
    ChooseWord,
}

impl PromptMode {
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            PromptMode::ChooseDescription
        } else {
            PromptMode::ChooseWord
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub number: usize,
    pub total: usize,
    pub mode: PromptMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    pub options: BTreeMap<OptionKey, String>,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordOutcome {
    pub card_id: CardId,
    pub attempts: u32,
    pub mistakes: u32,
    pub final_rating: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub success_percent: u32,
    pub first_try_count: u32,
    pub total_mistakes: u32,
    pub failed_writes: usize,
}
