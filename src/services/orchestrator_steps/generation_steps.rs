use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{Difficulty, QuizCell, QuizType};

const SECTIONS_TIMEOUT: u64 = 180;
const CONCEPTS_TIMEOUT: u64 = 120;
const QUIZ_CELL_TIMEOUT: u64 = 120;

const DEFAULT_RETRIES: u32 = 2;
const QUIZ_CELL_RETRIES: u32 = 1;

/// Quiz types generated through the model; matching is derived from concepts.
pub const MODEL_QUIZ_TYPES: [QuizType; 3] = [
    QuizType::TrueFalse,
    QuizType::MultipleChoice,
    QuizType::Identification,
];

/// One model-backed unit of work in a generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStep {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub max_retries: u32,
    pub timeout_seconds: Option<u64>,
}

impl GenerationStep {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            max_retries: DEFAULT_RETRIES,
            timeout_seconds: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    pub fn kind(&self) -> Option<StepKind> {
        StepKind::from_step_name(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    GenerateSections,
    ExtractConcepts,
    QuizCell(QuizCell),
}

impl StepKind {
    pub fn from_step_name(name: &str) -> Option<Self> {
        match name {
            "generate_sections" => Some(StepKind::GenerateSections),
            "extract_concepts" => Some(StepKind::ExtractConcepts),
            _ => {
                let mut parts = name.strip_prefix("quiz_")?.splitn(2, '_');
                let quiz_type = QuizType::from_slug(parts.next()?)?;
                let difficulty = Difficulty::from_name(parts.next()?)?;
                MODEL_QUIZ_TYPES
                    .contains(&quiz_type)
                    .then(|| StepKind::QuizCell(QuizCell::new(quiz_type, difficulty)))
            }
        }
    }
}

pub fn quiz_step_name(cell: QuizCell) -> String {
    format!("quiz_{}_{}", cell.quiz_type.slug(), cell.difficulty)
}

pub fn create_reviewer_steps() -> Vec<GenerationStep> {
    vec![generate_sections_step(), extract_concepts_step()]
}

pub fn create_quiz_steps() -> Vec<GenerationStep> {
    MODEL_QUIZ_TYPES
        .iter()
        .flat_map(|quiz_type| {
            Difficulty::ALL
                .iter()
                .map(move |difficulty| quiz_cell_step(QuizCell::new(*quiz_type, *difficulty)))
        })
        .collect()
}

fn generate_sections_step() -> GenerationStep {
    GenerationStep::new("generate_sections")
        .with_description("Split the source text into titled reviewer sections via the model")
        .with_max_retries(DEFAULT_RETRIES)
        .with_timeout(SECTIONS_TIMEOUT)
}

fn extract_concepts_step() -> GenerationStep {
    GenerationStep::new("extract_concepts")
        .with_description("Extract glossary terms and definitions via the model")
        .with_max_retries(DEFAULT_RETRIES)
        .with_timeout(CONCEPTS_TIMEOUT)
}

fn quiz_cell_step(cell: QuizCell) -> GenerationStep {
    GenerationStep::new(quiz_step_name(cell))
        .with_description(format!(
            "Generate up to {} {} questions at {} difficulty",
            cell.target(),
            cell.quiz_type.key(),
            cell.difficulty
        ))
        .with_max_retries(QUIZ_CELL_RETRIES)
        .with_timeout(QUIZ_CELL_TIMEOUT)
}
