use crate::models::domain::{Difficulty, QuizCell, QuizType};
use crate::models::dto::model_output::{
    item_schema, ModelIdentificationDto, ModelMultipleChoiceDto, ModelTrueFalseDto,
};

pub const SECTIONS_SOURCE_CHARS: usize = 10_000;
pub const CONCEPTS_SOURCE_CHARS: usize = 8_000;
pub const QUIZ_SOURCE_CHARS: usize = 5_000;
pub const HARD_QUIZ_SOURCE_CHARS: usize = 4_000;

pub const SECTIONS_TEMPERATURE: f32 = 0.4;
pub const CONCEPTS_TEMPERATURE: f32 = 0.3;
pub const EASY_QUIZ_TEMPERATURE: f32 = 0.3;
pub const QUIZ_TEMPERATURE: f32 = 0.4;

const SECTIONS_PROMPT: &str = r#"You are a science education expert. Analyze this scientific text and break it into 4-6 logical sections.

For EACH section, provide detailed content using these markers:
- Use "BULLET " for bullet points
- Use "NUM1. ", "NUM2. " for numbered lists
- Use "ARROW " for key highlights

TEXT TO ANALYZE:
{source}

RESPOND WITH ONLY THIS JSON (no additional text before or after):
[
  {
    "title": "Introduction to the Topic",
    "level": 1,
    "content": [
      "Opening paragraph explaining the topic in 2-3 sentences.",
      "BULLET First important key point",
      "BULLET Second important key point",
      "",
      "Additional explanation paragraph."
    ]
  }
]

CRITICAL: Start your response with [ and end with ]. No other text. Each section must have DIFFERENT content. Include 4-8 items per section."#;

const CONCEPTS_PROMPT: &str = r#"Extract 15-20 unique scientific concepts from this text.

TEXT:
{source}

RESPOND WITH ONLY THIS JSON (no additional text before or after):
[
  {
    "term": "Cell Membrane",
    "definition": "A selectively permeable barrier that surrounds the cell."
  },
  {
    "term": "Mitochondria",
    "definition": "The powerhouse of the cell that produces ATP."
  }
]

CRITICAL: Start with [ and end with ]. No text before or after. Each concept must be DIFFERENT. Clear definitions."#;

const QUIZ_PROMPT: &str = r#"{task}

TEXT: {source}

Each item MUST match this JSON schema:
{schema}

RESPOND WITH ONLY THIS JSON (no text before or after):
{example}

CRITICAL RULES:
- Start with [ and end with ]
- At most {count} items
{rules}- No commas after the last item"#;

const TRUE_FALSE_EXAMPLE: &str = r#"[
  {"question": "The cell membrane is selectively permeable", "answer": true, "explanation": "Correct. The cell membrane allows certain substances to pass while blocking others."},
  {"question": "Mitochondria are found in plant cells only", "answer": false, "explanation": "False. Mitochondria are found in both plant and animal cells."}
]"#;

const MULTIPLE_CHOICE_EXAMPLE: &str = r#"[
  {
    "question": "What is the function of the cell membrane?",
    "options": ["Controls what enters and exits", "Produces energy", "Stores DNA", "Makes proteins"],
    "correctIndex": 0,
    "explanation": "The cell membrane controls what enters and exits the cell"
  }
]"#;

const IDENTIFICATION_EXAMPLE: &str = r#"[
  {"question": "The organelle that produces most of the cell's ATP.", "answer": "Mitochondria", "hint": "Starts with \"M\""}
]"#;

pub fn sections_prompt(text: &str) -> String {
    SECTIONS_PROMPT.replace("{source}", &excerpt(text, SECTIONS_SOURCE_CHARS))
}

pub fn concepts_prompt(text: &str) -> String {
    CONCEPTS_PROMPT.replace("{source}", &excerpt(text, CONCEPTS_SOURCE_CHARS))
}

/// Prompt for one model-backed quiz cell; matching has no prompt.
pub fn quiz_prompt(cell: QuizCell, text: &str) -> Option<String> {
    let (schema, example) = match cell.quiz_type {
        QuizType::TrueFalse => (item_schema::<ModelTrueFalseDto>(), TRUE_FALSE_EXAMPLE),
        QuizType::MultipleChoice => (
            item_schema::<ModelMultipleChoiceDto>(),
            MULTIPLE_CHOICE_EXAMPLE,
        ),
        QuizType::Identification => (
            item_schema::<ModelIdentificationDto>(),
            IDENTIFICATION_EXAMPLE,
        ),
        QuizType::Matching => return None,
    };

    let prompt = QUIZ_PROMPT
        .replace("{task}", &task_line(cell))
        .replace("{schema}", &schema)
        .replace("{example}", example)
        .replace("{count}", &cell.target().to_string())
        .replace("{rules}", &rules(cell.quiz_type))
        .replace("{source}", &excerpt(text, source_chars(cell.difficulty)));

    Some(prompt)
}

pub fn quiz_temperature(difficulty: Difficulty) -> f32 {
    match difficulty {
        Difficulty::Easy => EASY_QUIZ_TEMPERATURE,
        Difficulty::Medium | Difficulty::Hard => QUIZ_TEMPERATURE,
    }
}

/// Hard prompts are shorter to leave room for the completion.
fn source_chars(difficulty: Difficulty) -> usize {
    match difficulty {
        Difficulty::Hard => HARD_QUIZ_SOURCE_CHARS,
        Difficulty::Easy | Difficulty::Medium => QUIZ_SOURCE_CHARS,
    }
}

fn task_line(cell: QuizCell) -> String {
    let count = cell.target();
    match (cell.quiz_type, cell.difficulty) {
        (QuizType::TrueFalse, Difficulty::Easy) => format!(
            "Create EXACTLY {} true/false questions about this scientific text. Make them straightforward and obvious.",
            count
        ),
        (QuizType::TrueFalse, Difficulty::Medium) => format!(
            "Create EXACTLY {} true/false questions about this scientific text. Require some thought and understanding.",
            count
        ),
        (QuizType::TrueFalse, _) => format!("Create EXACTLY {} challenging true/false questions.", count),
        (QuizType::MultipleChoice, Difficulty::Easy) => format!(
            "Create EXACTLY {} multiple choice questions with 4 options each. Make correct answer obvious.",
            count
        ),
        (QuizType::MultipleChoice, Difficulty::Medium) => format!(
            "Create EXACTLY {} multiple choice questions with 4 plausible options each.",
            count
        ),
        (QuizType::MultipleChoice, _) => format!(
            "Create EXACTLY {} challenging multiple choice questions with very similar options.",
            count
        ),
        (QuizType::Identification, Difficulty::Easy) => format!(
            "Create EXACTLY {} identification questions. Give a full definition and ask for the term.",
            count
        ),
        (QuizType::Identification, Difficulty::Medium) => format!(
            "Create EXACTLY {} identification questions. Give a partial description and ask for the term.",
            count
        ),
        (QuizType::Identification, _) => format!(
            "Create EXACTLY {} identification questions from brief clues. Never reveal the answer in the question.",
            count
        ),
        (QuizType::Matching, _) => String::new(),
    }
}

fn rules(quiz_type: QuizType) -> String {
    let rules: &[&str] = match quiz_type {
        QuizType::TrueFalse => &["\"answer\" must be true or false (boolean, not string)"],
        QuizType::MultipleChoice => &[
            "Each question has exactly 4 options in \"options\" array",
            "\"correctIndex\" is 0, 1, 2, or 3 (number, not string)",
        ],
        QuizType::Identification => &[
            "\"answer\" is the term only",
            "\"hint\" must not contain the answer",
        ],
        QuizType::Matching => &[],
    };
    rules.iter().map(|rule| format!("- {}\n", rule)).collect()
}

/// First `limit` characters of `text`.
pub fn excerpt(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
