use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::errors::AppError;
use crate::models::domain::{
    ContentLine, IdentificationItem, MultipleChoiceItem, Section, TrueFalseItem,
};

/// Booleans arrive either as JSON booleans or as "true"/"false" strings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum LenientBool {
    Bool(bool),
    Text(String),
}

impl LenientBool {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            LenientBool::Bool(value) => Some(*value),
            LenientBool::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, JsonSchema)]
pub struct ModelSectionDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub level: Option<Value>,
    #[serde(default)]
    pub content: Vec<Value>,
}

impl TryFrom<ModelSectionDto> for Section {
    type Error = AppError;

    fn try_from(dto: ModelSectionDto) -> Result<Self, Self::Error> {
        dto.validate()?;

        let title = dto.title.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError("section title is blank".to_string()));
        }

        let level = match &dto.level {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(1),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(1),
            _ => 1,
        };

        let content = dto
            .content
            .iter()
            .filter_map(|value| match value {
                Value::String(line) => Some(ContentLine::from_model_line(line)),
                Value::Number(n) => Some(ContentLine::new(n.to_string())),
                _ => None,
            })
            .collect();

        Ok(Section::new(title, level.min(2) as u8, content))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, JsonSchema)]
pub struct ModelConceptDto {
    #[validate(length(min = 1, max = 120))]
    pub term: String,
    #[serde(default)]
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptCandidate {
    pub term: String,
    pub definition: String,
}

impl TryFrom<ModelConceptDto> for ConceptCandidate {
    type Error = AppError;

    fn try_from(dto: ModelConceptDto) -> Result<Self, Self::Error> {
        dto.validate()?;

        let term = dto.term.trim().to_string();
        if term.is_empty() {
            return Err(AppError::ValidationError("concept term is blank".to_string()));
        }

        Ok(ConceptCandidate {
            term,
            definition: dto.definition.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, JsonSchema)]
pub struct ModelTrueFalseDto {
    #[validate(length(min = 1))]
    pub question: String,
    pub answer: LenientBool,
    #[serde(default)]
    pub explanation: String,
}

impl TryFrom<ModelTrueFalseDto> for TrueFalseItem {
    type Error = AppError;

    fn try_from(dto: ModelTrueFalseDto) -> Result<Self, Self::Error> {
        dto.validate()?;
        let question = non_blank(&dto.question, "true/false question")?;

        let answer = dto.answer.as_bool().ok_or_else(|| {
            AppError::ValidationError(format!("answer is not a boolean: {:?}", dto.answer))
        })?;

        Ok(TrueFalseItem {
            question,
            answer,
            explanation: dto.explanation.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelMultipleChoiceDto {
    #[validate(length(min = 1))]
    pub question: String,
    #[validate(length(equal = 4))]
    pub options: Vec<String>,
    #[serde(alias = "correct_index")]
    #[validate(range(min = 0, max = 3))]
    pub correct_index: i64,
    #[serde(default)]
    pub explanation: String,
}

impl TryFrom<ModelMultipleChoiceDto> for MultipleChoiceItem {
    type Error = AppError;

    fn try_from(dto: ModelMultipleChoiceDto) -> Result<Self, Self::Error> {
        dto.validate()?;
        let question = non_blank(&dto.question, "multiple choice question")?;

        if dto.options.iter().any(|option| option.trim().is_empty()) {
            return Err(AppError::ValidationError(
                "multiple choice option is blank".to_string(),
            ));
        }

        let options: [String; 4] = dto
            .options
            .into_iter()
            .map(|option| option.trim().to_string())
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| AppError::ValidationError("expected exactly 4 options".to_string()))?;

        Ok(MultipleChoiceItem {
            question,
            options,
            correct_index: dto.correct_index as usize,
            explanation: dto.explanation.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, JsonSchema)]
pub struct ModelIdentificationDto {
    #[validate(length(min = 1))]
    pub question: String,
    #[validate(length(min = 1, max = 120))]
    pub answer: String,
    #[serde(default)]
    pub hint: String,
}

impl TryFrom<ModelIdentificationDto> for IdentificationItem {
    type Error = AppError;

    fn try_from(dto: ModelIdentificationDto) -> Result<Self, Self::Error> {
        dto.validate()?;

        let question = non_blank(&dto.question, "identification question")?;
        let answer = non_blank(&dto.answer, "identification answer")?;
        let hint = dto.hint.trim();
        // A hint must never give the answer away.
        let hint = if hint.is_empty() || hint.to_lowercase().contains(&answer.to_lowercase()) {
            first_letter_hint(&answer)
        } else {
            hint.to_string()
        };

        Ok(IdentificationItem {
            question,
            answer,
            hint,
        })
    }
}

fn non_blank(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::ValidationError(format!("{} is blank", field)));
    }
    Ok(value.to_string())
}

pub fn first_letter_hint(term: &str) -> String {
    let mut chars = term.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(_)) => format!("Starts with \"{}\"", first),
        _ => "No hint".to_string(),
    }
}

/// Items that survived shape validation, and how many were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBatch<T> {
    pub items: Vec<T>,
    pub rejected: usize,
}

/// Validates every element of a parsed model response, dropping the malformed ones.
/// An object wrapping an array (`{"questions": [...]}`) is unwrapped first.
pub fn collect_valid<D, T>(value: Value, context: &str) -> ValidatedBatch<T>
where
    D: DeserializeOwned,
    T: TryFrom<D, Error = AppError>,
{
    let elements = match value {
        Value::Array(items) => items,
        Value::Object(map) => {
            let wrapped = map.values().find_map(|v| v.as_array().cloned());
            match wrapped {
                Some(items) => items,
                None => vec![Value::Object(map)],
            }
        }
        _ => Vec::new(),
    };

    let mut items = Vec::with_capacity(elements.len());
    let mut rejected = 0;

    for (index, element) in elements.into_iter().enumerate() {
        let converted = serde_json::from_value::<D>(element)
            .map_err(AppError::from)
            .and_then(T::try_from);

        match converted {
            Ok(item) => items.push(item),
            Err(e) => {
                log::warn!("Dropping item {} from {}: {}", index, context, e);
                rejected += 1;
            }
        }
    }

    ValidatedBatch { items, rejected }
}

/// Compact JSON schema for one item, embedded in prompts.
pub fn item_schema<T: JsonSchema>() -> String {
    serde_json::to_string(&schemars::schema_for!(T)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn multiple_choice_items_with_wrong_shape_are_filtered() {
        let value = json!([
            {"question": "Q1", "options": ["a", "b", "c", "d"], "correctIndex": 2, "explanation": "e"},
            {"question": "Q2", "options": ["a", "b", "c"], "correctIndex": 0},
            {"question": "Q3", "options": ["a", "b", "c", "d"], "correctIndex": 4},
            {"question": "Q4", "options": ["a", "b", "c", "d"], "correct_index": 1}
        ]);

        let batch =
            collect_valid::<ModelMultipleChoiceDto, MultipleChoiceItem>(value, "mc-easy");

        assert_eq!(batch.rejected, 2);
        assert_eq!(batch.items.len(), 2);
        assert_eq!(batch.items[0].correct_index, 2);
        assert_eq!(batch.items[1].question, "Q4");
    }

    #[test]
    fn true_false_accepts_string_booleans() {
        let value = json!([
            {"question": "Cells divide.", "answer": "true", "explanation": "Mitosis."},
            {"question": "Cells are rocks.", "answer": false},
            {"question": "Unclear.", "answer": "maybe"}
        ]);

        let batch = collect_valid::<ModelTrueFalseDto, TrueFalseItem>(value, "tf-easy");

        assert_eq!(batch.items.len(), 2);
        assert!(batch.items[0].answer);
        assert!(!batch.items[1].answer);
        assert_eq!(batch.rejected, 1);
    }

    #[test]
    fn wrapped_array_is_unwrapped() {
        let value = json!({"questions": [{"question": "Q", "answer": true}]});

        let batch = collect_valid::<ModelTrueFalseDto, TrueFalseItem>(value, "tf-medium");

        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.rejected, 0);
    }

    #[test]
    fn section_dto_converts_markers_and_defaults_level() {
        let value = json!([{
            "title": "Cell Structure",
            "content": ["Cells have parts.", "BULLET Nucleus", "NUM1. Membrane", 7, {"x": 1}]
        }]);

        let batch = collect_valid::<ModelSectionDto, Section>(value, "sections");
        let section = &batch.items[0];

        assert_eq!(section.level, 1);
        assert_eq!(section.content.len(), 4);
        assert_eq!(section.content[1].as_str(), "• Nucleus");
        assert_eq!(section.content[2].as_str(), "1. Membrane");
        assert_eq!(section.content[3].as_str(), "7");
    }

    #[test]
    fn identification_hint_never_contains_answer() {
        let dto = ModelIdentificationDto {
            question: "The powerhouse of the cell".to_string(),
            answer: "Mitochondria".to_string(),
            hint: "Think mitochondria".to_string(),
        };

        let item = IdentificationItem::try_from(dto).expect("item should convert");

        assert_eq!(item.hint, "Starts with \"M\"");
    }

    #[test]
    fn concept_dto_rejects_blank_term() {
        let value = json!([
            {"term": "   ", "definition": "nothing"},
            {"term": "Osmosis", "definition": " Water movement. "}
        ]);

        let batch = collect_valid::<ModelConceptDto, ConceptCandidate>(value, "concepts");

        assert_eq!(batch.rejected, 1);
        assert_eq!(batch.items[0].definition, "Water movement.");
    }

    #[test]
    fn whitespace_only_quiz_fields_are_rejected() {
        let true_false = collect_valid::<ModelTrueFalseDto, TrueFalseItem>(
            json!([{"question": "   ", "answer": true}, {"question": "Cells divide.", "answer": true}]),
            "tf-easy",
        );
        let multiple_choice = collect_valid::<ModelMultipleChoiceDto, MultipleChoiceItem>(
            json!([{"question": "\n\t", "options": ["a", "b", "c", "d"], "correctIndex": 0}]),
            "mc-easy",
        );
        let identification = collect_valid::<ModelIdentificationDto, IdentificationItem>(
            json!([
                {"question": "  ", "answer": "Osmosis"},
                {"question": "Movement of water.", "answer": "  "},
                {"question": "Movement of water.", "answer": " Osmosis "}
            ]),
            "id-easy",
        );

        assert_eq!(true_false.rejected, 1);
        assert_eq!(true_false.items.len(), 1);
        assert_eq!(multiple_choice.rejected, 1);
        assert!(multiple_choice.items.is_empty());
        assert_eq!(identification.rejected, 2);
        assert_eq!(identification.items[0].answer, "Osmosis");
        assert_eq!(identification.items[0].hint, "Starts with \"O\"");
    }

    #[test]
    fn item_schema_names_required_fields() {
        let schema = item_schema::<ModelMultipleChoiceDto>();

        assert!(schema.contains("correctIndex"));
        assert!(schema.contains("options"));
    }
}
