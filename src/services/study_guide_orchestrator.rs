use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::constants::prompts::{
    concepts_prompt, quiz_prompt, quiz_temperature, sections_prompt, CONCEPTS_TEMPERATURE,
    SECTIONS_TEMPERATURE,
};
use crate::errors::AppError;
use crate::models::domain::quiz_item::QuizItemKey;
use crate::models::domain::{
    Concept, FallbackNotice, FallbackReason, QuestionSet, QuizCell, QuizType, Reviewer, Section,
    SourceQuality, StudyGuide,
};
use crate::models::dto::model_output::{
    collect_valid, ConceptCandidate, ModelConceptDto, ModelIdentificationDto,
    ModelMultipleChoiceDto, ModelSectionDto, ModelTrueFalseDto, ValidatedBatch,
};
use crate::services::completion_provider::{
    complete_with_retry, CompletionProvider, CompletionRequest, RetryPolicy,
};
use crate::services::concept_extractor;
use crate::services::content_analyzer::ContentAnalysis;
use crate::services::orchestrator_steps::generation_steps::{
    create_quiz_steps, create_reviewer_steps, GenerationStep, StepKind,
};
use crate::services::question_generator::{self, merge_cell, MIN_VIABLE_ITEMS};
use crate::services::response_parser::{self, ParseError};
use crate::services::section_splitter;

/// Below either count the source is flagged as thin.
const MIN_CONCEPTS: usize = 5;
const MIN_SENTENCES: usize = 5;

/// Runs the reviewer and quiz plans for one source document.
///
/// With a provider every plan step is attempted through the model first and degrades to
/// the heuristic engine on its own; without one the heuristic engine is used throughout.
pub struct StudyGuideOrchestrator {
    provider: Option<Arc<dyn CompletionProvider>>,
    retry_policy: RetryPolicy,
    max_tokens: u32,
    timeout_seconds: u64,
    shuffle_seed: Option<u64>,
}

impl StudyGuideOrchestrator {
    pub fn heuristic() -> Self {
        Self {
            provider: None,
            retry_policy: RetryPolicy::new(0, Duration::ZERO),
            max_tokens: 0,
            timeout_seconds: 0,
            shuffle_seed: None,
        }
    }

    pub fn with_provider(provider: Arc<dyn CompletionProvider>, config: &Config) -> Self {
        Self {
            provider: Some(provider),
            retry_policy: RetryPolicy::from_config(config),
            max_tokens: config.llm_max_tokens,
            timeout_seconds: config.llm_timeout_seconds,
            shuffle_seed: config.shuffle_seed,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    pub fn processing_version(&self) -> String {
        let mode = if self.provider.is_some() { "llm" } else { "heuristic" };
        format!("{}-{}", env!("CARGO_PKG_VERSION"), mode)
    }

    /// Never fails: every step that cannot use the model falls back and is reported in
    /// [`StudyGuide::fallbacks`].
    pub async fn generate(&self, title: &str, text: &str) -> StudyGuide {
        let run_id = Uuid::new_v4();
        let analysis = ContentAnalysis::analyze(text);
        let version = self.processing_version();

        if analysis.is_empty() {
            log::warn!("Run {}: source text for '{}' is empty", run_id, title);
            return StudyGuide {
                reviewer: Reviewer {
                    title: title.to_string(),
                    sections: Vec::new(),
                    concepts: Vec::new(),
                    metadata: analysis.metadata(text, &version),
                    original_text: text.to_string(),
                },
                questions: QuestionSet::default(),
                source_quality: SourceQuality::ThinSourceMaterial,
                fallbacks: Vec::new(),
            };
        }

        log::info!("Run {}: generating study guide for '{}' ({})", run_id, title, version);

        let mut fallbacks = Vec::new();
        let mut sections = Vec::new();
        let mut concepts = Vec::new();

        for step in create_reviewer_steps() {
            log::info!("Executing {} step for run {}", step.name, run_id);
            match step.kind() {
                Some(StepKind::GenerateSections) => {
                    sections = self.build_sections(&step, &analysis, &mut fallbacks).await
                }
                Some(StepKind::ExtractConcepts) => {
                    concepts = self.build_concepts(&step, &analysis, &mut fallbacks).await
                }
                _ => log::warn!("Run {}: no reviewer handler for step {}", run_id, step.name),
            }
        }

        let mut rng = match self.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut questions = question_generator::generate(&sections, &concepts, &mut rng);

        if let Some(provider) = self.provider.as_deref() {
            for step in create_quiz_steps() {
                log::info!("Executing {} step for run {}", step.name, run_id);
                match step.kind() {
                    Some(StepKind::QuizCell(cell)) => {
                        self.merge_quiz_cell(
                            provider,
                            &step,
                            cell,
                            &analysis.text,
                            &mut questions,
                            &mut fallbacks,
                        )
                        .await
                    }
                    _ => log::warn!("Run {}: no quiz handler for step {}", run_id, step.name),
                }
            }
        }

        let source_quality =
            if concepts.len() < MIN_CONCEPTS || analysis.sentences.len() < MIN_SENTENCES {
                SourceQuality::ThinSourceMaterial
            } else {
                SourceQuality::Sufficient
            };

        log::info!(
            "Run {}: {} sections, {} concepts, {} quiz items, {} fallbacks",
            run_id,
            sections.len(),
            concepts.len(),
            questions.total_items(),
            fallbacks.len()
        );

        StudyGuide {
            reviewer: Reviewer {
                title: title.to_string(),
                sections,
                concepts,
                metadata: analysis.metadata(text, &version),
                original_text: text.to_string(),
            },
            questions,
            source_quality,
            fallbacks,
        }
    }

    async fn build_sections(
        &self,
        step: &GenerationStep,
        analysis: &ContentAnalysis,
        fallbacks: &mut Vec<FallbackNotice>,
    ) -> Vec<Section> {
        if let Some(provider) = self.provider.as_deref() {
            let request = CompletionRequest::new(
                "sections",
                sections_prompt(&analysis.text),
                SECTIONS_TEMPERATURE,
                self.max_tokens,
            );
            let outcome = self
                .run_model_step::<ModelSectionDto, Section>(provider, step, &request)
                .await;
            if let Some(sections) = accept_batch(step, outcome, 1, fallbacks) {
                return sections;
            }
            log::warn!("Using heuristic sections after {} fell back", step.name);
        }

        section_splitter::split(&analysis.text)
    }

    async fn build_concepts(
        &self,
        step: &GenerationStep,
        analysis: &ContentAnalysis,
        fallbacks: &mut Vec<FallbackNotice>,
    ) -> Vec<Concept> {
        if let Some(provider) = self.provider.as_deref() {
            let request = CompletionRequest::new(
                "concepts",
                concepts_prompt(&analysis.text),
                CONCEPTS_TEMPERATURE,
                self.max_tokens,
            );
            let outcome = self
                .run_model_step::<ModelConceptDto, ConceptCandidate>(provider, step, &request)
                .await;
            if let Some(candidates) = accept_batch(step, outcome, 1, fallbacks) {
                return concept_extractor::from_model_candidates(candidates, &analysis.text);
            }
            log::warn!("Using heuristic concepts after {} fell back", step.name);
        }

        concept_extractor::extract(analysis)
    }

    async fn merge_quiz_cell(
        &self,
        provider: &dyn CompletionProvider,
        step: &GenerationStep,
        cell: QuizCell,
        source_text: &str,
        questions: &mut QuestionSet,
        fallbacks: &mut Vec<FallbackNotice>,
    ) {
        let Some(prompt) = quiz_prompt(cell, source_text) else {
            return;
        };
        let request = CompletionRequest::new(
            cell.context(),
            prompt,
            quiz_temperature(cell.difficulty),
            self.max_tokens,
        );

        let difficulty = cell.difficulty;
        match cell.quiz_type {
            QuizType::TrueFalse => {
                self.merge_items::<ModelTrueFalseDto, _>(
                    provider,
                    step,
                    cell,
                    &request,
                    questions.true_false.get_mut(difficulty),
                    fallbacks,
                )
                .await
            }
            QuizType::MultipleChoice => {
                self.merge_items::<ModelMultipleChoiceDto, _>(
                    provider,
                    step,
                    cell,
                    &request,
                    questions.multiple_choice.get_mut(difficulty),
                    fallbacks,
                )
                .await
            }
            QuizType::Identification => {
                self.merge_items::<ModelIdentificationDto, _>(
                    provider,
                    step,
                    cell,
                    &request,
                    questions.identification.get_mut(difficulty),
                    fallbacks,
                )
                .await
            }
            QuizType::Matching => {}
        }
    }

    /// Replaces the heuristic items in `slot` with the model items merged over them.
    async fn merge_items<D, T>(
        &self,
        provider: &dyn CompletionProvider,
        step: &GenerationStep,
        cell: QuizCell,
        request: &CompletionRequest,
        slot: &mut Vec<T>,
        fallbacks: &mut Vec<FallbackNotice>,
    ) where
        D: DeserializeOwned,
        T: TryFrom<D, Error = AppError> + QuizItemKey,
    {
        let outcome = self.run_model_step::<D, T>(provider, step, request).await;
        let model_items = accept_batch(step, outcome, MIN_VIABLE_ITEMS, fallbacks).unwrap_or_default();
        let model_count = model_items.len();

        let heuristic_items = std::mem::take(slot);
        let heuristic_count = heuristic_items.len();
        *slot = merge_cell(model_items, heuristic_items, cell.target());

        log::debug!(
            "Cell {}: {} model + {} heuristic candidates -> {} items",
            cell,
            model_count,
            heuristic_count,
            slot.len()
        );
    }

    async fn run_model_step<D, T>(
        &self,
        provider: &dyn CompletionProvider,
        step: &GenerationStep,
        request: &CompletionRequest,
    ) -> Result<ValidatedBatch<T>, FallbackReason>
    where
        D: DeserializeOwned,
        T: TryFrom<D, Error = AppError>,
    {
        // Config values cap the per-step plan.
        let policy = self
            .retry_policy
            .with_max_retries(step.max_retries.min(self.retry_policy.max_retries));
        let timeout_seconds = step
            .timeout_seconds
            .map_or(self.timeout_seconds, |seconds| seconds.min(self.timeout_seconds));

        let raw = complete_with_retry(provider, request, &policy, Duration::from_secs(timeout_seconds))
            .await
            .map_err(|e| {
                log::warn!("Step {} completion failed: {}", step.name, e);
                FallbackReason::CompletionFailed {
                    message: e.to_string(),
                }
            })?;

        let value = response_parser::parse(&raw, &request.context).map_err(|e| match e {
            ParseError::NoStructureFound { .. } => FallbackReason::NoStructureFound,
            ParseError::InvalidJson { message, .. } => FallbackReason::InvalidJson { message },
        })?;

        Ok(collect_valid::<D, T>(value, &request.context))
    }
}

/// Records the notices a step outcome earns and returns its items if any survived.
fn accept_batch<T>(
    step: &GenerationStep,
    outcome: Result<ValidatedBatch<T>, FallbackReason>,
    minimum: usize,
    fallbacks: &mut Vec<FallbackNotice>,
) -> Option<Vec<T>> {
    let batch = match outcome {
        Ok(batch) => batch,
        Err(reason) => {
            fallbacks.push(FallbackNotice::new(step.name.as_str(), reason));
            return None;
        }
    };

    let accepted = batch.items.len();
    if batch.rejected > 0 {
        log::warn!(
            "Step {} rejected {} malformed items ({} accepted)",
            step.name,
            batch.rejected,
            accepted
        );
        fallbacks.push(FallbackNotice::new(
            step.name.as_str(),
            FallbackReason::ValidationFailure {
                accepted,
                rejected: batch.rejected,
            },
        ));
    }
    if accepted < minimum {
        log::warn!("Step {} produced only {} usable items", step.name, accepted);
        fallbacks.push(FallbackNotice::new(
            step.name.as_str(),
            FallbackReason::BelowMinimum { count: accepted },
        ));
    }

    (accepted > 0).then_some(batch.items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{ConceptType, Difficulty};
    use crate::services::completion_provider::{CompletionError, MockCompletionProvider};

    const SOURCE: &str = "Osmosis is the movement of water across a membrane. \
        Diffusion is the spreading of particles from high to low concentration. \
        Mitochondria are organelles that release energy from food. \
        Ribosomes are structures that assemble proteins from amino acids. \
        Chloroplasts are organelles where photosynthesis takes place. \
        The nucleus is a compartment that stores genetic material.";

    const SECTIONS_JSON: &str = r#"Here are the sections:
```json
[{"title": "Transport", "level": 1, "content": ["BULLET Osmosis moves water", "Diffusion spreads particles."]},
 {"title": "Organelles", "level": 2, "content": ["NUM1. Mitochondria release energy"]}]
```"#;

    const CONCEPTS_JSON: &str = r#"[{"term": "Osmosis", "definition": "Movement of water across a membrane"},
        {"term": "Diffusion", "definition": "Spreading of particles from high to low concentration"}]"#;

    fn scripted_provider(
        script: impl Fn(&str) -> Result<String, CompletionError> + Send + 'static,
    ) -> Arc<dyn CompletionProvider> {
        let mut provider = MockCompletionProvider::new();
        provider
            .expect_complete()
            .returning(move |request| script(&request.context));
        Arc::new(provider)
    }

    fn orchestrator(provider: Arc<dyn CompletionProvider>) -> StudyGuideOrchestrator {
        StudyGuideOrchestrator::with_provider(provider, &Config::test_config())
    }

    fn notices_for<'a>(guide: &'a StudyGuide, step: &str) -> Vec<&'a FallbackReason> {
        guide
            .fallbacks
            .iter()
            .filter(|notice| notice.step == step)
            .map(|notice| &notice.reason)
            .collect()
    }

    #[tokio::test]
    async fn empty_input_makes_no_model_calls() {
        let mut provider = MockCompletionProvider::new();
        provider.expect_complete().times(0);
        let orchestrator = orchestrator(Arc::new(provider));

        let guide = orchestrator.generate("Blank", "  \n\t ").await;

        assert_eq!(guide.source_quality, SourceQuality::ThinSourceMaterial);
        assert!(guide.reviewer.sections.is_empty());
        assert!(guide.reviewer.concepts.is_empty());
        assert!(guide.questions.is_empty());
        assert!(guide.fallbacks.is_empty());
    }

    #[tokio::test]
    async fn heuristic_run_builds_complete_guide() {
        let orchestrator = StudyGuideOrchestrator::heuristic().with_seed(11);

        let guide = orchestrator.generate("Cells", SOURCE).await;

        assert_eq!(guide.source_quality, SourceQuality::Sufficient);
        assert_eq!(guide.reviewer.concepts.len(), 6);
        assert!(guide
            .reviewer
            .concepts
            .iter()
            .all(|c| c.concept_type == ConceptType::Definition));
        assert!(!guide.questions.multiple_choice.get(Difficulty::Easy).is_empty());
        assert!(guide.reviewer.metadata.processing_version.ends_with("-heuristic"));
        assert!(!guide.is_degraded());
    }

    #[tokio::test]
    async fn failing_provider_degrades_every_step_to_heuristics() {
        let provider = scripted_provider(|_| Err(CompletionError::Transport("refused".into())));
        let orchestrator = orchestrator(provider).with_seed(11);

        let guide = orchestrator.generate("Cells", SOURCE).await;
        let heuristic = StudyGuideOrchestrator::heuristic()
            .with_seed(11)
            .generate("Cells", SOURCE)
            .await;

        assert_eq!(guide.fallbacks.len(), 11);
        assert!(guide
            .fallbacks
            .iter()
            .all(|n| matches!(n.reason, FallbackReason::CompletionFailed { .. })));
        assert_eq!(guide.reviewer.sections, heuristic.reviewer.sections);
        assert_eq!(guide.reviewer.concepts, heuristic.reviewer.concepts);
        assert_eq!(guide.questions, heuristic.questions);
        assert!(guide.reviewer.metadata.processing_version.ends_with("-llm"));
    }

    #[tokio::test]
    async fn model_reviewer_is_used_when_it_parses() {
        let provider = scripted_provider(|context| match context {
            "sections" => Ok(SECTIONS_JSON.to_string()),
            "concepts" => Ok(CONCEPTS_JSON.to_string()),
            _ => Ok("I could not produce questions for this text.".to_string()),
        });

        let guide = orchestrator(provider).with_seed(3).generate("Cells", SOURCE).await;

        let titles: Vec<&str> = guide.reviewer.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Transport", "Organelles"]);
        assert_eq!(guide.reviewer.sections[0].content[0].as_str(), "• Osmosis moves water");
        assert_eq!(guide.reviewer.concepts.len(), 2);
        assert!(guide
            .reviewer
            .concepts
            .iter()
            .all(|c| c.concept_type == ConceptType::AiExtracted));
        assert_eq!(guide.source_quality, SourceQuality::ThinSourceMaterial);

        assert!(notices_for(&guide, "generate_sections").is_empty());
        assert_eq!(
            notices_for(&guide, "quiz_tf_easy"),
            vec![&FallbackReason::NoStructureFound]
        );
        assert_eq!(guide.fallbacks.len(), 9);
    }

    #[tokio::test]
    async fn malformed_items_are_reported_per_cell() {
        let provider = scripted_provider(|context| match context {
            "mc-hard" => Ok(r#"[
                {"question": "Which organelle releases energy?", "options": ["Mitochondria", "Ribosome", "Nucleus", "Chloroplast"], "correctIndex": 0, "explanation": "Respiration."},
                {"question": "Broken", "options": ["only", "three", "options"], "correctIndex": 1}
            ]"#
            .to_string()),
            _ => Err(CompletionError::EmptyResponse),
        });

        let guide = orchestrator(provider).with_seed(5).generate("Cells", SOURCE).await;

        assert_eq!(
            notices_for(&guide, "quiz_mc_hard"),
            vec![
                &FallbackReason::ValidationFailure {
                    accepted: 1,
                    rejected: 1
                },
                &FallbackReason::BelowMinimum { count: 1 },
            ]
        );
        let hard = guide.questions.multiple_choice.get(Difficulty::Hard);
        assert_eq!(hard[0].question, "Which organelle releases energy?");
        assert!(hard.len() <= 10);
    }

    #[tokio::test]
    async fn retries_are_capped_by_the_step_plan() {
        let mut provider = MockCompletionProvider::new();
        // test_config allows one retry; each of the 11 steps is attempted twice.
        provider
            .expect_complete()
            .times(22)
            .returning(|_| Err(CompletionError::Timeout(5)));

        let guide = orchestrator(Arc::new(provider)).generate("Cells", SOURCE).await;

        assert_eq!(guide.fallbacks.len(), 11);
    }
}
