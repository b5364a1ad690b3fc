pub mod answer_checker;
pub mod completion_provider;
pub mod concept_extractor;
pub mod content_analyzer;
pub mod orchestrator_steps;
pub mod pattern_detector;
pub mod question_generator;
pub mod response_parser;
pub mod section_splitter;
pub mod study_guide_orchestrator;
pub mod text_preprocessor;
