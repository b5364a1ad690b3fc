pub mod prompts;
pub mod vocabulary;
