use crate::models::domain::{Concept, ConceptType, ContentLine, Section};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// Three explicit "X is a Y" sentences and no headings.
    pub const THREE_DEFINITIONS: &str = "A cell is a basic unit of life in all organisms. \
        An enzyme is a protein that speeds up chemical reactions. \
        A gene is a segment of DNA that codes for a protein.";

    /// Extraction-damaged notes: stray glyphs, a hyphenated break, a page number and a list.
    pub const MESSY_NOTES: &str = "CELL BIOLOGY\n\nThe cell is the basic unit of life. It was first ob-\nserved by Robert Hooke in 1665.\n\n12\n\nKey organelles:\n* nucleus\n- mitochondria\n3) ribosomes\n\nPhotosynthesis happens in chloroplasts.\u{0007}";

    /// Creates a glossary with six definitions and two frequent terms
    pub fn sample_concepts() -> Vec<Concept> {
        vec![
            definition("Osmosis", "Movement of water across a semipermeable membrane"),
            definition("Diffusion", "Spreading of particles from high to low concentration"),
            definition("Mitochondrion", "Organelle that releases energy through cellular respiration"),
            definition("Ribosome", "Structure that assembles proteins from amino acids"),
            definition("Chloroplast", "Organelle where photosynthesis takes place in plant cells"),
            definition("Nucleus", "Membrane-bound compartment that stores genetic material"),
            Concept::new(
                "Calvin Cycle",
                "The Calvin Cycle is a set of reactions that fixes carbon dioxide into sugar",
                0.5,
                ConceptType::Frequent,
                4,
            ),
            Concept::new(
                "Krebs Cycle",
                "The Krebs Cycle is a series of reactions that releases stored energy",
                0.375,
                ConceptType::Frequent,
                3,
            ),
        ]
    }

    /// Creates two sections whose sentences are suitable true/false material
    pub fn sample_sections() -> Vec<Section> {
        vec![
            Section::new(
                "Cell Structure",
                1,
                lines(&[
                    "The cell membrane is a thin barrier that controls what enters the cell.",
                    "Ribosomes are small structures that build proteins from amino acids.",
                    "The nucleus contains the genetic material of eukaryotic cells.",
                    "• cytoplasm",
                ]),
            ),
            Section::new(
                "Energy",
                2,
                lines(&[
                    "Mitochondria are the organelles where cellular respiration releases energy.",
                    "Chloroplasts are found in plant cells and capture energy from sunlight.",
                    "Why do cells need energy?",
                ]),
            ),
        ]
    }

    fn definition(term: &str, text: &str) -> Concept {
        Concept::new(term, text, 0.95, ConceptType::Definition, 1)
    }

    fn lines(texts: &[&str]) -> Vec<ContentLine> {
        texts.iter().map(|text| ContentLine::new(*text)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_sample_concepts() {
        let concepts = sample_concepts();
        assert_eq!(concepts.len(), 8);
        assert!(concepts.iter().all(|c| c.has_definition()));
    }

    #[test]
    fn test_fixtures_sample_sections() {
        let sections = sample_sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Cell Structure");
    }
}
