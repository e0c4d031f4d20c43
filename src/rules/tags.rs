use serde::{Deserialize, Serialize};

/// Element affinity inferred from a definition's identifier or name.
///
/// Inference is a case-insensitive substring match. This is a known fragility
/// inherited from the content pipeline: identifiers are the only tag carrier
/// until definitions grow an explicit element field, at which point `infer`
/// can be dropped without touching the lookup tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementTag {
    Fire,
    Water,
    Wood,
    Metal,
    Earth,
    Lightning,
    Ice,
    Wind,
}

impl ElementTag {
    pub fn infer(text: &str) -> Option<ElementTag> {
        let lower = text.to_ascii_lowercase();
        const KEYWORDS: [(&str, ElementTag); 9] = [
            ("fire", ElementTag::Fire),
            ("flame", ElementTag::Fire),
            ("water", ElementTag::Water),
            ("wood", ElementTag::Wood),
            ("metal", ElementTag::Metal),
            ("earth", ElementTag::Earth),
            ("lightning", ElementTag::Lightning),
            ("ice", ElementTag::Ice),
            ("wind", ElementTag::Wind),
        ];
        KEYWORDS
            .iter()
            .find(|(needle, _)| lower.contains(needle))
            .map(|(_, tag)| *tag)
    }
}

/// Broad role tag inferred the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryTag {
    Attack,
    Defense,
    Movement,
    Support,
    Cultivation,
}

impl CategoryTag {
    pub fn infer(text: &str) -> Option<CategoryTag> {
        let lower = text.to_ascii_lowercase();
        const KEYWORDS: [(&str, CategoryTag); 14] = [
            ("strike", CategoryTag::Attack),
            ("slash", CategoryTag::Attack),
            ("palm", CategoryTag::Attack),
            ("fist", CategoryTag::Attack),
            ("blade", CategoryTag::Attack),
            ("shield", CategoryTag::Defense),
            ("guard", CategoryTag::Defense),
            ("ward", CategoryTag::Defense),
            ("step", CategoryTag::Movement),
            ("dash", CategoryTag::Movement),
            ("heal", CategoryTag::Support),
            ("mend", CategoryTag::Support),
            ("meditation", CategoryTag::Cultivation),
            ("breath", CategoryTag::Cultivation),
        ];
        KEYWORDS
            .iter()
            .find(|(needle, _)| lower.contains(needle))
            .map(|(_, tag)| *tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_element_from_identifier() {
        assert_eq!(ElementTag::infer("fire_palm"), Some(ElementTag::Fire));
        assert_eq!(ElementTag::infer("Azure Flame Art"), Some(ElementTag::Fire));
        assert_eq!(ElementTag::infer("stone_skin"), None);
    }

    #[test]
    fn infers_category_from_identifier() {
        assert_eq!(CategoryTag::infer("burning_palm"), Some(CategoryTag::Attack));
        assert_eq!(CategoryTag::infer("Cloud Step"), Some(CategoryTag::Movement));
        assert_eq!(CategoryTag::infer("turtle"), None);
    }
}
