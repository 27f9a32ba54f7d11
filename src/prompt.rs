//! Prompt construction for the three Gemini operations. Pure string
//! formatting; validity of the embedded JSON is the caller's concern.

/// Language of the JSON values currently on screen. Translation toggles
/// strictly between these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Chinese,
}

impl Language {
    pub fn toggled(self) -> Self {
        match self {
            Language::English => Language::Chinese,
            Language::Chinese => Language::English,
        }
    }

    pub fn english_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Chinese => "Chinese",
        }
    }
}

/// Fixed instruction sent alongside the uploaded image.
pub const ANALYZE_INSTRUCTIONS: &str = "Analyze this image in exhaustive JSON detail. \
Provide keys like subjects, colors, layout, style, mood, lighting, and textures. \
Only output the JSON string, no other text. No markdown formatting.";

/// Builds the refinement prompt. The approximate-length directive is only
/// included when a target length was supplied.
pub fn modify_prompt(current_json: &str, instruction: &str, target_length: Option<u32>) -> String {
    let length_rule = match target_length {
        Some(count) => format!(
            "Ensure the output content is approximately {} characters/words in total to fit platform limits.",
            count
        ),
        None => String::new(),
    };

    format!(
        "Input JSON:\n{current_json}\n\n\
         Modification Request:\n{instruction}\n\n\
         {length_rule}\n\n\
         Rules:\n\
         1. Output ONLY the updated JSON.\n\
         2. DO NOT include any text like \"Based on your request\" or \"Here is the updated JSON\".\n\
         3. DO NOT include markdown code blocks (no ```json).\n\
         4. Ensure it is valid JSON.\n\
         5. If a word count is specified, summarize or expand the JSON values to meet that length while maintaining descriptive quality."
    )
}

/// Builds the translation prompt: values only, keys kept verbatim.
pub fn translate_prompt(current_json: &str, target: Language) -> String {
    format!(
        "Translate the values of this JSON to {}. \
         Keep keys exactly as they are. Output ONLY valid JSON string.\n{}",
        target.english_name(),
        current_json
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_toggles_between_two_tags() {
        assert_eq!(Language::English.toggled(), Language::Chinese);
        assert_eq!(Language::Chinese.toggled(), Language::English);
        assert_eq!(Language::English.toggled().toggled(), Language::English);
    }

    #[test]
    fn test_analyze_instructions_request_json_only() {
        assert!(ANALYZE_INSTRUCTIONS.contains("subjects"));
        assert!(ANALYZE_INSTRUCTIONS.contains("lighting"));
        assert!(ANALYZE_INSTRUCTIONS.contains("No markdown formatting"));
    }

    #[test]
    fn test_modify_prompt_embeds_json_and_instruction() {
        let prompt = modify_prompt("{\"a\":\"x\"}", "make it shorter", Some(200));
        assert!(prompt.contains("{\"a\":\"x\"}"));
        assert!(prompt.contains("make it shorter"));
        assert!(prompt.contains("approximately 200"));
    }

    #[test]
    fn test_modify_prompt_omits_length_rule_without_target() {
        let prompt = modify_prompt("{}", "remove the mood field", None);
        assert!(prompt.contains("remove the mood field"));
        assert!(!prompt.contains("approximately"));
    }

    #[test]
    fn test_translate_prompt_names_target_and_keeps_keys() {
        let prompt = translate_prompt("{\"a\":\"x\"}", Language::Chinese);
        assert!(prompt.contains("Chinese"));
        assert!(prompt.contains("Keep keys exactly as they are"));
        assert!(prompt.contains("{\"a\":\"x\"}"));

        let prompt = translate_prompt("{}", Language::English);
        assert!(prompt.contains("English"));
    }
}
