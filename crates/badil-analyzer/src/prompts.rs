//! Built-in system prompts, overridable from config.

use badil_core::config::Config;

/// Vision prompt: identify brand, parent company, and product category in
/// a fixed bracket format the parser understands.
pub const IMAGE_ANALYSIS: &str = "\
You are a product identification AI. Your task is to analyze the provided image and accurately \
identify the brand/company name, the parent company name, and the product type/category (not the \
specific product name or flavor).
Respond only in this exact format:
[Brand Name, Parent Company Name, Product Type]

if no Parent Company put: $

Correct Examples:
[7 Up, PepsiCo, Soft Drink]
[Miranda, PepsiCo, Soft Drink]
[Apple, $, smartphone]
[Cadbury, Mondelez, Dairy Milk chocolate]

Do NOT return specific product names or flavors:
[Apple, $, iPhone 14 Pro] (Incorrect - too specific)

Do NOT omit required parts or change the format.

If no product is clearly visible in the image, respond exactly with: #

Be concise and consistent. Do not include any extra text, punctuation, or formatting other than \
the specified structure.";

/// Text prompt used to restyle a stored boycott cause for the client.
pub const TEXT_GENERATION: &str =
    "Type this text in another style, with Arabic language";

pub fn image_analysis(config: &Config) -> String {
    config
        .image_analysis_prompt()
        .unwrap_or(IMAGE_ANALYSIS)
        .to_string()
}

pub fn text_generation(config: &Config) -> String {
    config
        .text_generation_prompt()
        .unwrap_or(TEXT_GENERATION)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use badil_core::config::PromptsConfig;

    #[test]
    fn test_defaults_apply() {
        let config = Config::default();
        assert!(image_analysis(&config).contains("[Brand Name, Parent Company Name, Product Type]"));
        assert!(text_generation(&config).contains("Arabic"));
    }

    #[test]
    fn test_config_overrides_win() {
        let config = Config {
            prompts: Some(PromptsConfig {
                image_analysis: Some("custom vision prompt".into()),
                text_generation: None,
            }),
            ..Default::default()
        };
        assert_eq!(image_analysis(&config), "custom vision prompt");
        assert_eq!(text_generation(&config), TEXT_GENERATION);
    }
}
