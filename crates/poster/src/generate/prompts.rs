//! Prompt template management.

use handlebars::{Handlebars, TemplateError};
use serde::Serialize;

use crate::error::UpstreamError;

/// Template names.
pub const POST_TEMPLATE: &str = "post";
pub const IMAGE_TEMPLATE: &str = "image";

/// Manages Handlebars prompt templates.
pub struct PromptManager {
    handlebars: Handlebars<'static>,
}

impl PromptManager {
    /// Create a new prompt manager with embedded templates.
    pub fn new() -> Result<Self, TemplateError> {
        let mut handlebars = Handlebars::new();
        // Prompts are plain text; HTML escaping would mangle quotes and URLs.
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);

        handlebars.register_template_string(POST_TEMPLATE, POST_PROMPT)?;
        handlebars.register_template_string(IMAGE_TEMPLATE, IMAGE_PROMPT)?;

        Ok(Self { handlebars })
    }

    /// Render a template with the given data.
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String, UpstreamError> {
        Ok(self.handlebars.render(template, data)?)
    }
}

/// System prompt for the post writer.
pub const WRITER_SYSTEM_PROMPT: &str = r#"You are an executive LinkedIn ghost-writer. Turn research into a high-performing post.

POST BLUEPRINT
1. Hook (1-2 lines): a question, a striking statistic or a mini-story.
2. Key insights: translate the research into plain language, as short bullet points.
3. Takeaway / call to action: invite discussion or suggest an action.
4. Hashtags: camelCase tags on the last line.

CONSTRAINTS
- Short paragraphs (at most 3 lines) with white space for scannability.
- Cite sources inline as "(Source: <full URL>)" when a fact comes from a specific page.
- Never invent numbers, dates or quotes that are not in the research.
- Friendly, professional tone: a helpful peer, never pushy sales.

OUTPUT FORMAT
Return plain text exactly as it should appear on LinkedIn: no code fences, no JSON, no preamble."#;

/// User prompt for the post writer.
const POST_PROMPT: &str = r"Write a LinkedIn post about: {{topic}}

Hard limit: {{max_length}} characters including spaces and hashtags.
Use at most {{max_hashtags}} hashtags.
{{#if sources}}

Research to ground the post:
{{#each sources}}

### Source {{this.number}}: {{#if this.title}}{{this.title}} {{/if}}({{this.url}})
{{this.text}}
{{/each}}
{{else}}

No research material was supplied. Rely on well-established knowledge and avoid specific statistics.
{{/if}}
";

/// Prompt for the image model.
const IMAGE_PROMPT: &str = r"A professional, modern hero image for a LinkedIn post about {{topic}}.
Business-friendly palette of blues, greens and greys, square framing, clean composition,
inclusive and diverse people unless the subject is abstract. No text, letters or logos in the image.
The post reads: {{excerpt}}";
